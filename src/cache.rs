//! Content-addressed cache of downloaded URL artifacts.
//!
//! Each URL maps to `cache_dir/<md5(url)>`. Presence of that file is the only
//! freshness signal: there is no TTL and no revalidation, so a cached copy is
//! reused until a caller passes `force = true`.
//!
//! ## Population
//!
//! On a miss the caller's [`Fetch`] writes into a scratch file inside
//! `cache_dir`, which is renamed onto the canonical path only once the body
//! is complete. A reader therefore never sees a half-written artifact, and
//! a failed download leaves nothing behind.
//!
//! Population is serialized per key. A non-forced request that waited on the
//! lock re-checks the cache before fetching, so N concurrent misses for one
//! URL cost one download. Forced requests always download, one at a time.

use crate::error::GatewayError;
use crate::fetch::Fetch;
use crate::types::{ArtifactOrigin, LocalArtifact};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

/// Hex MD5 digest of a URL string, used as the cached file's name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for the URL exactly as given; no normalisation is applied.
    pub fn for_url(url: &str) -> Self {
        Self(format!("{:x}", md5::compute(url.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a presence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// A reusable copy exists at this path.
    Hit(PathBuf),
    /// The caller must populate this path.
    Miss(PathBuf),
}

impl CacheLookup {
    pub fn path(&self) -> &Path {
        match self {
            CacheLookup::Hit(p) | CacheLookup::Miss(p) => p,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }
}

type KeyLock = tokio::sync::Mutex<()>;

/// URL artifact cache rooted at one directory.
#[derive(Debug)]
pub struct ArtifactCache {
    dir: PathBuf,
    locks: Mutex<HashMap<CacheKey, Weak<KeyLock>>>,
}

impl ArtifactCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Canonical location of the artifact for `key`.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.as_str())
    }

    /// Decide whether `url` can be served from disk.
    ///
    /// Never touches the network. With `force` set this always misses.
    pub async fn resolve(&self, url: &str, force: bool) -> CacheLookup {
        let path = self.path_for(&CacheKey::for_url(url));
        if !force && is_file(&path).await {
            CacheLookup::Hit(path)
        } else {
            CacheLookup::Miss(path)
        }
    }

    /// Return the cached artifact for `url`, downloading it with `fetcher`
    /// on a miss or when `force` is set.
    pub async fn get_or_fetch(
        &self,
        url: &str,
        force: bool,
        fetcher: &dyn Fetch,
    ) -> Result<LocalArtifact, GatewayError> {
        if let CacheLookup::Hit(path) = self.resolve(url, force).await {
            debug!("Cache hit for {}: {}", url, path.display());
            return Ok(LocalArtifact::new(path, ArtifactOrigin::CacheHit));
        }

        let key = CacheKey::for_url(url);
        let _guard = self.lock(&key).await;

        // Another request may have populated the key while we waited.
        if !force {
            if let CacheLookup::Hit(path) = self.resolve(url, false).await {
                debug!("Cache filled while waiting for {}: {}", url, path.display());
                return Ok(LocalArtifact::new(path, ArtifactOrigin::CacheHit));
            }
        }

        let path = self.path_for(&key);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| GatewayError::io(&self.dir, e))?;

        info!("Download {} to {}", url, path.display());

        // Dropping the scratch path on any early return deletes it.
        let staging = tempfile::Builder::new()
            .prefix(&format!(".{key}."))
            .suffix(".part")
            .tempfile_in(&self.dir)
            .map_err(|e| GatewayError::io(&self.dir, e))?
            .into_temp_path();

        let bytes = fetcher.fetch(url, &staging).await?;

        staging
            .persist(&path)
            .map_err(|e| GatewayError::io(&path, e.error))?;

        debug!("Cached {} bytes at {}", bytes, path.display());
        Ok(LocalArtifact::new(path, ArtifactOrigin::Downloaded))
    }

    async fn lock(&self, key: &CacheKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, weak| weak.strong_count() > 0);
            match locks.get(key).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(KeyLock::new(()));
                    locks.insert(key.clone(), Arc::downgrade(&lock));
                    lock
                }
            }
        };
        lock.lock_owned().await
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
