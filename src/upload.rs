//! Persist an inbound upload stream to a local file.
//!
//! The local name is `<prefix><declared filename>` inside the upload
//! directory, so an upload named `a.txt` lands at `temp_a.txt` with the
//! default configuration. Only the final component of the declared name is
//! used: a client sending `../../etc/passwd` gets `temp_passwd`.
//!
//! Two uploads declaring the same name at the same time write the same
//! path; the later writer wins. A body stream that fails with
//! [`std::io::ErrorKind::FileTooLarge`] is reported as
//! [`GatewayError::UploadTooLarge`].
//!
//! A failed upload removes the file at its path, which may be the finished
//! file of a concurrent upload that declared the same name.

use crate::error::GatewayError;
use crate::types::{ArtifactOrigin, LocalArtifact};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Writes upload bodies under one directory with a fixed name prefix.
#[derive(Debug, Clone)]
pub struct UploadMaterializer {
    dir: PathBuf,
    prefix: String,
}

impl UploadMaterializer {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Local path an upload declaring `declared_filename` is written to.
    pub fn path_for(&self, declared_filename: &str) -> Result<PathBuf, GatewayError> {
        let name = final_component(declared_filename).ok_or_else(|| GatewayError::InvalidUpload {
            reason: format!("unusable filename '{declared_filename}'"),
        })?;
        Ok(self.dir.join(format!("{}{}", self.prefix, name)))
    }

    /// Copy `body` to disk in full and return the resulting artifact.
    ///
    /// If the stream fails part-way the partial file is removed.
    pub async fn materialize<S>(
        &self,
        body: S,
        declared_filename: &str,
    ) -> Result<LocalArtifact, GatewayError>
    where
        S: Stream<Item = std::io::Result<Bytes>>,
    {
        let path = self.path_for(declared_filename)?;

        if !self.dir.as_os_str().is_empty() {
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(|e| GatewayError::io(&self.dir, e))?;
        }

        match write_stream(&path, body).await {
            Ok(written) => {
                debug!("Saved upload {} ({} bytes)", path.display(), written);
                Ok(LocalArtifact::new(path, ArtifactOrigin::Upload))
            }
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&path).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        warn!("Could not remove partial upload {}: {}", path.display(), rm);
                    }
                }
                Err(e)
            }
        }
    }
}

async fn write_stream<S>(path: &Path, body: S) -> Result<u64, GatewayError>
where
    S: Stream<Item = std::io::Result<Bytes>>,
{
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| GatewayError::io(path, e))?;

    let mut body = std::pin::pin!(body);
    let mut written: u64 = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| match e.kind() {
            std::io::ErrorKind::FileTooLarge => GatewayError::UploadTooLarge {
                path: path.to_path_buf(),
            },
            _ => GatewayError::io(path, e),
        })?;
        file.write_all(&chunk)
            .await
            .map_err(|e| GatewayError::io(path, e))?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(|e| GatewayError::io(path, e))?;
    Ok(written)
}

/// Last path component of a client-supplied name, splitting on both `/` and `\`.
fn final_component(name: &str) -> Option<&str> {
    let last = name.rsplit(['/', '\\']).next()?.trim();
    match last {
        "" | "." | ".." => None,
        s => Some(s),
    }
}
