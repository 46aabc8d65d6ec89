//! Configuration types for the conversion gateway.
//!
//! All gateway behaviour is controlled through [`GatewayConfig`], built via
//! its [`GatewayConfigBuilder`]. The binary maps its CLI flags onto the
//! builder; library users set only the fields they care about.

use crate::engine::ExtractionEngine;
use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Browser identification header sent with every download. Some servers
/// reject clients that do not look like a desktop browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";

/// Configuration for a [`crate::gateway::Gateway`].
///
/// # Example
/// ```rust
/// use mdgate::GatewayConfig;
///
/// let config = GatewayConfig::builder()
///     .cache_dir("/var/cache/mdgate")
///     .retain_uploads(false)
///     .build()
///     .unwrap();
/// assert_eq!(config.upload_prefix, "temp_");
/// ```
#[derive(Clone)]
pub struct GatewayConfig {
    /// Directory holding URL artifacts, one file per URL named by its cache key. Default: `tmp`.
    pub cache_dir: PathBuf,

    /// Directory receiving materialized uploads. Default: empty (the process working directory).
    pub upload_dir: PathBuf,

    /// Prefix prepended to declared upload filenames. Default: `temp_`.
    pub upload_prefix: String,

    /// Keep uploaded artifacts on disk after the response. Default: true.
    ///
    /// When false, the upload flow deletes its artifact on every exit path.
    pub retain_uploads: bool,

    /// Let the URL flow convert an existing local path directly. Default: true.
    ///
    /// This exposes any file readable by the server process to remote callers.
    /// Turn it off for deployments that are reachable from untrusted networks.
    pub allow_local_paths: bool,

    /// `User-Agent` header sent with downloads.
    pub user_agent: String,

    /// Whole-request download timeout in seconds. Default: None (transport default).
    pub download_timeout_secs: Option<u64>,

    /// Which extraction engine to build. Default: `markitdown` subprocess.
    pub engine: EngineKind,

    /// Timeout for subprocess engines in seconds. Default: 300.
    pub engine_timeout_secs: u64,

    /// Pre-constructed engine. Takes precedence over `engine`.
    pub engine_override: Option<Arc<dyn ExtractionEngine>>,

    /// Maximum accepted request body in bytes. Default: 100 MiB.
    pub max_upload_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("tmp"),
            upload_dir: PathBuf::new(),
            upload_prefix: "temp_".to_string(),
            retain_uploads: true,
            allow_local_paths: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            download_timeout_secs: None,
            engine: EngineKind::default(),
            engine_timeout_secs: 300,
            engine_override: None,
            max_upload_bytes: 100 * 1024 * 1024,
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("cache_dir", &self.cache_dir)
            .field("upload_dir", &self.upload_dir)
            .field("upload_prefix", &self.upload_prefix)
            .field("retain_uploads", &self.retain_uploads)
            .field("allow_local_paths", &self.allow_local_paths)
            .field("user_agent", &self.user_agent)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("engine", &self.engine)
            .field("engine_timeout_secs", &self.engine_timeout_secs)
            .field(
                "engine_override",
                &self.engine_override.as_ref().map(|e| e.name().to_string()),
            )
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl GatewayConfig {
    /// Create a new builder for `GatewayConfig`.
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GatewayConfig`].
#[derive(Debug)]
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl GatewayConfigBuilder {
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = dir.into();
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    pub fn upload_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.upload_prefix = prefix.into();
        self
    }

    pub fn retain_uploads(mut self, v: bool) -> Self {
        self.config.retain_uploads = v;
        self
    }

    pub fn allow_local_paths(mut self, v: bool) -> Self {
        self.config.allow_local_paths = v;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = Some(secs);
        self
    }

    pub fn engine(mut self, kind: EngineKind) -> Self {
        self.config.engine = kind;
        self
    }

    pub fn engine_timeout_secs(mut self, secs: u64) -> Self {
        self.config.engine_timeout_secs = secs;
        self
    }

    pub fn engine_override(mut self, engine: Arc<dyn ExtractionEngine>) -> Self {
        self.config.engine_override = Some(engine);
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GatewayConfig, GatewayError> {
        let c = &self.config;
        if c.upload_prefix.is_empty() {
            return Err(GatewayError::InvalidConfig(
                "Upload prefix must not be empty".into(),
            ));
        }
        if c.upload_prefix.contains(['/', '\\']) {
            return Err(GatewayError::InvalidConfig(format!(
                "Upload prefix must not contain path separators, got '{}'",
                c.upload_prefix
            )));
        }
        if c.cache_dir.as_os_str().is_empty() {
            return Err(GatewayError::InvalidConfig(
                "Cache directory must not be empty".into(),
            ));
        }
        if c.user_agent.trim().is_empty() {
            return Err(GatewayError::InvalidConfig(
                "User-Agent must not be empty".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(GatewayError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        if c.download_timeout_secs == Some(0) {
            return Err(GatewayError::InvalidConfig(
                "Download timeout must be ≥ 1s".into(),
            ));
        }
        if c.engine_timeout_secs == 0 {
            return Err(GatewayError::InvalidConfig(
                "Engine timeout must be ≥ 1s".into(),
            ));
        }
        if let EngineKind::Command { program, .. } = &c.engine {
            if program.trim().is_empty() {
                return Err(GatewayError::InvalidConfig(
                    "Engine command must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which built-in extraction engine the gateway constructs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineKind {
    /// Run `program [args..] <path>` and read Markdown from stdout.
    Command { program: String, args: Vec<String> },
    /// Return UTF-8 text files verbatim.
    PlainText,
}

impl Default for EngineKind {
    fn default() -> Self {
        EngineKind::Command {
            program: "markitdown".to_string(),
            args: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PlainTextEngine;

    #[test]
    fn defaults_match_documented_layout() {
        let c = GatewayConfig::default();
        assert_eq!(c.cache_dir, PathBuf::from("tmp"));
        assert_eq!(c.upload_dir, PathBuf::new());
        assert_eq!(c.upload_prefix, "temp_");
        assert!(c.retain_uploads);
        assert!(c.allow_local_paths);
        assert!(c.download_timeout_secs.is_none());
        assert!(c.user_agent.contains("Chrome/108"));
        assert_eq!(
            c.engine,
            EngineKind::Command {
                program: "markitdown".into(),
                args: vec![]
            }
        );
    }

    #[test]
    fn builder_sets_fields() {
        let c = GatewayConfig::builder()
            .cache_dir("/srv/cache")
            .upload_dir("/srv/uploads")
            .upload_prefix("up_")
            .retain_uploads(false)
            .allow_local_paths(false)
            .download_timeout_secs(30)
            .engine(EngineKind::PlainText)
            .max_upload_bytes(1024)
            .build()
            .unwrap();
        assert_eq!(c.cache_dir, PathBuf::from("/srv/cache"));
        assert_eq!(c.upload_dir, PathBuf::from("/srv/uploads"));
        assert_eq!(c.upload_prefix, "up_");
        assert!(!c.retain_uploads);
        assert!(!c.allow_local_paths);
        assert_eq!(c.download_timeout_secs, Some(30));
        assert_eq!(c.engine, EngineKind::PlainText);
        assert_eq!(c.max_upload_bytes, 1024);
    }

    #[test]
    fn empty_prefix_rejected() {
        let err = GatewayConfig::builder().upload_prefix("").build().unwrap_err();
        assert!(matches!(err, GatewayError::InvalidConfig(_)));
    }

    #[test]
    fn prefix_with_separator_rejected() {
        assert!(GatewayConfig::builder()
            .upload_prefix("../x_")
            .build()
            .is_err());
    }

    #[test]
    fn zero_limits_rejected() {
        assert!(GatewayConfig::builder().max_upload_bytes(0).build().is_err());
        assert!(GatewayConfig::builder()
            .download_timeout_secs(0)
            .build()
            .is_err());
        assert!(GatewayConfig::builder().engine_timeout_secs(0).build().is_err());
    }

    #[test]
    fn empty_engine_command_rejected() {
        let err = GatewayConfig::builder()
            .engine(EngineKind::Command {
                program: " ".into(),
                args: vec![],
            })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Engine command"));
    }

    #[test]
    fn debug_hides_engine_override_internals() {
        let c = GatewayConfig::builder()
            .engine_override(Arc::new(PlainTextEngine))
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("plain-text"), "got: {dbg}");
    }
}
