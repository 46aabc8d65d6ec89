//! Error types for the mdgate library.
//!
//! Two error types reflect two distinct boundaries:
//!
//! * [`GatewayError`]: every failure a request can end in. Returned as
//!   `Err(GatewayError)` from the [`crate::gateway::Gateway`] flows and turned
//!   into a JSON error body by the HTTP layer.
//!
//! * [`crate::engine::EngineError`]: failures raised by the external
//!   extraction engine. The conversion step wraps each one into
//!   [`GatewayError::ConversionFailed`], so callers only ever see a single
//!   taxonomy.
//!
//! Each variant belongs to exactly one [`ErrorKind`], and each kind maps to
//! exactly one HTTP status through [`ErrorKind::status_code`].

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the mdgate library.
#[derive(Debug, Error)]
pub enum GatewayError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// URL does not start with an accepted scheme.
    #[error("Invalid URL scheme in '{url}': must start with http:// or https://")]
    InvalidUrl { url: String },

    /// The upload request carried no usable file.
    #[error("Invalid upload: {reason}")]
    InvalidUpload { reason: String },

    /// The upload body ran past the server's request size limit.
    #[error("Upload '{path}' exceeds the request size limit")]
    UploadTooLarge { path: PathBuf },

    /// The resolved local artifact does not exist.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    // ── Network errors ────────────────────────────────────────────────────
    /// Remote endpoint unreachable, or the connection dropped mid-transfer.
    #[error("Request error: failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Remote endpoint answered with a non-success status.
    #[error("Request error: '{url}' returned HTTP {status}")]
    DownloadStatus { url: String, status: u16 },

    /// Download exceeded the configured timeout.
    #[error("Request error: download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The extraction engine failed on this artifact.
    #[error("Conversion error: {detail}")]
    ConversionFailed { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Local read/write failure while materializing an artifact.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Classification of a [`GatewayError`] into a failure domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed client input (bad URL scheme, missing upload).
    InvalidInput,
    /// Request body over the configured limit.
    TooLarge,
    /// Referenced local path absent.
    NotFound,
    /// Remote fetch failure.
    Network,
    /// Extraction engine failure.
    Conversion,
    /// Local filesystem failure.
    Io,
    /// Startup-time configuration failure.
    Config,
}

impl ErrorKind {
    /// HTTP status for this kind of failure.
    ///
    /// | Kind | Status |
    /// |------|--------|
    /// | `InvalidInput` | 400 |
    /// | `TooLarge` | 413 |
    /// | `Network` | 400 |
    /// | `NotFound` | 404 |
    /// | `Conversion` | 500 |
    /// | `Io` | 500 |
    /// | `Config` | 500 |
    pub const fn status_code(self) -> u16 {
        match self {
            ErrorKind::InvalidInput => 400,
            ErrorKind::TooLarge => 413,
            ErrorKind::Network => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conversion => 500,
            ErrorKind::Io => 500,
            ErrorKind::Config => 500,
        }
    }
}

impl GatewayError {
    /// The failure domain this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::InvalidUrl { .. } | GatewayError::InvalidUpload { .. } => {
                ErrorKind::InvalidInput
            }
            GatewayError::FileNotFound { .. } => ErrorKind::NotFound,
            GatewayError::DownloadFailed { .. }
            | GatewayError::DownloadStatus { .. }
            | GatewayError::DownloadTimeout { .. } => ErrorKind::Network,
            GatewayError::ConversionFailed { .. } => ErrorKind::Conversion,
            GatewayError::Io { .. } => ErrorKind::Io,
            GatewayError::UploadTooLarge { .. } => ErrorKind::TooLarge,
            GatewayError::InvalidConfig(_) => ErrorKind::Config,
        }
    }

    /// Shorthand for `self.kind().status_code()`.
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GatewayError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_mentions_scheme() {
        let e = GatewayError::InvalidUrl {
            url: "ftp://bad".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("scheme"), "got: {msg}");
        assert!(msg.contains("ftp://bad"), "got: {msg}");
        assert_eq!(e.status_code(), 400);
    }

    #[test]
    fn network_errors_map_to_400() {
        let errors = [
            GatewayError::DownloadFailed {
                url: "https://x".into(),
                reason: "connection refused".into(),
            },
            GatewayError::DownloadStatus {
                url: "https://x".into(),
                status: 503,
            },
            GatewayError::DownloadTimeout {
                url: "https://x".into(),
                secs: 5,
            },
        ];
        for e in errors {
            assert_eq!(e.kind(), ErrorKind::Network);
            assert_eq!(e.status_code(), 400);
        }
    }

    #[test]
    fn not_found_maps_to_404() {
        let e = GatewayError::FileNotFound {
            path: PathBuf::from("tmp/missing"),
        };
        assert_eq!(e.kind(), ErrorKind::NotFound);
        assert_eq!(e.status_code(), 404);
        assert!(e.to_string().contains("tmp/missing"));
    }

    #[test]
    fn conversion_and_io_map_to_500() {
        let conv = GatewayError::ConversionFailed {
            path: PathBuf::from("temp_a.pdf"),
            detail: "corrupt xref table".into(),
        };
        assert_eq!(conv.status_code(), 500);
        assert!(conv.to_string().contains("corrupt xref table"));

        let io = GatewayError::io(
            "temp_a.pdf",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(io.kind(), ErrorKind::Io);
        assert_eq!(io.status_code(), 500);
    }

    #[test]
    fn download_status_display() {
        let e = GatewayError::DownloadStatus {
            url: "https://example.com/doc.pdf".into(),
            status: 404,
        };
        assert!(e.to_string().contains("HTTP 404"));
    }

    #[test]
    fn oversized_upload_maps_to_413() {
        let e = GatewayError::UploadTooLarge {
            path: PathBuf::from("temp_big.pdf"),
        };
        assert_eq!(e.kind(), ErrorKind::TooLarge);
        assert_eq!(e.status_code(), 413);
        assert!(e.to_string().contains("temp_big.pdf"));
    }
}
