//! The extraction engine boundary.
//!
//! Turning a PDF, DOCX, XLSX or image into Markdown is not done here. It is
//! delegated to an [`ExtractionEngine`], a black box that takes a local path
//! and either yields text or fails. Two adapters ship with the crate:
//!
//! * [`CommandEngine`]: runs an external converter (by default the
//!   `markitdown` CLI) as a subprocess and captures its stdout.
//! * [`PlainTextEngine`]: returns UTF-8 text files verbatim.
//!
//! Callers with their own engine implement the trait and hand it to
//! [`crate::config::GatewayConfigBuilder::engine_override`].

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Text produced by an engine for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text_content: String,
}

/// Failures raised by an extraction engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The converter process could not be started (not installed, not executable).
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The converter ran longer than allowed and was killed.
    #[error("'{program}' timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    /// The converter exited unsuccessfully.
    #[error("'{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The engine does not understand this document.
    #[error("unsupported document '{path}': {reason}")]
    Unsupported { path: PathBuf, reason: String },

    /// Reading the document failed.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An external component that extracts Markdown text from a local file.
///
/// `Ok(None)` means the engine ran but found nothing to extract; the
/// conversion step reports that as an empty document, not a failure.
#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn extract(&self, path: &Path) -> Result<Option<Extraction>, EngineError>;
}

// ── CommandEngine ────────────────────────────────────────────────────────

/// Runs `program [args..] <path>` and treats stdout as Markdown.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }
}

#[async_trait]
impl ExtractionEngine for CommandEngine {
    fn name(&self) -> &str {
        &self.program
    }

    async fn extract(&self, path: &Path) -> Result<Option<Extraction>, EngineError> {
        debug!("Running {} on {}", self.program, path.display());

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // On timeout the child is dropped, and kill_on_drop reaps it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(EngineError::Spawn {
                    program: self.program.clone(),
                    source,
                })
            }
            Err(_) => {
                return Err(EngineError::Timeout {
                    program: self.program.clone(),
                    secs: self.timeout.as_secs(),
                })
            }
        };

        if !output.status.success() {
            return Err(EngineError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(Extraction { text_content: text }))
    }
}

// ── PlainTextEngine ──────────────────────────────────────────────────────

/// Returns the file's contents unchanged if they are valid UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextEngine;

#[async_trait]
impl ExtractionEngine for PlainTextEngine {
    fn name(&self) -> &str {
        "plain-text"
    }

    async fn extract(&self, path: &Path) -> Result<Option<Extraction>, EngineError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let text = String::from_utf8(bytes).map_err(|e| EngineError::Unsupported {
            path: path.to_path_buf(),
            reason: format!("not UTF-8 text ({e})"),
        })?;

        Ok(Some(Extraction { text_content: text }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn plain_text_returns_contents_verbatim() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"# Title\n\nbody").unwrap();

        let out = PlainTextEngine.extract(f.path()).await.unwrap().unwrap();
        assert_eq!(out.text_content, "# Title\n\nbody");
    }

    #[tokio::test]
    async fn plain_text_rejects_binary() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&[0xff, 0xfe, 0x00, 0x9f]).unwrap();

        let err = PlainTextEngine.extract(f.path()).await.unwrap_err();
        assert!(matches!(err, EngineError::Unsupported { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn command_engine_missing_program_is_spawn_error() {
        let engine = CommandEngine::new(
            "mdgate-no-such-converter",
            Vec::new(),
            Duration::from_secs(5),
        );
        let err = engine.extract(Path::new("whatever.pdf")).await.unwrap_err();
        assert!(matches!(err, EngineError::Spawn { .. }), "got: {err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_engine_captures_stdout() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello from cat").unwrap();

        let engine = CommandEngine::new("cat", Vec::new(), Duration::from_secs(5));
        let out = engine.extract(f.path()).await.unwrap().unwrap();
        assert_eq!(out.text_content, "hello from cat");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_engine_empty_output_is_none() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let engine = CommandEngine::new("cat", Vec::new(), Duration::from_secs(5));
        assert!(engine.extract(f.path()).await.unwrap().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_engine_nonzero_exit_is_failure() {
        // `cat` on a missing file exits 1 with a message on stderr.
        let engine = CommandEngine::new("cat", Vec::new(), Duration::from_secs(5));
        let err = engine
            .extract(Path::new("/nonexistent/mdgate-test-input"))
            .await
            .unwrap_err();
        match err {
            EngineError::Failed { stderr, .. } => assert!(!stderr.is_empty()),
            other => panic!("expected Failed, got {other}"),
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn command_engine_times_out() {
        // GNU sleep sums its operands: `sleep 5 0` sleeps five seconds.
        let engine = CommandEngine::new(
            "sleep",
            vec!["5".to_string()],
            Duration::from_millis(100),
        );
        let err = engine.extract(Path::new("0")).await.unwrap_err();
        assert!(matches!(err, EngineError::Timeout { .. }), "got: {err}");
    }
}
