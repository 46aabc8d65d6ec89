//! Conversion step: hand a local artifact to the extraction engine.
//!
//! The source must exist before the engine is invoked. A missing path is a
//! [`GatewayError::FileNotFound`] and the engine is never called. Anything the
//! engine raises becomes a [`GatewayError::ConversionFailed`]. An engine that
//! runs but finds no text produces an empty string, not an error.

use crate::engine::ExtractionEngine;
use crate::error::GatewayError;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Runs one extraction engine over local files.
#[derive(Clone)]
pub struct Converter {
    engine: Arc<dyn ExtractionEngine>,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("engine", &self.engine.name())
            .finish()
    }
}

impl Converter {
    pub fn new(engine: Arc<dyn ExtractionEngine>) -> Self {
        Self { engine }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Extract Markdown from the file at `path`.
    pub async fn convert(&self, path: &Path) -> Result<String, GatewayError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(GatewayError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let start = Instant::now();
        let extraction = self
            .engine
            .extract(path)
            .await
            .map_err(|e| GatewayError::ConversionFailed {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        let markdown = extraction.map(|x| x.text_content).unwrap_or_default();
        debug!(
            "{} extracted {} chars from {} in {}ms",
            self.engine.name(),
            markdown.len(),
            path.display(),
            start.elapsed().as_millis()
        );
        Ok(markdown)
    }
}
