//! Request orchestration: the two entry flows.
//!
//! ```text
//! upload ──▶ materialize ──────────────────────────────▶ convert
//! url    ──▶ local path? ──yes────────────────────────▶ convert
//!                │no
//!                ▼
//!           scheme check ──▶ cache hit? ──yes─────────▶ convert
//!                                 │no / forced
//!                                 ▼
//!                               fetch ──▶ commit ─────▶ convert
//! ```
//!
//! Both flows log their failure and then emit `Converted <target> to Markdown`
//! unconditionally when they return, successful or not.

use crate::cache::ArtifactCache;
use crate::config::{EngineKind, GatewayConfig};
use crate::convert::Converter;
use crate::engine::{CommandEngine, ExtractionEngine, PlainTextEngine};
use crate::error::{ErrorKind, GatewayError};
use crate::fetch::{Fetch, HttpFetcher};
use crate::types::{
    ArtifactOrigin, ConversionRequest, ConversionResult, LocalArtifact, UploadPayload, UrlRequest,
};
use crate::upload::UploadMaterializer;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Check if the input string looks like a URL this gateway will fetch.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Everything a request needs, shared across all requests.
pub struct Gateway {
    config: GatewayConfig,
    cache: ArtifactCache,
    fetcher: Arc<dyn Fetch>,
    uploads: UploadMaterializer,
    converter: Converter,
}

impl Gateway {
    /// Build a gateway that downloads with reqwest.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let fetcher = HttpFetcher::new(
            &config.user_agent,
            config.download_timeout_secs.map(Duration::from_secs),
        )?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// Build a gateway around a caller-supplied fetcher.
    pub fn with_fetcher(config: GatewayConfig, fetcher: Arc<dyn Fetch>) -> Self {
        let converter = Converter::new(build_engine(&config));
        info!(
            "Gateway ready: engine={}, cache={}, uploads={}",
            converter.engine_name(),
            config.cache_dir.display(),
            if config.upload_dir.as_os_str().is_empty() {
                ".".to_string()
            } else {
                config.upload_dir.display().to_string()
            }
        );
        Self {
            cache: ArtifactCache::new(&config.cache_dir),
            uploads: UploadMaterializer::new(&config.upload_dir, &config.upload_prefix),
            fetcher,
            converter,
            config,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    /// Dispatch a request to its flow.
    pub async fn handle(
        &self,
        request: ConversionRequest<'_>,
    ) -> Result<ConversionResult, GatewayError> {
        match request {
            ConversionRequest::Upload(payload) => self.convert_upload(payload).await,
            ConversionRequest::Url(req) => self.convert_url(&req).await,
        }
    }

    /// Upload flow: save the body locally, then convert it.
    pub async fn convert_upload(
        &self,
        payload: UploadPayload<'_>,
    ) -> Result<ConversionResult, GatewayError> {
        let mut completion = CompletionLog::new(&payload.filename);
        let result = self.upload_flow(payload, &mut completion).await;
        if let Err(ref e) = result {
            error!(error = ?e, "File conversion error: {e}");
        }
        result
    }

    async fn upload_flow(
        &self,
        payload: UploadPayload<'_>,
        completion: &mut CompletionLog,
    ) -> Result<ConversionResult, GatewayError> {
        let UploadPayload { filename, body } = payload;
        let artifact = self.uploads.materialize(body, &filename).await?;
        completion.retarget(artifact.path.display().to_string());

        let markdown = self.converter.convert(&artifact.path).await;
        if !self.config.retain_uploads {
            discard(&artifact).await;
        }
        Ok(ConversionResult::success(&artifact, markdown?))
    }

    /// URL flow: resolve a local path or cached/downloaded artifact, then convert it.
    pub async fn convert_url(
        &self,
        request: &UrlRequest,
    ) -> Result<ConversionResult, GatewayError> {
        let _completion = CompletionLog::new(&request.url);
        let result = self.url_flow(request).await;
        match &result {
            Err(e) if e.kind() == ErrorKind::Network => {
                warn!(error = ?e, "URL download error: {e}")
            }
            Err(e) => error!(error = ?e, "URL conversion error: {e}"),
            Ok(_) => {}
        }
        result
    }

    async fn url_flow(&self, request: &UrlRequest) -> Result<ConversionResult, GatewayError> {
        let artifact = self.resolve_url(request).await?;
        let markdown = self.converter.convert(&artifact.path).await?;
        Ok(ConversionResult::success(&artifact, markdown))
    }

    /// Turn a URL request into a local artifact without converting it.
    ///
    /// Fails with [`GatewayError::InvalidUrl`] before any network or cache
    /// access when the reference is neither an existing local path nor an
    /// `http(s)://` URL.
    pub async fn resolve_url(&self, request: &UrlRequest) -> Result<LocalArtifact, GatewayError> {
        let url = request.url.as_str();

        if self.config.allow_local_paths && tokio::fs::try_exists(url).await.unwrap_or(false) {
            debug!("Using local path {}", url);
            return Ok(LocalArtifact::new(url, ArtifactOrigin::LocalPath));
        }

        if !is_url(url) {
            return Err(GatewayError::InvalidUrl {
                url: url.to_string(),
            });
        }

        self.cache
            .get_or_fetch(url, request.force_download, self.fetcher.as_ref())
            .await
    }
}

/// Pre-built engine wins over the configured kind.
fn build_engine(config: &GatewayConfig) -> Arc<dyn ExtractionEngine> {
    if let Some(ref engine) = config.engine_override {
        return Arc::clone(engine);
    }
    match &config.engine {
        EngineKind::Command { program, args } => Arc::new(CommandEngine::new(
            program.clone(),
            args.clone(),
            Duration::from_secs(config.engine_timeout_secs),
        )),
        EngineKind::PlainText => Arc::new(PlainTextEngine),
    }
}

async fn discard(artifact: &LocalArtifact) {
    match tokio::fs::remove_file(&artifact.path).await {
        Ok(()) => debug!("Removed upload {}", artifact.path.display()),
        Err(e) => warn!("Could not remove upload {}: {}", artifact.path.display(), e),
    }
}

/// Logs the completion line when dropped, so it fires on every return path.
struct CompletionLog {
    target: String,
}

impl CompletionLog {
    fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    fn retarget(&mut self, target: impl Into<String>) {
        self.target = target.into();
    }
}

impl Drop for CompletionLog {
    fn drop(&mut self) {
        info!("Converted {} to Markdown", self.target);
    }
}
