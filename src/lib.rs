//! # mdgate
//!
//! A small HTTP gateway that turns documents into Markdown.
//!
//! Clients either upload a file or name one by URL. Uploads are written to a
//! local file first; URLs are downloaded into a content-addressed cache
//! (`<cache_dir>/<md5(url)>`) and reused on later requests until a caller
//! forces a refresh. In both cases the local file is handed to an extraction
//! engine (the `markitdown` CLI by default) and its text comes back as
//! Markdown.
//!
//! ## Request Flow
//!
//! ```text
//! POST /convert/file/  ──▶ upload   ──▶ temp_<name> ─┐
//!                                                    ├─▶ engine ─▶ {code, filename, markdown}
//! POST /convert/url/   ──▶ cache    ──▶ tmp/<md5>   ─┘
//!                           │ miss
//!                           └─▶ fetch (reqwest, streamed to disk)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mdgate::{Gateway, GatewayConfig, UrlRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = Gateway::new(GatewayConfig::default())?;
//!
//!     // Library use
//!     let result = gateway
//!         .convert_url(&UrlRequest::new("https://example.com/doc.pdf"))
//!         .await?;
//!     println!("{}", result.markdown);
//!
//!     // Or serve it
//!     mdgate::api::serve("127.0.0.1:8000".parse()?, Arc::new(gateway)).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mdgate` binary (clap + anyhow + tracing-subscriber + tracing-appender) |
//!
//! Disable `cli` when embedding the router or the gateway in another service:
//! ```toml
//! mdgate = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod cache;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod gateway;
pub mod types;
pub mod upload;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cache::{ArtifactCache, CacheKey, CacheLookup};
pub use config::{EngineKind, GatewayConfig, GatewayConfigBuilder, DEFAULT_USER_AGENT};
pub use convert::Converter;
pub use engine::{CommandEngine, EngineError, Extraction, ExtractionEngine, PlainTextEngine};
pub use error::{ErrorKind, GatewayError};
pub use fetch::{Fetch, HttpFetcher};
pub use gateway::{is_url, Gateway};
pub use types::{
    ArtifactOrigin, ByteStream, ConversionRequest, ConversionResult, LocalArtifact, UploadPayload,
    UrlRequest,
};
pub use upload::UploadMaterializer;
