//! Request, artifact and response types.

use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::pin::Pin;

/// A boxed stream of upload body chunks.
pub type ByteStream<'a> = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + 'a>>;

/// One conversion request, as received at either entry point.
pub enum ConversionRequest<'a> {
    /// A document uploaded in the request body.
    Upload(UploadPayload<'a>),
    /// A URL, or a path on the server's file system.
    Url(UrlRequest),
}

impl fmt::Debug for ConversionRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionRequest::Upload(p) => f
                .debug_struct("Upload")
                .field("filename", &p.filename)
                .finish_non_exhaustive(),
            ConversionRequest::Url(r) => f.debug_tuple("Url").field(r).finish(),
        }
    }
}

/// An uploaded document: its raw byte stream and the filename the client declared.
pub struct UploadPayload<'a> {
    pub filename: String,
    pub body: ByteStream<'a>,
}

impl<'a> UploadPayload<'a> {
    pub fn new<S>(filename: impl Into<String>, body: S) -> Self
    where
        S: Stream<Item = std::io::Result<Bytes>> + Send + 'a,
    {
        Self {
            filename: filename.into(),
            body: Box::pin(body),
        }
    }
}

/// Body of `POST /convert/url/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRequest {
    /// `http(s)://` URL, or a path on the server's file system.
    pub url: String,
    /// Re-download even when a cached copy exists.
    #[serde(default)]
    pub force_download: bool,
}

impl UrlRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            force_download: false,
        }
    }

    pub fn force(mut self, v: bool) -> Self {
        self.force_download = v;
        self
    }
}

/// Where a [`LocalArtifact`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactOrigin {
    /// Materialized from an upload during this request.
    Upload,
    /// An existing path on the server named directly in a URL request.
    LocalPath,
    /// Reused from the URL cache without network access.
    CacheHit,
    /// Fetched from the network during this request.
    Downloaded,
}

/// A local file ready for conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalArtifact {
    pub path: PathBuf,
    pub origin: ArtifactOrigin,
}

impl LocalArtifact {
    pub fn new(path: impl Into<PathBuf>, origin: ArtifactOrigin) -> Self {
        Self {
            path: path.into(),
            origin,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Response envelope returned by both endpoints on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// HTTP-style status code, 200 on success.
    pub code: u16,
    /// The resolved local identifier, not the name the client sent.
    pub filename: String,
    /// Extracted Markdown. Empty when the document had no extractable text.
    pub markdown: String,
    /// Human-readable outcome.
    pub detail: String,
}

impl ConversionResult {
    pub fn success(artifact: &LocalArtifact, markdown: String) -> Self {
        Self {
            code: 200,
            filename: artifact.path.to_string_lossy().into_owned(),
            markdown,
            detail: "success".to_string(),
        }
    }
}
