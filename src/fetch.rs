//! Remote retrieval: stream an HTTP(S) response body into a local file.
//!
//! The body is written chunk by chunk as it arrives, so memory use does not
//! depend on the size of the remote document. Every failure on the network
//! side (unreachable host, non-success status, connection dropped mid-body)
//! is reported as a network-classified [`GatewayError`]; failures writing
//! the destination file are reported as I/O errors.
//!
//! Scheme validation happens before a fetch is attempted, in
//! [`crate::gateway::Gateway`].

use crate::error::GatewayError;
use async_trait::async_trait;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Retrieves a URL into a local file.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Write the body of `url` to `destination`, returning the byte count.
    ///
    /// On failure a partially written `destination` may remain; callers
    /// that need atomicity stage into a scratch path first.
    async fn fetch(&self, url: &str, destination: &Path) -> Result<u64, GatewayError>;
}

/// [`Fetch`] over a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpFetcher {
    /// Build a fetcher that identifies itself with `user_agent`.
    ///
    /// Without a `timeout` only the transport's own limits apply.
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self, GatewayError> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent);
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }

    fn network_error(&self, url: &str, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            if let Some(t) = self.timeout {
                return GatewayError::DownloadTimeout {
                    url: url.to_string(),
                    secs: t.as_secs(),
                };
            }
        }
        GatewayError::DownloadFailed {
            url: url.to_string(),
            reason: error_chain(&err),
        }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<u64, GatewayError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.network_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::DownloadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|e| GatewayError::io(destination, e))?;

        let mut body = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| self.network_error(url, e))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| GatewayError::io(destination, e))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| GatewayError::io(destination, e))?;

        debug!("Fetched {} bytes from {}", written, url);
        Ok(written)
    }
}

/// Render an error and all of its sources on one line.
///
/// reqwest's top-level message ("error sending request") hides the cause
/// (DNS failure, refused connection) in the source chain.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(s) = source {
        msg.push_str(": ");
        msg.push_str(&s.to_string());
        source = s.source();
    }
    msg
}
