//! HTTP surface for the gateway.
//!
//! # Endpoints
//!
//! - `POST /convert/file/` - Convert an uploaded file (multipart form data)
//! - `POST /convert/url/` - Convert a document by URL or server-local path (JSON)
//! - `GET /health` - Health check
//!
//! Both conversion endpoints answer `{code, filename, markdown, detail}` on
//! success and `{code, detail}` on failure, with the HTTP status matching
//! `code`.
//!
//! # cURL Examples
//!
//! ```bash
//! curl -F "file=@report.pdf" http://localhost:8000/convert/file/
//!
//! curl -H 'content-type: application/json' \
//!      -d '{"url":"https://example.com/doc.pdf"}' \
//!      http://localhost:8000/convert/url/
//!
//! # Ignore the cached copy
//! curl -H 'content-type: application/json' \
//!      -d '{"url":"https://example.com/doc.pdf","force_download":true}' \
//!      http://localhost:8000/convert/url/
//! ```

mod error;
mod handlers;
mod server;
mod types;

pub use error::ApiError;
pub use server::{create_router, serve};
pub use types::{ApiState, ErrorResponse, HealthResponse};
