//! API request handlers.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        Multipart, State,
    },
    Json,
};
use futures::TryStreamExt;
use std::io;

use crate::error::GatewayError;
use crate::types::{ConversionRequest, ConversionResult, UploadPayload, UrlRequest};

use super::{
    error::{exceeds_body_limit, ApiError},
    types::{ApiState, HealthResponse},
};

/// Upload endpoint handler.
///
/// POST /convert/file/
///
/// Accepts multipart form data. The first field that carries a filename
/// (conventionally `file`) is streamed to disk and converted; other fields
/// are ignored.
pub async fn convert_file_handler(
    State(state): State<ApiState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ConversionResult>, ApiError> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let body = field.map_err(field_read_error);
        let request = ConversionRequest::Upload(UploadPayload::new(filename, body));
        return Ok(Json(state.gateway.handle(request).await?));
    }

    Err(GatewayError::InvalidUpload {
        reason: "multipart body contains no file".to_string(),
    }
    .into())
}

/// Body limit failures become `FileTooLarge` so the upload is reported as 413.
fn field_read_error(err: MultipartError) -> io::Error {
    if exceeds_body_limit(&err) {
        io::Error::new(io::ErrorKind::FileTooLarge, err)
    } else {
        io::Error::other(err)
    }
}

/// URL endpoint handler.
///
/// POST /convert/url/
///
/// Accepts `{"url": "...", "force_download": false}`. `url` may also name a
/// file that already exists on the server.
pub async fn convert_url_handler(
    State(state): State<ApiState>,
    payload: Result<Json<UrlRequest>, JsonRejection>,
) -> Result<Json<ConversionResult>, ApiError> {
    let Json(request) = payload?;
    let result = state.gateway.handle(ConversionRequest::Url(request)).await?;
    Ok(Json(result))
}

/// Health check endpoint handler.
///
/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
