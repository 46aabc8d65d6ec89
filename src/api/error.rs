//! Mapping from library errors to HTTP responses.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::LengthLimitError;
use std::error::Error as StdError;

use crate::error::GatewayError;

use super::types::ErrorResponse;

/// An error on its way out of a handler.
///
/// Every failure, including malformed request bodies that axum would
/// otherwise answer in plain text, leaves as a JSON [`ErrorResponse`].
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

/// 413 for bodies over the limit; every other parse failure is a 400.
impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE || exceeds_body_limit(&err) {
            Self::new(StatusCode::PAYLOAD_TOO_LARGE, "Request payload is too large")
        } else {
            Self::new(StatusCode::BAD_REQUEST, err.body_text())
        }
    }
}

/// Whether `err` or any of its sources is a body length limit error.
///
/// The limit error arrives wrapped once per limiting layer, so the whole
/// source chain is searched.
pub(super) fn exceeds_body_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            code: self.status.as_u16(),
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full, Limited};

    async fn length_limit_error() -> axum::BoxError {
        Limited::new(Full::new(Bytes::from_static(b"more than four bytes")), 4)
            .collect()
            .await
            .unwrap_err()
    }

    #[tokio::test]
    async fn body_limit_is_found_through_wrappers() {
        let inner = axum::Error::new(length_limit_error().await);
        let outer = axum::Error::new(inner);
        assert!(exceeds_body_limit(&outer));

        let io = std::io::Error::other("connection reset");
        assert!(!exceeds_body_limit(&io));
    }

    #[test]
    fn gateway_errors_keep_their_status() {
        let e: ApiError = GatewayError::InvalidUrl {
            url: "ftp://bad".into(),
        }
        .into();
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert!(e.detail.contains("ftp://bad"));

        let e: ApiError = GatewayError::FileNotFound {
            path: "tmp/x".into(),
        }
        .into();
        assert_eq!(e.status, StatusCode::NOT_FOUND);

        let e: ApiError = GatewayError::ConversionFailed {
            path: "temp_a.pdf".into(),
            detail: "bad xref".into(),
        }
        .into();
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);

        let e: ApiError = GatewayError::UploadTooLarge {
            path: "temp_big.pdf".into(),
        }
        .into();
        assert_eq!(e.status, StatusCode::PAYLOAD_TOO_LARGE);
    }
}
