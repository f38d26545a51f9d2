//! HTTP error responses

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pokedex_core::{Error, UploadRejection};
use serde_json::json;
use tracing::{error, warn};

use crate::telemetry::ERRORS_TOTAL;

/// Errors a handler can return
#[derive(Debug)]
pub enum AppError {
    /// Anything raised by validation, decoding or inference
    Service(Error),
    /// The multipart stream broke while reading a field
    Multipart { status: StatusCode, message: String },
    NotFound(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Service(err) => status_for(err),
            AppError::Multipart { status, .. } => *status,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Service(err) => err.kind(),
            AppError::Multipart { status, .. } if *status == StatusCode::PAYLOAD_TOO_LARGE => {
                "payload_too_large"
            }
            AppError::Multipart { .. } => "malformed_request",
            AppError::NotFound(_) => "not_found",
        }
    }
}

/// HTTP status for a service error
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Upload(rejection) => match rejection {
            UploadRejection::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            UploadRejection::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            UploadRejection::MissingField(_)
            | UploadRejection::Malformed(_)
            | UploadRejection::Empty
            | UploadRejection::UnrecognizedFormat => StatusCode::BAD_REQUEST,
        },
        Error::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError::Service(err)
    }
}

impl From<UploadRejection> for AppError {
    fn from(rejection: UploadRejection) -> Self {
        AppError::Service(Error::Upload(rejection))
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        UploadRejection::Malformed(rejection.body_text()).into()
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::Multipart {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        let message = match self {
            AppError::Service(err) => err.to_string(),
            AppError::Multipart { message, .. } => message,
            AppError::NotFound(path) => format!("no route for {}", path),
        };

        if status.is_server_error() {
            error!(kind, %status, "{}", message);
        } else {
            warn!(kind, %status, "{}", message);
        }
        metrics::counter!(ERRORS_TOTAL, "kind" => kind).increment(1);

        let body = json!({
            "error": {
                "message": message,
                "type": kind,
            }
        });

        (status, Json(body)).into_response()
    }
}
