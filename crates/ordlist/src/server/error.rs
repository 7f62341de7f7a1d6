use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use ordlist_core::resolver::ResolverError;
use ordlist_core::ListingError;

// ==============================================================================
// Error Type
// ==============================================================================

#[derive(Debug)]
pub(crate) enum AppError {
    BadRequest(String),
    Validation { field: String, message: String },
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    BadGateway(String),
    ServiceUnavailable(String),
    GatewayTimeout(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": message, "field": field }),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, error_body(msg)),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, error_body(msg)),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, error_body(msg)),
            Self::Conflict(msg) => (StatusCode::CONFLICT, error_body(msg)),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, error_body(msg)),
            Self::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, error_body(msg)),
            Self::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, error_body(msg)),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, error_body(msg)),
        };

        (status, Json(body)).into_response()
    }
}

fn error_body(message: String) -> serde_json::Value {
    serde_json::json!({ "error": message })
}

impl From<ListingError> for AppError {
    fn from(err: ListingError) -> Self {
        let message = err.to_string();
        match err {
            ListingError::Validation { field, message } => Self::Validation {
                field: field.to_string(),
                message,
            },
            ListingError::InvalidPublicKey(_)
            | ListingError::InvalidAddress(_)
            | ListingError::InvalidSignedPsbt(_) => Self::BadRequest(message),
            ListingError::NotFound(_) => Self::NotFound(message),
            ListingError::AlreadyListed(_) | ListingError::Conflict(_) => Self::Conflict(message),
            ListingError::IdentityMismatch(_) => Self::Forbidden(message),
            ListingError::OrdinalResolution(ResolverError::NotFound(_)) => Self::NotFound(message),
            ListingError::OrdinalResolution(_) => Self::BadGateway(message),
            ListingError::Store(_) => Self::ServiceUnavailable(message),
        }
    }
}
