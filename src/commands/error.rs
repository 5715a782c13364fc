//! Error types for the HTTP handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Client-facing failure categories.
///
/// Messages are fixed strings; storage and token details are logged by the
/// handler before conversion and never reach the response body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, malformed, expired or otherwise invalid credential
    #[error("invalid or missing credentials")]
    Unauthorized,

    /// Valid credential without the admin role
    #[error("admin role required")]
    Forbidden,

    #[error("invalid request body")]
    BadRequest,

    #[error("{0}")]
    NotFound(&'static str),

    /// A read against the store failed
    #[error("{0}")]
    Retrieval(&'static str),

    /// A create/delete transaction failed and was rolled back
    #[error("{0}")]
    Mutation(&'static str),
}

impl ApiError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Retrieval(_) | Self::Mutation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::Unauthorized => "Invalid or missing credentials",
            Self::Forbidden => "Admins only",
            Self::BadRequest => "Invalid request body",
            Self::NotFound(msg) | Self::Retrieval(msg) | Self::Mutation(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "error": self.message() }))).into_response()
    }
}
