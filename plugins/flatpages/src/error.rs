//! Route error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use webdesq_sdk::prelude::HostError;

/// Errors returned by flatpages routes.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        match self {
            RouteError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response()
            }
            RouteError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "unauthorized" })),
            )
                .into_response(),
            RouteError::Host(e) => e.into_response(),
            RouteError::Internal(e) => {
                tracing::error!(error = %e, "flatpages route failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Result type alias using RouteError.
pub type RouteResult<T> = Result<T, RouteError>;
