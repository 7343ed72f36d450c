//! Errors raised by host services.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Failure reported by a host service (storage, validation, metadata).
///
/// Plugins pass these through unchanged; the host decides the status code.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("entity '{0}' is not registered")]
    UnknownEntity(String),

    #[error("store '{0}' is not registered")]
    UnknownStore(String),

    #[error("internal host error")]
    Internal(#[from] anyhow::Error),
}

impl HostError {
    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownEntity(_) | Self::UnknownStore(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for HostError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            Self::Internal(e) => {
                tracing::error!(error = %e, "internal host error");
                "internal server error".to_string()
            }
            Self::UnknownEntity(_) | Self::UnknownStore(_) => {
                tracing::error!(error = %self, "host misconfiguration");
                "internal server error".to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn misconfiguration_is_500_with_a_vague_body() {
        let err = HostError::UnknownStore("posts".into());
        assert_eq!(err.to_string(), "store 'posts' is not registered");
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn internal_error_is_500() {
        let err = HostError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
