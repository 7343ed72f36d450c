//! The user a request is made on behalf of.

use std::collections::HashSet;

use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::feature::Requirement;

/// User context resolved by the host's session layer.
///
/// The host inserts it into the request extensions before plugin routes run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    /// User ID.
    pub id: String,
    /// IDs of users whose documents this user shares.
    #[serde(default)]
    pub coworkers: Vec<String>,
    /// Fully qualified features granted to the user.
    #[serde(default)]
    pub features: HashSet<String>,
}

impl UserContext {
    /// Create a user with no coworkers and no features.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            coworkers: Vec::new(),
            features: HashSet::new(),
        }
    }

    /// Add coworkers.
    pub fn with_coworkers<I, T>(mut self, coworkers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.coworkers.extend(coworkers.into_iter().map(Into::into));
        self
    }

    /// Grant features.
    pub fn with_features<I, T>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.features.extend(features.into_iter().map(Into::into));
        self
    }

    /// Check if the user holds a feature.
    pub fn can(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    /// Inverse of [`UserContext::can`].
    pub fn cannot(&self, feature: &str) -> bool {
        !self.can(feature)
    }

    /// Check a requirement group against the user's features.
    pub fn satisfies(&self, requirement: &Requirement) -> bool {
        requirement.is_satisfied_by(|feature| self.can(feature))
    }

    /// True when `user_id` is this user or one of their coworkers.
    pub fn is_self_or_coworker(&self, user_id: &str) -> bool {
        self.id == user_id || self.coworkers.iter().any(|c| c == user_id)
    }
}

/// Rejection when no host user is attached to the request.
#[derive(Debug)]
pub struct MissingUser;

impl IntoResponse for MissingUser {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "authentication required" })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = MissingUser;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserContext>()
            .cloned()
            .ok_or(MissingUser)
    }
}
