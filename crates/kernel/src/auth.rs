//! Bearer token authentication.
//!
//! Resolves `Authorization: Bearer <token>` against the users in the site
//! file and attaches the matching [`UserContext`] to the request:
//! - Known token -> user inserted into request extensions
//! - Unknown token -> 401 JSON error
//! - No header -> passes through; gated routes reject it later

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, bail};
use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{debug, warn};
use webdesq_sdk::prelude::UserContext;

use crate::config::UserEntry;

/// Users by token.
#[derive(Debug, Default)]
pub struct UserDirectory {
    by_token: HashMap<String, UserContext>,
}

impl UserDirectory {
    pub fn from_entries(entries: &[UserEntry]) -> Result<Self> {
        let mut by_token = HashMap::with_capacity(entries.len());
        for entry in entries {
            if entry.token.is_empty() {
                bail!("user '{}' has an empty token", entry.id);
            }
            let user = UserContext::new(entry.id.clone())
                .with_coworkers(entry.coworkers.iter().cloned())
                .with_features(entry.features.iter().cloned());
            if by_token.insert(entry.token.clone(), user).is_some() {
                bail!("token of user '{}' is not unique", entry.id);
            }
        }
        Ok(Self { by_token })
    }

    pub fn authenticate(&self, token: &str) -> Option<&UserContext> {
        self.by_token.get(token)
    }

    pub fn users(&self) -> impl Iterator<Item = &UserContext> {
        self.by_token.values()
    }

    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }
}

pub async fn authenticate_bearer(
    State(users): State<Arc<UserDirectory>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token else {
        return next.run(request).await;
    };

    match users.authenticate(token) {
        Some(user) => {
            debug!(user = %user.id, "bearer token accepted");
            let user = user.clone();
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => {
            warn!("rejected unknown bearer token");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "invalid token" })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, token: &str) -> UserEntry {
        UserEntry {
            id: id.into(),
            token: token.into(),
            features: vec!["acme/pages/see".into()],
            coworkers: vec!["friend".into()],
        }
    }

    #[test]
    fn tokens_resolve_to_users() {
        let users = UserDirectory::from_entries(&[entry("alice", "a"), entry("bob", "b")]).unwrap();
        let alice = users.authenticate("a").unwrap();
        assert_eq!(alice.id, "alice");
        assert!(alice.can("acme/pages/see"));
        assert!(alice.is_self_or_coworker("friend"));
        assert!(users.authenticate("c").is_none());
    }

    #[test]
    fn duplicate_or_empty_tokens_are_rejected() {
        assert!(UserDirectory::from_entries(&[entry("a", "x"), entry("b", "x")]).is_err());
        assert!(UserDirectory::from_entries(&[entry("a", "")]).is_err());
    }
}
