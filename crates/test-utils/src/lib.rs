#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Webdesq test utilities.
//!
//! Helpers for integration testing: document and user fixtures, request
//! builders that attach a host user, and JSON assertion utilities.

use axum::body::Body;
use axum::http::{Method, Request, header};
use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;
use webdesq_sdk::prelude::{Document, Log, LogEntry, UserContext};

/// Fixed reference time so fixture ordering is deterministic.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

/// Create a test document owned by `created_by`.
pub fn test_document(created_by: &str) -> TestDocument {
    TestDocument {
        id: Uuid::now_v7().to_string(),
        created_by: created_by.to_string(),
        created_on: epoch(),
        fields: Map::new(),
    }
}

/// A test document builder.
#[derive(Debug, Clone)]
pub struct TestDocument {
    pub id: String,
    pub created_by: String,
    pub created_on: DateTime<Utc>,
    pub fields: Map<String, JsonValue>,
}

impl TestDocument {
    /// Set a custom ID.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Shift the creation time by `minutes` from [`epoch`].
    pub fn created_minutes_after_epoch(mut self, minutes: i64) -> Self {
        self.created_on = epoch() + Duration::minutes(minutes);
        self
    }

    /// Add a single field.
    pub fn with_field(mut self, name: &str, value: JsonValue) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// Add a translatable field with one value per language.
    pub fn with_translations(self, name: &str, values: &[(&str, &str)]) -> Self {
        let map: Map<String, JsonValue> = values
            .iter()
            .map(|(lang, text)| (lang.to_string(), JsonValue::String(text.to_string())))
            .collect();
        self.with_field(name, JsonValue::Object(map))
    }

    pub fn build(self) -> Document {
        Document {
            id: self.id,
            log: Log {
                created: LogEntry {
                    on: self.created_on,
                    by: self.created_by,
                },
                changed: None,
            },
            fields: self.fields,
        }
    }
}

/// Create a test user holding `features`.
pub fn test_user(id: &str, features: &[&str]) -> UserContext {
    UserContext::new(id).with_features(features.iter().copied())
}

/// Build a request carrying `user` in its extensions, as the host's
/// bearer auth layer would.
pub fn request(method: Method, uri: &str, user: Option<&UserContext>) -> TestRequest {
    TestRequest {
        method,
        uri: uri.to_string(),
        user: user.cloned(),
        headers: Vec::new(),
        body: None,
    }
}

/// A request builder for router tests.
#[derive(Debug, Clone)]
pub struct TestRequest {
    method: Method,
    uri: String,
    user: Option<UserContext>,
    headers: Vec<(String, String)>,
    body: Option<JsonValue>,
}

impl TestRequest {
    /// Add a header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Set a JSON body.
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    pub fn build(self) -> Request<Body> {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }

        let body = match self.body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };

        let mut request = builder.body(body).unwrap();
        if let Some(user) = self.user {
            request.extensions_mut().insert(user);
        }
        request
    }
}

/// Read a response body as JSON (`null` for an empty body).
pub async fn body_json(response: Response) -> JsonValue {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return JsonValue::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

/// Read a JSON object body and return its keys in the order they were sent.
pub async fn body_keys(response: Response) -> Vec<String> {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let object: IndexMap<String, JsonValue> = serde_json::from_slice(&bytes).unwrap();
    object.into_keys().collect()
}

/// Assertion helpers for JSON content.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a JSON value lacks a specific key.
    pub fn lacks_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_none(),
            "Expected JSON to NOT have key '{key}', got: {value}"
        );
    }

    /// IDs of a JSON array of documents, in order.
    pub fn ids(value: &Value) -> Vec<String> {
        value
            .as_array()
            .unwrap_or_else(|| panic!("Expected JSON array, got: {value}"))
            .iter()
            .map(|doc| doc["id"].as_str().unwrap().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_builder() {
        let doc = test_document("u1")
            .with_id("page-1")
            .created_minutes_after_epoch(5)
            .with_translations("title", &[("en", "Home")])
            .build();

        assert_eq!(doc.id, "page-1");
        assert_eq!(doc.created_by(), "u1");
        assert_eq!(doc.log.created.on, epoch() + Duration::minutes(5));
        assert_eq!(doc.fields["title"]["en"], "Home");
    }

    #[test]
    fn test_user_builder() {
        let user = test_user("u1", &["a/b/c"]);
        assert!(user.can("a/b/c"));
        assert!(user.cannot("a/b/d"));
    }

    #[test]
    fn request_carries_user_and_json() {
        let user = test_user("u1", &[]);
        let req = request(Method::POST, "/x", Some(&user))
            .header("init", "1")
            .json(serde_json::json!({ "a": 1 }))
            .build();

        assert_eq!(req.extensions().get::<UserContext>(), Some(&user));
        assert_eq!(req.headers()["init"], "1");
        assert_eq!(req.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_assertions() {
        let json = serde_json::json!([{ "id": "a" }, { "id": "b" }]);
        assert_eq!(assert::ids(&json), vec!["a", "b"]);
        assert::has_key(&json[0], "id");
        assert::lacks_key(&json[0], "title");
    }
}
