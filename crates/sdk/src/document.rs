//! Stored documents and list response shapes.

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Who did something, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub on: DateTime<Utc>,
    pub by: String,
}

impl LogEntry {
    /// Entry stamped with the current time.
    pub fn now(by: impl Into<String>) -> Self {
        Self {
            on: Utc::now(),
            by: by.into(),
        }
    }
}

/// Change log kept by the host for every document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub created: LogEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed: Option<LogEntry>,
}

/// A document held in a host store.
///
/// `id` and `log` are owned by the host; everything else is entity data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub log: Log,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// ID of the user who created the document.
    pub fn created_by(&self) -> &str {
        &self.log.created.by
    }

    /// Resolve a dotted path such as `log.created.on` or `title.en`.
    pub fn lookup(&self, path: &str) -> Option<Value> {
        let mut segments = path.split('.');
        let head = segments.next()?;

        let mut current = match head {
            "id" => Value::String(self.id.clone()),
            "log" => serde_json::to_value(&self.log).ok()?,
            other => self.fields.get(other)?.clone(),
        };

        for segment in segments {
            current = current.get(segment)?.clone();
        }
        Some(current)
    }
}

/// Shape requested for list responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListFormat {
    /// Ordered JSON array.
    #[default]
    Array,
    /// JSON object keyed by document ID.
    Object,
}

impl ListFormat {
    /// Name of the request header selecting the format.
    pub const HEADER: &'static str = "format";

    /// `format: object` selects [`ListFormat::Object`]; anything else is an array.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match headers.get(Self::HEADER).and_then(|v| v.to_str().ok()) {
            Some("object") => Self::Object,
            _ => Self::Array,
        }
    }
}

/// A list of documents in the requested [`ListFormat`].
///
/// The object form keeps the order documents were found in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Listing {
    Array(Vec<Document>),
    Object(IndexMap<String, Document>),
}

impl Listing {
    /// Arrange documents in the given format.
    pub fn new(documents: Vec<Document>, format: ListFormat) -> Self {
        match format {
            ListFormat::Array => Self::Array(documents),
            ListFormat::Object => Self::Object(
                documents
                    .into_iter()
                    .map(|doc| (doc.id.clone(), doc))
                    .collect(),
            ),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        match self {
            Self::Array(docs) => docs.iter().any(|d| d.id == id),
            Self::Object(docs) => docs.contains_key(id),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Array(docs) => docs.len(),
            Self::Object(docs) => docs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
