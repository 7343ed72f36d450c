//! Entity metadata: search filters and list formats.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::user::UserContext;

/// A search filter offered for an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Key used in posted search queries.
    pub name: String,
    pub label: String,
    /// Document paths the filter matches against.
    pub paths: Vec<String>,
    /// Whether the paths hold per-language values.
    #[serde(default)]
    pub translatable: bool,
}

/// A column a GUI can show when listing an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Format {
    pub name: String,
    pub label: String,
    pub path: String,
    #[serde(default)]
    pub translatable: bool,
}

/// Host service computing filter and format metadata.
#[async_trait]
pub trait EntityMetadata: Send + Sync {
    async fn filters(&self, entity: &str, user: &UserContext) -> Result<Vec<Filter>, HostError>;

    async fn formats(&self, entity: &str, user: &UserContext) -> Result<Vec<Format>, HostError>;
}
