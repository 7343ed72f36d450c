//! Host document storage.
//!
//! Backends implement [`DocumentStorage`]. Plugins use the user-scoped
//! facade returned by [`crate::server::Server::storage`]:
//!
//! ```ignore
//! let docs = server
//!     .storage(&user)
//!     .store("flatpages")
//!     .find()
//!     .sort(SortKey::descending("log.created.on"))
//!     .to_array()
//!     .await?;
//! ```

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{Document, ListFormat, Listing};
use crate::error::HostError;
use crate::metadata::Filter;
use crate::user::UserContext;

/// Which documents a query selects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// Every document visible to the user.
    #[default]
    All,
    /// A single document by ID.
    Id(String),
    /// Documents where any of `paths` contains `needle` (case-insensitive).
    Contains { paths: Vec<String>, needle: String },
    /// All nested selectors match.
    And(Vec<Selector>),
    /// At least one nested selector matches.
    Or(Vec<Selector>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort on a dotted document path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub path: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn ascending(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn descending(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// A compiled storage query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageQuery {
    #[serde(default)]
    pub selector: Selector,
    #[serde(default)]
    pub sort: Vec<SortKey>,
}

impl StorageQuery {
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            sort: Vec::new(),
        }
    }
}

/// Storage backend provided by the host.
///
/// `find` is scoped to what `user` may see; `get` and `delete` address a
/// document directly and leave access checks to the caller.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    async fn find(
        &self,
        user: &UserContext,
        store: &str,
        query: &StorageQuery,
    ) -> Result<Vec<Document>, HostError>;

    async fn get(
        &self,
        user: &UserContext,
        store: &str,
        id: &str,
    ) -> Result<Option<Document>, HostError>;

    /// Delete matching documents, returning how many were removed.
    async fn delete(
        &self,
        user: &UserContext,
        store: &str,
        selector: &Selector,
    ) -> Result<u64, HostError>;

    /// Compile entity filters and a posted search query into a storage query.
    ///
    /// `languages` restricts translatable fields; `None` searches them all.
    fn prepare_query(
        &self,
        user: &UserContext,
        filters: &[Filter],
        query: &Value,
        languages: Option<&[String]>,
    ) -> Result<StorageQuery, HostError>;
}

/// Storage bound to a user.
#[derive(Clone, Copy)]
pub struct Storage<'a> {
    backend: &'a dyn DocumentStorage,
    user: &'a UserContext,
}

impl<'a> Storage<'a> {
    pub fn new(backend: &'a dyn DocumentStorage, user: &'a UserContext) -> Self {
        Self { backend, user }
    }

    /// Open a named store.
    pub fn store(&self, name: &'a str) -> Store<'a> {
        Store {
            backend: self.backend,
            user: self.user,
            name,
        }
    }

    pub fn prepare_query(
        &self,
        filters: &[Filter],
        query: &Value,
        languages: Option<&[String]>,
    ) -> Result<StorageQuery, HostError> {
        self.backend
            .prepare_query(self.user, filters, query, languages)
    }
}

/// A named store bound to a user.
#[derive(Clone, Copy)]
pub struct Store<'a> {
    backend: &'a dyn DocumentStorage,
    user: &'a UserContext,
    name: &'a str,
}

impl<'a> Store<'a> {
    /// Find every visible document.
    pub fn find(&self) -> Find<'a> {
        self.find_with(StorageQuery::default())
    }

    /// Find documents matching a prepared query.
    pub fn find_with(&self, query: StorageQuery) -> Find<'a> {
        Find {
            store: *self,
            query,
        }
    }

    pub async fn get(&self, id: &str) -> Result<Option<Document>, HostError> {
        self.backend.get(self.user, self.name, id).await
    }

    pub async fn delete(&self, selector: &Selector) -> Result<u64, HostError> {
        self.backend.delete(self.user, self.name, selector).await
    }
}

/// A pending find, executed by one of the `to_*` methods.
pub struct Find<'a> {
    store: Store<'a>,
    query: StorageQuery,
}

impl Find<'_> {
    /// Add a sort key; earlier keys take precedence.
    pub fn sort(mut self, key: SortKey) -> Self {
        self.query.sort.push(key);
        self
    }

    pub async fn to_array(self) -> Result<Vec<Document>, HostError> {
        let Store {
            backend,
            user,
            name,
        } = self.store;
        backend.find(user, name, &self.query).await
    }

    /// Execute and key the result by ID, in find order.
    pub async fn to_object(self) -> Result<IndexMap<String, Document>, HostError> {
        let docs = self.to_array().await?;
        Ok(docs.into_iter().map(|d| (d.id.clone(), d)).collect())
    }

    /// Execute and arrange the result in `format`.
    pub async fn to_listing(self, format: ListFormat) -> Result<Listing, HostError> {
        let docs = self.to_array().await?;
        Ok(Listing::new(docs, format))
    }
}
