//! In-memory document storage.
//!
//! One collection per registered entity, addressable by entity name or
//! store name. Finds are scoped: an entity with a `see_all` feature only
//! shows users without it their own documents and their coworkers'.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;
use webdesq_sdk::prelude::{
    Document, DocumentStorage, EntityDefinition, Filter, HostError, Selector, StorageQuery,
    UserContext,
};

use crate::entity::EntityRegistry;
use crate::query;

pub struct MemoryStorage {
    entities: Arc<EntityRegistry>,
    /// Keyed by entity name. Built once, so only the inner maps lock.
    collections: HashMap<String, DashMap<String, Document>>,
}

impl MemoryStorage {
    pub fn new(entities: Arc<EntityRegistry>) -> Self {
        let collections = entities
            .iter()
            .map(|entity| (entity.name.clone(), DashMap::new()))
            .collect();
        Self {
            entities,
            collections,
        }
    }

    fn collection(
        &self,
        store: &str,
    ) -> Result<(&EntityDefinition, &DashMap<String, Document>), HostError> {
        let entity = self
            .entities
            .resolve(store)
            .ok_or_else(|| HostError::UnknownStore(store.to_string()))?;
        let docs = self
            .collections
            .get(&entity.name)
            .ok_or_else(|| HostError::UnknownStore(store.to_string()))?;
        Ok((entity, docs))
    }

    /// Insert or replace a document.
    pub fn put(&self, store: &str, doc: Document) -> Result<(), HostError> {
        let (_, docs) = self.collection(store)?;
        docs.insert(doc.id.clone(), doc);
        Ok(())
    }

    /// Fetch a document without access checks.
    pub fn fetch(&self, store: &str, id: &str) -> Result<Option<Document>, HostError> {
        let (_, docs) = self.collection(store)?;
        Ok(docs.get(id).map(|entry| entry.value().clone()))
    }

    pub fn count(&self, store: &str) -> Result<usize, HostError> {
        Ok(self.collection(store)?.1.len())
    }
}

/// Whether `user` may see `doc` in a find on `entity`.
fn visible(entity: &EntityDefinition, user: &UserContext, doc: &Document) -> bool {
    match &entity.see_all {
        Some(feature) if user.cannot(feature) => user.is_self_or_coworker(doc.created_by()),
        _ => true,
    }
}

#[async_trait]
impl DocumentStorage for MemoryStorage {
    async fn find(
        &self,
        user: &UserContext,
        store: &str,
        query: &StorageQuery,
    ) -> Result<Vec<Document>, HostError> {
        let (entity, docs) = self.collection(store)?;

        let mut found: Vec<Document> = docs
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|doc| visible(entity, user, doc) && query::matches(doc, &query.selector))
            .collect();
        query::sort(&mut found, &query.sort);

        debug!(store, user = %user.id, count = found.len(), "find");
        Ok(found)
    }

    async fn get(
        &self,
        _user: &UserContext,
        store: &str,
        id: &str,
    ) -> Result<Option<Document>, HostError> {
        self.fetch(store, id)
    }

    async fn delete(
        &self,
        user: &UserContext,
        store: &str,
        selector: &Selector,
    ) -> Result<u64, HostError> {
        let (_, docs) = self.collection(store)?;

        let doomed: Vec<String> = match selector {
            Selector::Id(id) => vec![id.clone()],
            other => docs
                .iter()
                .filter(|entry| query::matches(entry.value(), other))
                .map(|entry| entry.key().clone())
                .collect(),
        };

        let removed = doomed
            .iter()
            .filter(|id| docs.remove(id.as_str()).is_some())
            .count() as u64;

        debug!(store, user = %user.id, removed, "delete");
        Ok(removed)
    }

    fn prepare_query(
        &self,
        _user: &UserContext,
        filters: &[Filter],
        query: &Value,
        languages: Option<&[String]>,
    ) -> Result<StorageQuery, HostError> {
        Ok(query::compile(filters, query, languages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use webdesq_sdk::prelude::{FieldDefinition, FieldKind, SortKey};
    use webdesq_test_utils::{test_document, test_user};

    const SEE_ALL: &str = "acme/pages/seeAll";

    fn storage() -> MemoryStorage {
        let mut registry = EntityRegistry::new();
        registry
            .register(EntityDefinition {
                name: "acme/page".into(),
                store: "pages".into(),
                see_all: Some(SEE_ALL.into()),
                fields: vec![FieldDefinition::new("title", FieldKind::String).filter()],
            })
            .unwrap();
        MemoryStorage::new(Arc::new(registry))
    }

    fn seed(storage: &MemoryStorage) {
        for (id, owner, minutes) in [("a", "alice", 1), ("b", "bob", 2), ("c", "carol", 3)] {
            let doc = test_document(owner)
                .with_id(id)
                .created_minutes_after_epoch(minutes)
                .with_field("title", json!(format!("page {id}")))
                .build();
            storage.put("pages", doc).unwrap();
        }
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.id.as_str()).collect()
    }

    #[tokio::test]
    async fn entity_and_store_names_share_a_collection() {
        let storage = storage();
        seed(&storage);
        assert!(storage.fetch("acme/page", "a").unwrap().is_some());
        assert_eq!(storage.count("pages").unwrap(), 3);
    }

    #[tokio::test]
    async fn find_is_scoped_without_see_all() {
        let storage = storage();
        seed(&storage);
        let mut query = StorageQuery::default();
        query.sort.push(SortKey::ascending("log.created.on"));

        let alice = UserContext::new("alice").with_coworkers(["carol"]);
        let found = storage.find(&alice, "pages", &query).await.unwrap();
        assert_eq!(ids(&found), vec!["a", "c"]);

        let admin = test_user("admin", &[SEE_ALL]);
        let found = storage.find(&admin, "pages", &query).await.unwrap();
        assert_eq!(ids(&found), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn get_and_delete_are_not_scoped() {
        let storage = storage();
        seed(&storage);
        let alice = UserContext::new("alice");

        assert!(storage.get(&alice, "pages", "b").await.unwrap().is_some());
        let removed = storage
            .delete(&alice, "pages", &Selector::Id("b".into()))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(storage.count("pages").unwrap(), 2);
    }

    #[tokio::test]
    async fn delete_by_selector_counts_removals() {
        let storage = storage();
        seed(&storage);
        let user = UserContext::new("alice");

        let selector = Selector::Contains {
            paths: vec!["title".into()],
            needle: "PAGE".into(),
        };
        assert_eq!(storage.delete(&user, "pages", &selector).await.unwrap(), 3);
        assert_eq!(
            storage
                .delete(&user, "pages", &Selector::Id("a".into()))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn unknown_store_is_an_error() {
        let storage = storage();
        let err = storage
            .find(&UserContext::new("u"), "posts", &StorageQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::UnknownStore(name) if name == "posts"));
    }
}
