//! Registry of entity definitions declared by plugins.
//!
//! Also serves entity metadata: filters come from fields flagged `filter`,
//! formats (list columns) from fields flagged `column`.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use webdesq_sdk::prelude::{
    EntityDefinition, EntityMetadata, Filter, Format, HostError, UserContext,
};

/// Column appended to every entity's formats.
const CREATED_FORMAT: &str = "created";

#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: HashMap<String, Arc<EntityDefinition>>,
    /// Store name to entity name.
    stores: HashMap<String, String>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entity: EntityDefinition) -> Result<()> {
        if self.entities.contains_key(&entity.name) {
            bail!("entity '{}' is declared twice", entity.name);
        }
        if let Some(owner) = self.stores.get(&entity.store) {
            bail!(
                "store '{}' of entity '{}' already belongs to '{owner}'",
                entity.store,
                entity.name
            );
        }

        self.stores.insert(entity.store.clone(), entity.name.clone());
        self.entities.insert(entity.name.clone(), Arc::new(entity));
        Ok(())
    }

    /// Look up an entity by its name.
    pub fn get(&self, entity: &str) -> Option<&Arc<EntityDefinition>> {
        self.entities.get(entity)
    }

    /// Look up an entity by entity name or by store name.
    pub fn resolve(&self, name: &str) -> Option<&Arc<EntityDefinition>> {
        self.entities.get(name).or_else(|| {
            self.stores
                .get(name)
                .and_then(|entity| self.entities.get(entity))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<EntityDefinition>> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn require(&self, entity: &str) -> Result<&Arc<EntityDefinition>, HostError> {
        self.get(entity)
            .ok_or_else(|| HostError::UnknownEntity(entity.to_string()))
    }
}

#[async_trait]
impl EntityMetadata for EntityRegistry {
    async fn filters(&self, entity: &str, _user: &UserContext) -> Result<Vec<Filter>, HostError> {
        let def = self.require(entity)?;
        Ok(def
            .fields
            .iter()
            .filter(|field| field.filter)
            .map(|field| Filter {
                name: field.name.clone(),
                label: field.label.clone(),
                paths: vec![field.name.clone()],
                translatable: field.translatable,
            })
            .collect())
    }

    async fn formats(&self, entity: &str, _user: &UserContext) -> Result<Vec<Format>, HostError> {
        let def = self.require(entity)?;
        let mut formats: Vec<Format> = def
            .fields
            .iter()
            .filter(|field| field.column)
            .map(|field| Format {
                name: field.name.clone(),
                label: field.label.clone(),
                path: field.name.clone(),
                translatable: field.translatable,
            })
            .collect();

        formats.push(Format {
            name: CREATED_FORMAT.into(),
            label: CREATED_FORMAT.into(),
            path: "log.created.on".into(),
            translatable: false,
        });
        Ok(formats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webdesq_sdk::prelude::{FieldDefinition, FieldKind};

    fn page() -> EntityDefinition {
        EntityDefinition {
            name: "acme/page".into(),
            store: "pages".into(),
            see_all: None,
            fields: vec![
                FieldDefinition::new("title", FieldKind::String)
                    .label("title")
                    .translatable()
                    .filter()
                    .column(),
                FieldDefinition::new("body", FieldKind::Html).label("body"),
            ],
        }
    }

    #[test]
    fn resolves_by_entity_or_store_name() {
        let mut registry = EntityRegistry::new();
        registry.register(page()).unwrap();

        assert_eq!(registry.resolve("acme/page").unwrap().store, "pages");
        assert_eq!(registry.resolve("pages").unwrap().name, "acme/page");
        assert!(registry.resolve("posts").is_none());
        assert!(registry.get("pages").is_none());
    }

    #[test]
    fn duplicate_entity_or_store_is_rejected() {
        let mut registry = EntityRegistry::new();
        registry.register(page()).unwrap();
        assert!(registry.register(page()).is_err());

        let mut other = page();
        other.name = "acme/other".into();
        assert!(registry.register(other).is_err());
    }

    #[tokio::test]
    async fn filters_and_formats_follow_field_flags() {
        let mut registry = EntityRegistry::new();
        registry.register(page()).unwrap();
        let user = UserContext::new("u1");

        let filters = registry.filters("acme/page", &user).await.unwrap();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].paths, vec!["title"]);
        assert!(filters[0].translatable);

        let formats = registry.formats("acme/page", &user).await.unwrap();
        let names: Vec<_> = formats.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["title", "created"]);
    }

    #[tokio::test]
    async fn unknown_entity_is_an_error() {
        let registry = EntityRegistry::new();
        let err = registry
            .filters("acme/none", &UserContext::new("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::UnknownEntity(name) if name == "acme/none"));
    }
}
