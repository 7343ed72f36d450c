//! Schema validation of entity documents.
//!
//! Submitted data is projected onto the entity's fields: unknown fields are
//! dropped, required fields must be non-empty, and text fields must be
//! strings (or language maps for translatable fields). The host owns `id`
//! and `log`; submitted values for them are ignored.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;
use webdesq_sdk::prelude::{
    Document, EntityDefinition, EntityValidator, FieldDefinition, HostError, Log, LogEntry,
    PendingCommit, Validation, ValidationReport, ValidationRequest,
};

use crate::entity::EntityRegistry;
use crate::storage::MemoryStorage;

pub struct SchemaValidator {
    entities: Arc<EntityRegistry>,
    storage: Arc<MemoryStorage>,
}

impl SchemaValidator {
    pub fn new(entities: Arc<EntityRegistry>, storage: Arc<MemoryStorage>) -> Self {
        Self { entities, storage }
    }
}

/// Check one field value, returning an error message if it does not fit.
fn check_field(field: &FieldDefinition, value: &Value) -> Option<&'static str> {
    match value {
        // A plain string is accepted as the only translation
        Value::String(text) => (field.required && text.trim().is_empty()).then_some("required"),
        Value::Object(translations) if field.translatable => {
            if !translations.values().all(Value::is_string) {
                return Some("expected text for every language");
            }
            let filled = translations
                .values()
                .filter_map(Value::as_str)
                .any(|t| !t.trim().is_empty());
            (field.required && !filled).then_some("required")
        }
        _ if field.translatable => Some("expected a map of language to text"),
        _ => Some("expected text"),
    }
}

/// Project `data` onto the entity's fields, recording errors in `report`.
fn project(entity: &EntityDefinition, data: &Value, report: &mut ValidationReport) {
    let Some(data) = data.as_object() else {
        report.add_error("_", "expected an object");
        return;
    };

    for field in &entity.fields {
        match data.get(&field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    report.add_error(field.name.clone(), "required");
                }
            }
            Some(value) => {
                if let Some(message) = check_field(field, value) {
                    report.add_error(field.name.clone(), message);
                }
                report.data.insert(field.name.clone(), value.clone());
            }
        }
    }
}

fn document_report(doc: &Document) -> Result<ValidationReport, HostError> {
    match serde_json::to_value(doc).map_err(anyhow::Error::from)? {
        Value::Object(map) => Ok(ValidationReport::new(map)),
        _ => Err(HostError::Internal(anyhow::anyhow!(
            "document did not serialize to an object"
        ))),
    }
}

#[async_trait]
impl EntityValidator for SchemaValidator {
    async fn validate(&self, request: ValidationRequest<'_>) -> Result<Validation, HostError> {
        let entity = self
            .entities
            .get(request.entity)
            .ok_or_else(|| HostError::UnknownEntity(request.entity.to_string()))?;

        let mut report = ValidationReport::new(Map::new());
        project(entity, &request.data, &mut report);

        let existing = if request.is_new {
            None
        } else {
            let id = request
                .id
                .map(String::from)
                .or_else(|| request.data.get("id").and_then(Value::as_str).map(String::from));
            match id {
                Some(id) => {
                    let found = self.storage.fetch(&entity.store, &id)?;
                    if found.is_none() {
                        report.add_error("id", "not found");
                    }
                    found
                }
                None => {
                    report.add_error("id", "required");
                    None
                }
            }
        };

        if let Some(existing) = &existing {
            report.data.insert("id".into(), Value::String(existing.id.clone()));
            let log = serde_json::to_value(&existing.log).map_err(anyhow::Error::from)?;
            report.data.insert("log".into(), log);
        }

        if report.has_errors() {
            debug!(entity = %entity.name, errors = ?report.errors, "validation failed");
            return Ok(Validation::Checked(report));
        }
        if request.validate_only {
            return Ok(Validation::Checked(report));
        }

        let fields = report
            .data
            .iter()
            .filter(|(key, _)| entity.field(key).is_some())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let document = match existing {
            Some(existing) => Document {
                id: existing.id,
                log: Log {
                    created: existing.log.created,
                    changed: Some(LogEntry::now(request.user.id.clone())),
                },
                fields,
            },
            None => Document {
                id: Uuid::now_v7().to_string(),
                log: Log {
                    created: LogEntry::now(request.user.id.clone()),
                    changed: None,
                },
                fields,
            },
        };

        let commit = StoreCommit {
            storage: Arc::clone(&self.storage),
            store: entity.store.clone(),
            document,
        };

        if request.store_if_valid {
            return Ok(Validation::Checked(Box::new(commit).commit().await?));
        }

        Ok(Validation::Pending {
            report: document_report(&commit.document)?,
            commit: Box::new(commit),
        })
    }
}

/// Deferred write of a validated document.
struct StoreCommit {
    storage: Arc<MemoryStorage>,
    store: String,
    document: Document,
}

#[async_trait]
impl PendingCommit for StoreCommit {
    async fn commit(self: Box<Self>) -> Result<ValidationReport, HostError> {
        let report = document_report(&self.document)?;
        info!(store = %self.store, id = %self.document.id, "document stored");
        self.storage.put(&self.store, self.document)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use webdesq_sdk::prelude::{FieldKind, UserContext};
    use webdesq_test_utils::test_document;

    fn setup() -> (SchemaValidator, Arc<MemoryStorage>) {
        let mut registry = EntityRegistry::new();
        registry
            .register(EntityDefinition {
                name: "acme/page".into(),
                store: "pages".into(),
                see_all: None,
                fields: vec![
                    FieldDefinition::new("title", FieldKind::String)
                        .required()
                        .translatable(),
                    FieldDefinition::new("slug", FieldKind::String),
                ],
            })
            .unwrap();
        let registry = Arc::new(registry);
        let storage = Arc::new(MemoryStorage::new(Arc::clone(&registry)));
        (SchemaValidator::new(registry, Arc::clone(&storage)), storage)
    }

    fn errors(validation: &Validation) -> Map<String, Value> {
        validation.report().errors.clone().unwrap_or_default()
    }

    #[tokio::test]
    async fn missing_required_field_is_reported() {
        let (validator, _) = setup();
        let user = UserContext::new("u1");

        let validation = validator
            .validate(ValidationRequest::new("acme/page", &user, json!({ "slug": "x" })).is_new(true))
            .await
            .unwrap();

        assert!(!validation.is_pending());
        assert_eq!(errors(&validation)["title"], json!("required"));
    }

    #[tokio::test]
    async fn wrong_kinds_are_reported_and_unknown_fields_dropped() {
        let (validator, _) = setup();
        let user = UserContext::new("u1");
        let data = json!({ "title": { "en": 3 }, "slug": 7, "extra": true });

        let validation = validator
            .validate(ValidationRequest::new("acme/page", &user, data).is_new(true))
            .await
            .unwrap();

        let errs = errors(&validation);
        assert!(errs.contains_key("title"));
        assert_eq!(errs["slug"], json!("expected text"));
        assert!(!validation.report().data.contains_key("extra"));
    }

    #[tokio::test]
    async fn valid_new_document_is_pending_until_committed() {
        let (validator, storage) = setup();
        let user = UserContext::new("u1");
        let data = json!({ "title": { "en": "About" }, "id": "forged" });

        let validation = validator
            .validate(ValidationRequest::new("acme/page", &user, data).is_new(true))
            .await
            .unwrap();
        let Validation::Pending { report, commit } = validation else {
            panic!("expected a pending validation");
        };
        assert_eq!(storage.count("pages").unwrap(), 0);
        assert_ne!(report.data["id"], json!("forged"));

        let stored = commit.commit().await.unwrap();
        let id = stored.data["id"].as_str().unwrap();
        let doc = storage.fetch("pages", id).unwrap().unwrap();
        assert_eq!(doc.created_by(), "u1");
        assert!(doc.log.changed.is_none());
    }

    #[tokio::test]
    async fn validate_only_never_stores() {
        let (validator, storage) = setup();
        let user = UserContext::new("u1");

        let validation = validator
            .validate(
                ValidationRequest::new("acme/page", &user, json!({ "title": { "en": "A" } }))
                    .is_new(true)
                    .validate_only(true),
            )
            .await
            .unwrap();

        assert!(!validation.is_pending());
        assert!(!validation.has_errors());
        assert_eq!(storage.count("pages").unwrap(), 0);
    }

    #[tokio::test]
    async fn update_with_store_if_valid_keeps_created_log() {
        let (validator, storage) = setup();
        let original = test_document("author").with_id("p1").build();
        storage.put("pages", original.clone()).unwrap();
        let editor = UserContext::new("editor");

        let validation = validator
            .validate(
                ValidationRequest::new("acme/page", &editor, json!({ "title": "Changed" }))
                    .id("p1")
                    .store_if_valid(true),
            )
            .await
            .unwrap();
        assert!(!validation.is_pending());
        assert!(!validation.has_errors());

        let doc = storage.fetch("pages", "p1").unwrap().unwrap();
        assert_eq!(doc.log.created, original.log.created);
        assert_eq!(doc.log.changed.as_ref().unwrap().by, "editor");
        assert_eq!(doc.fields["title"], json!("Changed"));
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_an_id_error() {
        let (validator, storage) = setup();
        let user = UserContext::new("u1");

        let validation = validator
            .validate(
                ValidationRequest::new("acme/page", &user, json!({ "title": "x" }))
                    .id("missing")
                    .store_if_valid(true),
            )
            .await
            .unwrap();

        assert_eq!(errors(&validation)["id"], json!("not found"));
        assert_eq!(storage.count("pages").unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_entity_is_an_error() {
        let (validator, _) = setup();
        let user = UserContext::new("u1");
        let err = validator
            .validate(ValidationRequest::new("acme/none", &user, json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::UnknownEntity(_)));
    }
}
