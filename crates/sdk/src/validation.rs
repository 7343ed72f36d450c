//! Entity validation with deferred persistence.
//!
//! Validation is two-phase. The validator always produces a
//! [`ValidationReport`]; when the data is valid and the caller asked for
//! neither a dry run nor immediate storage, it also hands back a
//! [`PendingCommit`] that persists the validated data when executed.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::HostError;
use crate::user::UserContext;

/// Arguments for [`EntityValidator::validate`].
#[derive(Debug, Clone)]
pub struct ValidationRequest<'a> {
    pub entity: &'a str,
    pub id: Option<&'a str>,
    pub data: Value,
    /// Dry run: never persist.
    pub validate_only: bool,
    pub is_new: bool,
    /// Persist immediately when valid instead of returning a commit.
    pub store_if_valid: bool,
    pub user: &'a UserContext,
}

impl<'a> ValidationRequest<'a> {
    pub fn new(entity: &'a str, user: &'a UserContext, data: Value) -> Self {
        Self {
            entity,
            id: None,
            data,
            validate_only: false,
            is_new: false,
            store_if_valid: false,
            user,
        }
    }

    pub fn id(mut self, id: &'a str) -> Self {
        self.id = Some(id);
        self
    }

    pub fn validate_only(mut self, validate_only: bool) -> Self {
        self.validate_only = validate_only;
        self
    }

    pub fn is_new(mut self, is_new: bool) -> Self {
        self.is_new = is_new;
        self
    }

    pub fn store_if_valid(mut self, store_if_valid: bool) -> Self {
        self.store_if_valid = store_if_valid;
        self
    }
}

/// Validated projection of the submitted data, plus any errors.
///
/// Serializes flat: entity fields at the top level, `errors` only when set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(flatten)]
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Map<String, Value>>,
}

impl ValidationReport {
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data, errors: None }
    }

    /// Record an error against a field.
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .get_or_insert_with(Map::new)
            .insert(field.into(), Value::String(message.into()));
    }

    /// True when an `errors` field is present, even if it is empty.
    pub fn has_errors(&self) -> bool {
        self.errors.is_some()
    }
}

/// Deferred persistence step handed out by a validator.
#[async_trait]
pub trait PendingCommit: Send {
    /// Persist the validated data and return the stored projection.
    async fn commit(self: Box<Self>) -> Result<ValidationReport, HostError>;
}

/// Outcome of a validation call.
pub enum Validation {
    /// Nothing left to do: a dry run, invalid data, or already stored.
    Checked(ValidationReport),
    /// Valid data awaiting an explicit commit.
    Pending {
        report: ValidationReport,
        commit: Box<dyn PendingCommit>,
    },
}

impl Validation {
    pub fn report(&self) -> &ValidationReport {
        match self {
            Self::Checked(report) | Self::Pending { report, .. } => report,
        }
    }

    /// Drop any pending commit and keep the report.
    pub fn into_report(self) -> ValidationReport {
        match self {
            Self::Checked(report) | Self::Pending { report, .. } => report,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.report().has_errors()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

impl fmt::Debug for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checked(report) => f.debug_tuple("Checked").field(report).finish(),
            Self::Pending { report, .. } => f
                .debug_struct("Pending")
                .field("report", report)
                .field("commit", &"PendingCommit")
                .finish(),
        }
    }
}

/// Host service validating entity data against its schema.
#[async_trait]
pub trait EntityValidator: Send + Sync {
    async fn validate(&self, request: ValidationRequest<'_>) -> Result<Validation, HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo(ValidationReport);

    #[async_trait]
    impl PendingCommit for Echo {
        async fn commit(self: Box<Self>) -> Result<ValidationReport, HostError> {
            Ok(self.0)
        }
    }

    #[test]
    fn report_serializes_flat_without_empty_errors() {
        let mut data = Map::new();
        data.insert("title".into(), json!("Home"));
        let report = ValidationReport::new(data);

        assert_eq!(serde_json::to_value(&report).unwrap(), json!({ "title": "Home" }));
    }

    #[test]
    fn report_with_errors() {
        let mut report = ValidationReport::default();
        report.add_error("title", "required");

        assert!(report.has_errors());
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({ "errors": { "title": "required" } })
        );
    }

    #[tokio::test]
    async fn pending_report_excludes_commit() {
        let report = ValidationReport::default();
        let validation = Validation::Pending {
            report: report.clone(),
            commit: Box::new(Echo(report)),
        };
        assert!(validation.is_pending());
        assert!(!validation.has_errors());

        let Validation::Pending { commit, .. } = validation else {
            panic!("expected pending");
        };
        let stored = commit.commit().await.unwrap();
        assert_eq!(stored, ValidationReport::default());
    }
}
