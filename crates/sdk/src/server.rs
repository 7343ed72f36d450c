//! Handle on the host services a plugin may call.

use std::sync::Arc;

use crate::error::HostError;
use crate::metadata::{EntityMetadata, Filter, Format};
use crate::publish::Publisher;
use crate::storage::{DocumentStorage, Storage};
use crate::user::UserContext;
use crate::validation::{EntityValidator, Validation, ValidationRequest};

/// Host services injected into plugins.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct Server {
    storage: Arc<dyn DocumentStorage>,
    validator: Arc<dyn EntityValidator>,
    metadata: Arc<dyn EntityMetadata>,
    publisher: Arc<dyn Publisher>,
}

impl Server {
    pub fn new(
        storage: Arc<dyn DocumentStorage>,
        validator: Arc<dyn EntityValidator>,
        metadata: Arc<dyn EntityMetadata>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            storage,
            validator,
            metadata,
            publisher,
        }
    }

    /// Storage scoped to `user`.
    pub fn storage<'a>(&'a self, user: &'a UserContext) -> Storage<'a> {
        Storage::new(self.storage.as_ref(), user)
    }

    pub async fn validate_entity(
        &self,
        request: ValidationRequest<'_>,
    ) -> Result<Validation, HostError> {
        self.validator.validate(request).await
    }

    pub async fn get_filters(
        &self,
        entity: &str,
        user: &UserContext,
    ) -> Result<Vec<Filter>, HostError> {
        self.metadata.filters(entity, user).await
    }

    pub async fn get_formats(
        &self,
        entity: &str,
        user: &UserContext,
    ) -> Result<Vec<Format>, HostError> {
        self.metadata.formats(entity, user).await
    }

    pub fn publish(&self, channel: &str, event: &str) {
        self.publisher.publish(channel, event);
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("storage", &"DocumentStorage")
            .field("validator", &"EntityValidator")
            .field("metadata", &"EntityMetadata")
            .field("publisher", &"Publisher")
            .finish()
    }
}
