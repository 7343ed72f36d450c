//! Webdesq Plugin SDK
//!
//! Types and traits shared between the Webdesq host and its plugins.
//! Plugins declare a [`manifest::PluginManifest`], build their routes from a
//! [`plugin::PluginContext`], and reach host services (storage, entity
//! validation, metadata, publishing) through [`server::Server`].

pub mod document;
pub mod error;
pub mod feature;
pub mod manifest;
pub mod metadata;
pub mod plugin;
pub mod publish;
pub mod server;
pub mod storage;
pub mod user;
pub mod validation;

pub mod prelude {
    pub use crate::document::{Document, ListFormat, Listing, Log, LogEntry};
    pub use crate::error::HostError;
    pub use crate::feature::{FeatureDefinition, FeatureGraph, Requirement};
    pub use crate::manifest::{
        EntityDefinition, FieldDefinition, FieldKind, GuiModule, MenuEntry, PluginManifest,
        SettingDefinition, SettingKind,
    };
    pub use crate::metadata::{EntityMetadata, Filter, Format};
    pub use crate::plugin::{
        MountedPlugin, Plugin, PluginContext, PluginError, RouteDescriptor, RouteSummary,
        into_router,
    };
    pub use crate::publish::Publisher;
    pub use crate::server::Server;
    pub use crate::storage::{DocumentStorage, Selector, SortKey, StorageQuery};
    pub use crate::user::UserContext;
    pub use crate::validation::{
        EntityValidator, PendingCommit, Validation, ValidationReport, ValidationRequest,
    };
}
