//! Flatpages plugin for Webdesq.
//!
//! Provides the `smartyellow/flatpage` entity: rich text pages with no
//! behaviour of their own. The plugin declares its permission features,
//! settings and GUI module, and serves CRUD and search routes that pass
//! through to host storage and validation.

mod entity;
mod error;
mod gui;
mod manifest;
mod routes;
mod settings;

use serde_json::{Map, Value};
use webdesq_sdk::plugin::{MountedPlugin, Plugin, PluginContext, PluginError, RouteDescriptor};
use webdesq_sdk::prelude::PluginManifest;

pub use entity::flatpage_entity;
pub use error::{RouteError, RouteResult};
pub use gui::gui_modules;
pub use manifest::manifest;
pub use routes::{Context, router, routes};
pub use settings::FlatpagesSettings;

/// Qualified plugin ID.
pub const PLUGIN_ID: &str = "smartyellow/flatpages";

/// Entity name, also addressable as a store.
pub const ENTITY: &str = "smartyellow/flatpage";

/// Store holding flatpages.
pub const STORE: &str = "flatpages";

/// Channel reload notifications are published on.
pub const CHANNEL: &str = "cms";

/// Published after every successful create, update or delete.
pub const RELOAD_EVENT: &str = "smartyellow/flatpages/reload";

/// Qualified permission features.
pub mod features {
    pub const SEE_MY: &str = "smartyellow/flatpages/seeMyFlatpages";
    pub const SEE_ALL: &str = "smartyellow/flatpages/seeAllFlatpages";
    pub const EDIT: &str = "smartyellow/flatpages/editFlatpages";
    pub const CREATE: &str = "smartyellow/flatpages/createFlatpages";
    pub const DELETE: &str = "smartyellow/flatpages/deleteFlatpages";
}

/// The plugin as mounted by the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatpagesPlugin;

impl Plugin for FlatpagesPlugin {
    fn manifest(&self) -> PluginManifest {
        manifest()
    }

    fn mount(
        &self,
        context: PluginContext<Map<String, Value>>,
    ) -> Result<MountedPlugin, PluginError> {
        let settings = FlatpagesSettings::from_map(&context.settings).map_err(|source| {
            PluginError::InvalidSettings {
                plugin: PLUGIN_ID.to_string(),
                source,
            }
        })?;

        Ok(MountedPlugin {
            router: router(context.with_settings(settings)),
            routes: routes().iter().map(RouteDescriptor::summary).collect(),
            gui_modules: gui_modules(),
        })
    }
}
