//! State shared by the host's own routes.

use std::sync::Arc;

use webdesq_sdk::prelude::GuiModule;

use crate::broadcast::Broadcaster;
use crate::registry::PluginSummary;

/// Shared host state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    broadcaster: Broadcaster,
    plugins: Vec<PluginSummary>,
    gui_modules: Vec<GuiModule>,
}

impl AppState {
    pub fn new(
        broadcaster: Broadcaster,
        plugins: Vec<PluginSummary>,
        gui_modules: Vec<GuiModule>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                broadcaster,
                plugins,
                gui_modules,
            }),
        }
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.inner.broadcaster
    }

    pub fn plugins(&self) -> &[PluginSummary] {
        &self.inner.plugins
    }

    pub fn gui_modules(&self) -> &[GuiModule] {
        &self.inner.gui_modules
    }
}
