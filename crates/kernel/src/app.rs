//! Assembles the host: services, plugins, and the HTTP router.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::middleware;
use tracing::info;
use webdesq_sdk::prelude::{FeatureGraph, GuiModule, Plugin, PluginContext, Server};

use crate::auth::{UserDirectory, authenticate_bearer};
use crate::broadcast::Broadcaster;
use crate::config::SiteConfig;
use crate::entity::EntityRegistry;
use crate::registry::{self, PluginSummary};
use crate::routes;
use crate::state::AppState;
use crate::storage::MemoryStorage;
use crate::validator::SchemaValidator;

/// A fully assembled host.
pub struct Kernel {
    router: Router,
    storage: Arc<MemoryStorage>,
    broadcaster: Broadcaster,
    features: FeatureGraph,
    state: AppState,
    users: Arc<UserDirectory>,
}

impl Kernel {
    pub fn builder(site: SiteConfig) -> KernelBuilder {
        KernelBuilder {
            site,
            plugins: Vec::new(),
        }
    }

    /// The complete router, bearer authentication included.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn storage(&self) -> &Arc<MemoryStorage> {
        &self.storage
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub fn features(&self) -> &FeatureGraph {
        &self.features
    }

    pub fn plugins(&self) -> &[PluginSummary] {
        self.state.plugins()
    }

    pub fn users(&self) -> &UserDirectory {
        &self.users
    }
}

pub struct KernelBuilder {
    site: SiteConfig,
    plugins: Vec<Box<dyn Plugin>>,
}

impl KernelBuilder {
    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Validate every plugin against the others, then mount them.
    pub fn build(self) -> Result<Kernel> {
        let manifests: Vec<_> = self.plugins.iter().map(|p| p.manifest()).collect();

        registry::check_requirements(&manifests)?;
        let features = registry::feature_graph(&manifests)?;

        let users = Arc::new(UserDirectory::from_entries(&self.site.users)?);
        registry::check_grants(&features, users.users())?;

        let mut entities = EntityRegistry::new();
        for manifest in &manifests {
            for entity in &manifest.entities {
                entities
                    .register(entity.clone())
                    .with_context(|| format!("plugin '{}' declares a bad entity", manifest.id))?;
            }
        }
        let entities = Arc::new(entities);

        let storage = Arc::new(MemoryStorage::new(Arc::clone(&entities)));
        let validator = Arc::new(SchemaValidator::new(
            Arc::clone(&entities),
            Arc::clone(&storage),
        ));
        let broadcaster = Broadcaster::default();
        let server = Server::new(
            storage.clone(),
            validator,
            entities.clone(),
            Arc::new(broadcaster.clone()),
        );

        let mut claimed: HashSet<(String, String)> = registry::host_routes();
        let mut plugin_router = Router::new();
        let mut summaries = Vec::with_capacity(manifests.len());
        let mut gui_modules: Vec<GuiModule> = Vec::new();

        for (plugin, manifest) in self.plugins.iter().zip(&manifests) {
            let configured = self.site.plugin_settings(&manifest.id)?;
            let settings = manifest.resolve_settings(&configured);

            let mounted = plugin
                .mount(PluginContext::new(server.clone(), settings))
                .with_context(|| format!("failed to mount plugin '{}'", manifest.id))?;
            registry::claim_routes(&mut claimed, &manifest.id, &mounted.routes)?;

            info!(
                plugin = %manifest.id,
                version = %manifest.version,
                routes = mounted.routes.len(),
                "plugin mounted"
            );

            plugin_router = plugin_router.merge(mounted.router);
            gui_modules.extend(mounted.gui_modules);
            summaries.push(PluginSummary::new(manifest, mounted.routes));
        }

        let state = AppState::new(broadcaster.clone(), summaries, gui_modules);
        let router = routes::router()
            .with_state(state.clone())
            .merge(plugin_router)
            .layer(middleware::from_fn_with_state(
                Arc::clone(&users),
                authenticate_bearer,
            ));

        Ok(Kernel {
            router,
            storage,
            broadcaster,
            features,
            state,
            users,
        })
    }
}
