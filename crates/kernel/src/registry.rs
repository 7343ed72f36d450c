//! Plugin registration.
//!
//! Validates plugin manifests against each other before anything is
//! mounted: unique IDs, satisfiable `requires`, and an acyclic feature
//! graph that every configured user's grant fits into.

use std::collections::HashSet;

use anyhow::{Context, Result, bail};
use axum::http::Method;
use serde::Serialize;
use tracing::info;
use webdesq_sdk::prelude::{
    FeatureDefinition, FeatureGraph, PluginManifest, RouteSummary, SettingDefinition, UserContext,
};

/// Services the host itself provides to `requires`.
pub const HOST_SERVICES: &[&str] = &["webdesq/sessions", "webdesq/storage"];

/// What `GET /plugins` lists about a mounted plugin.
#[derive(Debug, Clone, Serialize)]
pub struct PluginSummary {
    pub id: String,
    pub name: String,
    pub purpose: String,
    pub version: String,
    pub author: String,
    pub vendor: String,
    pub icon: String,
    pub features: Vec<FeatureDefinition>,
    pub settings: Vec<SettingDefinition>,
    pub routes: Vec<RouteSummary>,
}

impl PluginSummary {
    pub fn new(manifest: &PluginManifest, routes: Vec<RouteSummary>) -> Self {
        Self {
            id: manifest.id.clone(),
            name: manifest.name.clone(),
            purpose: manifest.purpose.clone(),
            version: manifest.version.clone(),
            author: manifest.author.clone(),
            vendor: manifest.vendor.clone(),
            icon: manifest.icon.clone(),
            features: manifest.qualified_features(),
            settings: manifest.settings.clone(),
            routes,
        }
    }
}

/// Check IDs are unique and every `requires` entry names a host service
/// or another registered plugin.
pub fn check_requirements(manifests: &[PluginManifest]) -> Result<()> {
    let mut ids: HashSet<&str> = HashSet::new();
    for manifest in manifests {
        if HOST_SERVICES.contains(&manifest.id.as_str()) || !ids.insert(&manifest.id) {
            bail!("plugin id '{}' is already registered", manifest.id);
        }
    }

    for manifest in manifests {
        let missing: Vec<&str> = manifest
            .requires
            .iter()
            .map(String::as_str)
            .filter(|required| !HOST_SERVICES.contains(required) && !ids.contains(required))
            .collect();
        if !missing.is_empty() {
            bail!(
                "plugin '{}' requires unavailable plugins: {}",
                manifest.id,
                missing.join(", ")
            );
        }
    }
    Ok(())
}

/// Build the combined feature graph of all plugins.
pub fn feature_graph(manifests: &[PluginManifest]) -> Result<FeatureGraph> {
    let graph = FeatureGraph::new(manifests.iter().flat_map(PluginManifest::qualified_features))
        .context("invalid feature declarations")?;
    info!(features = graph.len(), "feature graph built");
    Ok(graph)
}

/// Check every user's grant against the feature graph.
pub fn check_grants<'a>(
    graph: &FeatureGraph,
    users: impl IntoIterator<Item = &'a UserContext>,
) -> Result<()> {
    for user in users {
        graph
            .check_grant(&user.features)
            .with_context(|| format!("user '{}' has an invalid feature grant", user.id))?;
    }
    Ok(())
}

/// Reject a route another plugin (or the host) already serves.
pub fn claim_routes(
    claimed: &mut HashSet<(String, String)>,
    plugin: &str,
    routes: &[RouteSummary],
) -> Result<()> {
    for route in routes {
        if !claimed.insert((route.method.clone(), route.path.clone())) {
            bail!(
                "plugin '{plugin}' registers {} {} which is already taken",
                route.method,
                route.path
            );
        }
    }
    Ok(())
}

/// Routes served by the host itself.
pub fn host_routes() -> HashSet<(String, String)> {
    ["/health", "/events", "/plugins", "/gui/modules"]
        .into_iter()
        .map(|path| (Method::GET.to_string(), path.to_string()))
        .collect()
}
