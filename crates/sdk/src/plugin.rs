//! Plugin entry points: context, route descriptors, and the plugin trait.

use axum::Json;
use axum::Router;
use axum::extract::Request;
use axum::handler::Handler;
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{self, MethodRouter};
use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use crate::feature::Requirement;
use crate::manifest::{GuiModule, PluginManifest};
use crate::server::Server;
use crate::user::{MissingUser, UserContext};

/// Everything a plugin's builders may depend on.
#[derive(Debug, Clone)]
pub struct PluginContext<S> {
    pub server: Server,
    pub settings: S,
}

impl<S> PluginContext<S> {
    pub fn new(server: Server, settings: S) -> Self {
        Self { server, settings }
    }

    /// Replace the settings, keeping the server.
    pub fn with_settings<T>(self, settings: T) -> PluginContext<T> {
        PluginContext {
            server: self.server,
            settings,
        }
    }
}

/// One HTTP endpoint offered by a plugin.
pub struct RouteDescriptor<S> {
    pub path: &'static str,
    pub method: Method,
    /// Feature group the user must satisfy; `None` leaves the route ungated.
    pub requires: Option<Requirement>,
    pub purpose: Option<&'static str>,
    pub handler: MethodRouter<S>,
}

/// Serializable view of a [`RouteDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub path: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires: Option<Requirement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

impl<S> RouteDescriptor<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with(method: Method, path: &'static str, handler: MethodRouter<S>) -> Self {
        Self {
            path,
            method,
            requires: None,
            purpose: None,
            handler,
        }
    }

    pub fn get<H, T>(path: &'static str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        Self::with(Method::GET, path, routing::get(handler))
    }

    pub fn post<H, T>(path: &'static str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        Self::with(Method::POST, path, routing::post(handler))
    }

    pub fn put<H, T>(path: &'static str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        Self::with(Method::PUT, path, routing::put(handler))
    }

    pub fn delete<H, T>(path: &'static str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        Self::with(Method::DELETE, path, routing::delete(handler))
    }

    pub fn requires(mut self, requirement: Requirement) -> Self {
        self.requires = Some(requirement);
        self
    }

    pub fn purpose(mut self, purpose: &'static str) -> Self {
        self.purpose = Some(purpose);
        self
    }

    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            path: self.path.to_string(),
            method: self.method.to_string(),
            requires: self.requires.clone(),
            purpose: self.purpose.map(str::to_string),
        }
    }
}

/// Reject requests whose user does not satisfy `requirement`.
///
/// Missing user is 401; an unsatisfied group is 403.
pub async fn require_features(requirement: &Requirement, request: Request, next: Next) -> Response {
    let Some(user) = request.extensions().get::<UserContext>() else {
        return MissingUser.into_response();
    };

    if !user.satisfies(requirement) {
        warn!(
            user = %user.id,
            path = %request.uri().path(),
            requires = %requirement,
            "feature requirement not met"
        );
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "access denied", "requires": requirement })),
        )
            .into_response();
    }

    next.run(request).await
}

/// Assemble descriptors into a router, gating each declared requirement.
///
/// Descriptors sharing a path are merged into one method router.
pub fn into_router<S>(routes: Vec<RouteDescriptor<S>>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    routes.into_iter().fold(Router::new(), |router, route| {
        debug!(
            path = route.path,
            method = %route.method,
            gated = route.requires.is_some(),
            "registering plugin route"
        );

        let handler = match route.requires {
            Some(requirement) => {
                route
                    .handler
                    .route_layer(middleware::from_fn(move |request: Request, next: Next| {
                        let requirement = requirement.clone();
                        async move { require_features(&requirement, request, next).await }
                    }))
            }
            None => route.handler,
        };

        router.route(route.path, handler)
    })
}

/// Errors raised while mounting a plugin.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("invalid settings for plugin '{plugin}': {source}")]
    InvalidSettings {
        plugin: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A mounted plugin: its router plus what the host lists about it.
pub struct MountedPlugin {
    pub router: Router,
    pub routes: Vec<RouteSummary>,
    pub gui_modules: Vec<GuiModule>,
}

/// A plugin the host can mount.
///
/// Settings arrive as the resolved key-value map (declared defaults
/// overlaid with configuration); plugins convert them to their own type.
pub trait Plugin: Send + Sync {
    fn manifest(&self) -> PluginManifest;

    fn mount(&self, context: PluginContext<Map<String, Value>>)
    -> Result<MountedPlugin, PluginError>;
}
