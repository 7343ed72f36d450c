#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for kernel integration tests.
//!
//! [`NotesPlugin`] is a small plugin mounted on the REAL kernel so tests
//! exercise the actual registry, auth layer, and host routes.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::response::Response;
use serde_json::{Map, Value, json};
use tower::ServiceExt;
use webdesq_kernel::{Kernel, SiteConfig};
use webdesq_sdk::prelude::*;

pub const NOTES: &str = "acme/notes";
pub const SEE: &str = "acme/notes/seeNotes";
pub const WRITE: &str = "acme/notes/writeNotes";

/// Minimal plugin with one gated route, one open route, and a GUI module.
pub struct NotesPlugin {
    pub requires: Vec<String>,
}

impl Default for NotesPlugin {
    fn default() -> Self {
        Self {
            requires: vec!["webdesq/storage".into()],
        }
    }
}

type NotesContext = Arc<PluginContext<Map<String, Value>>>;

async fn settings(State(ctx): State<NotesContext>) -> Json<Value> {
    Json(Value::Object(ctx.settings.clone()))
}

async fn whoami(user: UserContext) -> Json<Value> {
    Json(json!({ "id": user.id }))
}

impl Plugin for NotesPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest {
            id: NOTES.into(),
            name: "Notes".into(),
            purpose: "Keep notes".into(),
            version: "0.1.0".into(),
            author: "Acme".into(),
            vendor: "Acme".into(),
            requires: self.requires.clone(),
            features: vec![
                FeatureDefinition::new("seeNotes", "See notes"),
                FeatureDefinition::new("writeNotes", "Write notes")
                    .requires(Requirement::feature("seeNotes")),
            ],
            settings: vec![SettingDefinition::new(
                "greeting",
                SettingKind::String,
                "greeting",
                json!("hello"),
            )],
            icon: String::new(),
            entities: vec![],
        }
    }

    fn mount(
        &self,
        context: PluginContext<Map<String, Value>>,
    ) -> Result<MountedPlugin, PluginError> {
        let routes = vec![
            RouteDescriptor::get("/notes/settings", settings)
                .requires(Requirement::feature(SEE))
                .purpose("Read settings"),
            RouteDescriptor::get("/notes/whoami", whoami),
        ];
        let summaries = routes.iter().map(RouteDescriptor::summary).collect();

        Ok(MountedPlugin {
            router: into_router(routes).with_state(Arc::new(context)),
            routes: summaries,
            gui_modules: vec![
                GuiModule {
                    path: "notes.svelte".into(),
                    requires: Some(Requirement::feature(SEE)),
                    menu: None,
                },
                GuiModule {
                    path: "about.svelte".into(),
                    requires: None,
                    menu: None,
                },
            ],
        })
    }
}

pub const SITE: &str = r#"
[[users]]
id = "reader"
token = "reader-token"
features = ["acme/notes/seeNotes"]

[[users]]
id = "nobody"
token = "nobody-token"

[plugins."acme/notes"]
greeting = "hi"
undeclared = true
"#;

pub fn kernel() -> Kernel {
    Kernel::builder(SiteConfig::parse(SITE).unwrap())
        .plugin(NotesPlugin::default())
        .build()
        .unwrap()
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn send(kernel: &Kernel, request: Request<Body>) -> Response {
    kernel.router().oneshot(request).await.unwrap()
}
