//! Plugin listings for the admin GUI.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use webdesq_sdk::prelude::{GuiModule, UserContext};

use crate::registry::PluginSummary;
use crate::state::AppState;

async fn list_plugins(
    State(state): State<AppState>,
    _user: UserContext,
) -> Json<Vec<PluginSummary>> {
    Json(state.plugins().to_vec())
}

/// GUI modules whose requirement the user satisfies.
async fn list_gui_modules(
    State(state): State<AppState>,
    user: UserContext,
) -> Json<Vec<GuiModule>> {
    let modules = state
        .gui_modules()
        .iter()
        .filter(|module| {
            module
                .requires
                .as_ref()
                .is_none_or(|requirement| user.satisfies(requirement))
        })
        .cloned()
        .collect();
    Json(modules)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plugins", get(list_plugins))
        .route("/gui/modules", get(list_gui_modules))
}
