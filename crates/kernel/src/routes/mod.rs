//! Routes served by the host itself.

pub mod events;
pub mod health;
pub mod plugins;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(events::router())
        .merge(plugins::router())
}
