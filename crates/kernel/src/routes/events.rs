//! Server-sent stream of published notifications.

use std::convert::Infallible;
use std::time::Duration;

use axum::Router;
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use serde::Deserialize;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;
use webdesq_sdk::prelude::UserContext;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct EventsQuery {
    /// Only forward this channel; all channels when absent.
    channel: Option<String>,
}

/// GET /events - one SSE event per notification, named after its channel.
async fn stream(
    State(state): State<AppState>,
    user: UserContext,
    Query(params): Query<EventsQuery>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>> + Send> {
    debug!(user = %user.id, channel = ?params.channel, "event stream opened");

    let rx = state.broadcaster().subscribe();
    let channel = params.channel;
    let stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(notification)
            if channel.as_deref().is_none_or(|c| c == notification.channel) =>
        {
            Some(Ok(Event::default()
                .event(notification.channel)
                .data(notification.event)))
        }
        // Lagged receivers skip what they missed
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/events", get(stream))
}
