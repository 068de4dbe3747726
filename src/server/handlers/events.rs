//! Server-Sent Events feed of audit lifecycle events.

use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use tracing::debug;

use crate::events::next_for_org;
use crate::server::AppState;

/// `GET /api/seo/events/:organization_id`
///
/// Each SSE event is named after the event topic and carries the event JSON.
pub async fn event_stream(
    State(state): State<AppState>,
    Path(organization_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("Event subscriber connected for {}", organization_id);
    let receiver = state.events.subscribe();

    let events = stream::unfold((receiver, organization_id), |(mut rx, org)| async move {
        let event = next_for_org(&mut rx, &org).await?;
        let sse = Event::default()
            .event(event.topic())
            .json_data(&event)
            .unwrap_or_else(|_| Event::default().comment("unserializable event"));
        Some((Ok(sse), (rx, org)))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
