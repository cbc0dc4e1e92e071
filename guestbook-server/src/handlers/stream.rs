//! Server push stream
//!
//! GET /api/guestbook/stream opens a long-lived `text/event-stream`. The
//! first frame is always `connected`; afterwards every stored or deleted
//! photo is delivered in publish order. A subscriber that lags behind the
//! event buffer has its stream closed.
//!
//! Events are named (`new_photo`, `delete_photo`) by default. With
//! `?format=message` they are sent unnamed with a `{type, data}` envelope
//! instead, for clients that only listen to generic messages.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use guestbook_core::event::EVENT_MESSAGE;
use guestbook_core::{PushEvent, RawEvent};
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, warn};

use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamFormat {
    #[default]
    Named,
    Message,
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    #[serde(default)]
    pub format: StreamFormat,
}

pub async fn stream_handler(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before the greeting so nothing published in between is lost.
    let rx = state.hub.subscribe();
    let format = query.format;
    debug!(?format, subscribers = state.hub.subscribers(), "Push stream opened");

    let greeting = stream::iter(to_sse(&PushEvent::Connected, format));
    let live = updates(rx, format);

    Sse::new(greeting.chain(live)).keep_alive(
        KeepAlive::new().interval(Duration::from_secs(state.config.stream_keepalive_secs)),
    )
}

/// Frames for every published event. A subscriber that falls behind the
/// buffer is cut off; on reconnect it gets `connected` and reloads the list.
fn updates(
    rx: broadcast::Receiver<PushEvent>,
    format: StreamFormat,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(rx, move |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => match to_sse(&event, format) {
                    Some(frame) => return Some((frame, rx)),
                    None => continue,
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Push stream lagging, closing so the client resyncs");
                    return None;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

fn to_sse(event: &PushEvent, format: StreamFormat) -> Option<Result<Event, Infallible>> {
    let encoded = match format {
        StreamFormat::Named => event.to_named(),
        StreamFormat::Message => event.to_envelope(),
    };

    match encoded {
        Ok(raw) => Some(Ok(frame(raw))),
        Err(e) => {
            error!(event = event.name(), error = %e, "Failed to encode push event");
            None
        }
    }
}

fn frame(raw: RawEvent) -> Event {
    let event = Event::default().data(raw.data);
    if raw.event == EVENT_MESSAGE {
        event
    } else {
        event.event(raw.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::EventHub;
    use guestbook_core::EntryId;

    #[test]
    fn test_format_defaults_to_named() {
        assert_eq!(StreamQuery::default().format, StreamFormat::Named);
    }

    #[test]
    fn test_to_sse_encodes_every_event() {
        let event = PushEvent::DeleteEntry(EntryId::from("a"));
        assert!(to_sse(&event, StreamFormat::Named).is_some());
        assert!(to_sse(&event, StreamFormat::Message).is_some());
    }

    #[tokio::test]
    async fn test_lagging_subscriber_stream_ends() {
        let hub = EventHub::new(1);
        let rx = hub.subscribe();
        for id in ["a", "b", "c"] {
            hub.publish(PushEvent::DeleteEntry(EntryId::from(id)));
        }

        let frames: Vec<_> = updates(rx, StreamFormat::Named).collect().await;
        assert!(frames.is_empty());
    }

    #[tokio::test]
    async fn test_updates_drain_then_end_on_close() {
        let hub = EventHub::new(8);
        let rx = hub.subscribe();
        hub.publish(PushEvent::DeleteEntry(EntryId::from("a")));
        hub.publish(PushEvent::DeleteEntry(EntryId::from("b")));
        drop(hub);

        let frames: Vec<_> = updates(rx, StreamFormat::Message).collect().await;
        assert_eq!(frames.len(), 2);
    }
}
