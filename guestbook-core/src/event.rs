//! Push event taxonomy, decoded once at the transport boundary.
//!
//! The stream carries either named events (`connected`, `new_photo`,
//! `delete_photo`) or, in the fallback variant, unnamed `message` events
//! whose data is an envelope `{"type": ..., "data": ...}`. Both decode into
//! the same closed [`PushEvent`] union.

use serde::{Deserialize, Serialize};

use crate::entry::{DeletedEntry, EntryId, GuestbookEntry};
use crate::error::DecodeError;

pub const EVENT_CONNECTED: &str = "connected";
pub const EVENT_NEW_PHOTO: &str = "new_photo";
pub const EVENT_DELETE_PHOTO: &str = "delete_photo";
pub const EVENT_MESSAGE: &str = "message";

/// One server-sent frame before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Event name; empty or `message` for unnamed events.
    pub event: String,
    pub data: String,
}

impl RawEvent {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }
}

/// Decoded push event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    /// Server acknowledged the stream.
    Connected,
    NewEntry(GuestbookEntry),
    DeleteEntry(EntryId),
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl PushEvent {
    /// Decode a raw frame.
    ///
    /// Returns `Ok(None)` for event names this client does not understand.
    pub fn decode(raw: &RawEvent) -> Result<Option<Self>, DecodeError> {
        match raw.event.as_str() {
            EVENT_CONNECTED => Ok(Some(Self::Connected)),
            EVENT_NEW_PHOTO => serde_json::from_str::<GuestbookEntry>(&raw.data)
                .map(|entry| Some(Self::NewEntry(entry)))
                .map_err(|source| decode_error(EVENT_NEW_PHOTO, source)),
            EVENT_DELETE_PHOTO => serde_json::from_str::<DeletedEntry>(&raw.data)
                .map(|deleted| Some(Self::DeleteEntry(deleted.id)))
                .map_err(|source| decode_error(EVENT_DELETE_PHOTO, source)),
            "" | EVENT_MESSAGE => Self::decode_envelope(&raw.data),
            _ => Ok(None),
        }
    }

    fn decode_envelope(data: &str) -> Result<Option<Self>, DecodeError> {
        let envelope: Envelope =
            serde_json::from_str(data).map_err(|source| decode_error(EVENT_MESSAGE, source))?;

        match envelope.kind.as_str() {
            EVENT_CONNECTED => Ok(Some(Self::Connected)),
            EVENT_NEW_PHOTO => serde_json::from_value::<GuestbookEntry>(envelope.data)
                .map(|entry| Some(Self::NewEntry(entry)))
                .map_err(|source| decode_error(EVENT_NEW_PHOTO, source)),
            EVENT_DELETE_PHOTO => {
                // Accept both `{"id": ...}` and a bare id.
                let id = match serde_json::from_value::<DeletedEntry>(envelope.data.clone()) {
                    Ok(deleted) => deleted.id,
                    Err(_) => serde_json::from_value::<EntryId>(envelope.data)
                        .map_err(|source| decode_error(EVENT_DELETE_PHOTO, source))?,
                };
                Ok(Some(Self::DeleteEntry(id)))
            }
            _ => Ok(None),
        }
    }

    /// Wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected => EVENT_CONNECTED,
            Self::NewEntry(_) => EVENT_NEW_PHOTO,
            Self::DeleteEntry(_) => EVENT_DELETE_PHOTO,
        }
    }

    fn payload(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::Connected => Ok(serde_json::json!({ "status": "connected" })),
            Self::NewEntry(entry) => serde_json::to_value(entry),
            Self::DeleteEntry(id) => serde_json::to_value(DeletedEntry { id: id.clone() }),
        }
    }

    /// Encode as a named event.
    pub fn to_named(&self) -> serde_json::Result<RawEvent> {
        Ok(RawEvent::new(self.name(), self.payload()?.to_string()))
    }

    /// Encode as an unnamed `message` event carrying a `{type, data}` envelope.
    pub fn to_envelope(&self) -> serde_json::Result<RawEvent> {
        let envelope = Envelope {
            kind: self.name().to_string(),
            data: self.payload()?,
        };
        Ok(RawEvent::new(EVENT_MESSAGE, serde_json::to_string(&envelope)?))
    }
}

fn decode_error(event: &str, source: serde_json::Error) -> DecodeError {
    DecodeError {
        event: event.to_string(),
        source,
    }
}
