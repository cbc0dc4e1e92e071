//! Guestbook data model and the JSON shapes exchanged with the store.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::identity::VisitorId;

/// Display name used when a visitor leaves the name blank.
pub const DEFAULT_VISITOR_NAME: &str = "Anonymous Visitor";

/// Opaque entry identifier, stable across reconnects.
///
/// Serialized as a string. Deserializes from either a JSON string or a JSON
/// integer, since stores are free to use numeric ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for EntryId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Signed(n) => Self(n.to_string()),
            RawId::Unsigned(n) => Self(n.to_string()),
        })
    }
}

/// Accept RFC 3339 or a zone-less ISO 8601 timestamp, the latter read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("unrecognised timestamp: {raw}"))
    })
}

/// Parse a store timestamp. Zone-less values (`2025-03-01T10:00:00.123456`,
/// `2025-03-01 10:00:00`) are taken to be UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn default_visitor_name() -> String {
    DEFAULT_VISITOR_NAME.to_string()
}

/// One guestbook contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestbookEntry {
    pub id: EntryId,
    pub visitor_id: VisitorId,
    #[serde(default = "default_visitor_name")]
    pub visitor_name: String,
    pub image_url: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl GuestbookEntry {
    /// Whether this entry was contributed by `visitor`.
    pub fn is_owned_by(&self, visitor: &VisitorId) -> bool {
        &self.visitor_id == visitor
    }
}

/// Trim a user-typed name, substituting [`DEFAULT_VISITOR_NAME`] when blank.
pub fn display_name(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        default_visitor_name()
    } else {
        trimmed.to_string()
    }
}

/// Body of `GET /api/guestbook/photos`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhotoList {
    #[serde(default)]
    pub photos: Option<Vec<GuestbookEntry>>,
}

impl PhotoList {
    pub fn new(photos: Vec<GuestbookEntry>) -> Self {
        Self {
            photos: Some(photos),
        }
    }

    /// Entries in store order; an absent list is empty.
    pub fn into_entries(self) -> Vec<GuestbookEntry> {
        self.photos.unwrap_or_default()
    }
}

/// Body of `POST /api/guestbook/upload`. `image` is an already-compressed data URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEntryRequest {
    pub image: String,
    pub name: String,
    pub visitor_id: VisitorId,
}

/// Body of `DELETE /api/guestbook/delete/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteEntryRequest {
    pub visitor_id: VisitorId,
}

/// Response body shared by the create and delete endpoints.
///
/// `photo` is only present on a successful create, and only when the store
/// echoes the new entry back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<GuestbookEntry>,
}

impl StoreResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn created(photo: GuestbookEntry) -> Self {
        Self {
            success: true,
            error: None,
            photo: Some(photo),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            photo: None,
        }
    }
}

/// Payload of a `delete_photo` push event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedEntry {
    pub id: EntryId,
}
