//! In-process guestbook store.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;
use tracing::debug;

use super::GuestbookStore;
use crate::api::IMAGES_PATH;
use crate::entry::{display_name, CreateEntryRequest, EntryId, GuestbookEntry};
use crate::error::StoreError;
use crate::event::PushEvent;
use crate::identity::VisitorId;

const EVENT_CAPACITY: usize = 64;

/// Store kept in memory, with the same ownership rules as the HTTP server.
///
/// Every accepted change is broadcast as a [`PushEvent`] to subscribers.
#[derive(Debug)]
pub struct MemoryGuestbookStore {
    entries: Mutex<Vec<GuestbookEntry>>,
    next_id: AtomicU64,
    echo_created: AtomicBool,
    offline: AtomicBool,
    events: broadcast::Sender<PushEvent>,
}

impl Default for MemoryGuestbookStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGuestbookStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            echo_created: AtomicBool::new(true),
            offline: AtomicBool::new(false),
            events,
        }
    }

    /// Whether `create` returns the new entry in its response (default: yes).
    pub fn set_echo_created(&self, echo: bool) {
        self.echo_created.store(echo, Ordering::SeqCst);
    }

    /// Make every request fail with a network error until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Receive every change accepted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.events.subscribe()
    }

    /// Insert an entry directly, bypassing validation and broadcasting.
    pub fn seed(&self, visitor: &VisitorId, name: &str) -> Result<GuestbookEntry, StoreError> {
        let entry = self.new_entry(visitor.clone(), display_name(name));
        self.lock()?.insert(0, entry.clone());
        Ok(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn new_entry(&self, visitor_id: VisitorId, visitor_name: String) -> GuestbookEntry {
        let id = EntryId::from(self.next_id.fetch_add(1, Ordering::SeqCst));
        GuestbookEntry {
            image_url: format!("{IMAGES_PATH}/{id}"),
            id,
            visitor_id,
            visitor_name,
            created_at: Utc::now(),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<GuestbookEntry>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Malformed("memory store poisoned".into()))
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Network("store unreachable".into()));
        }
        Ok(())
    }

    fn broadcast(&self, event: PushEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl GuestbookStore for MemoryGuestbookStore {
    async fn list(&self) -> Result<Vec<GuestbookEntry>, StoreError> {
        self.check_online()?;
        Ok(self.lock()?.clone())
    }

    async fn create(
        &self,
        request: CreateEntryRequest,
    ) -> Result<Option<GuestbookEntry>, StoreError> {
        self.check_online()?;
        if request.image.trim().is_empty() {
            return Err(StoreError::rejected(Some("No image provided".into())));
        }
        if request.visitor_id.as_str().trim().is_empty() {
            return Err(StoreError::rejected(Some("Missing visitor id".into())));
        }

        let entry = self.new_entry(request.visitor_id, display_name(&request.name));
        self.lock()?.insert(0, entry.clone());
        debug!(entry_id = %entry.id, "Memory store created entry");
        self.broadcast(PushEvent::NewEntry(entry.clone()));

        Ok(self.echo_created.load(Ordering::SeqCst).then_some(entry))
    }

    async fn delete(&self, id: &EntryId, visitor: &VisitorId) -> Result<(), StoreError> {
        self.check_online()?;
        {
            let mut entries = self.lock()?;
            let position = entries
                .iter()
                .position(|e| &e.id == id)
                .ok_or_else(|| StoreError::rejected(Some("Photo not found".into())))?;
            if !entries[position].is_owned_by(visitor) {
                return Err(StoreError::rejected(Some(
                    "You can only delete your own photos".into(),
                )));
            }
            entries.remove(position);
        }
        debug!(entry_id = %id, "Memory store deleted entry");
        self.broadcast(PushEvent::DeleteEntry(id.clone()));
        Ok(())
    }
}
