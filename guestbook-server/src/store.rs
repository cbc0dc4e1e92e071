//! In-memory photo store.
//!
//! Entries are kept in a `DashMap` keyed by id. A monotonically increasing
//! sequence number gives a stable newest-first order independent of clock
//! resolution.
//!
//! Inserts and removals take a `notify` callback that runs while the
//! sequence lock is held, so pushed events leave in the same order the list
//! reports.

use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use dashmap::DashMap;
use guestbook_core::api::IMAGES_PATH;
use guestbook_core::{EntryId, GuestbookEntry, VisitorId};
use thiserror::Error;

/// A stored photo and its image bytes.
#[derive(Debug, Clone)]
struct StoredPhoto {
    seq: u64,
    entry: GuestbookEntry,
    mime: &'static str,
    image: Vec<u8>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RemoveError {
    #[error("Photo not found")]
    NotFound,

    #[error("You can only delete your own photos")]
    NotOwner,
}

#[derive(Debug, Default)]
pub struct PhotoStore {
    photos: DashMap<EntryId, StoredPhoto>,
    /// Next sequence number; also serialises change notifications.
    seq: Mutex<u64>,
}

impl PhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new photo and return its entry. `notify` sees the entry
    /// before any later insert or removal is ordered.
    pub fn insert(
        &self,
        visitor_id: VisitorId,
        visitor_name: String,
        mime: &'static str,
        image: Vec<u8>,
        notify: impl FnOnce(&GuestbookEntry),
    ) -> GuestbookEntry {
        let id = EntryId::new(uuid::Uuid::new_v4().to_string());
        let entry = GuestbookEntry {
            image_url: format!("{IMAGES_PATH}/{id}"),
            id: id.clone(),
            visitor_id,
            visitor_name,
            created_at: Utc::now(),
        };
        let mut next = self.seq.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = *next;
        *next += 1;
        self.photos.insert(
            id,
            StoredPhoto {
                seq,
                entry: entry.clone(),
                mime,
                image,
            },
        );
        notify(&entry);
        entry
    }

    /// All entries, newest first.
    pub fn list(&self) -> Vec<GuestbookEntry> {
        let mut photos: Vec<(u64, GuestbookEntry)> = self
            .photos
            .iter()
            .map(|p| (p.seq, p.entry.clone()))
            .collect();
        photos.sort_by(|a, b| b.0.cmp(&a.0));
        photos.into_iter().map(|(_, entry)| entry).collect()
    }

    /// Image bytes and MIME type of an entry.
    pub fn image(&self, id: &EntryId) -> Option<(&'static str, Vec<u8>)> {
        self.photos.get(id).map(|p| (p.mime, p.image.clone()))
    }

    /// Remove an entry owned by `visitor`. `notify` runs only on success.
    pub fn remove(
        &self,
        id: &EntryId,
        visitor: &VisitorId,
        notify: impl FnOnce(&GuestbookEntry),
    ) -> Result<GuestbookEntry, RemoveError> {
        let _order = self.seq.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = self
            .photos
            .remove_if(id, |_, photo| photo.entry.is_owned_by(visitor));
        match removed {
            Some((_, photo)) => {
                notify(&photo.entry);
                Ok(photo.entry)
            }
            None if self.photos.contains_key(id) => Err(RemoveError::NotOwner),
            None => Err(RemoveError::NotFound),
        }
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(store: &PhotoStore, visitor: &str) -> GuestbookEntry {
        store.insert(
            VisitorId::new(visitor),
            "Ana".into(),
            "image/jpeg",
            vec![0xFF, 0xD8],
            |_| {},
        )
    }

    #[test]
    fn test_list_is_newest_first() {
        let store = PhotoStore::new();
        let a = insert(&store, "v1");
        let b = insert(&store, "v2");
        let c = insert(&store, "v1");
        let ids: Vec<_> = store.list().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }

    #[test]
    fn test_image_url_points_at_image_route() {
        let store = PhotoStore::new();
        let entry = insert(&store, "v1");
        assert_eq!(entry.image_url, format!("/api/guestbook/images/{}", entry.id));
        assert_eq!(store.image(&entry.id).unwrap().0, "image/jpeg");
    }

    #[test]
    fn test_remove_checks_owner() {
        let store = PhotoStore::new();
        let entry = insert(&store, "owner");

        assert_eq!(
            store.remove(&entry.id, &VisitorId::new("other"), |_| {}),
            Err(RemoveError::NotOwner)
        );
        assert_eq!(store.len(), 1);

        assert_eq!(store.remove(&entry.id, &VisitorId::new("owner"), |_| {}).unwrap(), entry);
        assert!(store.is_empty());
        assert_eq!(
            store.remove(&entry.id, &VisitorId::new("owner"), |_| {}),
            Err(RemoveError::NotFound)
        );
    }

    #[test]
    fn test_concurrent_inserts_notify_in_list_order() {
        let store = std::sync::Arc::new(PhotoStore::new());
        let notified = std::sync::Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                let notified = notified.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        store.insert(
                            VisitorId::new(format!("v{i}")),
                            "Ana".into(),
                            "image/jpeg",
                            vec![0xFF, 0xD8],
                            |entry| notified.lock().unwrap().push(entry.id.clone()),
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut pushed = notified.lock().unwrap().clone();
        pushed.reverse();
        let listed: Vec<_> = store.list().into_iter().map(|e| e.id).collect();
        assert_eq!(listed.len(), 200);
        assert_eq!(pushed, listed);
    }

    #[test]
    fn test_rejected_remove_does_not_notify() {
        let store = PhotoStore::new();
        let entry = insert(&store, "owner");
        let mut notified = false;
        let _ = store.remove(&entry.id, &VisitorId::new("other"), |_| notified = true);
        assert!(!notified);
        store
            .remove(&entry.id, &VisitorId::new("owner"), |_| notified = true)
            .unwrap();
        assert!(notified);
    }
}
