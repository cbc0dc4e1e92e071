//! Guestbook store clients.
//!
//! The store is the source of truth for entries and enforces ownership on
//! delete. Clients only list, create and delete; every change is echoed to
//! all connected clients through the push channel.

#[cfg(feature = "network")]
mod http;
mod memory;

#[cfg(feature = "network")]
pub use http::{is_transient_error, is_transient_status, HttpGuestbookStore, HttpStoreConfig};
pub use memory::MemoryGuestbookStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::entry::{CreateEntryRequest, EntryId, GuestbookEntry};
use crate::error::StoreError;
use crate::identity::VisitorId;

/// Remote list/create/delete operations.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait GuestbookStore: Send + Sync {
    /// All entries, newest first.
    async fn list(&self) -> Result<Vec<GuestbookEntry>, StoreError>;

    /// Create an entry. Returns the created entry when the store echoes it.
    async fn create(
        &self,
        request: CreateEntryRequest,
    ) -> Result<Option<GuestbookEntry>, StoreError>;

    /// Delete an entry owned by `visitor`.
    async fn delete(&self, id: &EntryId, visitor: &VisitorId) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: GuestbookStore + ?Sized> GuestbookStore for Arc<S> {
    async fn list(&self) -> Result<Vec<GuestbookEntry>, StoreError> {
        (**self).list().await
    }

    async fn create(
        &self,
        request: CreateEntryRequest,
    ) -> Result<Option<GuestbookEntry>, StoreError> {
        (**self).create(request).await
    }

    async fn delete(&self, id: &EntryId, visitor: &VisitorId) -> Result<(), StoreError> {
        (**self).delete(id, visitor).await
    }
}
