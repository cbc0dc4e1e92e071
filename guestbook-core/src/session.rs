//! A client's guestbook session.
//!
//! [`GuestbookSession`] ties the store, the reconciler, the notification
//! presenter and the publish pipeline together. It is driven from a single
//! task: the host feeds it push events and fired timers, and drains the
//! timers it asks for with [`take_deferred`](GuestbookSession::take_deferred).
//!
//! Nothing here is fatal. Store failures are logged and returned; the view
//! is left as it was.

use tracing::{debug, info, instrument, warn};

use crate::config::SyncConfig;
use crate::entry::{EntryId, GuestbookEntry};
use crate::error::{PublishError, StoreError};
use crate::event::PushEvent;
use crate::identity::VisitorId;
use crate::notify::{NotificationPresenter, ToastId};
use crate::publish::PublishPipeline;
use crate::reconciler::{GuestbookView, Insertion};
use crate::schedule::{Deferred, DeferredAction};
use crate::store::GuestbookStore;
use crate::workspace::{GalleryTab, Workspace};

/// What a push event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The stream (re)opened and the list was reloaded.
    Resynced(usize),
    /// The stream (re)opened but the reload failed.
    ResyncFailed(StoreError),
    Inserted {
        entry_id: EntryId,
        own: bool,
        toast: Option<ToastId>,
    },
    Duplicate(EntryId),
    Removed(EntryId),
    /// Delete for an entry that is not shown.
    Absent(EntryId),
}

pub struct GuestbookSession<S, W> {
    store: S,
    workspace: W,
    visitor: VisitorId,
    view: GuestbookView,
    notifier: NotificationPresenter,
    pipeline: PublishPipeline,
    deferred: Vec<Deferred>,
}

impl<S, W> GuestbookSession<S, W>
where
    S: GuestbookStore,
    W: Workspace,
{
    pub fn new(store: S, workspace: W, visitor: VisitorId, config: &SyncConfig) -> Self {
        Self {
            store,
            workspace,
            view: GuestbookView::new(visitor.clone()),
            visitor,
            notifier: NotificationPresenter::new(config.toast_duration),
            pipeline: PublishPipeline::default(),
            deferred: Vec::new(),
        }
    }

    pub fn visitor(&self) -> &VisitorId {
        &self.visitor
    }

    pub fn view(&self) -> &GuestbookView {
        &self.view
    }

    pub fn notifier(&self) -> &NotificationPresenter {
        &self.notifier
    }

    pub fn workspace(&self) -> &W {
        &self.workspace
    }

    pub fn workspace_mut(&mut self) -> &mut W {
        &mut self.workspace
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn pending_capture(&self) -> Option<&[u8]> {
        self.pipeline.pending()
    }

    /// Timers requested since the last call, for the host to schedule.
    pub fn take_deferred(&mut self) -> Vec<Deferred> {
        std::mem::take(&mut self.deferred)
    }

    /// Apply one decoded push event.
    pub async fn handle_push(&mut self, event: PushEvent) -> PushOutcome {
        match event {
            PushEvent::Connected => match self.reload().await {
                Ok(count) => PushOutcome::Resynced(count),
                Err(e) => PushOutcome::ResyncFailed(e),
            },
            PushEvent::NewEntry(entry) => self.apply_new_entry(entry),
            PushEvent::DeleteEntry(id) => match self.view.apply_delete_entry(&id) {
                Some(exit) => {
                    self.deferred.push(exit);
                    PushOutcome::Removed(id)
                }
                None => PushOutcome::Absent(id),
            },
        }
    }

    fn apply_new_entry(&mut self, entry: GuestbookEntry) -> PushOutcome {
        let entry_id = entry.id.clone();
        match self.view.apply_new_entry(entry.clone()) {
            Insertion::Inserted { own, cue } => {
                self.deferred.push(cue);
                let mut toast = None;
                if let Some(expiry) = self.notifier.notify(&entry, &self.visitor, &self.workspace) {
                    if let DeferredAction::ExpireToast(id) = expiry.action {
                        toast = Some(id);
                    }
                    self.deferred.push(expiry);
                }
                PushOutcome::Inserted {
                    entry_id,
                    own,
                    toast,
                }
            }
            Insertion::Duplicate => PushOutcome::Duplicate(entry_id),
        }
    }

    /// Replace the view with the store's current list.
    #[instrument(skip(self))]
    pub async fn reload(&mut self) -> Result<usize, StoreError> {
        match self.store.list().await {
            Ok(entries) => {
                self.view.replace_all(entries);
                Ok(self.view.count())
            }
            Err(e) => {
                warn!(error = %e, "Failed to load guestbook");
                Err(e)
            }
        }
    }

    /// Show `tab`. Showing the guestbook reloads it.
    pub async fn switch_tab(&mut self, tab: GalleryTab) -> Result<(), StoreError> {
        self.workspace.show_tab(tab);
        if tab == GalleryTab::Guestbook {
            self.reload().await?;
        }
        Ok(())
    }

    pub fn capture(&mut self, image: Vec<u8>) {
        self.pipeline.capture(image);
    }

    pub fn cancel_capture(&mut self) -> bool {
        self.pipeline.cancel()
    }

    /// Publish the pending capture under `name`.
    ///
    /// An echoed entry is applied right away; the matching push event is
    /// then a duplicate. Without an echo the list is reloaded instead.
    pub async fn publish(&mut self, name: &str) -> Result<Option<GuestbookEntry>, PublishError> {
        let created = self
            .pipeline
            .publish(&self.store, &self.visitor, name)
            .await?;

        match &created {
            Some(entry) => {
                self.apply_new_entry(entry.clone());
            }
            None => {
                debug!("Store did not echo the new entry, reloading");
                // failure already logged; the push echo may still arrive
                let _ = self.reload().await;
            }
        }
        Ok(created)
    }

    /// Delete an own entry. On success the list is reloaded; on failure the
    /// store's message is returned and nothing local changes.
    #[instrument(skip(self), fields(entry_id = %id))]
    pub async fn delete(&mut self, id: &EntryId) -> Result<(), StoreError> {
        if let Err(e) = self.store.delete(id, &self.visitor).await {
            warn!(error = %e, "Delete failed");
            return Err(e);
        }
        info!("Entry deleted");
        let _ = self.reload().await;
        Ok(())
    }

    /// Toast body clicked: bring the guestbook forward and reload it.
    pub async fn click_toast(&mut self, id: ToastId) -> bool {
        if !self.notifier.click(id, &mut self.workspace) {
            return false;
        }
        let _ = self.reload().await;
        true
    }

    pub fn dismiss_toast(&mut self, id: ToastId) -> bool {
        self.notifier.dismiss(id)
    }

    /// A timer from [`take_deferred`](Self::take_deferred) fired.
    pub fn fire(&mut self, action: &DeferredAction) -> bool {
        match action {
            DeferredAction::ExpireToast(id) => self.notifier.expire(*id),
            cue => self.view.finish_cue(cue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryGuestbookStore;
    use crate::workspace::HeadlessWorkspace;
    use crate::compress::ImageCompressor;
    use std::sync::Arc;

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        ImageCompressor::default()
            .compress_image(&image::DynamicImage::new_rgb8(width, height))
            .unwrap()
            .jpeg
    }

    fn session(
        store: Arc<MemoryGuestbookStore>,
        visitor: &str,
        tab: GalleryTab,
    ) -> GuestbookSession<Arc<MemoryGuestbookStore>, HeadlessWorkspace> {
        GuestbookSession::new(
            store,
            HeadlessWorkspace::new(tab, true),
            VisitorId::new(visitor),
            &SyncConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_connected_reloads() {
        let store = Arc::new(MemoryGuestbookStore::new());
        store.seed(&VisitorId::new("v1"), "Ana").unwrap();
        let mut session = session(store, "me", GalleryTab::Guestbook);

        assert_eq!(session.handle_push(PushEvent::Connected).await, PushOutcome::Resynced(1));
        assert_eq!(session.view().count(), 1);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_view() {
        let store = Arc::new(MemoryGuestbookStore::new());
        store.seed(&VisitorId::new("v1"), "Ana").unwrap();
        let mut session = session(store.clone(), "me", GalleryTab::Guestbook);
        session.reload().await.unwrap();

        store.set_offline(true);
        assert!(matches!(
            session.handle_push(PushEvent::Connected).await,
            PushOutcome::ResyncFailed(StoreError::Network(_))
        ));
        assert_eq!(session.view().count(), 1);
    }

    #[tokio::test]
    async fn test_publish_echo_then_push_is_duplicate() {
        let store = Arc::new(MemoryGuestbookStore::new());
        let mut events = store.subscribe();
        let mut session = session(store, "me", GalleryTab::Photos);

        session.capture(jpeg(40, 30));
        let entry = session.publish("Me").await.unwrap().unwrap();
        assert_eq!(session.view().count(), 1);
        assert!(session.notifier().toasts().is_empty());

        let echo = events.recv().await.unwrap();
        assert_eq!(
            session.handle_push(echo).await,
            PushOutcome::Duplicate(entry.id)
        );
        assert_eq!(session.view().count(), 1);
    }

    #[tokio::test]
    async fn test_publish_without_echo_reloads() {
        let store = Arc::new(MemoryGuestbookStore::new());
        store.set_echo_created(false);
        let mut session = session(store, "me", GalleryTab::Guestbook);

        session.capture(jpeg(10, 10));
        assert!(session.publish("").await.unwrap().is_none());
        assert_eq!(session.view().count(), 1);
        assert!(session.view().tiles()[0].own);
        assert!(session.pending_capture().is_none());
    }

    #[tokio::test]
    async fn test_delete_rejection_leaves_view() {
        let store = Arc::new(MemoryGuestbookStore::new());
        let theirs = store.seed(&VisitorId::new("owner"), "Ana").unwrap();
        let mut session = session(store, "intruder", GalleryTab::Guestbook);
        session.reload().await.unwrap();

        let err = session.delete(&theirs.id).await.unwrap_err();
        assert_eq!(err.to_string(), "You can only delete your own photos");
        assert!(session.view().contains(&theirs.id));
        assert!(session.take_deferred().is_empty());
    }

    #[tokio::test]
    async fn test_toast_lifecycle_through_session() {
        let store = Arc::new(MemoryGuestbookStore::new());
        let mut session = session(store.clone(), "me", GalleryTab::Photos);
        let entry = store.seed(&VisitorId::new("v1"), "Ana").unwrap();

        let PushOutcome::Inserted { toast: Some(toast), own: false, .. } =
            session.handle_push(PushEvent::NewEntry(entry)).await
        else {
            panic!("expected a toast");
        };

        let deferred = session.take_deferred();
        assert_eq!(deferred.len(), 2);
        let expiry = deferred
            .iter()
            .find(|d| matches!(d.action, DeferredAction::ExpireToast(_)))
            .unwrap();
        assert_eq!(expiry.after, SyncConfig::default().toast_duration);

        assert!(session.click_toast(toast).await);
        assert_eq!(session.workspace().active_tab(), GalleryTab::Guestbook);
        assert!(session.notifier().toasts().is_empty());
        // expiry after click is a no-op
        assert!(!session.fire(&expiry.action));
    }

    #[tokio::test]
    async fn test_switch_to_guestbook_reloads() {
        let store = Arc::new(MemoryGuestbookStore::new());
        let mut session = session(store.clone(), "me", GalleryTab::Photos);
        store.seed(&VisitorId::new("v1"), "Ana").unwrap();

        session.switch_tab(GalleryTab::Videos).await.unwrap();
        assert_eq!(session.view().count(), 0);
        session.switch_tab(GalleryTab::Guestbook).await.unwrap();
        assert_eq!(session.view().count(), 1);
    }
}
