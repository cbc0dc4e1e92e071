//! Transient notifications for entries contributed by other visitors.

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::config::DEFAULT_TOAST_DURATION;
use crate::entry::{EntryId, GuestbookEntry};
use crate::identity::VisitorId;
use crate::schedule::{Deferred, DeferredAction};
use crate::workspace::{GalleryTab, Workspace};

/// Handle of a visible toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(u64);

impl ToastId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub entry_id: EntryId,
    pub visitor_name: String,
    pub message: String,
}

/// Toast text for a new contribution.
pub fn toast_message(visitor_name: &str) -> String {
    format!("{visitor_name} just added a photo!")
}

/// Shows, dismisses and expires toasts.
///
/// Several toasts may be visible at once; each lives independently.
#[derive(Debug, Clone)]
pub struct NotificationPresenter {
    toasts: Vec<Toast>,
    next_id: u64,
    ttl: Duration,
}

impl Default for NotificationPresenter {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION)
    }
}

impl NotificationPresenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            toasts: Vec::new(),
            next_id: 1,
            ttl,
        }
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Raise a toast for `entry` unless the guestbook is already in view or
    /// the entry belongs to `local_visitor`. Returns the expiry timer.
    pub fn notify<W>(
        &mut self,
        entry: &GuestbookEntry,
        local_visitor: &VisitorId,
        workspace: &W,
    ) -> Option<Deferred>
    where
        W: Workspace + ?Sized,
    {
        if entry.is_owned_by(local_visitor) {
            return None;
        }
        if workspace.is_guestbook_active() {
            debug!(entry_id = %entry.id, "Guestbook in view, toast suppressed");
            return None;
        }

        let id = ToastId(self.next_id);
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            entry_id: entry.id.clone(),
            visitor_name: entry.visitor_name.clone(),
            message: toast_message(&entry.visitor_name),
        });

        debug!(toast_id = %id, entry_id = %entry.id, "Toast shown");
        Some(Deferred::new(self.ttl, DeferredAction::ExpireToast(id)))
    }

    /// Activate a toast: focus the guestbook tab, bring the gallery forward
    /// and remove the toast. Returns `false` if the toast is already gone.
    pub fn click<W>(&mut self, id: ToastId, workspace: &mut W) -> bool
    where
        W: Workspace + ?Sized,
    {
        if !self.remove(id) {
            return false;
        }
        workspace.show_tab(GalleryTab::Guestbook);
        workspace.bring_gallery_to_front();
        true
    }

    /// Close button.
    pub fn dismiss(&mut self, id: ToastId) -> bool {
        self.remove(id)
    }

    /// Expiry timer fired. A toast already dismissed or clicked is a no-op.
    pub fn expire(&mut self, id: ToastId) -> bool {
        self.remove(id)
    }

    fn remove(&mut self, id: ToastId) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        before != self.toasts.len()
    }
}
