//! Deferred presentation work.
//!
//! Cosmetic transitions (tile enter/exit cues, toast expiry) are returned to
//! the host as [`Deferred`] values instead of being scheduled internally. The
//! host runs them on its own timer and hands the action back when it fires.
//! None of them changes membership or counts.

use std::time::Duration;

use crate::entry::EntryId;
use crate::notify::ToastId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredAction {
    /// Drop the "entry" cue from a freshly inserted tile.
    ClearEnterCue(EntryId),
    /// Remove a tile whose exit cue has played.
    RemoveExitingTile(EntryId),
    /// Auto-expire a toast.
    ExpireToast(ToastId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deferred {
    pub after: Duration,
    pub action: DeferredAction,
}

impl Deferred {
    pub fn new(after: Duration, action: DeferredAction) -> Self {
        Self { after, action }
    }
}
