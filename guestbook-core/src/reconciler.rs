//! Event reconciler and the guestbook grid model.
//!
//! [`GuestbookView`] owns an explicit id index: it is the only authority on
//! which entries are present and on the displayed count. The render list
//! (`tiles`) is derived state that may briefly keep a removed tile around
//! while its exit cue plays.
//!
//! Events are applied strictly in delivery order. Insertion is idempotent
//! and deleting an unknown id is a no-op, so overlapping full reloads and
//! push deliveries converge on server truth.

use std::collections::HashSet;

use tracing::debug;

use crate::config::{ENTER_CUE_DURATION, EXIT_CUE_DURATION};
use crate::entry::{EntryId, GuestbookEntry};
use crate::identity::VisitorId;
use crate::schedule::{Deferred, DeferredAction};

/// Transient visual cue on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Entering,
    Exiting,
}

/// Rendered representation of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub entry: GuestbookEntry,
    /// Contributed by the local visitor.
    pub own: bool,
    pub cue: Option<Cue>,
}

/// Result of [`GuestbookView::apply_new_entry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    /// A tile was inserted; `cue` clears the entry cue when it fires.
    Inserted { own: bool, cue: Deferred },
    /// The id is already present; nothing changed.
    Duplicate,
}

/// The guestbook grid: header, newest-first tiles, optional empty placeholder.
#[derive(Debug, Clone)]
pub struct GuestbookView {
    local_visitor: VisitorId,
    index: HashSet<EntryId>,
    tiles: Vec<Tile>,
    empty_placeholder: bool,
}

impl GuestbookView {
    pub fn new(local_visitor: VisitorId) -> Self {
        Self {
            local_visitor,
            index: HashSet::new(),
            tiles: Vec::new(),
            empty_placeholder: false,
        }
    }

    pub fn local_visitor(&self) -> &VisitorId {
        &self.local_visitor
    }

    /// Displayed entry count.
    pub fn count(&self) -> usize {
        self.index.len()
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.index.contains(id)
    }

    /// Render list, directly below the header, newest first. Includes tiles
    /// still playing their exit cue.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tiles of entries that are present (exiting tiles excluded).
    pub fn entries(&self) -> impl Iterator<Item = &GuestbookEntry> {
        self.tiles
            .iter()
            .filter(|t| t.cue != Some(Cue::Exiting))
            .map(|t| &t.entry)
    }

    pub fn shows_empty_placeholder(&self) -> bool {
        self.empty_placeholder
    }

    /// Full reload: server order is display order, stale tiles are dropped.
    pub fn replace_all(&mut self, entries: Vec<GuestbookEntry>) {
        self.index.clear();
        self.tiles.clear();

        for entry in entries {
            if !self.index.insert(entry.id.clone()) {
                debug!(entry_id = %entry.id, "Skipping duplicate id in list response");
                continue;
            }
            let own = entry.is_owned_by(&self.local_visitor);
            self.tiles.push(Tile {
                entry,
                own,
                cue: None,
            });
        }

        self.empty_placeholder = self.index.is_empty();
        debug!(count = self.count(), "Guestbook view reloaded");
    }

    /// Insert a pushed entry at the top of the grid unless it is already present.
    pub fn apply_new_entry(&mut self, entry: GuestbookEntry) -> Insertion {
        if self.index.contains(&entry.id) {
            debug!(entry_id = %entry.id, "Entry already present, ignoring");
            return Insertion::Duplicate;
        }

        // A tile with this id may still be playing its exit cue.
        self.tiles
            .retain(|t| !(t.entry.id == entry.id && t.cue == Some(Cue::Exiting)));

        let own = entry.is_owned_by(&self.local_visitor);
        let id = entry.id.clone();
        self.index.insert(id.clone());
        self.tiles.insert(
            0,
            Tile {
                entry,
                own,
                cue: Some(Cue::Entering),
            },
        );
        self.empty_placeholder = false;

        debug!(entry_id = %id, own, count = self.count(), "Entry inserted");
        Insertion::Inserted {
            own,
            cue: Deferred::new(ENTER_CUE_DURATION, DeferredAction::ClearEnterCue(id)),
        }
    }

    /// Remove an entry. Membership and count change immediately; the returned
    /// timer only takes the tile out of the render list after its exit cue.
    pub fn apply_delete_entry(&mut self, id: &EntryId) -> Option<Deferred> {
        if !self.index.remove(id) {
            debug!(entry_id = %id, "Delete for unknown entry, ignoring");
            return None;
        }

        if let Some(tile) = self
            .tiles
            .iter_mut()
            .find(|t| &t.entry.id == id && t.cue != Some(Cue::Exiting))
        {
            tile.cue = Some(Cue::Exiting);
        }

        debug!(entry_id = %id, count = self.count(), "Entry removed");
        Some(Deferred::new(
            EXIT_CUE_DURATION,
            DeferredAction::RemoveExitingTile(id.clone()),
        ))
    }

    /// Run a fired cosmetic timer. Returns whether the render list changed.
    pub fn finish_cue(&mut self, action: &DeferredAction) -> bool {
        match action {
            DeferredAction::ClearEnterCue(id) => {
                match self
                    .tiles
                    .iter_mut()
                    .find(|t| &t.entry.id == id && t.cue == Some(Cue::Entering))
                {
                    Some(tile) => {
                        tile.cue = None;
                        true
                    }
                    None => false,
                }
            }
            DeferredAction::RemoveExitingTile(id) => {
                let before = self.tiles.len();
                self.tiles
                    .retain(|t| !(&t.entry.id == id && t.cue == Some(Cue::Exiting)));
                before != self.tiles.len()
            }
            DeferredAction::ExpireToast(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(id: &str, visitor: &str) -> GuestbookEntry {
        GuestbookEntry {
            id: EntryId::from(id),
            visitor_id: VisitorId::new(visitor),
            visitor_name: format!("name-{id}"),
            image_url: format!("/img/{id}"),
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
        }
    }

    fn view() -> GuestbookView {
        GuestbookView::new(VisitorId::new("me"))
    }

    #[test]
    fn test_insertion_is_idempotent() {
        let mut view = view();
        view.replace_all(vec![entry("a", "v1")]);
        assert_eq!(view.count(), 1);

        assert!(matches!(
            view.apply_new_entry(entry("b", "v2")),
            Insertion::Inserted { own: false, .. }
        ));
        assert_eq!(view.apply_new_entry(entry("b", "v2")), Insertion::Duplicate);

        assert_eq!(view.count(), 2);
        assert_eq!(view.tiles().iter().filter(|t| t.entry.id == EntryId::from("b")).count(), 1);
    }

    #[test]
    fn test_new_entry_goes_to_top_and_clears_placeholder() {
        let mut view = view();
        view.replace_all(Vec::new());
        assert!(view.shows_empty_placeholder());

        view.apply_new_entry(entry("old", "v1"));
        view.apply_new_entry(entry("new", "me"));

        assert!(!view.shows_empty_placeholder());
        let ids: Vec<_> = view.entries().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["new", "old"]);
        assert!(view.tiles()[0].own);
        assert_eq!(view.tiles()[0].cue, Some(Cue::Entering));
    }

    #[test]
    fn test_enter_cue_clears_without_touching_count() {
        let mut view = view();
        let Insertion::Inserted { cue, .. } = view.apply_new_entry(entry("a", "v1")) else {
            panic!("expected insertion");
        };
        assert_eq!(cue.after, ENTER_CUE_DURATION);
        assert!(view.finish_cue(&cue.action));
        assert_eq!(view.tiles()[0].cue, None);
        assert_eq!(view.count(), 1);
        assert!(!view.finish_cue(&cue.action));
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let mut view = view();
        view.replace_all(vec![entry("a", "v1")]);
        assert!(view.apply_delete_entry(&EntryId::from("zzz")).is_none());
        assert_eq!(view.count(), 1);
        assert_eq!(view.tiles().len(), 1);
    }

    #[test]
    fn test_delete_is_logically_immediate() {
        let mut view = view();
        view.replace_all(vec![entry("a", "v1"), entry("b", "v2")]);

        let timer = view.apply_delete_entry(&EntryId::from("a")).unwrap();
        assert_eq!(view.count(), 1);
        assert!(!view.contains(&EntryId::from("a")));
        // still rendered while the exit cue plays
        assert_eq!(view.tiles().len(), 2);
        assert_eq!(view.entries().count(), 1);

        assert_eq!(timer.after, EXIT_CUE_DURATION);
        assert!(view.finish_cue(&timer.action));
        assert_eq!(view.tiles().len(), 1);

        // a second delete of the same id changes nothing
        assert!(view.apply_delete_entry(&EntryId::from("a")).is_none());
        assert_eq!(view.count(), 1);
    }

    #[test]
    fn test_reinsert_during_exit_cue_replaces_stale_tile() {
        let mut view = view();
        view.replace_all(vec![entry("a", "v1")]);
        let exit = view.apply_delete_entry(&EntryId::from("a")).unwrap();

        view.apply_new_entry(entry("a", "v1"));
        assert_eq!(view.tiles().len(), 1);
        assert_eq!(view.tiles()[0].cue, Some(Cue::Entering));

        // the late exit timer must not remove the fresh tile
        assert!(!view.finish_cue(&exit.action));
        assert_eq!(view.tiles().len(), 1);
        assert_eq!(view.count(), 1);
    }

    #[test]
    fn test_reload_reflects_server_truth() {
        let mut view = view();
        view.replace_all(vec![entry("a", "v1"), entry("b", "me")]);
        view.apply_new_entry(entry("c", "v3"));

        view.replace_all(vec![entry("b", "me"), entry("b", "me")]);
        assert_eq!(view.count(), 1);
        assert_eq!(view.tiles().len(), 1);
        assert!(view.tiles()[0].own);
        assert!(!view.shows_empty_placeholder());
    }

    #[test]
    fn test_rapid_create_then_delete_converges() {
        let mut view = view();
        view.replace_all(Vec::new());
        view.apply_new_entry(entry("x", "v1"));
        view.apply_delete_entry(&EntryId::from("x"));
        assert_eq!(view.count(), 0);
        assert!(!view.contains(&EntryId::from("x")));
    }
}
