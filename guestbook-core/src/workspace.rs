//! The desktop surface the guestbook lives in.
//!
//! Window management is an external collaborator; the sync engine only needs
//! to know whether the guestbook is the focused view and to be able to bring
//! it forward when a toast is clicked.

use std::fmt;
use std::str::FromStr;

/// Tabs of the gallery window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GalleryTab {
    Photos,
    Videos,
    #[default]
    Guestbook,
}

impl fmt::Display for GalleryTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Photos => "photos",
            Self::Videos => "videos",
            Self::Guestbook => "guestbook",
        })
    }
}

impl FromStr for GalleryTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "photos" => Ok(Self::Photos),
            "videos" => Ok(Self::Videos),
            "guestbook" => Ok(Self::Guestbook),
            other => Err(format!(
                "unknown tab '{other}' (expected photos, videos or guestbook)"
            )),
        }
    }
}

/// Window-manager operations the guestbook calls into.
pub trait Workspace {
    /// Whether the guestbook is the currently active/focused view.
    fn is_guestbook_active(&self) -> bool;

    /// Make `tab` the visible tab of the gallery window.
    fn show_tab(&mut self, tab: GalleryTab);

    /// Open the gallery window if needed and raise it above the others.
    fn bring_gallery_to_front(&mut self);
}

/// Workspace without a display, tracking focus only.
#[derive(Debug, Clone)]
pub struct HeadlessWorkspace {
    active_tab: GalleryTab,
    gallery_open: bool,
    raised: u32,
}

impl HeadlessWorkspace {
    pub fn new(active_tab: GalleryTab, gallery_open: bool) -> Self {
        Self {
            active_tab,
            gallery_open,
            raised: 0,
        }
    }

    pub fn active_tab(&self) -> GalleryTab {
        self.active_tab
    }

    pub fn is_gallery_open(&self) -> bool {
        self.gallery_open
    }

    /// How many times the gallery was brought to front.
    pub fn times_raised(&self) -> u32 {
        self.raised
    }
}

impl Default for HeadlessWorkspace {
    fn default() -> Self {
        Self::new(GalleryTab::Guestbook, true)
    }
}

impl Workspace for HeadlessWorkspace {
    fn is_guestbook_active(&self) -> bool {
        self.gallery_open && self.active_tab == GalleryTab::Guestbook
    }

    fn show_tab(&mut self, tab: GalleryTab) {
        self.active_tab = tab;
    }

    fn bring_gallery_to_front(&mut self) {
        self.gallery_open = true;
        self.raised += 1;
    }
}
