//! Guestbook Core - live synchronisation for a shared visitor guestbook
//!
//! Visitors contribute photos to a shared guestbook. Every connected client
//! sees additions and deletions from everyone else in near real time, without
//! polling, through a server push stream.
//!
//! # Features
//!
//! - Push channel with a fixed-delay reconnect policy and a hard attempt ceiling
//! - Idempotent reconciliation of pushed events into an explicit id index
//! - Capture-to-publish pipeline with mandatory client-side compression
//! - Toast notifications for other visitors' contributions
//! - Pseudonymous visitor identity persisted in client-local storage
//!
//! # Example
//!
//! ```no_run
//! use guestbook_core::{
//!     GuestbookSession, HeadlessWorkspace, HttpGuestbookStore, HttpStoreConfig, PushChannel,
//!     ReconnectPolicy, SseTransport, SyncConfig, VisitorIdentity, MemoryKeyValueStore,
//! };
//!
//! # async fn example() -> guestbook_core::Result<()> {
//! let config = SyncConfig::from_env();
//! let visitor = VisitorIdentity::new(MemoryKeyValueStore::new()).get_or_create()?;
//! let store = HttpGuestbookStore::new(HttpStoreConfig::from_sync_config(&config)?)?;
//!
//! let mut session = GuestbookSession::new(store, HeadlessWorkspace::default(), visitor, &config);
//! let (mut channel, mut events) = PushChannel::new(
//!     SseTransport::new(&config.server_url)?,
//!     ReconnectPolicy::from(&config),
//! );
//! channel.connect().await;
//!
//! while let Some(event) = events.recv().await {
//!     session.handle_push(event).await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod channel;
pub mod compress;
pub mod config;
pub mod entry;
pub mod error;
pub mod event;
pub mod identity;
pub mod notify;
pub mod publish;
pub mod reconciler;
pub mod schedule;
pub mod session;
pub mod store;
pub mod workspace;

// Re-export main types for convenience
pub use channel::{
    ConnectionMachine, ConnectionState, ConnectionStatus, PushChannel, ReconnectPolicy,
    RetryDecision, Script, ScriptedTransport, Timer, TokioTimer, Transport,
};
pub use compress::{CompressedImage, CompressionSettings, ImageCompressor};
pub use config::SyncConfig;
pub use entry::{EntryId, GuestbookEntry, DEFAULT_VISITOR_NAME};
pub use error::{
    ChannelError, CompressionError, DecodeError, GuestbookError, PublishError, Result, StoreError,
};
pub use event::{PushEvent, RawEvent};
pub use identity::{
    FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, VisitorId, VisitorIdentity,
};
pub use notify::{NotificationPresenter, Toast, ToastId};
pub use publish::PublishPipeline;
pub use reconciler::{Cue, GuestbookView, Insertion, Tile};
pub use schedule::{Deferred, DeferredAction};
pub use session::{GuestbookSession, PushOutcome};
pub use store::{GuestbookStore, MemoryGuestbookStore};
pub use workspace::{GalleryTab, HeadlessWorkspace, Workspace};

// Network-dependent exports
#[cfg(feature = "network")]
pub use channel::SseTransport;
#[cfg(feature = "network")]
pub use store::{HttpGuestbookStore, HttpStoreConfig};
