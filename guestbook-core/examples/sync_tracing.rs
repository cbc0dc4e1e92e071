//! Example demonstrating the sync engine's tracing instrumentation.
//!
//! Two visitors share an in-memory store. One publishes and deletes a photo
//! while the other follows along over a scripted push stream.
//!
//! Run with: cargo run -p guestbook-core --example sync_tracing

use std::sync::Arc;

use guestbook_core::{
    GalleryTab, GuestbookSession, HeadlessWorkspace, ImageCompressor, MemoryGuestbookStore,
    PushChannel, PushEvent, ReconnectPolicy, Script, ScriptedTransport, SyncConfig, VisitorId,
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with debug level
    fmt()
        .with_env_filter(EnvFilter::new("guestbook_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== Guestbook Sync Tracing Demo ===\n");

    let config = SyncConfig::default();
    let store = Arc::new(MemoryGuestbookStore::new());
    let mut ana = GuestbookSession::new(
        Arc::clone(&store),
        HeadlessWorkspace::default(),
        VisitorId::new("visitor_ana"),
        &config,
    );
    let mut bob = GuestbookSession::new(
        Arc::clone(&store),
        HeadlessWorkspace::new(GalleryTab::Photos, true),
        VisitorId::new("visitor_bob"),
        &config,
    );

    // Relay the store's changes into bob's push stream.
    let (tx, script) = Script::feed();
    let mut changes = store.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = changes.recv().await {
            let Ok(raw) = event.to_named() else { break };
            if tx.send(raw).is_err() {
                break;
            }
        }
    });

    let (mut channel, mut events) =
        PushChannel::new(ScriptedTransport::new([script]), ReconnectPolicy::from(&config));
    channel.connect().await;

    let photo = match ImageCompressor::default()
        .compress_image(&image::DynamicImage::new_rgb8(1024, 768))
    {
        Ok(compressed) => compressed.jpeg,
        Err(e) => {
            eprintln!("Failed to build demo photo: {e}");
            return;
        }
    };

    println!("\nAna publishes a photo...\n");
    ana.capture(photo);
    let created = match ana.publish("Ana").await {
        Ok(Some(entry)) => entry,
        Ok(None) => {
            eprintln!("Store did not echo the entry");
            return;
        }
        Err(e) => {
            eprintln!("Publish failed: {e}");
            return;
        }
    };

    if let Some(event) = events.recv().await {
        println!("Bob: {:?}", bob.handle_push(event).await);
    }
    for toast in bob.notifier().toasts() {
        println!("Bob sees a toast: {}", toast.message);
    }

    println!("\nAna deletes it again...\n");
    if let Err(e) = ana.delete(&created.id).await {
        eprintln!("Delete failed: {e}");
        return;
    }
    if let Some(event @ PushEvent::DeleteEntry(_)) = events.recv().await {
        println!("Bob: {:?}", bob.handle_push(event).await);
    }

    channel.disconnect().await;
    println!("\nBob's guestbook now shows {} photos", bob.view().count());
}
