//! List command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use guestbook_core::GalleryTab;
use tracing::info;

use crate::utils::{format_timestamp, ClientContext};

/// Print the guestbook newest-first, marking the local visitor's entries.
pub async fn execute(ctx: &ClientContext, json: bool) -> Result<()> {
    let mut session = ctx.session(GalleryTab::Guestbook)?;
    let count = session
        .reload()
        .await
        .context("Failed to load guestbook")?;
    info!(count, "Guestbook loaded");

    if json {
        let entries: Vec<_> = session.view().entries().collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if session.view().shows_empty_placeholder() {
        if !ctx.quiet {
            println!("{}", "No photos yet. Be the first to add one!".dimmed());
        }
        return Ok(());
    }

    if !ctx.quiet {
        println!(
            "{} {}",
            "Guestbook".bold(),
            format!("({count} photos)").dimmed()
        );
        println!();
    }

    for tile in session.view().tiles() {
        let entry = &tile.entry;
        let marker = if tile.own {
            "(you)".green().to_string()
        } else {
            String::new()
        };
        println!(
            "  {}  {}  {} {}",
            entry.id.to_string().cyan(),
            format_timestamp(&entry.created_at).dimmed(),
            entry.visitor_name,
            marker
        );
    }
    Ok(())
}
