//! Publish command implementation.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use guestbook_core::{GalleryTab, PublishError};
use tracing::info;

use crate::utils::{read_input, ClientContext};

/// Capture an image file, compress it and add it to the guestbook.
pub async fn execute(ctx: &ClientContext, file: PathBuf, name: Option<String>) -> Result<()> {
    let image = read_input(&file)?;
    info!(path = %file.display(), bytes = image.len(), "Read file");

    let mut session = ctx.session(GalleryTab::Guestbook)?;
    session.capture(image);

    let created = match session.publish(name.as_deref().unwrap_or_default()).await {
        Ok(created) => created,
        Err(PublishError::ServerRejected(message)) => bail!("Upload rejected: {message}"),
        Err(e) => return Err(e).context("Failed to publish photo"),
    };

    match created {
        Some(entry) if ctx.quiet => println!("{}", entry.id),
        Some(entry) => {
            println!("{} {}", "Published".green().bold(), entry.id.to_string().cyan());
            println!("   {} {}", "Name:".dimmed(), entry.visitor_name);
            println!("   {} {}", "Image:".dimmed(), entry.image_url);
        }
        None if ctx.quiet => {}
        None => println!("{}", "Published".green().bold()),
    }
    Ok(())
}
