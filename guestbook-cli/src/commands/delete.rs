//! Delete command implementation.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use guestbook_core::{EntryId, GalleryTab, StoreError};

use crate::utils::ClientContext;

/// Delete one of the local visitor's own entries.
pub async fn execute(ctx: &ClientContext, id: String) -> Result<()> {
    let id = EntryId::new(id);
    let mut session = ctx.session(GalleryTab::Guestbook)?;

    match session.delete(&id).await {
        Ok(()) => {}
        Err(StoreError::Rejected(message)) => bail!("Delete rejected: {message}"),
        Err(e) => return Err(e).context("Failed to delete photo"),
    }

    if !ctx.quiet {
        println!("{} {}", "Deleted".green().bold(), id.to_string().cyan());
    }
    Ok(())
}
