//! Whoami command implementation.

use anyhow::Result;
use colored::Colorize;

use crate::utils::ClientContext;

/// Print the persisted visitor id, creating it on first use.
pub fn execute(ctx: &ClientContext) -> Result<()> {
    let visitor = ctx.visitor()?;

    if ctx.quiet {
        println!("{visitor}");
    } else {
        println!("{} {}", "Visitor id:".dimmed(), visitor.to_string().bold());
        println!("{} {}", "State file:".dimmed(), ctx.state_file.display());
    }
    Ok(())
}
