//! Guestbook CLI - headless client for the live guestbook.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use guestbook_core::GalleryTab;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod exit_codes;
mod utils;

use exit_codes::{ExitCode, EXIT_CODES_HELP};
use utils::ClientContext;

#[derive(Parser)]
#[command(name = "guestbook")]
#[command(author, version, about = "Shared visitor guestbook with live updates", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Guestbook server URL (defaults to GUESTBOOK_URL or http://127.0.0.1:3000)
    #[arg(long, global = true, value_name = "URL")]
    server: Option<String>,

    /// File holding the persisted visitor id
    #[arg(long, global = true, value_name = "PATH")]
    state_file: Option<PathBuf>,

    /// Only print essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show this client's visitor id, creating it on first use
    Whoami,

    /// List guestbook photos, newest first
    List {
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compress an image and add it to the guestbook
    Publish {
        /// Path to the image file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Name shown next to the photo (defaults to "Anonymous Visitor")
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Delete one of your own photos
    Delete {
        /// Id of the photo to delete
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Follow the guestbook live until Ctrl-C
    Watch {
        /// Gallery tab considered active (toasts only appear off the guestbook tab)
        #[arg(long, default_value_t = GalleryTab::Guestbook)]
        tab: GalleryTab,
    },
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "guestbook=debug,guestbook_core=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = ClientContext::new(cli.server, cli.state_file, cli.quiet);

    match cli.command {
        Commands::Whoami => commands::whoami::execute(&ctx),
        Commands::List { json } => commands::list::execute(&ctx, json).await,
        Commands::Publish { file, name } => commands::publish::execute(&ctx, file, name).await,
        Commands::Delete { id } => commands::delete::execute(&ctx, id).await,
        Commands::Watch { tab } => commands::watch::execute(&ctx, tab).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(err) = run(cli).await {
        let exit = ExitCode::from_anyhow(&err);
        if let Some(message) = exit.message {
            eprintln!("{} {}", "Error:".red().bold(), message);
        }
        std::process::exit(exit.code);
    }
}
