//! Watch command implementation.
//!
//! Runs a live session in the terminal: the push channel feeds the session,
//! deferred cues and toast expiry run on tokio timers, and the list is
//! periodically reconciled against the server.

use anyhow::{Context, Result};
use colored::Colorize;
use guestbook_core::{
    ConnectionState, ConnectionStatus, Deferred, DeferredAction, GalleryTab, PushChannel,
    PushOutcome, ReconnectPolicy, SseTransport,
};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{Instant, Interval};
use tracing::{debug, info, warn};

use crate::utils::{CliSession, ClientContext};

pub async fn execute(ctx: &ClientContext, tab: GalleryTab) -> Result<()> {
    let mut session = ctx.session(tab)?;
    let transport = SseTransport::new(&ctx.config.server_url)
        .context("Failed to configure push channel")?;
    let (mut channel, mut events) =
        PushChannel::new(transport, ReconnectPolicy::from(&ctx.config));
    let mut status = channel.subscribe_status();

    if !ctx.quiet {
        println!(
            "{} {} {}",
            "Watching".bold(),
            ctx.config.server_url.cyan(),
            format!("as {} on the {tab} tab (Ctrl-C to stop)", session.visitor()).dimmed()
        );
    }

    match session.reload().await {
        Ok(count) => report_count(ctx, count),
        Err(e) => warn!(error = %e, "Initial load failed, waiting for the push channel"),
    }

    channel.connect().await;

    let (fired_tx, mut fired) = mpsc::unbounded_channel::<DeferredAction>();
    let mut timers = JoinSet::new();
    let mut resync = ctx
        .config
        .resync_interval
        .filter(|period| !period.is_zero())
        .map(|period| tokio::time::interval_at(Instant::now() + period, period));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                break;
            }
            Some(event) = events.recv() => {
                let outcome = session.handle_push(event).await;
                report(ctx, &session, &outcome);
                schedule(&mut timers, &fired_tx, session.take_deferred());
            }
            Some(action) = fired.recv() => {
                let changed = session.fire(&action);
                debug!(?action, changed, "Deferred action fired");
            }
            Ok(()) = status.changed() => {
                let current = *status.borrow_and_update();
                report_status(ctx, current);
            }
            () = tick(&mut resync) => {
                match session.reload().await {
                    Ok(count) => debug!(count, "Periodic resync"),
                    Err(e) => warn!(error = %e, "Periodic resync failed"),
                }
            }
            Some(joined) = timers.join_next(), if !timers.is_empty() => {
                if let Err(e) = joined {
                    debug!(error = %e, "Timer task ended abnormally");
                }
            }
        }
    }

    channel.disconnect().await;
    timers.shutdown().await;
    info!("Watch stopped");
    if !ctx.quiet {
        println!();
        println!("{}", "Disconnected.".dimmed());
    }
    Ok(())
}

/// Run each deferred action after its delay by sending it back to the loop.
fn schedule(
    timers: &mut JoinSet<()>,
    fired: &mpsc::UnboundedSender<DeferredAction>,
    deferred: Vec<Deferred>,
) {
    for Deferred { after, action } in deferred {
        let fired = fired.clone();
        timers.spawn(async move {
            tokio::time::sleep(after).await;
            let _ = fired.send(action);
        });
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn report_count(ctx: &ClientContext, count: usize) {
    if !ctx.quiet {
        println!("{}", format!("{count} photos in the guestbook").dimmed());
    }
}

fn report(ctx: &ClientContext, session: &CliSession, outcome: &PushOutcome) {
    match outcome {
        PushOutcome::Resynced(count) => report_count(ctx, *count),
        PushOutcome::ResyncFailed(e) => warn!(error = %e, "Reload after reconnect failed"),
        PushOutcome::Inserted {
            entry_id,
            own,
            toast,
        } => {
            if let Some(toast) = toast.and_then(|id| {
                session.notifier().toasts().iter().find(|t| t.id == id)
            }) {
                // shown in quiet mode too
                println!("{} {}", "*".yellow().bold(), toast.message.bold());
            }
            if !ctx.quiet {
                let who = if *own { "you".green() } else { "another visitor".normal() };
                println!(
                    "{} {} {}",
                    "+".green().bold(),
                    entry_id.to_string().cyan(),
                    format!("added by {who} ({} total)", session.view().count()).dimmed()
                );
            }
        }
        PushOutcome::Removed(entry_id) => {
            if !ctx.quiet {
                println!(
                    "{} {} {}",
                    "-".red().bold(),
                    entry_id.to_string().cyan(),
                    format!("removed ({} total)", session.view().count()).dimmed()
                );
            }
        }
        PushOutcome::Duplicate(id) | PushOutcome::Absent(id) => {
            debug!(entry_id = %id, "Push event already reflected");
        }
    }
}

fn report_status(ctx: &ClientContext, status: ConnectionStatus) {
    match status.state {
        ConnectionState::Open => info!("Push channel open"),
        ConnectionState::Erroring => warn!(
            attempt = status.reconnect_attempts,
            "Push channel lost, retrying"
        ),
        ConnectionState::Disconnected if status.reconnect_attempts > 0 => {
            if !ctx.quiet {
                eprintln!(
                    "{} {}",
                    "Live updates stopped:".red().bold(),
                    format!(
                        "gave up after {} attempts; the list still resyncs every {}s",
                        status.reconnect_attempts,
                        ctx.config
                            .resync_interval
                            .map(|p| p.as_secs())
                            .unwrap_or_default()
                    )
                    .dimmed()
                );
            }
        }
        _ => {}
    }
}
