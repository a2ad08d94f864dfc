use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::sync::background::{BackgroundSync, spawn_periodic};
use crate::sync::events::SyncEvent;
use crate::ui::messages::{info, success, warning};
use crate::{connect, open_store};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

fn announce(event: &SyncEvent) {
    match event {
        SyncEvent::ConnectivityChanged { online: true } => success("Connection restored"),
        SyncEvent::ConnectivityChanged { online: false } => {
            warning("Connection lost: records will be saved offline")
        }
        SyncEvent::SyncFinished { report } if !report.is_success() => warning(format!(
            "{} of {} records could not be synced",
            report.failed.len(),
            report.attempted
        )),
        SyncEvent::SyncComplete { replayed, remaining } => info(format!(
            "Background sync completed ({} replayed, {} still queued)",
            replayed, remaining
        )),
        _ => {}
    }
}

/// Probe connectivity every `interval` seconds; reconnects trigger a
/// background sync, and a periodic pass runs every `sync_interval_secs`.
/// Runs until Ctrl-C.
pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Daemon { interval } = cmd else {
        return Ok(());
    };
    let interval = Duration::from_secs((*interval).max(1));

    let engine = connect(cfg, open_store(cfg)?).await;
    let mut events = engine.subscribe();
    let trigger = BackgroundSync::spawn(&engine);

    info(format!(
        "Watching {} every {}s, syncing every {}s (Ctrl-C to stop)",
        cfg.api_endpoint,
        interval.as_secs(),
        cfg.sync_interval().as_secs()
    ));

    // already online at startup: drain whatever is pending
    if engine.is_online() {
        engine.schedule_sync().await;
    }
    let periodic = spawn_periodic(&engine, cfg.sync_interval());

    let mut ticker = tokio::time::interval(interval);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                engine.probe_connectivity().await;
            }
            event = events.recv() => match event {
                Ok(ev) => announce(&ev),
                Err(RecvError::Lagged(n)) => {
                    tracing::debug!(skipped = n, "event subscriber lagged")
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut ctrl_c => {
                info("Stopping daemon");
                break;
            }
        }
    }

    periodic.abort();
    trigger.abort();
    Ok(())
}
