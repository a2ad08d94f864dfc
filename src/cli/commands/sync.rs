use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::sync::background::{BackgroundSync, replay_pending};
use crate::sync::engine::SyncNowOutcome;
use crate::ui::messages::{info, success, warning};
use crate::{connect, open_store};

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Sync {
        full,
        download,
        replay,
    } = cmd
    else {
        return Ok(());
    };

    let engine = connect(cfg, open_store(cfg)?).await;
    if !engine.is_online() {
        return Err(AppError::Offline(format!(
            "server {} is not reachable",
            cfg.api_endpoint
        )));
    }

    if *full {
        let report = engine.perform_full_sync().await?;
        success(format!(
            "Full sync completed: {} downloaded ({} new), {} uploaded",
            report.downloaded, report.inserted, report.uploaded
        ));
        return Ok(());
    }

    if *download {
        let before = engine.store().record_count()?;
        let records = engine.download_records().await?;
        let inserted = engine.store().record_count()? - before;
        success(format!(
            "Downloaded {} records ({} new)",
            records.len(),
            inserted
        ));
        return Ok(());
    }

    if *replay {
        let report = replay_pending(&engine).await?;
        print_replay(report.replayed, report.remaining);
        return Ok(());
    }

    // default: what the background trigger does on reconnect
    let trigger = BackgroundSync::attach(&engine);
    let pass = trigger.run_once().await?;
    print_replay(pass.replay.replayed, pass.replay.remaining);
    info(format!("Upload: {}", describe(&pass.outcome)));

    let status = engine.status()?;
    if status.unsynced == 0 {
        success("All records are synced");
    } else {
        warning(format!("{} records are still unsynced", status.unsynced));
    }
    Ok(())
}

fn print_replay(replayed: usize, remaining: usize) {
    if replayed > 0 {
        info(format!("Replayed {} offline requests", replayed));
    }
    if remaining > 0 {
        warning(format!("{} offline requests are still queued", remaining));
    }
}

pub(crate) fn describe(outcome: &SyncNowOutcome) -> String {
    match outcome {
        SyncNowOutcome::AlreadyRunning => "a sync pass is already running".to_string(),
        SyncNowOutcome::Offline => "offline".to_string(),
        SyncNowOutcome::NothingToSync => "nothing to sync".to_string(),
        SyncNowOutcome::Completed(report) => format!(
            "{} of {} records synced, {} failed",
            report.synced,
            report.attempted,
            report.failed.len()
        ),
    }
}
