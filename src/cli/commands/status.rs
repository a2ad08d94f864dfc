use crate::cli::commands::{print_record_row, print_records_header};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::controller::SessionState;
use crate::errors::AppResult;
use crate::ui::messages::{connectivity, header};
use crate::utils::format_duration;
use crate::{connect, controller, open_store};
use chrono::{DateTime, Local, Utc};

fn format_instant(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Status { recent } = cmd else {
        return Ok(());
    };

    let engine = connect(cfg, open_store(cfg)?).await;
    let ctl = controller(cfg, engine.clone())?;
    let status = engine.status()?;
    let stats = ctl.stats()?;

    header("Status");

    match ctl.state() {
        SessionState::Ready => println!("Session     : ready to check in"),
        SessionState::CheckedIn { since } => {
            println!("Session     : checked in since {}", format_instant(since))
        }
    }
    println!("Server      : {} ({})", connectivity(status.online), cfg.api_endpoint);
    println!(
        "Last sync   : {}",
        if status.last_sync_time == 0 {
            "never".to_string()
        } else {
            format_instant(status.last_sync_time)
        }
    );
    println!("Unsynced    : {}", status.unsynced);
    println!("Today       : {}", format_duration(stats.today_minutes));
    println!("This week   : {}", format_duration(stats.week_minutes));

    let records = ctl.recent(*recent)?;
    if !records.is_empty() {
        println!();
        print_records_header();
        for rec in &records {
            print_record_row(rec);
        }
    }

    Ok(())
}
