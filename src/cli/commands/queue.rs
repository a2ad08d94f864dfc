use crate::config::Config;
use crate::errors::AppResult;
use crate::open_store;
use crate::ui::messages::info;
use crate::utils::formatting::pad_right;
use chrono::{DateTime, Local, Utc};

pub fn handle(cfg: &Config) -> AppResult<()> {
    let store = open_store(cfg)?;
    let pending = store.pending_requests()?;

    if pending.is_empty() {
        info("No offline requests queued.");
        return Ok(());
    }

    println!(
        "{} {} {} {} URL",
        pad_right("ID", 6),
        pad_right("QUEUED AT", 19),
        pad_right("METHOD", 6),
        pad_right("RECORD", 6)
    );
    for req in &pending {
        let queued = DateTime::<Utc>::from_timestamp_millis(req.timestamp)
            .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| req.timestamp.to_string());
        let record = req
            .record_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{} {} {} {} {}",
            pad_right(&req.id.to_string(), 6),
            pad_right(&queued, 19),
            pad_right(&req.method, 6),
            pad_right(&record, 6),
            req.url
        );
    }
    Ok(())
}
