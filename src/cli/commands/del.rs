use crate::cli::commands::ask_confirmation;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::models::record::AttendanceRecord;
use crate::open_store;
use crate::ui::messages::{info, success};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Del { id, yes } = cmd {
        let store = open_store(cfg)?;
        let rec = store.get(*id)?;

        let prompt = format!(
            "Delete record #{} ({} on {} at {})? This action is irreversible.",
            rec.id,
            rec.kind.label(),
            rec.date_str(),
            rec.time_str()
        );
        if !*yes && !ask_confirmation(&prompt) {
            info("Operation cancelled.");
            return Ok(());
        }

        store.delete_record(*id)?;
        store.audit("del", &id.to_string(), &summary(&rec));
        success(format!("Record #{} has been deleted.", id));
    }

    Ok(())
}

fn summary(rec: &AttendanceRecord) -> String {
    format!(
        "Deleted {} of {} (synced: {})",
        rec.kind, rec.date_str(), rec.synced
    )
}
