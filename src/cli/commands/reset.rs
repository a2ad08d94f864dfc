use crate::cli::commands::ask_confirmation;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::open_store;
use crate::ui::messages::{info, success};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Reset { yes } = cmd {
        if !*yes
            && !ask_confirmation(
                "Delete ALL attendance records and queued requests? This action is irreversible.",
            )
        {
            info("Operation cancelled.");
            return Ok(());
        }

        let store = open_store(cfg)?;
        let records = store.record_count()?;
        store.clear()?;
        store.audit("reset", "all", &format!("Deleted {} records", records));

        success(format!("Deleted {} records.", records));
    }

    Ok(())
}
