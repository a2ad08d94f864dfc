pub mod attendance;
pub mod config;
pub mod daemon;
pub mod del;
pub mod health;
pub mod init;
pub mod list;
pub mod log;
pub mod queue;
pub mod reset;
pub mod stats;
pub mod status;
pub mod sync;

use crate::models::record::AttendanceRecord;
use crate::ui::messages::{dimmed, sync_badge, warning};
use crate::utils::formatting::pad_right;
use std::io::{self, Write};

/// Ask a yes/no confirmation from the user
pub(crate) fn ask_confirmation(prompt: &str) -> bool {
    warning(prompt);
    print!("Confirm [y/N]: ");
    let _ = io::stdout().flush();

    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_ok() {
        matches!(s.trim().to_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}

pub(crate) fn print_records_header() {
    println!(
        "{} {} {} {} {} {}",
        pad_right("ID", 6),
        pad_right("DATE", 10),
        pad_right("TIME", 5),
        pad_right("TYPE", 9),
        pad_right("SYNC", 7),
        "LOCATION"
    );
}

pub(crate) fn print_record_row(rec: &AttendanceRecord) {
    let location = rec
        .location
        .as_ref()
        .map(|l| l.display_label())
        .unwrap_or_else(|| dimmed("-"));

    // badge carries ANSI codes: pad on the plain word
    let badge_pad = " ".repeat(7usize.saturating_sub(if rec.synced { 6 } else { 7 }));

    println!(
        "{} {} {} {} {}{} {}",
        pad_right(&rec.id.to_string(), 6),
        rec.date_str(),
        pad_right(&rec.time_str(), 5),
        pad_right(rec.kind.to_db_str(), 9),
        sync_badge(rec.synced),
        badge_pad,
        location
    );
}
