use ansi_term::{Colour, Style};
use std::fmt;

const ICON_INFO: &str = "ℹ️";
const ICON_OK: &str = "✅";
const ICON_WARN: &str = "⚠️";
const ICON_ERR: &str = "❌";

pub fn info<T: fmt::Display>(msg: T) {
    println!("{} {}", Colour::Blue.bold().paint(ICON_INFO), msg);
}

pub fn success<T: fmt::Display>(msg: T) {
    println!("{} {}", Colour::Green.bold().paint(ICON_OK), msg);
}

pub fn warning<T: fmt::Display>(msg: T) {
    println!("{} {}", Colour::Yellow.bold().paint(ICON_WARN), msg);
}

pub fn error<T: fmt::Display>(msg: T) {
    eprintln!("{} {}", Colour::Red.bold().paint(ICON_ERR), msg);
}

/// Formatted section header
pub fn header<T: fmt::Display>(msg: T) {
    println!(
        "{}\n",
        Colour::Blue
            .bold()
            .paint(format!("====================== {}", msg))
    );
}

/// `online` / `offline`, coloured.
pub fn connectivity(online: bool) -> String {
    if online {
        Colour::Green.paint("online").to_string()
    } else {
        Colour::Red.paint("offline").to_string()
    }
}

/// `synced` / `pending`, coloured.
pub fn sync_badge(synced: bool) -> String {
    if synced {
        Colour::Green.paint("synced").to_string()
    } else {
        Colour::Yellow.paint("pending").to_string()
    }
}

pub fn dimmed<T: fmt::Display>(msg: T) -> String {
    Style::new().dimmed().paint(msg.to_string()).to_string()
}
