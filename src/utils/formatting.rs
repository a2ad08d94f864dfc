//! Formatting utilities used for CLI outputs.

/// `"Xh Ym"`: whole hours, remaining minutes rounded.
pub fn format_duration(minutes: f64) -> String {
    let minutes = minutes.max(0.0);
    let mut hours = (minutes / 60.0).floor() as i64;
    let mut mins = (minutes % 60.0).round() as i64;

    if mins == 60 {
        hours += 1;
        mins = 0;
    }

    format!("{}h {}m", hours, mins)
}

pub fn pad_right(s: &str, width: usize) -> String {
    format!("{:<width$}", s, width = width)
}
