use crate::config::Config;
use crate::errors::AppResult;
use crate::utils::{date, format_duration};
use crate::{controller, local_engine, open_store};

pub fn handle(cfg: &Config) -> AppResult<()> {
    let ctl = controller(cfg, local_engine(cfg, open_store(cfg)?))?;
    let stats = ctl.stats()?;

    let today = date::today();
    let (week_start, week_end) = date::week_bounds(today);

    println!(
        "📅 Today ({})            : {}",
        today,
        format_duration(stats.today_minutes)
    );
    println!(
        "🗓️  Week ({} → {}) : {}",
        week_start,
        week_end,
        format_duration(stats.week_minutes)
    );
    println!("☁️  Unsynced records       : {}", stats.unsynced);
    Ok(())
}
