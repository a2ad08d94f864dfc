use crate::config::Config;
use crate::errors::AppResult;
use crate::models::record::AttendanceRecord;
use crate::ui::messages::{info, success, warning};
use crate::{connect, controller, open_store};

pub async fn check_in(cfg: &Config) -> AppResult<()> {
    let engine = connect(cfg, open_store(cfg)?).await;
    let mut ctl = controller(cfg, engine)?;

    let rec = ctl.check_in().await?;
    success(format!("Checked in at {}", rec.time_str()));
    report(&rec);
    Ok(())
}

pub async fn check_out(cfg: &Config) -> AppResult<()> {
    let engine = connect(cfg, open_store(cfg)?).await;
    let mut ctl = controller(cfg, engine)?;

    let rec = ctl.check_out().await?;
    success(format!("Checked out at {}", rec.time_str()));
    report(&rec);

    if let Some(km) = ctl.session_distance_km(&rec)?
        && km >= 0.1
    {
        info(format!("Distance from check-in: {:.1} km", km));
    }

    let stats = ctl.stats()?;
    info(format!(
        "Worked today: {}",
        crate::utils::format_duration(stats.today_minutes)
    ));
    Ok(())
}

fn report(rec: &AttendanceRecord) {
    if let Some(loc) = &rec.location {
        info(format!("Location: {}", loc.display_label()));
    }

    if rec.synced {
        info("Record synced with the server");
    } else {
        warning("Saved offline: the record will be synced when the server is reachable");
    }
}
