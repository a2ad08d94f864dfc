use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::migrate::applied_versions;
use crate::db::store::LocalStore;
use crate::errors::AppResult;
use crate::ui::messages::success;

/// Handle the `init` command
///
/// This initializes:
///  - the config directory (if missing)
///  - the configuration file (skipped in test mode)
///  - the SQLite database and all pending migrations
pub fn handle(cli: &Cli) -> AppResult<()> {
    let cfg = Config::init_all(cli.db.as_deref(), cli.test)?;

    println!("⚙️  Initializing rAttendance…");
    if !cli.test {
        println!("📄 Config file : {}", Config::config_file().display());
    }
    println!("🗄️  Database   : {}", &cfg.database);

    let store = LocalStore::open(&cfg.database)?;
    let versions = store.pool().with_conn(|conn| applied_versions(conn))?;
    println!("🧩 Migrations : {}", versions.join(", "));

    store.audit(
        "init",
        "Database initialized",
        &format!("Database initialized at {}", &cfg.database),
    );

    success(format!("Database initialized at {}", &cfg.database));
    Ok(())
}
