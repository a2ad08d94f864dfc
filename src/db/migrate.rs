use crate::errors::{AppError, AppResult};
use rusqlite::{Connection, OptionalExtension};

/// Ordered list of schema migrations: (version, description, SQL).
///
/// Each migration runs once; applied versions are recorded in the `log`
/// table as `migration_applied` rows.
const MIGRATIONS: &[(&str, &str, &str)] = &[
    (
        "20250301_0001_create_attendance",
        "Created attendance table",
        r#"
        CREATE TABLE IF NOT EXISTS attendance (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            type        TEXT    NOT NULL CHECK(type IN ('check-in','check-out')),
            timestamp   INTEGER NOT NULL,
            date        TEXT    NOT NULL,
            location    TEXT,
            synced      INTEGER NOT NULL DEFAULT 0 CHECK(synced IN (0,1)),
            created_at  TEXT    NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_attendance_date      ON attendance(date);
        CREATE INDEX IF NOT EXISTS idx_attendance_type      ON attendance(type);
        CREATE INDEX IF NOT EXISTS idx_attendance_synced    ON attendance(synced);
        CREATE INDEX IF NOT EXISTS idx_attendance_timestamp ON attendance(timestamp);
        "#,
    ),
    (
        "20250301_0002_create_offline_requests",
        "Created offline request queue",
        r#"
        CREATE TABLE IF NOT EXISTS offline_requests (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            url        TEXT    NOT NULL,
            method     TEXT    NOT NULL,
            payload    TEXT    NOT NULL,
            timestamp  INTEGER NOT NULL
        );
        "#,
    ),
    (
        "20250301_0003_create_settings",
        "Created settings table",
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key    TEXT PRIMARY KEY,
            value  TEXT NOT NULL
        );
        "#,
    ),
    (
        "20250412_0004_offline_request_record_link",
        "Linked offline requests to attendance records",
        r#"
        ALTER TABLE offline_requests ADD COLUMN record_id INTEGER;
        CREATE INDEX IF NOT EXISTS idx_offline_requests_record ON offline_requests(record_id);
        "#,
    ),
];

/// Ensure that the `log` table exists. Migrations are tracked in it, so it
/// is created outside the versioned list.
fn ensure_log_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )
}

fn is_applied(conn: &Connection, version: &str) -> rusqlite::Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn apply(conn: &Connection, version: &str, description: &str, sql: &str) -> AppResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(sql)
        .map_err(|e| AppError::Migration(format!("{}: {}", version, e)))?;

    tx.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [version, description],
    )?;

    tx.commit()?;

    tracing::info!(version, "migration applied");
    Ok(())
}

/// Public entry point: run all pending migrations.
///
/// Invoked by db::init_db().
pub fn run_pending_migrations(conn: &Connection) -> AppResult<()> {
    ensure_log_table(conn)?;

    for (version, description, sql) in MIGRATIONS {
        if !is_applied(conn, version)? {
            apply(conn, version, description, sql)?;
        }
    }

    Ok(())
}

/// Versions recorded as applied, in application order.
pub fn applied_versions(conn: &Connection) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT target FROM log WHERE operation = 'migration_applied' ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
