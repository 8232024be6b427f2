//! Connection bootstrap utilities for SQLite.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Every open attempt emits one `db_open` start event and one outcome event.

use super::{DbResult, DbSettings, SqliteConnection};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens a SQLite database file with default settings.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<SqliteConnection> {
    let settings = DbSettings {
        path: Some(path.as_ref().to_path_buf()),
        ..DbSettings::default()
    };
    open_with_settings(&settings)
}

/// Opens an in-memory SQLite database with default settings.
pub fn open_db_in_memory() -> DbResult<SqliteConnection> {
    open_with_settings(&DbSettings::default())
}

/// Opens a connection as described by `settings`.
///
/// # Side effects
/// - Emits `db_open` logging events with mode, duration and status.
pub fn open_with_settings(settings: &DbSettings) -> DbResult<SqliteConnection> {
    let started_at = Instant::now();
    let mode = if settings.path.is_some() { "file" } else { "memory" };
    info!("event=db_open module=db status=start mode={}", mode);

    let opened = match settings.path.as_deref() {
        Some(path) => Connection::open(path),
        None => Connection::open_in_memory(),
    };
    let conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    if let Err(err) = configure_connection(&conn, settings.busy_timeout_ms) {
        error!(
            "event=db_open module=db status=error mode={} duration_ms={} error_code=db_configure_failed error={}",
            mode,
            started_at.elapsed().as_millis(),
            err
        );
        return Err(err.into());
    }

    info!(
        "event=db_open module=db status=ok mode={} tx_mode={} duration_ms={}",
        mode,
        settings.transaction_mode.as_str(),
        started_at.elapsed().as_millis()
    );
    Ok(SqliteConnection::new(conn, settings.transaction_mode))
}

fn configure_connection(conn: &Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
    Ok(())
}
