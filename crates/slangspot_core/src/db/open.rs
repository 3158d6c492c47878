//! Connection bootstrap.
//!
//! # Invariants
//! - Returned connections enforce foreign keys and wait up to
//!   [`BUSY_TIMEOUT`] on locks.
//! - File databases run in WAL mode so page reads do not block the
//!   request that is writing.
//! - Returned connections have migrations fully applied.
//! - Returned connections provide `unicode_lower(text)` for case-insensitive
//!   search over non-ASCII text.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{debug, error, warn};
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) a database file.
///
/// The HTTP layer calls this once per request, so the success path logs at
/// `debug` only.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with(Mode::File, || Connection::open(path))
}

/// Private in-memory database, used by tests and the CLI smoke checks.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with(Mode::Memory, Connection::open_in_memory)
}

#[derive(Clone, Copy)]
enum Mode {
    File,
    Memory,
}

impl Mode {
    fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Memory => "memory",
        }
    }
}

fn open_with(
    mode: Mode,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode_label = mode.as_str();

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode_label,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn, mode) {
        Ok(()) => {
            debug!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode_label,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode_label,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, mode: Mode) -> DbResult<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    register_functions(conn)?;
    if matches!(mode, Mode::File) {
        // journal_mode answers with the resulting mode, so it must be queried.
        let journal_mode: String =
            conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
        if !journal_mode.eq_ignore_ascii_case("wal") {
            warn!(
                "event=db_open module=db status=degraded journal_mode={}",
                journal_mode
            );
        }
    }
    apply_migrations(conn)
}

/// SQLite `lower()` and `LIKE` only fold ASCII letters.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::open_db_in_memory;

    #[test]
    fn unicode_lower_folds_spanish_letters() {
        let conn = open_db_in_memory().unwrap();
        let lowered: String = conn
            .query_row("SELECT unicode_lower('ÑAPA Él ACÁ')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(lowered, "ñapa él acá");

        let missing: Option<String> = conn
            .query_row("SELECT unicode_lower(NULL)", [], |row| row.get(0))
            .unwrap();
        assert!(missing.is_none());
    }
}
