//! SQLite connection bootstrap and transactional adapter.
//!
//! # Responsibility
//! - Open and configure SQLite connections from typed settings.
//! - Expose SQLite as a flat `TransactionalConnection` for the txn manager.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and a busy timeout set.
//! - Transactions are only opened through `TransactionManager`, never with
//!   ad-hoc `BEGIN` statements on the same connection.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod connection;
mod open;

pub use connection::{SqliteConnection, TransactionMode};
pub use open::{open_db, open_db_in_memory, open_with_settings};

pub type DbResult<T> = Result<T, DbError>;

/// Configuration group consumed by [`open_with_settings`].
pub const DB_CONFIG_GROUP: &str = "db";

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Connection settings read from the `db` configuration group.
///
/// Every field is optional in the source; absent `path` means in-memory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbSettings {
    pub path: Option<PathBuf>,
    pub busy_timeout_ms: u64,
    pub transaction_mode: TransactionMode,
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            transaction_mode: TransactionMode::default(),
        }
    }
}
