//! SQLite implementation of the flat transaction primitive.

use crate::txn::TransactionalConnection;
use rusqlite::Connection;
use serde::Deserialize;
use std::ops::{Deref, DerefMut};

/// Locking mode used for the real `BEGIN`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    /// Locks are acquired on first read/write.
    #[default]
    Deferred,
    /// Reserved write lock taken at `BEGIN`.
    Immediate,
    Exclusive,
}

impl TransactionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deferred => "deferred",
            Self::Immediate => "immediate",
            Self::Exclusive => "exclusive",
        }
    }

    fn begin_sql(self) -> &'static str {
        match self {
            Self::Deferred => "BEGIN DEFERRED;",
            Self::Immediate => "BEGIN IMMEDIATE;",
            Self::Exclusive => "BEGIN EXCLUSIVE;",
        }
    }
}

/// `rusqlite::Connection` plus the mode used to open transactions.
///
/// Derefs to the inner connection for statements.
#[derive(Debug)]
pub struct SqliteConnection {
    conn: Connection,
    mode: TransactionMode,
}

impl SqliteConnection {
    pub fn new(conn: Connection, mode: TransactionMode) -> Self {
        Self { conn, mode }
    }

    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

impl Deref for SqliteConnection {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl DerefMut for SqliteConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

impl TransactionalConnection for SqliteConnection {
    type Error = rusqlite::Error;

    fn begin_transaction(&mut self) -> Result<(), Self::Error> {
        self.conn.execute_batch(self.mode.begin_sql())
    }

    fn commit(&mut self) -> Result<(), Self::Error> {
        self.conn.execute_batch("COMMIT;")
    }

    fn rollback(&mut self) -> Result<(), Self::Error> {
        self.conn.execute_batch("ROLLBACK;")
    }
}

#[cfg(test)]
mod tests {
    use super::{SqliteConnection, TransactionMode};
    use crate::txn::TransactionalConnection;
    use rusqlite::Connection;

    fn connection(mode: TransactionMode) -> SqliteConnection {
        SqliteConnection::new(
            Connection::open_in_memory().expect("open in-memory db"),
            mode,
        )
    }

    #[test]
    fn begin_and_commit_toggle_autocommit() {
        for mode in [
            TransactionMode::Deferred,
            TransactionMode::Immediate,
            TransactionMode::Exclusive,
        ] {
            let mut conn = connection(mode);
            assert!(conn.is_autocommit());

            conn.begin_transaction().expect("begin");
            assert!(!conn.is_autocommit(), "{mode:?}");

            conn.commit().expect("commit");
            assert!(conn.is_autocommit());
        }
    }

    #[test]
    fn rollback_discards_writes() {
        let mut conn = connection(TransactionMode::Deferred);
        conn.execute_batch("CREATE TABLE items (name TEXT NOT NULL);")
            .expect("create table");

        conn.begin_transaction().expect("begin");
        conn.execute("INSERT INTO items (name) VALUES ('draft');", [])
            .expect("insert");
        conn.rollback().expect("rollback");

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM items;", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 0);
    }

    #[test]
    fn nested_begin_is_rejected_by_sqlite() {
        let mut conn = connection(TransactionMode::Deferred);
        conn.begin_transaction().expect("begin");

        conn.begin_transaction()
            .expect_err("sqlite has no nested BEGIN");
    }

    #[test]
    fn commit_without_transaction_fails() {
        let mut conn = connection(TransactionMode::Deferred);
        conn.commit().expect_err("nothing to commit");
    }
}
