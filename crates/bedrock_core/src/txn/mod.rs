//! Nested transaction scopes over a flat transactional connection.
//!
//! # Responsibility
//! - Define the connection capability the manager drives.
//! - Emulate nested scopes with a depth counter, without savepoints.
//!
//! # Invariants
//! - Only the outermost `begin`/`commit`/`rollback` reaches the connection.
//! - A failed real begin/commit/rollback leaves the depth unchanged.
//! - `commit`/`rollback` at depth 0 fail fast instead of going negative.
//!
//! # Concurrency
//! One manager per unit of work. All mutations take `&mut self`; sharing a
//! manager across threads is unsupported, give each worker its own connection.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod manager;

pub use manager::TransactionManager;

/// Connection primitive supporting one flat transaction at a time.
pub trait TransactionalConnection {
    type Error: Error + 'static;

    fn begin_transaction(&mut self) -> Result<(), Self::Error>;
    fn commit(&mut self) -> Result<(), Self::Error>;
    fn rollback(&mut self) -> Result<(), Self::Error>;
}

/// Scope operation names used in errors and log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOperation {
    Begin,
    Commit,
    Rollback,
}

impl TxOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Commit => "commit",
            Self::Rollback => "rollback",
        }
    }
}

impl Display for TxOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type TxResult<T, E> = Result<T, TransactionError<E>>;

/// Transaction scope errors.
#[derive(Debug)]
pub enum TransactionError<E> {
    /// The connection failed a real begin/commit/rollback; kept verbatim.
    Underlying(E),
    /// `commit` or `rollback` with no open scope.
    UnbalancedCall { operation: TxOperation },
}

impl<E> TransactionError<E> {
    /// Returns the connection error, if this is one.
    pub fn underlying(&self) -> Option<&E> {
        match self {
            Self::Underlying(err) => Some(err),
            Self::UnbalancedCall { .. } => None,
        }
    }

    pub fn into_underlying(self) -> Option<E> {
        match self {
            Self::Underlying(err) => Some(err),
            Self::UnbalancedCall { .. } => None,
        }
    }
}

impl<E: Display> Display for TransactionError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Underlying(err) => write!(f, "{err}"),
            Self::UnbalancedCall { operation } => {
                write!(f, "{operation} called with no open transaction scope")
            }
        }
    }
}

impl<E: Error + 'static> Error for TransactionError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Underlying(err) => Some(err),
            Self::UnbalancedCall { .. } => None,
        }
    }
}
