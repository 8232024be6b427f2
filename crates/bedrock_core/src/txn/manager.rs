//! Depth-counted transaction manager.
//!
//! State machine:
//! - IDLE (depth 0) --begin--> OPEN(1), real begin.
//! - OPEN(n) --begin--> OPEN(n+1), no I/O.
//! - OPEN(1) --commit|rollback--> IDLE, real commit/rollback.
//! - OPEN(n>1) --commit|rollback--> OPEN(n-1), no I/O.
//! - IDLE --commit|rollback--> error, state unchanged.

use super::{TransactionError, TransactionalConnection, TxOperation, TxResult};
use log::{debug, error, warn};

/// Reentrant transaction boundary over one connection.
///
/// Nested scopes are cooperative: an inner `rollback` only decrements the
/// depth, and the outcome reaching the connection is decided by the outermost
/// scope.
#[derive(Debug)]
pub struct TransactionManager<C: TransactionalConnection> {
    connection: C,
    depth: usize,
}

impl<C: TransactionalConnection> TransactionManager<C> {
    pub fn new(connection: C) -> Self {
        Self {
            connection,
            depth: 0,
        }
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether a real transaction is open.
    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    /// Releases the connection when no scope is open; otherwise hands the
    /// manager back unchanged.
    pub fn into_inner(self) -> Result<C, Self> {
        if self.depth > 0 {
            return Err(self);
        }
        Ok(self.connection)
    }

    /// Opens a scope. Only the outermost call starts a real transaction.
    pub fn begin(&mut self) -> TxResult<&mut Self, C::Error> {
        if self.depth == 0 {
            if let Err(err) = self.connection.begin_transaction() {
                error!(
                    "event=tx_begin module=txn status=error depth=0 error={}",
                    err
                );
                return Err(TransactionError::Underlying(err));
            }
            debug!("event=tx_begin module=txn status=ok depth=1 real=true");
        }

        self.depth += 1;
        Ok(self)
    }

    /// Closes a scope. Only the call at depth 1 commits for real; if that
    /// commit fails the depth stays at 1 so the caller can retry or roll back.
    pub fn commit(&mut self) -> TxResult<(), C::Error> {
        self.close_scope(TxOperation::Commit)
    }

    /// Closes a scope. Only the call at depth 1 rolls back for real.
    pub fn rollback(&mut self) -> TxResult<(), C::Error> {
        self.close_scope(TxOperation::Rollback)
    }

    /// Runs `f` inside one scope: commit on `Ok`, roll back on `Err`.
    ///
    /// If the closing commit fails at the outermost scope the transaction is
    /// rolled back before the commit error is returned. If a rollback issued
    /// here fails, its error is returned instead and the scope stays open at
    /// depth 1 for the caller to retry or roll back.
    pub fn transactional<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<TransactionError<C::Error>>,
    {
        self.begin()?;
        let entered_at = self.depth;

        match f(self) {
            Ok(value) => {
                if let Err(err) = self.commit() {
                    if entered_at == 1 && self.depth == 1 {
                        self.rollback_after_failure("commit_failed")?;
                    }
                    return Err(err.into());
                }
                Ok(value)
            }
            Err(err) => {
                self.rollback_after_failure("scope_error")?;
                Err(err)
            }
        }
    }

    fn close_scope(&mut self, operation: TxOperation) -> TxResult<(), C::Error> {
        match self.depth {
            0 => {
                warn!(
                    "event=tx_{} module=txn status=error depth=0 error_code=unbalanced_call",
                    operation
                );
                Err(TransactionError::UnbalancedCall { operation })
            }
            1 => {
                let result = if operation == TxOperation::Commit {
                    self.connection.commit()
                } else {
                    self.connection.rollback()
                };
                if let Err(err) = result {
                    error!(
                        "event=tx_{} module=txn status=error depth=1 error={}",
                        operation, err
                    );
                    return Err(TransactionError::Underlying(err));
                }

                self.depth = 0;
                debug!(
                    "event=tx_{} module=txn status=ok depth=0 real=true",
                    operation
                );
                Ok(())
            }
            _ => {
                self.depth -= 1;
                Ok(())
            }
        }
    }

    fn rollback_after_failure(&mut self, cause: &str) -> TxResult<(), C::Error> {
        if self.depth == 0 {
            return Ok(());
        }
        self.rollback().map_err(|err| {
            warn!(
                "event=tx_rollback module=txn status=error cause={} depth={}",
                cause, self.depth
            );
            err
        })
    }
}
