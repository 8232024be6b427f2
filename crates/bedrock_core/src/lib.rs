//! Core runtime pieces for Bedrock applications.
//! Layered configuration resolution and nested transaction scopes.

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod logging;
pub mod txn;

pub use bootstrap::{init_logging_from, layered_resolver, transaction_manager_from, BootstrapError};
pub use config::{
    ConfigError, ConfigGroup, ConfigReader, ConfigResolver, ConfigResult, EnvReader, FileReader,
    MemoryReader, SharedConfigResolver,
};
pub use db::{open_db, open_db_in_memory, DbError, DbResult, DbSettings, SqliteConnection};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings};
pub use txn::{TransactionError, TransactionManager, TransactionalConnection, TxOperation, TxResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
