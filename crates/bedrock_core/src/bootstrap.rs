//! Startup wiring between configuration, logging and the database layer.
//!
//! # Responsibility
//! - Build the standard layered resolver (shared base, then per-environment).
//! - Turn the `log` and `db` groups into an active logger and a
//!   `TransactionManager` over SQLite.
//!
//! The resolver and the transaction manager stay independent; only this
//! module knows about both.

use crate::config::{ConfigError, ConfigResolver, FileReader};
use crate::db::{open_with_settings, DbError, DbSettings, SqliteConnection, DB_CONFIG_GROUP};
use crate::logging::{init_logging_with, LogSettings, LOG_CONFIG_GROUP};
use crate::txn::TransactionManager;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug)]
pub enum BootstrapError {
    Config(ConfigError),
    Db(DbError),
    Logging(String),
}

impl Display for BootstrapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Logging(message) => write!(f, "logging setup failed: {message}"),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Logging(_) => None,
        }
    }
}

impl From<ConfigError> for BootstrapError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for BootstrapError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Resolver reading `<config_dir>/<group>.{toml,json}`, overridden by
/// `<config_dir>/<environment>/<group>.{toml,json}` when an environment is set.
pub fn layered_resolver(config_dir: impl AsRef<Path>, environment: Option<&str>) -> ConfigResolver {
    let config_dir = config_dir.as_ref();
    let mut resolver = ConfigResolver::new();
    resolver.attach(Arc::new(FileReader::new(config_dir)), true);
    if let Some(environment) = environment.map(str::trim).filter(|env| !env.is_empty()) {
        resolver.attach(Arc::new(FileReader::new(config_dir.join(environment))), true);
    }
    resolver
}

/// Starts file logging from the `log` group. Returns whether logging is on.
pub fn init_logging_from(resolver: &ConfigResolver) -> Result<bool, BootstrapError> {
    let settings: LogSettings = resolver.load_as(LOG_CONFIG_GROUP)?;
    init_logging_with(&settings).map_err(BootstrapError::Logging)
}

/// Opens the connection described by the `db` group and wraps it in a
/// transaction manager.
pub fn transaction_manager_from(
    resolver: &ConfigResolver,
) -> Result<TransactionManager<SqliteConnection>, BootstrapError> {
    let settings: DbSettings = resolver.load_as(DB_CONFIG_GROUP)?;
    let connection = open_with_settings(&settings)?;
    info!(
        "event=bootstrap_db module=bootstrap status=ok tx_mode={} in_memory={}",
        settings.transaction_mode.as_str(),
        settings.path.is_none()
    );
    Ok(TransactionManager::new(connection))
}
