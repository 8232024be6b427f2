//! Layered configuration resolution.
//!
//! # Responsibility
//! - Merge named configuration groups from an ordered set of readers.
//! - Cache merged groups until the reader set changes.
//!
//! # Invariants
//! - Later-attached readers win on key conflicts; nested mappings merge per key.
//! - Any `attach`/`detach` clears the whole cache.
//! - Reader failures propagate unchanged; nothing is retried.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod env_reader;
mod merge;
mod reader;
mod resolver;

pub use env_reader::EnvReader;
pub use merge::{deep_merge, lookup};
pub use reader::{ConfigReader, FileReader, MemoryReader};
pub use resolver::{ConfigResolver, SharedConfigResolver};

/// Merged key/value content of one configuration group.
pub type ConfigGroup = Map<String, Value>;

pub type ConfigResult<T> = Result<T, ConfigError>;

static GROUP_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.\-]*$").expect("valid group name regex"));

/// Configuration resolution and reader errors.
#[derive(Debug)]
pub enum ConfigError {
    /// `load` was called before any reader was attached.
    NoReaders,
    /// Group name is blank or not an identifier.
    InvalidGroupName(String),
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        message: String,
    },
    /// Source decoded fine but its top level is not a key/value mapping.
    NotAMapping {
        path: PathBuf,
    },
    /// Merged group could not be deserialized into the requested type.
    Decode {
        group: String,
        source: serde_json::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoReaders => write!(f, "no configuration readers attached"),
            Self::InvalidGroupName(name) => write!(f, "invalid configuration group name: `{name}`"),
            Self::Read { path, source } => {
                write!(f, "failed to read config file {}: {source}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "failed to parse config file {}: {message}", path.display())
            }
            Self::NotAMapping { path } => write!(
                f,
                "config file {} must contain a key/value mapping at the top level",
                path.display()
            ),
            Self::Decode { group, source } => {
                write!(f, "failed to decode configuration group `{group}`: {source}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Decode { source, .. } => Some(source),
            Self::NoReaders
            | Self::InvalidGroupName(_)
            | Self::Parse { .. }
            | Self::NotAMapping { .. } => None,
        }
    }
}

/// Rejects blank names and anything that is not a plain identifier.
///
/// Names double as file stems for [`FileReader`], so path separators and
/// `..` are refused here rather than in each reader.
pub fn validate_group_name(name: &str) -> ConfigResult<()> {
    if name.trim().is_empty() || !GROUP_NAME_RE.is_match(name) || name.contains("..") {
        return Err(ConfigError::InvalidGroupName(name.to_string()));
    }
    Ok(())
}
