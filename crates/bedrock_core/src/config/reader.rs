//! Configuration reader contracts and built-in sources.
//!
//! # Responsibility
//! - Define the single-operation reader capability consumed by the resolver.
//! - Provide file-backed and in-memory sources.
//!
//! # Invariants
//! - An absent group is `Ok(None)`, never an error.
//! - Decoded sources must be mappings at the top level.

use super::{ConfigError, ConfigGroup, ConfigResult};
use log::debug;
use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A source of named configuration groups.
///
/// Readers are queried in priority order by [`super::ConfigResolver`] and are
/// treated as stateless by it.
pub trait ConfigReader: Send + Sync {
    /// Returns the group content, or `None` when this source has no such group.
    fn load(&self, group: &str) -> ConfigResult<Option<ConfigGroup>>;

    /// Short label used in diagnostics.
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Reader over groups held in memory, typically built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    groups: HashMap<String, ConfigGroup>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one group.
    pub fn with_group(mut self, name: impl Into<String>, group: ConfigGroup) -> Self {
        self.groups.insert(name.into(), group);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, group: ConfigGroup) {
        self.groups.insert(name.into(), group);
    }
}

impl ConfigReader for MemoryReader {
    fn load(&self, group: &str) -> ConfigResult<Option<ConfigGroup>> {
        Ok(self.groups.get(group).cloned())
    }

    fn describe(&self) -> String {
        format!("memory({} groups)", self.groups.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Toml,
    Json,
}

impl FileFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }

    fn decode(self, raw: &str, path: &Path) -> ConfigResult<Value> {
        let decoded = match self {
            Self::Toml => toml::from_str::<Value>(raw).map_err(|err| err.to_string()),
            Self::Json => serde_json::from_str::<Value>(raw).map_err(|err| err.to_string()),
        };
        decoded.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }
}

/// Lookup order when a group exists in more than one format.
const FILE_FORMATS: &[FileFormat] = &[FileFormat::Toml, FileFormat::Json];

/// Reader that maps group `name` to `<dir>/<name>.toml` or `<dir>/<name>.json`.
///
/// TOML takes precedence when both files exist.
#[derive(Debug, Clone)]
pub struct FileReader {
    dir: PathBuf,
}

impl FileReader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ConfigReader for FileReader {
    fn load(&self, group: &str) -> ConfigResult<Option<ConfigGroup>> {
        for format in FILE_FORMATS {
            let path = self.dir.join(format!("{group}.{}", format.extension()));
            let raw = match std::fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(source) => return Err(ConfigError::Read { path, source }),
            };

            debug!(
                "event=config_read module=config status=ok group={} path={}",
                group,
                path.display()
            );
            return match format.decode(&raw, &path)? {
                Value::Object(map) => Ok(Some(map)),
                _ => Err(ConfigError::NotAMapping { path }),
            };
        }

        Ok(None)
    }

    fn describe(&self) -> String {
        format!("file({})", self.dir.display())
    }
}
