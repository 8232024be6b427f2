//! Ordered reader set with cached deep-merged groups.
//!
//! # Responsibility
//! - Own the priority-ordered reader list for one process or test.
//! - Merge and cache groups on demand.
//!
//! # Invariants
//! - Reader order is attachment order; front insertions have lowest priority.
//! - A cache entry is valid iff no `attach`/`detach` happened since it was built.
//! - `load` never holds the cache lock while calling readers.

use super::merge::{deep_merge, lookup};
use super::{validate_group_name, ConfigError, ConfigGroup, ConfigReader, ConfigResult};
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Instant;

/// Priority-ordered configuration resolver.
///
/// Mutation (`attach`/`detach`) needs `&mut self`; `load` works through
/// `&self` so a resolver behind a `RwLock` serves concurrent reads. See
/// [`SharedConfigResolver`].
#[derive(Default)]
pub struct ConfigResolver {
    readers: Vec<Arc<dyn ConfigReader>>,
    cache: Mutex<HashMap<String, Arc<ConfigGroup>>>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `attach(reader, true)`.
    pub fn with_reader(mut self, reader: Arc<dyn ConfigReader>) -> Self {
        self.attach(reader, true);
        self
    }

    /// Inserts a reader at the end (highest priority) or at the front
    /// (lowest priority) and clears every cached group.
    pub fn attach(&mut self, reader: Arc<dyn ConfigReader>, append_to_end: bool) {
        let label = reader.describe();
        if append_to_end {
            self.readers.push(reader);
        } else {
            self.readers.insert(0, reader);
        }
        self.clear_cache();

        debug!(
            "event=config_attach module=config status=ok reader={} position={} readers={}",
            label,
            if append_to_end { "end" } else { "front" },
            self.readers.len()
        );
    }

    /// Same as `attach(reader, true)`.
    pub fn attach_reader(&mut self, reader: Arc<dyn ConfigReader>) {
        self.attach(reader, true);
    }

    /// Removes the first occurrence of `reader` by identity.
    ///
    /// The cache is cleared even when nothing was removed. Returns whether a
    /// reader was found.
    pub fn detach<R: ConfigReader + ?Sized>(&mut self, reader: &Arc<R>) -> bool {
        let target = Arc::as_ptr(reader) as *const ();
        let position = self
            .readers
            .iter()
            .position(|existing| Arc::as_ptr(existing) as *const () == target);

        let removed = match position {
            Some(index) => {
                self.readers.remove(index);
                true
            }
            None => false,
        };
        self.clear_cache();

        debug!(
            "event=config_detach module=config status=ok removed={} readers={}",
            removed,
            self.readers.len()
        );
        removed
    }

    /// Current readers in priority order, lowest first.
    pub fn readers(&self) -> &[Arc<dyn ConfigReader>] {
        &self.readers
    }

    /// Drops every cached group.
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    /// Number of groups currently cached.
    pub fn cached_groups(&self) -> usize {
        self.lock_cache().len()
    }

    /// Returns the merged content of `group`.
    ///
    /// # Errors
    /// - `NoReaders` when no reader is attached.
    /// - `InvalidGroupName` for blank or non-identifier names.
    /// - Any reader error, unchanged.
    pub fn load(&self, group: &str) -> ConfigResult<Arc<ConfigGroup>> {
        if self.readers.is_empty() {
            return Err(ConfigError::NoReaders);
        }
        validate_group_name(group)?;

        if let Some(cached) = self.lock_cache().get(group) {
            return Ok(Arc::clone(cached));
        }

        let started_at = Instant::now();
        let mut merged = ConfigGroup::new();
        let mut sources = 0usize;
        for reader in &self.readers {
            let Some(values) = reader.load(group)? else {
                continue;
            };
            if values.is_empty() {
                continue;
            }
            deep_merge(&mut merged, values);
            sources += 1;
        }

        let mut cache = self.lock_cache();
        // A concurrent load may have filled the slot; keep the first result so
        // every caller observes the same Arc.
        let entry = cache
            .entry(group.to_string())
            .or_insert_with(|| Arc::new(merged));

        debug!(
            "event=config_load module=config status=ok group={} sources={} keys={} duration_ms={}",
            group,
            sources,
            entry.len(),
            started_at.elapsed().as_millis()
        );
        Ok(Arc::clone(entry))
    }

    /// Resolves a dotted path inside a merged group.
    pub fn get(&self, group: &str, path: &str) -> ConfigResult<Option<Value>> {
        let merged = self.load(group)?;
        Ok(lookup(&merged, path).cloned())
    }

    /// Deserializes a merged group into `T`.
    pub fn load_as<T: DeserializeOwned>(&self, group: &str) -> ConfigResult<T> {
        let merged = self.load(group)?;
        serde_json::from_value(Value::Object(merged.as_ref().clone())).map_err(|source| {
            ConfigError::Decode {
                group: group.to_string(),
                source,
            }
        })
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<String, Arc<ConfigGroup>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Debug for ConfigResolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let readers: Vec<String> = self.readers.iter().map(|reader| reader.describe()).collect();
        f.debug_struct("ConfigResolver")
            .field("readers", &readers)
            .field("cached_groups", &self.cached_groups())
            .finish()
    }
}

/// Thread-safe handle over one [`ConfigResolver`].
///
/// Loads share a read lock; `attach`/`detach` take the write lock, so a load
/// never observes a half-updated reader set or a stale cache.
#[derive(Debug, Clone, Default)]
pub struct SharedConfigResolver {
    inner: Arc<RwLock<ConfigResolver>>,
}

impl SharedConfigResolver {
    pub fn new(resolver: ConfigResolver) -> Self {
        Self {
            inner: Arc::new(RwLock::new(resolver)),
        }
    }

    pub fn attach(&self, reader: Arc<dyn ConfigReader>, append_to_end: bool) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .attach(reader, append_to_end);
    }

    pub fn detach<R: ConfigReader + ?Sized>(&self, reader: &Arc<R>) -> bool {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .detach(reader)
    }

    pub fn reader_count(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .readers()
            .len()
    }

    pub fn load(&self, group: &str) -> ConfigResult<Arc<ConfigGroup>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .load(group)
    }

    pub fn load_as<T: DeserializeOwned>(&self, group: &str) -> ConfigResult<T> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .load_as(group)
    }
}
