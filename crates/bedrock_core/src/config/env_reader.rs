//! Environment-variable configuration source.
//!
//! Variables follow `<PREFIX><GROUP>__<KEY>[__<SUBKEY>...]`, e.g.
//! `BEDROCK_DB__POOL__MAX_SIZE=8` yields `{"pool": {"max_size": 8}}` for
//! group `db` under prefix `BEDROCK_`.
//!
//! Group names are upper-cased and `-`/`.` fold to `_`, so groups that differ
//! only in those separators (`cache.redis`, `cache-redis`, `cache_redis`)
//! read the same variables.

use super::{ConfigGroup, ConfigReader, ConfigResult};
use serde_json::{Map, Value};

const SEGMENT_SEPARATOR: &str = "__";

/// Reader over a snapshot of environment variables.
///
/// The snapshot is taken at construction, so later process environment
/// changes are not observed.
#[derive(Debug, Clone)]
pub struct EnvReader {
    prefix: String,
    vars: Vec<(String, String)>,
}

impl EnvReader {
    /// Captures the current process environment.
    pub fn from_env(prefix: impl Into<String>) -> Self {
        Self::from_vars(prefix, std::env::vars())
    }

    /// Builds a reader from an explicit variable list.
    pub fn from_vars(
        prefix: impl Into<String>,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let prefix = prefix.into();
        let mut vars: Vec<(String, String)> = vars
            .into_iter()
            .filter(|(key, _)| key.starts_with(prefix.as_str()))
            .collect();
        vars.sort();
        Self { prefix, vars }
    }

    fn group_prefix(&self, group: &str) -> String {
        let normalized: String = group
            .chars()
            .map(|c| match c {
                '-' | '.' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();
        format!("{}{normalized}{SEGMENT_SEPARATOR}", self.prefix)
    }
}

impl ConfigReader for EnvReader {
    fn load(&self, group: &str) -> ConfigResult<Option<ConfigGroup>> {
        let group_prefix = self.group_prefix(group);
        let mut values = ConfigGroup::new();

        for (key, raw) in &self.vars {
            let Some(rest) = key.strip_prefix(group_prefix.as_str()) else {
                continue;
            };
            let segments: Vec<String> = rest
                .split(SEGMENT_SEPARATOR)
                .map(str::to_ascii_lowercase)
                .collect();
            if segments.iter().any(String::is_empty) {
                continue;
            }
            insert_path(&mut values, &segments, parse_value(raw));
        }

        if values.is_empty() {
            return Ok(None);
        }
        Ok(Some(values))
    }

    fn describe(&self) -> String {
        format!("env({}*)", self.prefix)
    }
}

fn insert_path(target: &mut ConfigGroup, segments: &[String], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = target;
    for segment in parents {
        let slot = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => return,
        };
    }
    current.insert(last.clone(), value);
}

/// JSON scalars (`true`, `8`, `1.5`, `null`) keep their type; everything else
/// stays a plain string.
fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(value @ (Value::Bool(_) | Value::Number(_) | Value::Null)) => value,
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::EnvReader;
    use crate::config::ConfigReader;
    use serde_json::{json, Value};

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn builds_nested_group_from_prefixed_variables() {
        let reader = EnvReader::from_vars(
            "BEDROCK_",
            vars(&[
                ("BEDROCK_DB__PATH", "/var/lib/app.db"),
                ("BEDROCK_DB__POOL__MAX_SIZE", "8"),
                ("BEDROCK_DB__POOL__ENABLED", "true"),
                ("BEDROCK_MAIL__HOST", "smtp.local"),
                ("OTHER_DB__PATH", "ignored"),
            ]),
        );

        let db = reader.load("db").expect("load").expect("db group");
        assert_eq!(
            Value::Object(db),
            json!({"path": "/var/lib/app.db", "pool": {"max_size": 8, "enabled": true}})
        );
    }

    #[test]
    fn absent_group_is_none() {
        let reader = EnvReader::from_vars("BEDROCK_", vars(&[("BEDROCK_DB__PATH", "x")]));
        assert!(reader.load("mail").expect("load").is_none());
    }

    #[test]
    fn group_names_with_separators_are_normalized() {
        let reader = EnvReader::from_vars(
            "APP_",
            vars(&[("APP_CACHE_REDIS__URL", "redis://localhost")]),
        );

        let group = reader.load("cache-redis").expect("load").expect("group");
        assert_eq!(group["url"], json!("redis://localhost"));
    }

    #[test]
    fn separator_variants_of_a_group_share_variables() {
        let reader = EnvReader::from_vars(
            "APP_",
            vars(&[
                ("APP_CACHE_REDIS__URL", "redis://localhost"),
                ("APP_CACHE__URL", "memory://"),
            ]),
        );

        let expected = json!({"url": "redis://localhost"});
        for name in ["cache.redis", "cache-redis", "cache_redis", "Cache_Redis"] {
            let group = reader.load(name).expect("load").expect("group");
            assert_eq!(Value::Object(group), expected, "group {name}");
        }
        let plain = reader.load("cache").expect("load").expect("group");
        assert_eq!(Value::Object(plain), json!({"url": "memory://"}));
    }

    #[test]
    fn empty_segments_are_skipped() {
        let reader = EnvReader::from_vars(
            "APP_",
            vars(&[("APP_DB____PATH", "x"), ("APP_DB__NAME", "main")]),
        );

        let group = reader.load("db").expect("load").expect("group");
        assert_eq!(Value::Object(group), json!({"name": "main"}));
    }

    #[test]
    fn non_scalar_text_stays_string() {
        let reader = EnvReader::from_vars(
            "APP_",
            vars(&[("APP_LOG__LEVEL", "info"), ("APP_LOG__TAGS", "[1,2]")]),
        );

        let group = reader.load("log").expect("load").expect("group");
        assert_eq!(group["level"], json!("info"));
        assert_eq!(group["tags"], json!("[1,2]"));
    }
}
