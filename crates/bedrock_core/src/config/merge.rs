//! Recursive per-key merge of configuration groups.

use super::ConfigGroup;
use serde_json::Value;

/// Merges `incoming` into `target`; `incoming` wins on conflicts.
///
/// When both sides hold a mapping under the same key the two mappings are
/// merged by the same rule. Scalars and arrays are replaced wholesale.
pub fn deep_merge(target: &mut ConfigGroup, incoming: ConfigGroup) {
    for (key, value) in incoming {
        match value {
            Value::Object(nested) => match target.get_mut(&key) {
                Some(Value::Object(existing)) => deep_merge(existing, nested),
                _ => {
                    target.insert(key, Value::Object(nested));
                }
            },
            other => {
                target.insert(key, other);
            }
        }
    }
}

/// Resolves a dotted path such as `pool.max_size` inside a group.
///
/// Returns `None` for an empty path, an empty segment, or any missing step.
pub fn lookup<'a>(group: &'a ConfigGroup, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next().filter(|segment| !segment.is_empty())?;
    let mut current = group.get(first)?;
    for segment in segments {
        if segment.is_empty() {
            return None;
        }
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}
