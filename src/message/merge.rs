//! Recursive merge of JSON objects
//!
//! Objects merge key by key, arrays accumulate (later elements are appended,
//! never merged by index), anything else is replaced by the later value.

use serde_json::{Map, Value};

/// Merge a sequence of objects left to right into a new object
pub fn deep_merge<'a, I>(layers: I) -> Map<String, Value>
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    let mut merged = Map::new();
    for layer in layers {
        merge_into(&mut merged, layer);
    }
    merged
}

/// Merge `incoming` into `target` in place
pub fn merge_value(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(incoming)) => merge_into(existing, incoming),
        (Value::Array(existing), Value::Array(incoming)) => {
            existing.extend(incoming.iter().cloned())
        }
        (target, incoming) => *target = incoming.clone(),
    }
}

/// Merge the entries of `incoming` into `target` in place
pub fn merge_into(target: &mut Map<String, Value>, incoming: &Map<String, Value>) {
    for (key, value) in incoming {
        match target.get_mut(key) {
            Some(existing) => merge_value(existing, value),
            None => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_later_scalar_wins() {
        let base = object(json!({"a": 1, "b": "x"}));
        let custom = object(json!({"a": 2}));

        let merged = deep_merge([&base, &custom]);
        assert_eq!(Value::Object(merged), json!({"a": 2, "b": "x"}));
    }

    #[test]
    fn test_nested_objects_merge() {
        let custom = object(json!({"a": {"b": 1}}));
        let apns = object(json!({"a": {"c": 2}}));

        let merged = deep_merge([&custom, &apns]);
        assert_eq!(Value::Object(merged), json!({"a": {"b": 1, "c": 2}}));
    }

    #[test]
    fn test_arrays_are_appended() {
        let base = object(json!({"tags": ["one", "two"]}));
        let extra = object(json!({"tags": ["three"]}));

        let merged = deep_merge([&base, &extra]);
        assert_eq!(
            Value::Object(merged),
            json!({"tags": ["one", "two", "three"]})
        );
    }

    #[test]
    fn test_mismatched_kinds_are_replaced() {
        let base = object(json!({"aps": {"alert": "hi"}, "n": [1]}));
        let custom = object(json!({"aps": [], "n": {"k": true}}));

        let merged = deep_merge([&base, &custom]);
        assert_eq!(Value::Object(merged), json!({"aps": [], "n": {"k": true}}));
    }

    #[test]
    fn test_null_overrides() {
        let base = object(json!({"a": {"b": 1}}));
        let custom = object(json!({"a": null}));

        let merged = deep_merge([&base, &custom]);
        assert_eq!(Value::Object(merged), json!({"a": null}));
    }

    #[test]
    fn test_key_order_follows_first_appearance() {
        let base = object(json!({"z": 1, "a": 2}));
        let custom = object(json!({"m": 3, "z": 4}));

        let merged = deep_merge([&base, &custom]);
        let keys: Vec<_> = merged.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_empty_layers() {
        let merged = deep_merge(std::iter::empty());
        assert!(merged.is_empty());
    }
}
