//! Payload normalization
//!
//! Turns any JSON payload into the sensor's primary value and attribute map:
//! - arrays: length + `items`
//! - objects: `count`, else `total`, else `"OK"`; the object is the attribute map
//! - scalars: string form + `raw`

use serde::Serialize;
use serde_json::{Map, Value};

pub const ITEMS_KEY: &str = "items";
pub const RAW_KEY: &str = "raw";
pub const DEFAULT_STATE: &str = "OK";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub primary: Value,
    pub attributes: Map<String, Value>,
}

pub fn normalize(value: Value) -> Reading {
    match value {
        Value::Array(items) => {
            let primary = Value::from(items.len());
            let mut attributes = Map::new();
            attributes.insert(ITEMS_KEY.to_string(), Value::Array(items));
            Reading { primary, attributes }
        }
        Value::Object(object) => {
            let primary = object
                .get("count")
                .or_else(|| object.get("total"))
                .cloned()
                .unwrap_or_else(|| Value::String(DEFAULT_STATE.to_string()));
            Reading {
                primary,
                attributes: object,
            }
        }
        scalar => {
            let primary = Value::String(scalar_text(&scalar));
            let mut attributes = Map::new();
            attributes.insert(RAW_KEY.to_string(), scalar);
            Reading { primary, attributes }
        }
    }
}

/// Strings come out bare, booleans and null as `True`/`False`/`None`.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_array_counts_items() {
        let reading = normalize(json!(["a", "b", "c"]));
        assert_eq!(reading.primary, json!(3));
        assert_eq!(reading.attributes, attrs(json!({"items": ["a", "b", "c"]})));
    }

    #[test]
    fn test_empty_array() {
        let reading = normalize(json!([]));
        assert_eq!(reading.primary, json!(0));
        assert_eq!(reading.attributes, attrs(json!({"items": []})));
    }

    #[test]
    fn test_count_wins_over_total() {
        let reading = normalize(json!({"total": 10, "count": 2}));
        assert_eq!(reading.primary, json!(2));
    }

    #[test]
    fn test_total_used_without_count() {
        let input = json!({"total": 17, "region": "eu"});
        let reading = normalize(input.clone());
        assert_eq!(reading.primary, json!(17));
        assert_eq!(reading.attributes, attrs(input));
    }

    #[test]
    fn test_count_value_kept_as_is() {
        let reading = normalize(json!({"count": null}));
        assert_eq!(reading.primary, Value::Null);

        let reading = normalize(json!({"count": "many"}));
        assert_eq!(reading.primary, json!("many"));
    }

    #[test]
    fn test_object_without_known_keys() {
        let input = json!({"status": "green", "nodes": [1, 2]});
        let reading = normalize(input.clone());
        assert_eq!(reading.primary, json!("OK"));
        assert_eq!(reading.attributes, attrs(input));
    }

    #[test]
    fn test_key_match_is_exact() {
        let reading = normalize(json!({"Count": 1, "totals": 2}));
        assert_eq!(reading.primary, json!("OK"));
    }

    #[test]
    fn test_attribute_order_preserved() {
        let reading = normalize(json!({"zeta": 1, "alpha": 2, "mid": 3}));
        let keys: Vec<&str> = reading.attributes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_scalars() {
        let reading = normalize(json!("hello"));
        assert_eq!(reading.primary, json!("hello"));
        assert_eq!(reading.attributes, attrs(json!({"raw": "hello"})));

        let reading = normalize(json!(42));
        assert_eq!(reading.primary, json!("42"));
        assert_eq!(reading.attributes, attrs(json!({"raw": 42})));

        let reading = normalize(json!(2.5));
        assert_eq!(reading.primary, json!("2.5"));

        let reading = normalize(json!(true));
        assert_eq!(reading.primary, json!("True"));
        assert_eq!(reading.attributes, attrs(json!({"raw": true})));

        let reading = normalize(json!(false));
        assert_eq!(reading.primary, json!("False"));

        let reading = normalize(Value::Null);
        assert_eq!(reading.primary, json!("None"));
        assert_eq!(reading.attributes, attrs(json!({"raw": null})));
    }
}
