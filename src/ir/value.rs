//! Shape-aware comparisons over resolved attribute values.
//!
//! Both built-in rules and the custom check interpreter use these, so a
//! string/list/map attribute behaves the same way in either kind of rule.

use super::Value;

/// Text form of a scalar. Lists, maps and null have none.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numeric view of a number or a numeric string.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Loose equality: scalars compare by numeric value or text, lists
/// element-wise, maps key-wise.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(k, v)| b.get(k).is_some_and(|other| values_equal(v, other)))
        }
        (Value::Null, Value::Null) => true,
        (Value::Array(_) | Value::Object(_) | Value::Null, _)
        | (_, Value::Array(_) | Value::Object(_) | Value::Null) => false,
        _ => {
            if let (Some(a), Some(b)) = (as_number(left), as_number(right)) {
                if matches!(left, Value::Number(_)) || matches!(right, Value::Number(_)) {
                    return a == b;
                }
            }
            scalar_text(left) == scalar_text(right)
        }
    }
}

/// Membership test used by `contains`.
///
/// - string: substring of the needle's text
/// - list: some element equals the needle
/// - map: some key equals the needle's text, or some value equals the needle
/// - anything else: false
pub fn value_contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::String(s) => scalar_text(needle).is_some_and(|n| s.contains(&n)),
        Value::Array(items) => items.iter().any(|item| values_equal(item, needle)),
        Value::Object(map) => {
            let key_hit = scalar_text(needle).is_some_and(|n| map.contains_key(&n));
            key_hit || map.values().any(|v| values_equal(v, needle))
        }
        _ => false,
    }
}

pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn number_and_numeric_string_are_equal() {
        assert!(values_equal(&json!(443), &json!("443")));
        assert!(values_equal(&json!("443"), &json!(443.0)));
        assert!(!values_equal(&json!("0443"), &json!("443")));
    }

    #[test]
    fn bool_compares_with_text() {
        assert!(values_equal(&json!(true), &json!("true")));
        assert!(!values_equal(&json!(false), &json!("true")));
    }

    #[test]
    fn maps_compare_key_wise() {
        assert!(values_equal(
            &json!({"a": 1, "b": "x"}),
            &json!({"b": "x", "a": "1"})
        ));
        assert!(!values_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }

    #[test]
    fn contains_per_shape() {
        assert!(value_contains(&json!("arn:aws:s3:::logs"), &json!("s3")));
        assert!(value_contains(&json!(["10.0.0.0/8", "0.0.0.0/0"]), &json!("0.0.0.0/0")));
        assert!(value_contains(&json!({"Environment": "prod"}), &json!("Environment")));
        assert!(value_contains(&json!({"Environment": "prod"}), &json!("prod")));
        assert!(!value_contains(&json!(true), &json!("true")));
        assert!(!value_contains(&json!(null), &json!("x")));
    }

    #[test]
    fn empty_values() {
        assert!(is_empty(&json!("")));
        assert!(is_empty(&json!([])));
        assert!(is_empty(&json!({})));
        assert!(is_empty(&json!(null)));
        assert!(!is_empty(&json!(0)));
    }
}
