//! The dynamic value model for template evaluation.
//!
//! Template bodies produce [`Value`]s: plain text bodies produce strings,
//! structured bodies produce tagged objects, and embedded expressions may
//! produce any variant. The model is a closed tagged union so that the
//! evaluator's matches over results stay exhaustive.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Number;

/// Key used when converting a tagged value to and from JSON.
pub const TAG_KEY: &str = "lgType";

/// A dynamic, JSON-like value.
///
/// Mappings preserve insertion order, which matters for structured template
/// bodies where the author's key order is part of the output.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// The absent value. Renders as the empty string.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A number. Integers and floats share one representation.
    Number(f64),
    /// A string.
    String(String),
    /// An ordered sequence of values.
    Array(Vec<Value>),
    /// An ordered key/value mapping.
    Object(IndexMap<String, Value>),
    /// An ordered mapping tagged with a type name, as produced by
    /// structured template bodies.
    Tagged {
        tag: String,
        fields: IndexMap<String, Value>,
    },
}

impl Value {
    /// Build a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// The truthiness rule used by conditions: `null` and `false` are
    /// false, everything else is true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The numeric content, if this value is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string content, if this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a named field of an object or tagged value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.get(name),
            Value::Tagged { fields, .. } => fields.get(name),
            _ => None,
        }
    }

    /// Index into an array.
    pub fn element(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Array(items) => items.get(index),
            _ => None,
        }
    }

    /// Convert to a `serde_json::Value`. Tagged values become objects with
    /// a leading [`TAG_KEY`] entry.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Tagged { tag, fields } => {
                let mut map = serde_json::Map::new();
                map.insert(TAG_KEY.to_string(), serde_json::Value::String(tag.clone()));
                for (k, v) in fields {
                    map.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(map)
            }
        }
    }

    /// Convert from a `serde_json::Value`. Objects carrying a string
    /// [`TAG_KEY`] entry become tagged values.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let tag = map.get(TAG_KEY).and_then(|v| v.as_str());
                let fields: IndexMap<String, Value> = map
                    .iter()
                    .filter(|(k, _)| tag.is_none() || k.as_str() != TAG_KEY)
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect();
                match tag {
                    Some(tag) => Value::Tagged {
                        tag: tag.to_string(),
                        fields,
                    },
                    None => Value::Object(fields),
                }
            }
        }
    }
}

impl fmt::Display for Value {
    /// Renders the substitution form: `null` is empty, numbers drop a
    /// trailing `.0`, compound values render as JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => f.write_str(s),
            Value::Array(_) | Value::Object(_) | Value::Tagged { .. } => {
                write!(f, "{}", self.to_json())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_renders_empty() {
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn test_integral_number_renders_without_fraction() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(3.5).to_string(), "3.5");
        assert_eq!(Value::Number(-2.0).to_string(), "-2");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::string("").is_truthy());
    }

    #[test]
    fn test_equality_is_structural() {
        assert_eq!(Value::Number(1.0), Value::Number(1.0));
        assert_ne!(Value::Number(1.0), Value::string("1"));
        assert_eq!(
            Value::Array(vec![Value::Bool(true)]),
            Value::Array(vec![Value::Bool(true)]),
        );
    }

    #[test]
    fn test_tagged_json_round_trip() {
        let mut fields = IndexMap::new();
        fields.insert("text".to_string(), Value::string("hi"));
        let value = Value::Tagged {
            tag: "Activity".to_string(),
            fields,
        };

        let json = value.to_json();
        assert_eq!(json[TAG_KEY], "Activity");
        assert_eq!(Value::from_json(&json), value);
    }

    #[test]
    fn test_field_and_element_access() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"items": [1, 2, 3], "name": "Ann"}"#).unwrap();
        let value = Value::from_json(&json);

        assert_eq!(value.field("name"), Some(&Value::string("Ann")));
        assert_eq!(
            value.field("items").and_then(|v| v.element(1)),
            Some(&Value::Number(2.0))
        );
        assert_eq!(value.field("missing"), None);
    }
}
