//! Loosely-typed metadata values.
//!
//! Card metadata blocks can carry anything YAML can express. `Value` keeps the
//! shape explicit so every consumer goes through a fallible accessor or the
//! total [`Value::to_flat_string`] conversion instead of guessing types.

use std::collections::BTreeMap;
use std::fmt;

/// A metadata value from a card's frontmatter.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True when the value carries something: not null and not an empty string.
    pub fn is_present(&self) -> bool {
        match self {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Convert to the string form used in the render namespace.
    ///
    /// Returns `None` only for `Null`. Integers use base-10, floats the
    /// shortest decimal that round-trips.
    pub fn to_flat_string(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
            Value::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Mapping(map) => {
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                Ok(())
            }
        }
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(v: serde_yaml::Value) -> Self {
        match v {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    // Beyond i64 range: keep the magnitude as a float.
                    Value::Float(u as f64)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_yaml::Value::Mapping(map) => Value::Mapping(
                map.into_iter()
                    .filter_map(|(k, v)| yaml_key(k).map(|k| (k, Value::from(v))))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Value::from(tagged.value),
        }
    }
}

/// Mapping keys are strings in card metadata; scalar keys are stringified.
pub(crate) fn yaml_key(key: serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_flattening() {
        assert_eq!(Value::Int(3).to_flat_string().as_deref(), Some("3"));
        assert_eq!(Value::Float(2.5).to_flat_string().as_deref(), Some("2.5"));
        assert_eq!(Value::Float(3.0).to_flat_string().as_deref(), Some("3"));
        assert_eq!(Value::Float(0.1).to_flat_string().as_deref(), Some("0.1"));
        assert_eq!(Value::Bool(true).to_flat_string().as_deref(), Some("true"));
        assert_eq!(Value::Null.to_flat_string(), None);
    }

    #[test]
    fn test_sequence_flattening() {
        let v = Value::Sequence(vec![Value::String("R".into()), Value::String("G".into())]);
        assert_eq!(v.to_flat_string().as_deref(), Some("R, G"));
    }

    #[test]
    fn test_from_yaml_nested() {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str("mtg:\n  cmc: 3\n  color_identity: [R]\n").unwrap();
        let v = Value::from(yaml);
        let mtg = v.as_mapping().unwrap().get("mtg").unwrap();
        assert_eq!(mtg.as_mapping().unwrap().get("cmc"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_presence() {
        assert!(!Value::Null.is_present());
        assert!(!Value::String(String::new()).is_present());
        assert!(Value::Int(0).is_present());
    }
}
