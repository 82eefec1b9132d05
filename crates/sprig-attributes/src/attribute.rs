//! Attributes and the values they carry.
//!
//! An attribute is a `(name, type)` pair. Values come from a small closed
//! set: strings, booleans and named values (the enum-like usage/category
//! objects a build declares). Desugaring turns named values into plain
//! strings so containers can cross process boundaries.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use sprig_core::types::Version;

/// Declared type of an attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeType {
    String,
    Boolean,
    /// Enum-like type identified by its type name (`Usage`, `Category`, ...)
    Named(String),
}

/// A typed, named dimension used to distinguish variants
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Attribute {
    name: Arc<str>,
    value_type: AttributeType,
}

/// Attribute value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Value {
    String(String),
    Boolean(bool),
    Named(String),
}

impl Attribute {
    /// Create an attribute with an explicit type
    pub fn of(name: impl AsRef<str>, value_type: AttributeType) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            value_type,
        }
    }

    /// Create a string-typed attribute
    pub fn string(name: impl AsRef<str>) -> Self {
        Self::of(name, AttributeType::String)
    }

    /// Create a boolean-typed attribute
    pub fn boolean(name: impl AsRef<str>) -> Self {
        Self::of(name, AttributeType::Boolean)
    }

    /// Create an attribute whose values are named objects of `type_name`
    pub fn named(name: impl AsRef<str>, type_name: impl Into<String>) -> Self {
        Self::of(name, AttributeType::Named(type_name.into()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> &AttributeType {
        &self.value_type
    }

    /// Same attribute with its type reduced to String/Boolean
    pub fn desugared(&self) -> Attribute {
        match self.value_type {
            AttributeType::Named(_) => Attribute {
                name: Arc::clone(&self.name),
                value_type: AttributeType::String,
            },
            _ => self.clone(),
        }
    }

    /// Check if a value has this attribute's declared type
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (&self.value_type, value),
            (AttributeType::String, Value::String(_))
                | (AttributeType::Boolean, Value::Boolean(_))
                | (AttributeType::Named(_), Value::Named(_))
        )
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeType::String => f.write_str("String"),
            AttributeType::Boolean => f.write_str("Boolean"),
            AttributeType::Named(name) => f.write_str(name),
        }
    }
}

impl Value {
    /// Create a named value
    pub fn named(name: impl Into<String>) -> Self {
        Value::Named(name.into())
    }

    /// Textual form, if this value has one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Named(s) => Some(s),
            Value::Boolean(_) => None,
        }
    }

    /// Reduce this value to String/Boolean
    pub fn desugared(&self) -> Value {
        match self {
            Value::Named(name) => Value::String(name.clone()),
            other => other.clone(),
        }
    }

    /// Convert this value to the given type, if a lossless conversion exists
    pub fn coerce(&self, target: &AttributeType) -> Option<Value> {
        match (self, target) {
            (Value::String(_), AttributeType::String)
            | (Value::Boolean(_), AttributeType::Boolean)
            | (Value::Named(_), AttributeType::Named(_)) => Some(self.clone()),
            (Value::String(s), AttributeType::Named(_)) => Some(Value::Named(s.clone())),
            (Value::Named(s), AttributeType::String) => Some(Value::String(s.clone())),
            (Value::String(s), AttributeType::Boolean) => match s.as_str() {
                "true" => Some(Value::Boolean(true)),
                "false" => Some(Value::Boolean(false)),
                _ => None,
            },
            (Value::Boolean(b), AttributeType::String) => Some(Value::String(b.to_string())),
            _ => None,
        }
    }

    /// Natural ordering: booleans false < true, text by version-like ordering
    pub fn natural_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) | (Value::Named(a), Value::Named(b)) => {
                match (Version::parse(a), Version::parse(b)) {
                    (Ok(a), Ok(b)) => Some(a.cmp(&b)),
                    _ => Some(a.cmp(b)),
                }
            },
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "'{}'", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Named(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_identity_includes_type() {
        assert_eq!(Attribute::string("color"), Attribute::string("color"));
        assert_ne!(Attribute::string("color"), Attribute::named("color", "Color"));
    }

    #[test]
    fn test_desugared_attribute() {
        let usage = Attribute::named("usage", "Usage");
        assert_eq!(usage.desugared(), Attribute::string("usage"));
        assert_eq!(Attribute::boolean("debug").desugared(), Attribute::boolean("debug"));
    }

    #[test]
    fn test_coercion() {
        let usage_type = AttributeType::Named("Usage".to_string());
        assert_eq!(
            Value::from("java-api").coerce(&usage_type),
            Some(Value::named("java-api"))
        );
        assert_eq!(
            Value::from("true").coerce(&AttributeType::Boolean),
            Some(Value::Boolean(true))
        );
        assert_eq!(Value::from("yes").coerce(&AttributeType::Boolean), None);
        assert_eq!(Value::Boolean(true).coerce(&usage_type), None);
    }

    #[test]
    fn test_natural_ordering() {
        assert_eq!(
            Value::from("8").natural_cmp(&Value::from("11")),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Boolean(false).natural_cmp(&Value::Boolean(true)),
            Some(Ordering::Less)
        );
        assert_eq!(Value::from("a").natural_cmp(&Value::Boolean(true)), None);
    }

    #[test]
    fn test_accepts() {
        assert!(Attribute::boolean("debug").accepts(&Value::Boolean(false)));
        assert!(!Attribute::boolean("debug").accepts(&Value::from("false")));
    }
}
