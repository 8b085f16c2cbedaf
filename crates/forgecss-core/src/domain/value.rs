//! Runtime values produced by evaluating expressions.

use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// An evaluated value. Never holds an unresolved variable reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Truthiness used by `@if`, `!`, `&&` and `||`.
    ///
    /// null is false, numbers are false only at exactly zero, and strings,
    /// arrays and objects are false only when empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::Array(items) => !items.is_empty(),
            Self::Object(entries) => !entries.is_empty(),
        }
    }

    /// Text form used for interpolation, paths, commands and file content.
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::String(s) => s.clone(),
            Self::Array(_) | Self::Object(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Follow a dotted path (`a.b.c`) through nested objects.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(self, |current, key| match current {
            Self::Object(entries) => entries.get(key),
            _ => None,
        })
    }
}

/// Whole numbers small enough to be exact print without a fraction.
fn as_integer(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15).then_some(n as i64)
}

fn format_number(n: f64) -> String {
    match as_integer(n) {
        Some(i) => i.to_string(),
        None => n.to_string(),
    }
}

/// Numbers serialize the way [`Value::to_text`] prints them, so `3` stays
/// `3` inside arrays, objects and templates.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => match as_integer(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => items.serialize(serializer),
            Self::Object(entries) => entries.serialize(serializer),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Self::Object(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_rules() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(Value::Number(-0.5).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(!Value::Array(vec![]).is_truthy());
        assert!(Value::Array(vec![Value::Null]).is_truthy());
        assert!(!Value::Object(IndexMap::new()).is_truthy());
    }

    #[test]
    fn integral_numbers_print_without_fraction() {
        assert_eq!(Value::Number(3.0).to_text(), "3");
        assert_eq!(Value::Number(-12.0).to_text(), "-12");
        assert_eq!(Value::Number(2.5).to_text(), "2.5");
    }

    #[test]
    fn compound_values_render_as_json() {
        let mut entries = IndexMap::new();
        entries.insert("b".to_string(), Value::from(1.0));
        entries.insert("a".to_string(), Value::Array(vec![Value::Null, Value::from(true)]));
        assert_eq!(Value::Object(entries).to_text(), r#"{"b":1,"a":[null,true]}"#);
    }

    #[test]
    fn numbers_print_the_same_inside_arrays() {
        let items = Value::Array(vec![Value::from(3.0), Value::from(2.5), Value::from(-1.0)]);
        assert_eq!(items.to_text(), "[3,2.5,-1]");
        assert_eq!(
            serde_json::to_value(Value::from(3.0)).unwrap(),
            serde_json::json!(3)
        );
    }

    #[test]
    fn null_renders_empty() {
        assert_eq!(Value::Null.to_text(), "");
    }

    #[test]
    fn dotted_path_lookup() {
        let mut inner = IndexMap::new();
        inner.insert("name".to_string(), Value::from("svc"));
        let mut outer = IndexMap::new();
        outer.insert("project".to_string(), Value::Object(inner));
        let value = Value::Object(outer);

        assert_eq!(value.get_path("project.name"), Some(&Value::from("svc")));
        assert_eq!(value.get_path("project.missing"), None);
    }
}
