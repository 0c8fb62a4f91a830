//! Typed attribute values
//!
//! Attribute strings are decoded once, at tree-build time, into a [`Value`]
//! so that predicates can compare numbers as numbers and booleans as
//! booleans.

use std::fmt;

/// A typed scalar decoded from an attribute string
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Value {
    /// Plain text
    Text(String),
    /// 64-bit signed integer
    Integer(i64),
    /// Double-precision floating point number
    Float(f64),
    /// Boolean (`true` / `false`, any case)
    Boolean(bool),
    /// String representation of an untyped primitive
    RawBytes(String),
}

impl Value {
    /// Decode an attribute string.
    ///
    /// Integer is tried first, then float, then a case-insensitive
    /// `true`/`false`; anything else is kept as text. Every input yields
    /// exactly one variant.
    pub fn from_attribute(raw: &str) -> Self {
        if let Ok(n) = raw.parse::<i64>() {
            Value::Integer(n)
        } else if let Ok(f) = raw.parse::<f64>() {
            Value::Float(f)
        } else if raw.eq_ignore_ascii_case("true") {
            Value::Boolean(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Value::Boolean(false)
        } else {
            Value::Text(raw.to_string())
        }
    }

    /// Wrap an untyped primitive by its string representation
    pub fn raw(value: impl fmt::Display) -> Self {
        Value::RawBytes(value.to_string())
    }

    /// Short name of the variant, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::RawBytes(_) => "raw",
        }
    }

    #[inline]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) | Value::RawBytes(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::integer("12", Value::Integer(12))]
    #[case::negative("-7", Value::Integer(-7))]
    #[case::float("12.5", Value::Float(12.5))]
    #[case::exponent("1e3", Value::Float(1000.0))]
    #[case::lower_true("true", Value::Boolean(true))]
    #[case::upper_true("TRUE", Value::Boolean(true))]
    #[case::mixed_false("False", Value::Boolean(false))]
    #[case::text("hello", Value::Text("hello".to_string()))]
    #[case::empty("", Value::Text(String::new()))]
    #[case::padded_number(" 12", Value::Text(" 12".to_string()))]
    #[case::yes("yes", Value::Text("yes".to_string()))]
    fn test_from_attribute(#[case] raw: &str, #[case] expected: Value) {
        assert_eq!(Value::from_attribute(raw), expected);
    }

    #[test]
    fn test_from_attribute_is_deterministic() {
        for raw in ["0", "3.14", "tRuE", "abc", "12abc", "."] {
            assert_eq!(Value::from_attribute(raw), Value::from_attribute(raw));
        }
    }

    #[test]
    fn test_raw_and_display() {
        assert_eq!(Value::raw(42u8), Value::RawBytes("42".to_string()));
        assert_eq!(Value::Integer(5).to_string(), "5");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Boolean(false).to_string(), "false");
        assert_eq!(Value::from("x").to_string(), "x");
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Integer(3).as_integer(), Some(3));
        assert_eq!(Value::Integer(3).as_float(), None);
        assert_eq!(Value::Boolean(true).as_bool(), Some(true));
        assert_eq!(Value::from("t").as_text(), Some("t"));
        assert_eq!(Value::Float(1.0).type_name(), "float");
    }
}
