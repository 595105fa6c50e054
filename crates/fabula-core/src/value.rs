//! Typed variable values and the coercion rules applied at API boundaries.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The declared type of a narrative variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    /// A 64-bit floating-point stat, optionally bounded.
    Number,
    /// A true/false flag.
    Boolean,
    /// Free text.
    String,
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::String => write!(f, "string"),
        }
    }
}

/// A variable value. Authored documents carry these as plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A boolean value.
    Bool(bool),
    /// A numeric value.
    Number(f64),
    /// A text value.
    String(String),
}

impl Value {
    /// The type tag matching this value's variant.
    pub fn var_type(&self) -> VarType {
        match self {
            Self::Number(_) => VarType::Number,
            Self::Bool(_) => VarType::Boolean,
            Self::String(_) => VarType::String,
        }
    }

    /// Whether this value already has the given type.
    pub fn matches(&self, var_type: VarType) -> bool {
        self.var_type() == var_type
    }

    /// Coerce this value to the given type.
    ///
    /// Scene documents are authored loosely, so the boundary is permissive:
    /// - to `Number`: strings are parsed as `f64` (trimmed); an unparsable
    ///   string or a boolean yields `None`.
    /// - to `Boolean`: the strings `"true"` and `"1"` and the number `1`
    ///   coerce to `true`, everything else to `false`. Never fails.
    /// - to `String`: display conversion. Never fails.
    pub fn coerce(&self, var_type: VarType) -> Option<Value> {
        match var_type {
            VarType::Number => match self {
                Self::Number(n) => Some(Self::Number(*n)),
                Self::String(s) => s.trim().parse::<f64>().ok().map(Self::Number),
                Self::Bool(_) => None,
            },
            VarType::Boolean => match self {
                Self::Bool(b) => Some(Self::Bool(*b)),
                Self::String(s) => Some(Self::Bool(s == "true" || s == "1")),
                Self::Number(n) => Some(Self::Bool(*n == 1.0)),
            },
            VarType::String => Some(Self::String(self.to_string())),
        }
    }

    /// Ordering within a variant: numeric for numbers, lexicographic for
    /// strings, `false < true` for booleans. Cross-variant comparison is
    /// `None`.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_coercion() {
        assert_eq!(
            Value::from("3.5").coerce(VarType::Number),
            Some(Value::Number(3.5))
        );
        assert_eq!(
            Value::from(" 42 ").coerce(VarType::Number),
            Some(Value::Number(42.0))
        );
        assert_eq!(Value::from("not a number").coerce(VarType::Number), None);
        assert_eq!(Value::from(true).coerce(VarType::Number), None);
    }

    #[test]
    fn boolean_coercion_is_permissive() {
        assert_eq!(
            Value::from("true").coerce(VarType::Boolean),
            Some(Value::Bool(true))
        );
        assert_eq!(
            Value::from("1").coerce(VarType::Boolean),
            Some(Value::Bool(true))
        );
        assert_eq!(
            Value::from(1.0).coerce(VarType::Boolean),
            Some(Value::Bool(true))
        );
        assert_eq!(
            Value::from("yes").coerce(VarType::Boolean),
            Some(Value::Bool(false))
        );
        assert_eq!(
            Value::from(0.0).coerce(VarType::Boolean),
            Some(Value::Bool(false))
        );
    }

    #[test]
    fn string_coercion_drops_integral_fraction() {
        assert_eq!(
            Value::from(5.0).coerce(VarType::String),
            Some(Value::from("5"))
        );
        assert_eq!(
            Value::from(2.5).coerce(VarType::String),
            Some(Value::from("2.5"))
        );
        assert_eq!(
            Value::from(false).coerce(VarType::String),
            Some(Value::from("false"))
        );
    }

    #[test]
    fn comparison_stays_within_variant() {
        assert_eq!(
            Value::from(1.0).compare(&Value::from(2.0)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::from("b").compare(&Value::from("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::from(false).compare(&Value::from(true)),
            Some(Ordering::Less)
        );
        assert_eq!(Value::from(1.0).compare(&Value::from("1")), None);
    }

    #[test]
    fn untagged_scalars_round_trip() {
        let values = vec![Value::from(7.5), Value::from(true), Value::from("hi")];
        let json = serde_json::to_string(&values).unwrap();
        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(values, back);
    }

    #[test]
    fn json_string_digits_stay_strings() {
        let value: Value = serde_json::from_str("\"5\"").unwrap();
        assert_eq!(value, Value::from("5"));
        let value: Value = serde_json::from_str("5").unwrap();
        assert_eq!(value, Value::from(5.0));
    }
}
