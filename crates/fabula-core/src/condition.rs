//! Condition tests gating dialogues and choices.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A comparison operator, serialized in its authored form (`">"`, `"=="`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// Strictly greater than.
    #[serde(rename = ">")]
    Gt,
    /// Strictly less than.
    #[serde(rename = "<")]
    Lt,
    /// Greater than or equal.
    #[serde(rename = ">=")]
    Ge,
    /// Less than or equal.
    #[serde(rename = "<=")]
    Le,
    /// Equal.
    #[serde(rename = "==")]
    Eq,
    /// Not equal.
    #[serde(rename = "!=")]
    Ne,
}

/// A boolean test against a variable's current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Name of the variable under test.
    pub variable: String,
    /// The comparison to apply.
    pub operator: CompareOp,
    /// The expected value, coerced to the variable's type before comparing.
    pub value: Value,
}

impl Condition {
    /// Create a new condition.
    pub fn new(variable: impl Into<String>, operator: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            variable: variable.into(),
            operator,
            value: value.into(),
        }
    }

    /// Evaluate this condition against the variable's current value.
    ///
    /// An undefined variable (`None`) fails every comparison, so a dialogue
    /// gated on a variable that was never defined is skipped rather than
    /// shown. The expected value is coerced to the current value's type first
    /// (so `"true"` matches a boolean `true`); a failed coercion also fails
    /// the condition.
    pub fn holds(&self, current: Option<&Value>) -> bool {
        let Some(current) = current else {
            return false;
        };
        let Some(expected) = self.value.coerce(current.var_type()) else {
            return false;
        };
        match self.operator {
            CompareOp::Eq => *current == expected,
            CompareOp::Ne => *current != expected,
            CompareOp::Gt => matches!(current.compare(&expected), Some(Ordering::Greater)),
            CompareOp::Lt => matches!(current.compare(&expected), Some(Ordering::Less)),
            CompareOp::Ge => matches!(
                current.compare(&expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            CompareOp::Le => matches!(
                current.compare(&expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

/// Evaluate a conjunction of conditions against a variable lookup.
///
/// An empty list always holds; a dialogue without conditions is always shown.
pub fn evaluate_all<F>(conditions: &[Condition], mut lookup: F) -> bool
where
    F: FnMut(&str) -> Option<Value>,
{
    conditions
        .iter()
        .all(|condition| condition.holds(lookup(&condition.variable).as_ref()))
}
