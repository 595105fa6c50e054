//! State mutations applied when a choice is selected.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Default lower bound for `random` effects without an explicit `min`.
pub const RANDOM_DEFAULT_MIN: i64 = 0;
/// Default upper bound for `random` effects without an explicit `max`.
pub const RANDOM_DEFAULT_MAX: i64 = 100;

/// A mutation of one variable, applied through the variable store (and
/// therefore subject to the variable's own type coercion and clamping).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    /// Name of the variable to mutate.
    pub variable: String,
    /// The operation to perform.
    #[serde(flatten)]
    pub op: EffectOp,
}

/// The operation an effect performs, tagged as `"operation"` in authored JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum EffectOp {
    /// Assign a literal value.
    Set {
        /// The value to assign.
        value: Value,
    },
    /// Add a delta to a numeric variable.
    Add {
        /// The delta to add (may be negative).
        value: f64,
    },
    /// Assign a uniformly distributed integer in `[min, max]`.
    Random {
        /// Inclusive lower bound; defaults to [`RANDOM_DEFAULT_MIN`].
        #[serde(default)]
        min: Option<i64>,
        /// Inclusive upper bound; defaults to [`RANDOM_DEFAULT_MAX`].
        #[serde(default)]
        max: Option<i64>,
    },
}

impl Effect {
    /// An effect assigning a literal value.
    pub fn set(variable: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            variable: variable.into(),
            op: EffectOp::Set {
                value: value.into(),
            },
        }
    }

    /// An effect adding a delta to a numeric variable.
    pub fn add(variable: impl Into<String>, value: f64) -> Self {
        Self {
            variable: variable.into(),
            op: EffectOp::Add { value },
        }
    }

    /// An effect assigning a random integer in `[min, max]`.
    pub fn random(variable: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            variable: variable.into(),
            op: EffectOp::Random {
                min: Some(min),
                max: Some(max),
            },
        }
    }
}
