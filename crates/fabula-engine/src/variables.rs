//! The typed variable store.
//!
//! Narrative stats ("Confidence", "Health", ...) live here as typed,
//! optionally bounded values. Definitions are setup-time and validated hard;
//! mutations during playback are permissive — bad authored data warns and
//! no-ops instead of failing, per the runtime's recovery rules.
//!
//! Methods take `&self` so the store can be shared between the engine and
//! the editor layer behind an `Rc`, and so `variable:changed` handlers may
//! read the store re-entrantly (all internal borrows are released before the
//! bus is notified).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use fabula_core::{Value, VarType};

use crate::bus::EventBus;
use crate::error::{EngineError, EngineResult};
use crate::events::{EventPayload, topic};

/// One variable's full definition and current value.
///
/// This is also the persisted shape: exports serialize a map of these keyed
/// by variable name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    /// The declared type; `value` and `default_value` always match it.
    #[serde(rename = "type")]
    pub var_type: VarType,
    /// The current value.
    pub value: Value,
    /// The value restored by [`VariableManager::reset`].
    pub default_value: Value,
    /// Lower clamp bound for numeric variables.
    #[serde(default)]
    pub min: Option<f64>,
    /// Upper clamp bound for numeric variables.
    #[serde(default)]
    pub max: Option<f64>,
}

/// Typed, bounded key/value store for narrative state.
pub struct VariableManager {
    variables: RefCell<BTreeMap<String, Variable>>,
    bus: Option<Rc<EventBus>>,
}

impl VariableManager {
    /// Create a store that does not announce changes.
    pub fn new() -> Self {
        Self {
            variables: RefCell::new(BTreeMap::new()),
            bus: None,
        }
    }

    /// Create a store that publishes `variable:changed` on the given bus.
    pub fn with_bus(bus: Rc<EventBus>) -> Self {
        Self {
            variables: RefCell::new(BTreeMap::new()),
            bus: Some(bus),
        }
    }

    /// Define a variable, replacing any existing definition of the same name.
    ///
    /// This is the one hard-failing entry point: an empty name or a default
    /// value that does not match the declared type is a programmer error in
    /// initial setup, not narrative data.
    pub fn define(
        &self,
        name: &str,
        var_type: VarType,
        default_value: impl Into<Value>,
        min: Option<f64>,
        max: Option<f64>,
    ) -> EngineResult<()> {
        if name.trim().is_empty() {
            return Err(EngineError::EmptyVariableName);
        }
        let default_value = default_value.into();
        if !default_value.matches(var_type) {
            return Err(EngineError::DefaultTypeMismatch {
                name: name.to_string(),
                expected: var_type,
            });
        }
        self.variables.borrow_mut().insert(
            name.to_string(),
            Variable {
                var_type,
                value: default_value.clone(),
                default_value,
                min,
                max,
            },
        );
        Ok(())
    }

    /// The current value of a variable, or `None` if it was never defined.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.variables.borrow().get(name).map(|v| v.value.clone())
    }

    /// Set a variable's value.
    ///
    /// The input is coerced to the declared type (see [`Value::coerce`]);
    /// numeric values are then clamped against whichever bounds are present.
    /// Setting an undefined variable, or a numeric variable to an unparsable
    /// value, warns and leaves state unchanged. `variable:changed` is
    /// published only when the stored value actually changed.
    pub fn set(&self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        let change = {
            let mut variables = self.variables.borrow_mut();
            let Some(variable) = variables.get_mut(name) else {
                warn!(name, "set on undefined variable");
                return;
            };
            let Some(coerced) = value.coerce(variable.var_type) else {
                warn!(name, %value, "value does not parse as a number");
                return;
            };
            let mut next = coerced;
            if let Value::Number(n) = &mut next {
                if let Some(min) = variable.min
                    && *n < min
                {
                    *n = min;
                }
                if let Some(max) = variable.max
                    && *n > max
                {
                    *n = max;
                }
            }
            if variable.value == next {
                None
            } else {
                let old_value = std::mem::replace(&mut variable.value, next.clone());
                Some((next, old_value))
            }
        };
        if let Some((value, old_value)) = change
            && let Some(bus) = &self.bus
        {
            bus.publish(
                topic::VARIABLE_CHANGED,
                EventPayload::VariableChanged {
                    name: name.to_string(),
                    value,
                    old_value,
                },
            );
        }
    }

    /// Add a delta to a numeric variable, inheriting [`VariableManager::set`]
    /// clamping. Warns and no-ops on non-numeric or undefined variables.
    pub fn increment(&self, name: &str, delta: f64) {
        match self.get(name) {
            Some(Value::Number(current)) => self.set(name, current + delta),
            _ => warn!(name, "increment on a non-numeric variable"),
        }
    }

    /// Restore a variable to its default value.
    pub fn reset(&self, name: &str) {
        let default = self
            .variables
            .borrow()
            .get(name)
            .map(|v| v.default_value.clone());
        if let Some(default) = default {
            self.set(name, default);
        }
    }

    /// Owned snapshot of every current value, keyed by name.
    pub fn get_all(&self) -> BTreeMap<String, Value> {
        self.variables
            .borrow()
            .iter()
            .map(|(name, variable)| (name.clone(), variable.value.clone()))
            .collect()
    }

    /// Owned snapshot of every full definition, keyed by name.
    pub fn definitions(&self) -> BTreeMap<String, Variable> {
        self.variables.borrow().clone()
    }

    /// Serialize all variables as a pretty JSON map
    /// `{name: {type, value, defaultValue, min, max}}`.
    pub fn export_to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(&*self.variables.borrow())?)
    }

    /// Replace all variables with the definitions in a JSON payload.
    ///
    /// The whole payload is parsed and validated before any state is
    /// touched, so a failed import leaves the prior state intact and returns
    /// false. Each imported value goes through [`VariableManager::set`], so
    /// out-of-range persisted numbers are re-clamped on the way in.
    pub fn import_from_json(&self, json: &str) -> bool {
        let parsed: BTreeMap<String, Variable> = match serde_json::from_str(json) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(%err, "variable import failed to parse");
                return false;
            }
        };
        for (name, variable) in &parsed {
            if name.trim().is_empty() || !variable.default_value.matches(variable.var_type) {
                warn!(name, "variable import rejected: invalid definition");
                return false;
            }
        }

        self.variables.borrow_mut().clear();
        for (name, variable) in parsed {
            let value = variable.value.clone();
            // Cannot fail: every entry was validated above.
            if self
                .define(
                    &name,
                    variable.var_type,
                    variable.default_value,
                    variable.min,
                    variable.max,
                )
                .is_ok()
            {
                self.set(&name, value);
            }
        }
        true
    }
}

impl Default for VariableManager {
    fn default() -> Self {
        Self::new()
    }
}
