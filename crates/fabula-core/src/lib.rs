//! Scene data model for Fabula: typed values, dialogues, conditions, and effects.
//!
//! This crate defines the documents that the playback engine consumes. It is
//! independent of the runtime — scenes are authored as JSON by an editor layer
//! and deserialized into these types, or constructed programmatically through
//! the builder methods.

/// Condition tests gating dialogues and choices.
pub mod condition;
/// State mutations applied when a choice is selected.
pub mod effect;
/// Scene documents: scenes, dialogues, and choices.
pub mod scene;
/// Typed variable values and coercion rules.
pub mod value;

/// Re-export condition types.
pub use condition::{CompareOp, Condition, evaluate_all};
/// Re-export effect types.
pub use effect::{Effect, EffectOp};
/// Re-export scene document types.
pub use scene::{Choice, Dialogue, Scene};
/// Re-export value types.
pub use value::{Value, VarType};
