//! Error types for the runtime.
//!
//! Only setup mistakes are hard failures: a bad variable definition reflects
//! a programmer error, not narrative-authoring data. Everything the engine
//! hits during playback (undefined variables, malformed dialogues, dead-end
//! scenes) is recovered with a warning or a clean `scene_end` instead.

use fabula_core::VarType;
use thiserror::Error;

/// Alias for `Result<T, EngineError>`.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in the playback runtime.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A variable was defined with an empty name.
    #[error("variable name must not be empty")]
    EmptyVariableName,

    /// A variable's default value does not match its declared type.
    #[error("default value for \"{name}\" must be a {expected}")]
    DefaultTypeMismatch {
        /// The offending variable name.
        name: String,
        /// The declared type.
        expected: VarType,
    },

    /// Variable state could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
