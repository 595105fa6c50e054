//! Narrative playback runtime for Fabula.
//!
//! Three collaborating units drive scene playback: an [`EventBus`] decouples
//! the engine from its observers, a [`VariableManager`] holds typed, bounded
//! narrative state, and a [`DialogueEngine`] walks a scene deciding what to
//! show next. The rendering/editor layer constructs one of each, subscribes
//! to the bus, and feeds validated [`fabula_core::Scene`] documents in.
//!
//! The whole runtime is single-threaded and synchronous: `publish` dispatches
//! handlers in-line on the caller's stack, and every unit is re-entrant-safe
//! so a handler may call back into the engine mid-dispatch.

/// Named-topic publish/subscribe hub.
pub mod bus;
/// Engine configuration.
pub mod config;
/// The dialogue state machine.
pub mod engine;
/// Error types for the runtime.
pub mod error;
/// Event payloads and topic names emitted by the runtime.
pub mod events;
/// The typed variable store.
pub mod variables;

/// Re-export the event bus.
pub use bus::{EventBus, HandlerId};
/// Re-export the engine configuration.
pub use config::EngineConfig;
/// Re-export the dialogue engine.
pub use engine::{DialogueEngine, EngineState};
/// Re-export error types.
pub use error::{EngineError, EngineResult};
/// Re-export event types.
pub use events::{EventPayload, topic};
/// Re-export the variable store.
pub use variables::{Variable, VariableManager};
