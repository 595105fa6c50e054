//! Event payloads and topic names emitted by the runtime.

use std::rc::Rc;

use fabula_core::{Choice, Dialogue, Scene, Value};

/// Topic names published by the runtime.
pub mod topic {
    /// A scene started playback. Payload: [`super::EventPayload::Scene`].
    pub const SCENE_START: &str = "engine:scene_start";
    /// The next dialogue step to render. Payload: [`super::EventPayload::Dialogue`].
    pub const DIALOGUE_SHOW: &str = "engine:dialogue_show";
    /// Selectable options for the current dialogue. Payload: [`super::EventPayload::Choices`].
    pub const CHOICES_SHOW: &str = "engine:choices_show";
    /// The scene is exhausted or was forcibly ended. Payload: [`super::EventPayload::None`].
    pub const SCENE_END: &str = "engine:scene_end";
    /// A choice requested a jump to another scene; the caller resolves the id.
    /// Payload: [`super::EventPayload::SceneId`].
    pub const SCENE_CHANGE_REQUEST: &str = "engine:scene_change_request";
    /// A variable's value actually changed. Payload: [`super::EventPayload::VariableChanged`].
    pub const VARIABLE_CHANGED: &str = "variable:changed";
}

/// Data carried by a published event.
#[derive(Debug, Clone)]
pub enum EventPayload {
    /// No payload.
    None,
    /// The scene that started playback.
    Scene(Rc<Scene>),
    /// The current dialogue.
    Dialogue(Dialogue),
    /// The currently available choices, already filtered by their conditions.
    Choices(Vec<Choice>),
    /// A variable changed value.
    VariableChanged {
        /// The variable's name.
        name: String,
        /// The new value.
        value: Value,
        /// The value before the change.
        old_value: Value,
    },
    /// The id of the scene a choice requested.
    SceneId(String),
}
