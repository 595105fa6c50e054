//! Scene documents: scenes, dialogues, and choices.
//!
//! A [`Scene`] is an ordered sequence of [`Dialogue`] steps. The engine never
//! mutates a scene; editors own these documents and hand them over for
//! playback. Every optional field defaults on deserialization so a malformed
//! authored document degrades instead of failing to parse — it is the
//! renderer's job to show a sensible fallback for missing text.

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::effect::Effect;

/// One narrative unit: an ordered sequence of dialogues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Unique identifier, referenced by choices in other scenes.
    pub id: String,
    /// Display title.
    #[serde(default)]
    pub title: Option<String>,
    /// The dialogue sequence, played in order.
    #[serde(default)]
    pub dialogues: Vec<Dialogue>,
}

impl Scene {
    /// Create an empty scene with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            dialogues: Vec::new(),
        }
    }

    /// Set the display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append a dialogue.
    pub fn with_dialogue(mut self, dialogue: Dialogue) -> Self {
        self.dialogues.push(dialogue);
        self
    }
}

/// One line of narration or speech, optionally gated and optionally branching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dialogue {
    /// Optional identifier, used as an in-scene branch target.
    #[serde(default)]
    pub id: Option<String>,
    /// Who speaks this line.
    #[serde(default)]
    pub speaker: String,
    /// The line itself.
    #[serde(default)]
    pub text: String,
    /// All conditions must hold for this dialogue to be shown.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Player choices; a dialogue with choices pauses playback.
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl Dialogue {
    /// Create a new dialogue line.
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: None,
            speaker: speaker.into(),
            text: text.into(),
            conditions: Vec::new(),
            choices: Vec::new(),
        }
    }

    /// Set the branch-target identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add a choice.
    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }
}

/// A player-selectable option attached to a dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    /// The option text shown to the player.
    #[serde(default)]
    pub text: String,
    /// All conditions must hold for this choice to be offered.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Effects applied, in order, when this choice is selected.
    #[serde(default)]
    pub effects: Vec<Effect>,
    /// Scene to jump to; resolution is the caller's responsibility.
    #[serde(default)]
    pub next_scene_id: Option<String>,
    /// Dialogue (by id) within the current scene to jump to.
    #[serde(default)]
    pub next_dialogue_id: Option<String>,
}

impl Choice {
    /// Create a new choice with the given option text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            conditions: Vec::new(),
            effects: Vec::new(),
            next_scene_id: None,
            next_dialogue_id: None,
        }
    }

    /// Add a condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add an effect.
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Set the target scene.
    pub fn with_goto_scene(mut self, scene_id: impl Into<String>) -> Self {
        self.next_scene_id = Some(scene_id.into());
        self
    }

    /// Set the in-scene target dialogue.
    pub fn with_goto_dialogue(mut self, dialogue_id: impl Into<String>) -> Self {
        self.next_dialogue_id = Some(dialogue_id.into());
        self
    }
}
