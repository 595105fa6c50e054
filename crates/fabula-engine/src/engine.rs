//! The dialogue state machine.
//!
//! The engine walks a [`Scene`] in order, skipping condition-gated dialogues,
//! pausing on choices, applying choice effects to the variable store, and
//! announcing every step on the bus. Playback state lives in `Cell`s and
//! `RefCell`s behind `&self` methods: event handlers are dispatched on the
//! engine's own call stack and are allowed to call straight back in (for
//! example `next()` from inside a `dialogue_show` handler), so no borrow may
//! be held while the bus runs.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use fabula_core::effect::{RANDOM_DEFAULT_MAX, RANDOM_DEFAULT_MIN};
use fabula_core::{Choice, Effect, EffectOp, Scene, Value, evaluate_all};

use crate::bus::EventBus;
use crate::config::EngineConfig;
use crate::events::{EventPayload, topic};
use crate::variables::VariableManager;

/// The engine's current playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No scene loaded.
    Idle,
    /// A linear dialogue is current.
    ShowingDialogue,
    /// The current dialogue has choices; blocked until one is selected.
    WaitingForChoice,
    /// Terminal until the next `start_scene`.
    SceneEnded,
}

/// Scene playback as a finite state machine.
pub struct DialogueEngine {
    variables: Rc<VariableManager>,
    bus: Rc<EventBus>,
    config: EngineConfig,
    /// The scene being played. The engine never mutates it.
    scene: RefCell<Option<Rc<Scene>>>,
    /// Index of the next dialogue to evaluate.
    cursor: Cell<usize>,
    waiting: Cell<bool>,
    ended: Cell<bool>,
    rng: RefCell<StdRng>,
}

impl DialogueEngine {
    /// Create an engine with the default configuration.
    pub fn new(variables: Rc<VariableManager>, bus: Rc<EventBus>) -> Self {
        Self::with_config(variables, bus, EngineConfig::default())
    }

    /// Create an engine with an explicit configuration.
    pub fn with_config(
        variables: Rc<VariableManager>,
        bus: Rc<EventBus>,
        config: EngineConfig,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            variables,
            bus,
            config,
            scene: RefCell::new(None),
            cursor: Cell::new(0),
            waiting: Cell::new(false),
            ended: Cell::new(false),
            rng: RefCell::new(rng),
        }
    }

    /// Whether the engine is blocked on [`DialogueEngine::select_choice`].
    pub fn is_waiting_for_choice(&self) -> bool {
        self.waiting.get()
    }

    /// Whether the current scene has ended.
    pub fn is_scene_ended(&self) -> bool {
        self.ended.get()
    }

    /// The engine's current state.
    pub fn state(&self) -> EngineState {
        if self.ended.get() {
            EngineState::SceneEnded
        } else if self.waiting.get() {
            EngineState::WaitingForChoice
        } else if self.scene.borrow().is_some() {
            EngineState::ShowingDialogue
        } else {
            EngineState::Idle
        }
    }

    /// Start playing a scene, discarding any prior playback state.
    ///
    /// Publishes `engine:scene_start`, then evaluates forward from the first
    /// dialogue — dialogue 0 is not assumed valid. A scene with no dialogues,
    /// or whose every dialogue fails its conditions, goes straight to
    /// `scene_ended` with a single `engine:scene_end`.
    pub fn start_scene(&self, scene: Scene) {
        let scene = Rc::new(scene);
        *self.scene.borrow_mut() = Some(Rc::clone(&scene));
        self.cursor.set(0);
        self.waiting.set(false);
        self.ended.set(false);

        self.bus.publish(topic::SCENE_START, EventPayload::Scene(scene));
        self.advance();
    }

    /// Advance past the current dialogue.
    ///
    /// A no-op while waiting for a choice, after scene end, or before any
    /// scene was started.
    pub fn next(&self) {
        if self.waiting.get() {
            warn!("next() while waiting for a choice");
            return;
        }
        if self.ended.get() || self.scene.borrow().is_none() {
            return;
        }
        self.advance();
    }

    /// Select one of the current dialogue's choices.
    ///
    /// A no-op with a warning unless the engine is waiting for a choice —
    /// this guards against stale UI callbacks firing after the scene moved
    /// on. Effects apply in order through the variable store; afterwards the
    /// engine either requests a scene change (`next_scene_id`, resolved by
    /// the caller), jumps to an in-scene dialogue (`next_dialogue_id`), or
    /// advances to the next dialogue.
    pub fn select_choice(&self, choice: &Choice) {
        if !self.waiting.get() {
            warn!("select_choice() while not waiting for a choice");
            return;
        }

        self.apply_effects(&choice.effects);
        self.waiting.set(false);

        if let Some(scene_id) = &choice.next_scene_id {
            self.bus.publish(
                topic::SCENE_CHANGE_REQUEST,
                EventPayload::SceneId(scene_id.clone()),
            );
        } else if let Some(dialogue_id) = &choice.next_dialogue_id {
            self.jump_to(dialogue_id);
        } else {
            self.advance();
        }
    }

    /// Force an immediate transition to `scene_ended`.
    ///
    /// Idempotent: `engine:scene_end` is published once per scene, no matter
    /// how the end is reached or how often this is called.
    pub fn end_scene(&self) {
        if self.ended.get() {
            return;
        }
        self.ended.set(true);
        self.waiting.set(false);
        *self.scene.borrow_mut() = None;
        self.bus.publish(topic::SCENE_END, EventPayload::None);
    }

    /// Walk forward from the cursor to the next dialogue whose conditions
    /// hold, bounded by the configured skip limit. Exhaustion and the bound
    /// both terminate the scene cleanly.
    fn advance(&self) {
        let Some(scene) = self.scene.borrow().clone() else {
            self.end_scene();
            return;
        };

        let mut skips = 0usize;
        loop {
            let index = self.cursor.get();
            if index >= scene.dialogues.len() {
                self.end_scene();
                return;
            }
            if skips >= self.config.max_skip_iterations {
                warn!(
                    limit = self.config.max_skip_iterations,
                    scene = %scene.id,
                    "skip limit reached; ending scene to avoid an authored infinite loop"
                );
                self.end_scene();
                return;
            }

            let dialogue = &scene.dialogues[index];
            // Move the cursor first so a handler calling next() re-entrantly
            // continues from the right place.
            self.cursor.set(index + 1);

            if !evaluate_all(&dialogue.conditions, |name| self.variables.get(name)) {
                skips += 1;
                continue;
            }

            self.bus
                .publish(topic::DIALOGUE_SHOW, EventPayload::Dialogue(dialogue.clone()));

            if !dialogue.choices.is_empty() {
                // Filter after dialogue_show: a handler may have mutated
                // variables that gate individual choices.
                let available: Vec<Choice> = dialogue
                    .choices
                    .iter()
                    .filter(|choice| {
                        evaluate_all(&choice.conditions, |name| self.variables.get(name))
                    })
                    .cloned()
                    .collect();
                if available.is_empty() {
                    warn!(
                        scene = %scene.id,
                        index,
                        "every choice was filtered out by conditions; treating dialogue as linear"
                    );
                } else {
                    self.waiting.set(true);
                    self.bus
                        .publish(topic::CHOICES_SHOW, EventPayload::Choices(available));
                }
            }
            return;
        }
    }

    /// Move the cursor to the dialogue with the given id, then evaluate from
    /// there. An unknown id warns and falls through to plain advancement.
    fn jump_to(&self, dialogue_id: &str) {
        let target = self.scene.borrow().as_ref().and_then(|scene| {
            scene
                .dialogues
                .iter()
                .position(|d| d.id.as_deref() == Some(dialogue_id))
        });
        match target {
            Some(index) => self.cursor.set(index),
            None => warn!(dialogue_id, "choice targets an unknown dialogue id"),
        }
        self.advance();
    }

    /// Apply a choice's effects in order through the variable store, so every
    /// assignment picks up the variable's own coercion and clamping.
    fn apply_effects(&self, effects: &[Effect]) {
        for effect in effects {
            match &effect.op {
                EffectOp::Set { value } => {
                    self.variables.set(&effect.variable, value.clone());
                }
                EffectOp::Add { value } => {
                    let current = match self.variables.get(&effect.variable) {
                        Some(Value::Number(n)) => n,
                        _ => 0.0,
                    };
                    self.variables.set(&effect.variable, current + value);
                }
                EffectOp::Random { min, max } => {
                    let min = min.unwrap_or(RANDOM_DEFAULT_MIN);
                    let max = max.unwrap_or(RANDOM_DEFAULT_MAX);
                    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
                    let roll = self.rng.borrow_mut().random_range(lo..=hi);
                    self.variables.set(&effect.variable, roll as f64);
                }
            }
        }
    }
}
