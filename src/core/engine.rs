//! The script engine: per-frame orchestration of world state, sequences,
//! triggers and interactables for the current level.
//!
//! Built via `ScriptEngine::builder()`.

use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::dispatcher::{ActionDispatcher, Scene};
use crate::core::evaluator::{FrameContacts, Interactable, Trigger, TriggerEvaluator};
use crate::core::presenter::{present, Presenter};
use crate::core::world_state::{LevelChangeRequest, TeleportRequest, WorldStateStore};
use crate::schema::action::{ActionResult, LightingChange, MusicCue};
use crate::schema::level::{LevelData, LevelError, LevelRegistry, Zone};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("level error: {0}")]
    Level(#[from] LevelError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown start level: {0}")]
    UnknownStartLevel(String),
}

/// Runtime objects of the loaded level.
#[derive(Debug, Clone)]
pub struct LevelState {
    pub name: String,
    pub triggers: Vec<Trigger>,
    pub interactables: Vec<Interactable>,
}

impl LevelState {
    /// Build fresh runtime objects. Consumed triggers are left out and
    /// consumed interactables come back already used.
    pub fn build(data: &LevelData, world: &WorldStateStore) -> LevelState {
        let triggers = data
            .triggers
            .iter()
            .filter(|def| !world.has_been_consumed(&def.id))
            .map(Trigger::from_def)
            .collect();
        let interactables = data
            .interactables
            .iter()
            .map(|def| {
                let mut obj = Interactable::from_def(def);
                if world.has_been_consumed(&def.id) {
                    obj.progress.restore_consumed();
                }
                obj
            })
            .collect();
        LevelState {
            name: data.name.clone(),
            triggers,
            interactables,
        }
    }

    pub fn interactable(&self, id: &str) -> Option<&Interactable> {
        self.interactables.iter().find(|obj| obj.id == id)
    }

    fn apply_visibility(&mut self, changes: &[(String, bool)]) {
        for (id, hidden) in changes {
            if let Some(obj) = self.interactables.iter_mut().find(|obj| &obj.id == id) {
                obj.progress.set_hidden(*hidden);
            }
        }
    }
}

/// Per-frame input from the game.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub delta_ms: f64,
    pub contacts: FrameContacts,
}

impl FrameInput {
    pub fn new(delta_ms: f64) -> Self {
        Self {
            delta_ms,
            contacts: FrameContacts::default(),
        }
    }

    pub fn touching(mut self, id: &str) -> Self {
        self.contacts = self.contacts.with_touch(id);
        self
    }

    pub fn attacking(mut self, id: &str) -> Self {
        self.contacts = self.contacts.with_attack(id);
        self
    }
}

/// What happened during one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameOutcome {
    /// Reposition the player; the zone, if any, was already entered.
    pub teleport: Option<TeleportRequest>,
    /// The level was swapped; the game reloads its map and moves the player.
    pub level_change: Option<LevelChangeRequest>,
    /// Results handed to the presenter this frame.
    pub results: Vec<ActionResult>,
    /// The interactable that finished; the game should cancel the attack.
    pub finished_interactable: Option<String>,
    /// Gameplay input stays suspended.
    pub input_suspended: bool,
}

/// Forwards to the game's scene and records visibility toggles so they
/// can be mirrored onto the level's interactables.
struct SceneProxy<'a> {
    inner: &'a mut dyn Scene,
    visibility: Vec<(String, bool)>,
}

impl<'a> SceneProxy<'a> {
    fn new(inner: &'a mut dyn Scene) -> Self {
        Self {
            inner,
            visibility: Vec::new(),
        }
    }
}

impl Scene for SceneProxy<'_> {
    fn unhide_object_by_id(&mut self, id: &str) {
        self.visibility.push((id.to_string(), false));
        self.inner.unhide_object_by_id(id);
    }
    fn hide_object_by_id(&mut self, id: &str) {
        self.visibility.push((id.to_string(), true));
        self.inner.hide_object_by_id(id);
    }
    fn change_zone(&mut self, zone: Zone) {
        self.inner.change_zone(zone);
    }
    fn play_sound(&mut self, name: &str, volume: Option<f32>) -> bool {
        self.inner.play_sound(name, volume)
    }
    fn stop_sound(&mut self, name: &str) {
        self.inner.stop_sound(name);
    }
    fn play_music(&mut self, cue: &MusicCue) {
        self.inner.play_music(cue);
    }
    fn set_lighting(&mut self, change: LightingChange) {
        self.inner.set_lighting(change);
    }
}

/// The top-level scripted-event engine.
pub struct ScriptEngine {
    world: WorldStateStore,
    evaluator: TriggerEvaluator,
    level: Option<LevelState>,
}

/// Builder for constructing a `ScriptEngine`.
#[derive(Default)]
pub struct ScriptEngineBuilder {
    levels_dir: Option<String>,
    /// Directly provided levels (for testing without files).
    levels: Option<LevelRegistry>,
    seed: u64,
    charge_sound: Option<String>,
    start_level: Option<String>,
}

impl ScriptEngine {
    pub fn builder() -> ScriptEngineBuilder {
        ScriptEngineBuilder::default()
    }

    pub fn world(&self) -> &WorldStateStore {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut WorldStateStore {
        &mut self.world
    }

    pub fn evaluator(&self) -> &TriggerEvaluator {
        &self.evaluator
    }

    pub fn evaluator_mut(&mut self) -> &mut TriggerEvaluator {
        &mut self.evaluator
    }

    pub fn level(&self) -> Option<&LevelState> {
        self.level.as_ref()
    }

    pub fn levels(&self) -> &LevelRegistry {
        self.evaluator.dispatcher().levels()
    }

    /// True while a blocking sequence runs.
    pub fn is_blocking(&self) -> bool {
        self.evaluator.runner().is_blocking()
    }

    /// Load a level's runtime objects. A running sequence is left alone.
    /// Returns false for an unknown level, keeping the current one.
    pub fn enter_level(&mut self, name: &str) -> bool {
        let Some(data) = self.evaluator.dispatcher().levels().get(name) else {
            warn!(level = name, "cannot enter unknown level");
            return false;
        };
        let state = LevelState::build(data, &self.world);
        info!(
            level = name,
            triggers = state.triggers.len(),
            interactables = state.interactables.len(),
            "level entered"
        );
        self.level = Some(state);
        self.evaluator.reset_contacts();
        true
    }

    /// Start a new game: clear the world state, drop any sequence and
    /// rebuild the current level from scratch.
    pub fn reset(&mut self) {
        self.world.reset();
        self.evaluator.runner_mut().cancel();
        if let Some(name) = self.level.as_ref().map(|l| l.name.clone()) {
            self.enter_level(&name);
        }
    }

    /// Run one frame.
    ///
    /// Pending teleport and level-change requests are polled once each and
    /// applied first; such a frame does nothing else. While the presenter
    /// blocks, the frame is skipped entirely. Otherwise the sequence runner
    /// advances, then triggers and interactables are scanned, and every
    /// result is routed to the presenter.
    pub fn tick(
        &mut self,
        input: &FrameInput,
        scene: &mut dyn Scene,
        presenter: &mut dyn Presenter,
    ) -> FrameOutcome {
        let mut outcome = FrameOutcome {
            teleport: self.world.consume_teleport(),
            level_change: self.world.consume_level_change(),
            ..FrameOutcome::default()
        };

        if let Some(teleport) = &outcome.teleport {
            if let Some(zone) = teleport.zone {
                scene.change_zone(zone);
            }
            info!(x = teleport.x, y = teleport.y, "player teleported");
        }
        if let Some(change) = &outcome.level_change {
            if self.enter_level(&change.level) {
                scene.change_zone(change.entry_zone);
            }
        }
        if outcome.teleport.is_some() || outcome.level_change.is_some() {
            outcome.input_suspended = self.is_blocking() || presenter.is_blocking();
            return outcome;
        }

        if presenter.is_blocking() {
            outcome.input_suspended = true;
            return outcome;
        }

        let mut proxy = SceneProxy::new(scene);
        outcome.results.extend(
            self.evaluator
                .update_sequence(input.delta_ms, &mut self.world, &mut proxy),
        );
        if let Some(level) = self.level.as_mut() {
            let report = self.evaluator.scan(
                &input.contacts,
                &level.triggers,
                &mut level.interactables,
                &mut self.world,
                &mut proxy,
            );
            outcome.results.extend(report.results);
            outcome.finished_interactable = report.finished;
            level.apply_visibility(&proxy.visibility);
        }

        for result in &outcome.results {
            present(result, presenter);
        }
        outcome.input_suspended = self.is_blocking() || presenter.is_blocking();
        outcome
    }
}

impl ScriptEngineBuilder {
    pub fn levels_dir(mut self, path: &str) -> Self {
        self.levels_dir = Some(path.to_string());
        self
    }

    /// Provide levels directly (for testing without files).
    pub fn with_levels(mut self, levels: LevelRegistry) -> Self {
        self.levels = Some(levels);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sound looped while an interactable charges.
    pub fn charge_sound(mut self, name: &str) -> Self {
        self.charge_sound = Some(name.to_string());
        self
    }

    pub fn start_level(mut self, name: &str) -> Self {
        self.start_level = Some(name.to_string());
        self
    }

    pub fn build(self) -> Result<ScriptEngine, EngineError> {
        let mut levels = self.levels.unwrap_or_default();

        // Files override directly provided levels of the same name
        if let Some(ref dir) = self.levels_dir {
            if Path::new(dir).exists() {
                load_ron_files_from_dir(dir, |path| {
                    let mut loaded = LevelRegistry::new();
                    loaded.insert(LevelData::load_from_ron(path)?);
                    levels.merge(loaded);
                    Ok(())
                })?;
            }
        }

        if let Some(ref name) = self.start_level {
            if !levels.contains(name) {
                return Err(EngineError::UnknownStartLevel(name.clone()));
            }
        }

        let dispatcher = ActionDispatcher::new(levels, self.seed);
        let mut engine = ScriptEngine {
            world: WorldStateStore::new(),
            evaluator: TriggerEvaluator::new(dispatcher, self.charge_sound),
            level: None,
        };
        if let Some(ref name) = self.start_level {
            engine.enter_level(name);
        }
        Ok(engine)
    }
}

/// Load all .ron files from a directory, calling `loader` for each.
fn load_ron_files_from_dir<F>(dir: &str, mut loader: F) -> Result<(), EngineError>
where
    F: FnMut(&Path) -> Result<(), EngineError>,
{
    let entries = std::fs::read_dir(dir)?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("ron") {
            loader(&path)?;
        }
    }
    Ok(())
}
