//! Trigger and interaction evaluation — decides each frame which placed
//! objects fire, and what firing does.

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::core::dispatcher::{ActionDispatcher, Scene};
use crate::core::interaction::{InteractionProgress, InteractionSignal};
use crate::core::params::Params;
use crate::core::sequence::{InteractionStep, SequenceRunner};
use crate::core::world_state::WorldStateStore;
use crate::schema::action::{ActionKind, ActionResult};
use crate::schema::condition::{Condition, FlagOperator};
use crate::schema::level::{InteractableDef, StepDef, TriggerDef};

/// The compiled behavior of a placed object: condition, action and
/// params parsed once at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub condition: Condition,
    pub action: Option<ActionKind>,
    pub params: Params,
    pub raw_params: String,
    pub steps: Vec<InteractionStep>,
}

impl Script {
    /// Compile level-data keywords. Unknown keywords are logged and
    /// degrade to "no condition" / "no action".
    pub fn compile(
        owner: &str,
        condition: &str,
        action: &str,
        raw_params: &str,
        steps: &[StepDef],
    ) -> Script {
        let condition = Condition::from_keyword(condition).unwrap_or_else(|| {
            warn!(owner, condition, "unknown condition keyword");
            Condition::None
        });
        let action = match action {
            "None" | "" => None,
            keyword => {
                let kind = ActionKind::from_keyword(keyword);
                if kind.is_none() {
                    warn!(owner, action = keyword, "unknown action keyword");
                }
                kind
            }
        };
        Script {
            condition,
            action,
            params: Params::parse(Some(raw_params)),
            raw_params: raw_params.to_string(),
            steps: steps.iter().filter_map(InteractionStep::from_def).collect(),
        }
    }
}

/// Anything the evaluator can fire.
pub trait Scripted {
    fn id(&self) -> &str;
    fn script(&self) -> &Script;
    /// Interactables track their own one-shot state and are never spent
    /// by their condition.
    fn is_interactable(&self) -> bool {
        false
    }
}

/// A placed trigger volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub id: String,
    pub script: Script,
}

impl Trigger {
    pub fn from_def(def: &TriggerDef) -> Trigger {
        Trigger {
            id: def.id.clone(),
            script: Script::compile(
                &def.id,
                &def.condition,
                &def.action,
                &def.params,
                &def.scripted_events,
            ),
        }
    }
}

impl Scripted for Trigger {
    fn id(&self) -> &str {
        &self.id
    }
    fn script(&self) -> &Script {
        &self.script
    }
}

/// A placed object that fires after sustained contact.
#[derive(Debug, Clone, PartialEq)]
pub struct Interactable {
    pub id: String,
    pub script: Script,
    pub progress: InteractionProgress,
}

impl Interactable {
    /// `OnStay`/`OnEnter` interactables fire on the first frame of contact.
    pub fn from_def(def: &InteractableDef) -> Interactable {
        let script = Script::compile(
            &def.id,
            &def.condition,
            &def.action,
            &def.params,
            &def.scripted_events,
        );
        let duration = match script.condition {
            Condition::OnStay | Condition::OnEnter => 1,
            _ => def.duration,
        };
        Interactable {
            id: def.id.clone(),
            progress: InteractionProgress::new(duration, def.starts_hidden),
            script,
        }
    }

    /// Which contact drives this object's progress.
    fn in_contact(&self, contacts: &FrameContacts) -> bool {
        match self.script.condition {
            Condition::OnStay | Condition::OnEnter => contacts.touching.contains(&self.id),
            Condition::OnInteract | Condition::None => contacts.attacking.contains(&self.id),
            Condition::AutoStart | Condition::IfFlag => false,
        }
    }
}

impl Scripted for Interactable {
    fn id(&self) -> &str {
        &self.id
    }
    fn script(&self) -> &Script {
        &self.script
    }
    fn is_interactable(&self) -> bool {
        true
    }
}

/// Object ids the player overlaps this frame, as reported by the game's
/// collision pass.
#[derive(Debug, Clone, Default)]
pub struct FrameContacts {
    /// Overlapping the player's body.
    pub touching: FxHashSet<String>,
    /// Hit by the player's attack/use box.
    pub attacking: FxHashSet<String>,
}

impl FrameContacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_touch(mut self, id: &str) -> Self {
        self.touching.insert(id.to_string());
        self
    }

    pub fn with_attack(mut self, id: &str) -> Self {
        self.attacking.insert(id.to_string());
        self
    }
}

/// What one frame's scan produced.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub results: Vec<ActionResult>,
    /// The interactable that finished this frame, if any.
    pub finished: Option<String>,
}

/// Evaluate an `IfFlag` parameter set against the world state.
///
/// Either a single `flag` compared with `value`, or `flag_a`/`flag_b`
/// combined by `condition` (`AND`, `OR`, `EQUAL`, `NOT_EQUAL`, default
/// `AND`).
pub fn flag_condition_holds(params: &Params, world: &WorldStateStore) -> bool {
    let expected = params.get("value");

    if let (Some(flag_a), Some(flag_b)) = (params.get_text("flag_a"), params.get_text("flag_b")) {
        let operator = match params.get_text("condition") {
            None => FlagOperator::And,
            Some(keyword) => match FlagOperator::from_keyword(&keyword) {
                Some(op) => op,
                None => {
                    warn!(operator = %keyword, "unknown IfFlag operator");
                    return false;
                }
            },
        };
        let a = world.get(&flag_a);
        let b = world.get(&flag_b);
        return match operator {
            FlagOperator::And => a == expected && b == expected,
            FlagOperator::Or => a == expected || b == expected,
            FlagOperator::Equal => a == b,
            FlagOperator::NotEqual => a != b,
        };
    }

    match params.get_text("flag") {
        Some(flag) => world.check(&flag, expected),
        None => {
            warn!("IfFlag without a flag");
            false
        }
    }
}

/// Fires triggers and interactables, owning the dispatcher and the single
/// sequence runner.
pub struct TriggerEvaluator {
    dispatcher: ActionDispatcher,
    runner: SequenceRunner,
    last_frame_triggers: FxHashSet<String>,
    charge_sound: Option<String>,
}

impl TriggerEvaluator {
    pub fn new(dispatcher: ActionDispatcher, charge_sound: Option<String>) -> Self {
        Self {
            dispatcher,
            runner: SequenceRunner::new(),
            last_frame_triggers: FxHashSet::default(),
            charge_sound,
        }
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut ActionDispatcher {
        &mut self.dispatcher
    }

    pub fn runner(&self) -> &SequenceRunner {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut SequenceRunner {
        &mut self.runner
    }

    /// Forget which triggers were touched last frame, so `OnEnter` fires
    /// again for objects of a freshly loaded level.
    pub fn reset_contacts(&mut self) {
        self.last_frame_triggers.clear();
    }

    /// Advance the active sequence by one frame.
    pub fn update_sequence(
        &mut self,
        delta_ms: f64,
        world: &mut WorldStateStore,
        scene: &mut dyn Scene,
    ) -> Option<ActionResult> {
        self.runner
            .update(delta_ms, &mut self.dispatcher, world, scene)
    }

    /// Fire one object: check its flag condition, then start its sequence
    /// or dispatch its single action, recording one-shot consumption.
    pub fn process_trigger(
        &mut self,
        obj: &dyn Scripted,
        world: &mut WorldStateStore,
        scene: &mut dyn Scene,
    ) -> Option<ActionResult> {
        let script = obj.script();
        if script.condition == Condition::IfFlag && !flag_condition_holds(&script.params, world) {
            return None;
        }

        let mut consume = script.condition.is_one_shot()
            && !obj.is_interactable()
            && script.params.get_bool("kill").unwrap_or(true);

        if !script.steps.is_empty() {
            let blocking = script.params.get_bool("blocking").unwrap_or(false);
            let started = self.runner.start_sequence(&script.steps, blocking);
            if started && consume {
                world.register_consumed(obj.id());
            }
            return None;
        }

        let action = script.action?;
        debug!(id = obj.id(), action = action.keyword(), "object fired");
        let result = self
            .dispatcher
            .execute_action(action, &script.params, world, scene);

        // the zone is about to change, nothing to spend
        if action.changes_zone() {
            consume = false;
        }
        if consume {
            world.register_consumed(obj.id());
        }
        result
    }

    /// Evaluate every trigger and interactable against this frame's
    /// contacts. At most one interactable finishes per frame.
    pub fn scan(
        &mut self,
        contacts: &FrameContacts,
        triggers: &[Trigger],
        interactables: &mut [Interactable],
        world: &mut WorldStateStore,
        scene: &mut dyn Scene,
    ) -> ScanReport {
        let mut report = ScanReport::default();

        let mut touching_now = FxHashSet::default();
        for trigger in triggers {
            if world.has_been_consumed(&trigger.id) {
                continue;
            }
            let touching = contacts.touching.contains(&trigger.id);
            if touching {
                touching_now.insert(trigger.id.clone());
            }
            let fire = match trigger.script.condition {
                Condition::OnStay | Condition::IfFlag => touching,
                Condition::OnEnter => touching && !self.last_frame_triggers.contains(&trigger.id),
                Condition::AutoStart => true,
                Condition::OnInteract | Condition::None => false,
            };
            if fire {
                report.results.extend(self.process_trigger(trigger, world, scene));
            }
        }
        self.last_frame_triggers = touching_now;

        let mut processed = false;
        for obj in interactables.iter_mut() {
            // hidden objects lose contact, so a charge in progress is dropped
            if obj.in_contact(contacts) && !obj.progress.is_hidden() && !processed {
                match obj.progress.progress_interaction() {
                    Some(InteractionSignal::Finished) => {
                        processed = true;
                        if obj.progress.duration() > 1 {
                            self.stop_charge(scene);
                        }
                        report.results.extend(self.process_trigger(&*obj, world, scene));
                        if !obj.script.action.is_some_and(|a| a.changes_zone()) {
                            world.register_consumed(&obj.id);
                        }
                        report.finished = Some(obj.id.clone());
                    }
                    Some(InteractionSignal::ChargeStarted | InteractionSignal::ChargePulse) => {
                        self.play_charge(scene);
                    }
                    None => {}
                }
            } else if obj.progress.reset_interaction() {
                self.stop_charge(scene);
            }
        }

        report
    }

    fn play_charge(&self, scene: &mut dyn Scene) {
        if let Some(sound) = &self.charge_sound {
            scene.play_sound(sound, None);
        }
    }

    fn stop_charge(&self, scene: &mut dyn Scene) {
        if let Some(sound) = &self.charge_sound {
            scene.stop_sound(sound);
        }
    }
}
