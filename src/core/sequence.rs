//! Sequence runner — cooperative execution of scripted step lists.

use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::core::dispatcher::{ActionDispatcher, Scene};
use crate::core::params::Params;
use crate::core::world_state::WorldStateStore;
use crate::schema::action::{ActionKind, ActionResult};
use crate::schema::level::StepDef;

/// Wait length when a `Wait` step names no `time`.
const DEFAULT_WAIT_SECS: f64 = 1.0;

/// One step of a sequence: an action with its pre-parsed params.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionStep {
    pub action: ActionKind,
    pub params: Params,
}

impl InteractionStep {
    /// Build a step from a keyword and raw params. Unknown keywords yield
    /// `None` so the step is dropped from its sequence.
    pub fn parse(action: &str, raw_params: &str) -> Option<InteractionStep> {
        let Some(kind) = ActionKind::from_keyword(action) else {
            warn!(action, "dropping sequence step with unknown action");
            return None;
        };
        Some(InteractionStep {
            action: kind,
            params: Params::parse(Some(raw_params)),
        })
    }

    pub fn from_def(def: &StepDef) -> Option<InteractionStep> {
        Self::parse(&def.action, &def.params)
    }

    /// Milliseconds a `Wait` step suspends the sequence.
    fn wait_ms(&self) -> f64 {
        self.params
            .get_f64("time")
            .unwrap_or(DEFAULT_WAIT_SECS)
            .max(0.0)
            * 1000.0
    }
}

/// Runs at most one sequence at a time.
///
/// The runner keeps its own clock, advanced by each frame's delta. A `Wait`
/// step records the clock value at which the sequence resumes; every other
/// step is dispatched on the frame it becomes current.
#[derive(Debug, Default)]
pub struct SequenceRunner {
    current: Option<InteractionStep>,
    queue: VecDeque<InteractionStep>,
    clock_ms: f64,
    resume_at_ms: f64,
    blocking: bool,
}

impl SequenceRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// True while a sequence started as blocking is running.
    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    /// Steps not yet reached, excluding the current one.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Start a sequence. Rejected, with no state change, when another
    /// sequence is running or `steps` is empty.
    pub fn start_sequence(&mut self, steps: &[InteractionStep], blocking: bool) -> bool {
        if steps.is_empty() {
            return false;
        }
        if self.is_active() {
            debug!("sequence already running, start rejected");
            return false;
        }
        debug!(steps = steps.len(), blocking, "sequence started");
        self.queue = steps.iter().cloned().collect();
        self.blocking = blocking;
        self.advance();
        true
    }

    /// Abandon the running sequence, if any.
    pub fn cancel(&mut self) {
        if self.is_active() {
            debug!(remaining = self.queue.len(), "sequence cancelled");
        }
        self.end();
    }

    /// Advance by one frame. Expired waits resolve immediately, and at
    /// most one action is dispatched per frame.
    pub fn update(
        &mut self,
        delta_ms: f64,
        dispatcher: &mut ActionDispatcher,
        world: &mut WorldStateStore,
        scene: &mut dyn Scene,
    ) -> Option<ActionResult> {
        if !self.is_active() {
            return None;
        }
        self.clock_ms += delta_ms.max(0.0);

        loop {
            let step = self.current.take()?;
            if step.action == ActionKind::Wait {
                if self.clock_ms < self.resume_at_ms {
                    self.current = Some(step);
                    return None;
                }
                self.advance();
                continue;
            }

            let blocking = self.blocking;
            let result = dispatcher.execute_action(step.action, &step.params, world, scene);
            self.advance();
            return result.map(|mut r| {
                r.blocking |= blocking;
                r
            });
        }
    }

    fn advance(&mut self) {
        self.current = self.queue.pop_front();
        match &self.current {
            Some(step) if step.action == ActionKind::Wait => {
                self.resume_at_ms = self.clock_ms + step.wait_ms();
            }
            Some(_) => {}
            None => self.end(),
        }
    }

    fn end(&mut self) {
        self.current = None;
        self.queue.clear();
        self.blocking = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dispatcher::tests::RecordingScene;
    use crate::schema::level::LevelRegistry;
    use crate::schema::value::Value;

    fn steps(defs: &[(&str, &str)]) -> Vec<InteractionStep> {
        defs.iter()
            .filter_map(|(a, p)| InteractionStep::parse(a, p))
            .collect()
    }

    struct Rig {
        runner: SequenceRunner,
        dispatcher: ActionDispatcher,
        world: WorldStateStore,
        scene: RecordingScene,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                runner: SequenceRunner::new(),
                dispatcher: ActionDispatcher::new(LevelRegistry::new(), 0),
                world: WorldStateStore::new(),
                scene: RecordingScene::default(),
            }
        }

        fn tick(&mut self, delta_ms: f64) -> Option<ActionResult> {
            self.runner
                .update(delta_ms, &mut self.dispatcher, &mut self.world, &mut self.scene)
        }
    }

    #[test]
    fn wait_then_set_flag() {
        let mut rig = Rig::new();
        let seq = steps(&[("Wait", "time=1.0"), ("SetFlag", "flag=y;value=1")]);
        assert!(rig.runner.start_sequence(&seq, false));

        for _ in 0..9 {
            assert!(rig.tick(100.0).is_none());
        }
        assert!(rig.world.get("y").is_none());

        rig.tick(100.0);
        assert_eq!(rig.world.get("y"), Some(&Value::Int(1)));
        assert!(!rig.runner.is_active());
    }

    #[test]
    fn wait_is_independent_of_frame_size() {
        let mut rig = Rig::new();
        let seq = steps(&[("Wait", "time=0.5"), ("SetFlag", "flag=done;value=true")]);
        rig.runner.start_sequence(&seq, false);

        rig.tick(16.0);
        rig.tick(400.0);
        assert!(rig.world.get("done").is_none());
        rig.tick(200.0);
        assert_eq!(rig.world.get("done"), Some(&Value::Bool(true)));
    }

    #[test]
    fn second_start_is_rejected() {
        let mut rig = Rig::new();
        let first = steps(&[("Wait", "time=1"), ("SetFlag", "flag=first;value=1")]);
        let second = steps(&[("SetFlag", "flag=second;value=1")]);

        assert!(rig.runner.start_sequence(&first, false));
        assert!(!rig.runner.start_sequence(&second, true));
        assert!(!rig.runner.is_blocking());
        assert_eq!(rig.runner.remaining(), 1);

        rig.tick(1000.0);
        assert_eq!(rig.world.get("first"), Some(&Value::Int(1)));
        assert!(rig.world.get("second").is_none());
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let mut rig = Rig::new();
        assert!(!rig.runner.start_sequence(&[], true));
        assert!(!rig.runner.is_active());
        assert!(rig.tick(16.0).is_none());
    }

    #[test]
    fn one_action_per_frame() {
        let mut rig = Rig::new();
        let seq = steps(&[
            ("SetFlag", "flag=a;value=1"),
            ("SetFlag", "flag=b;value=1"),
        ]);
        rig.runner.start_sequence(&seq, false);

        rig.tick(16.0);
        assert!(rig.world.get("a").is_some());
        assert!(rig.world.get("b").is_none());
        rig.tick(16.0);
        assert!(rig.world.get("b").is_some());
        assert!(!rig.runner.is_active());
    }

    #[test]
    fn results_carry_sequence_blocking() {
        let mut rig = Rig::new();
        let seq = steps(&[
            ("ShowNote", "text=first"),
            ("ShowDialogue", "text=second"),
        ]);
        rig.runner.start_sequence(&seq, true);
        assert!(rig.runner.is_blocking());

        assert!(rig.tick(16.0).unwrap().blocking);
        let last = rig.tick(16.0).unwrap();
        assert!(last.blocking);
        assert!(!rig.runner.is_blocking());
    }

    #[test]
    fn unknown_steps_are_dropped() {
        let seq = steps(&[("Dance", "x=1"), ("SetFlag", "flag=a;value=1")]);
        assert_eq!(seq.len(), 1);
        assert_eq!(seq[0].action, ActionKind::SetFlag);
    }

    #[test]
    fn cancel_returns_to_idle() {
        let mut rig = Rig::new();
        let seq = steps(&[("Wait", "time=5"), ("SetFlag", "flag=a;value=1")]);
        rig.runner.start_sequence(&seq, true);
        rig.runner.cancel();
        assert!(!rig.runner.is_active());
        assert!(!rig.runner.is_blocking());
        rig.tick(10_000.0);
        assert!(rig.world.get("a").is_none());
    }
}
