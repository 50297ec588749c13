//! Interaction progress — turns sustained contact into a single
//! "finished" edge.

/// Frames between charge pulses while an interaction builds up.
pub const CHARGE_CADENCE: u32 = 15;

/// What a frame of contact produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionSignal {
    /// First frame of contact: start the charge sound.
    ChargeStarted,
    /// Fixed-cadence feedback while charging.
    ChargePulse,
    /// Progress reached the required duration. Produced exactly once per
    /// object instance; the charge sound must stop.
    Finished,
}

/// Per-interactable progress state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionProgress {
    progress: u32,
    duration: u32,
    interacted_once: bool,
    hidden: bool,
}

impl InteractionProgress {
    /// A zero duration is treated as one frame.
    pub fn new(duration: u32, hidden: bool) -> Self {
        Self {
            progress: 0,
            duration: duration.max(1),
            interacted_once: false,
            hidden,
        }
    }

    pub fn progress(&self) -> u32 {
        self.progress
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn interacted_once(&self) -> bool {
        self.interacted_once
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    /// Mark an instance rebuilt from level data as already used.
    pub fn restore_consumed(&mut self) {
        self.interacted_once = true;
        self.progress = self.duration;
    }

    /// Call once per frame while contact holds.
    pub fn progress_interaction(&mut self) -> Option<InteractionSignal> {
        if self.hidden || self.interacted_once {
            return None;
        }

        self.progress += 1;
        if self.progress >= self.duration {
            self.progress = self.duration;
            self.interacted_once = true;
            return Some(InteractionSignal::Finished);
        }

        if self.progress == 1 {
            Some(InteractionSignal::ChargeStarted)
        } else if self.progress % CHARGE_CADENCE == 0 {
            Some(InteractionSignal::ChargePulse)
        } else {
            None
        }
    }

    /// Call once per frame while contact is absent. Returns true when a
    /// charge was interrupted and its sound must stop.
    pub fn reset_interaction(&mut self) -> bool {
        if self.progress == 0 || self.interacted_once {
            return false;
        }
        self.progress = 0;
        true
    }
}
