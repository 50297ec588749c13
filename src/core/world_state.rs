//! World state store — session flags, spent object ids and pending
//! zone/level requests.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

use crate::schema::level::Zone;
use crate::schema::value::Value;

/// A level change waiting for the game loop to act on it.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelChangeRequest {
    pub level: String,
    pub json_path: String,
    pub entry_zone: Zone,
    pub player_pos: Option<(f64, f64)>,
    pub music_path: Option<String>,
    pub darkness: bool,
}

/// A teleport waiting for the game loop. `zone: None` keeps the current zone.
#[derive(Debug, Clone, PartialEq)]
pub struct TeleportRequest {
    pub zone: Option<Zone>,
    pub x: f64,
    pub y: f64,
}

/// Mutable state shared by everything that runs scripted events.
///
/// Built once per game session and passed by `&mut` into the dispatcher,
/// the evaluator and the engine. Each pending request is a single slot: a
/// new request replaces an unconsumed one, and consuming empties the slot.
#[derive(Debug, Default)]
pub struct WorldStateStore {
    flags: FxHashMap<String, Value>,
    consumed: FxHashSet<String>,
    pending_level_change: Option<LevelChangeRequest>,
    pending_teleport: Option<TeleportRequest>,
}

impl WorldStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: Value) {
        debug!(flag = name, %value, "flag set");
        self.flags.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.flags.get(name)
    }

    /// Adds `amount` to a numeric flag, treating an absent flag as 0.
    /// Flags holding a bool or a string are left alone.
    pub fn increment(&mut self, name: &str, amount: &Value) {
        let current = self.flags.get(name).cloned().unwrap_or(Value::Int(0));
        if !current.is_numeric() {
            debug!(flag = name, %current, "increment skipped, flag is not numeric");
            return;
        }
        if let Some(next) = current.add(amount) {
            self.set(name, next);
        }
    }

    /// Exact comparison against an expected value. An absent flag only
    /// matches an absent expectation.
    pub fn check(&self, name: &str, expected: Option<&Value>) -> bool {
        self.flags.get(name) == expected
    }

    pub fn register_consumed(&mut self, id: &str) {
        debug!(id, "object consumed");
        self.consumed.insert(id.to_string());
    }

    pub fn has_been_consumed(&self, id: &str) -> bool {
        self.consumed.contains(id)
    }

    pub fn request_level_change(&mut self, request: LevelChangeRequest) {
        debug!(target_level = %request.level, "level change requested");
        self.pending_level_change = Some(request);
    }

    pub fn consume_level_change(&mut self) -> Option<LevelChangeRequest> {
        self.pending_level_change.take()
    }

    pub fn request_teleport(&mut self, request: TeleportRequest) {
        debug!(x = request.x, y = request.y, "teleport requested");
        self.pending_teleport = Some(request);
    }

    pub fn consume_teleport(&mut self) -> Option<TeleportRequest> {
        self.pending_teleport.take()
    }

    /// Forget everything to start a new game.
    pub fn reset(&mut self) {
        self.flags.clear();
        self.consumed.clear();
        self.pending_level_change = None;
        self.pending_teleport = None;
        info!("world state reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teleport(x: f64) -> TeleportRequest {
        TeleportRequest {
            zone: None,
            x,
            y: 0.0,
        }
    }

    fn level_change(level: &str) -> LevelChangeRequest {
        LevelChangeRequest {
            level: level.to_string(),
            json_path: format!("data/{}.json", level),
            entry_zone: Zone(0, 0),
            player_pos: Some((10.0, 20.0)),
            music_path: None,
            darkness: false,
        }
    }

    #[test]
    fn set_and_get() {
        let mut ws = WorldStateStore::new();
        assert!(ws.get("door").is_none());
        ws.set("door", Value::Bool(true));
        assert_eq!(ws.get("door"), Some(&Value::Bool(true)));
        ws.set("door", Value::from("broken"));
        assert_eq!(ws.get("door"), Some(&Value::from("broken")));
    }

    #[test]
    fn increment_absent_starts_at_zero() {
        let mut ws = WorldStateStore::new();
        ws.increment("notes_read", &Value::Int(1));
        ws.increment("notes_read", &Value::Int(2));
        assert_eq!(ws.get("notes_read"), Some(&Value::Int(3)));
    }

    #[test]
    fn increment_non_numeric_is_noop() {
        let mut ws = WorldStateStore::new();
        ws.set("name", Value::from("ghost"));
        ws.increment("name", &Value::Int(1));
        assert_eq!(ws.get("name"), Some(&Value::from("ghost")));

        ws.set("lit", Value::Bool(true));
        ws.increment("lit", &Value::Int(1));
        assert_eq!(ws.get("lit"), Some(&Value::Bool(true)));
    }

    #[test]
    fn check_semantics() {
        let mut ws = WorldStateStore::new();
        assert!(!ws.check("key", Some(&Value::Bool(false))));
        assert!(ws.check("key", None));
        ws.set("key", Value::Int(1));
        assert!(ws.check("key", Some(&Value::Int(1))));
        assert!(ws.check("key", Some(&Value::Float(1.0))));
        assert!(!ws.check("key", Some(&Value::Int(2))));
        assert!(!ws.check("key", None));
    }

    #[test]
    fn consumed_registry() {
        let mut ws = WorldStateStore::new();
        assert!(!ws.has_been_consumed("t1"));
        ws.register_consumed("t1");
        assert!(ws.has_been_consumed("t1"));
        assert!(!ws.has_been_consumed("t2"));
    }

    #[test]
    fn requests_are_single_slot() {
        let mut ws = WorldStateStore::new();
        ws.request_teleport(teleport(1.0));
        ws.request_teleport(teleport(2.0));
        assert_eq!(ws.consume_teleport(), Some(teleport(2.0)));
        assert_eq!(ws.consume_teleport(), None);

        ws.request_level_change(level_change("forest"));
        ws.request_level_change(level_change("manor"));
        let req = ws.consume_level_change().unwrap();
        assert_eq!(req.level, "manor");
        assert!(ws.consume_level_change().is_none());
    }

    #[test]
    fn reset_clears_everything() {
        let mut ws = WorldStateStore::new();
        ws.set("a", Value::Int(1));
        ws.register_consumed("t1");
        ws.request_teleport(teleport(1.0));
        ws.request_level_change(level_change("manor"));

        ws.reset();

        assert!(ws.get("a").is_none());
        assert!(!ws.has_been_consumed("t1"));
        assert!(ws.consume_teleport().is_none());
        assert!(ws.consume_level_change().is_none());
    }
}
