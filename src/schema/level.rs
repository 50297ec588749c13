//! Level data — placed triggers, interactables and static level settings,
//! loaded from RON files.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("duplicate object id '{id}' in level '{level}'")]
    DuplicateId { level: String, id: String },
}

/// A zone coordinate within a level's zone map, written `(row,col)` or
/// `row,col` in parameter strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Zone(pub i32, pub i32);

impl Zone {
    pub fn parse(input: &str) -> Option<Zone> {
        let cleaned: String = input
            .chars()
            .filter(|c| *c != '(' && *c != ')')
            .collect();
        let (row, col) = cleaned.split_once(',')?;
        Some(Zone(row.trim().parse().ok()?, col.trim().parse().ok()?))
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

/// One step of a scripted sequence, as written in level data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDef {
    pub action: String,
    #[serde(default)]
    pub params: String,
}

/// A placed trigger volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDef {
    pub id: String,
    #[serde(default = "default_trigger_condition")]
    pub condition: String,
    #[serde(default = "default_action")]
    pub action: String,
    #[serde(default)]
    pub params: String,
    #[serde(default)]
    pub scripted_events: Vec<StepDef>,
}

/// A placed object that needs sustained contact before it fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractableDef {
    pub id: String,
    #[serde(default = "default_interactable_condition")]
    pub condition: String,
    #[serde(default = "default_action")]
    pub action: String,
    #[serde(default)]
    pub params: String,
    /// Frames of contact required.
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default)]
    pub starts_hidden: bool,
    #[serde(default)]
    pub scripted_events: Vec<StepDef>,
}

fn default_trigger_condition() -> String {
    "OnEnter".to_string()
}

fn default_interactable_condition() -> String {
    "None".to_string()
}

fn default_action() -> String {
    "None".to_string()
}

fn default_duration() -> u32 {
    60
}

/// Static per-level settings consulted by `ChangeLevel`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LevelConfig {
    pub music: Option<String>,
    pub darkness: bool,
}

/// Everything a level file declares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Level")]
pub struct LevelData {
    pub name: String,
    #[serde(default)]
    pub music: Option<String>,
    #[serde(default)]
    pub darkness: bool,
    #[serde(default)]
    pub triggers: Vec<TriggerDef>,
    #[serde(default)]
    pub interactables: Vec<InteractableDef>,
}

impl LevelData {
    /// Load a level from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<LevelData, LevelError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a level from a RON string. Object ids must be unique across
    /// triggers and interactables.
    pub fn parse_ron(input: &str) -> Result<LevelData, LevelError> {
        let level: LevelData = ron::from_str(input)?;

        let mut seen = FxHashSet::default();
        let ids = level
            .triggers
            .iter()
            .map(|t| &t.id)
            .chain(level.interactables.iter().map(|i| &i.id));
        for id in ids {
            if !seen.insert(id.as_str()) {
                return Err(LevelError::DuplicateId {
                    level: level.name.clone(),
                    id: id.clone(),
                });
            }
        }

        Ok(level)
    }

    pub fn config(&self) -> LevelConfig {
        LevelConfig {
            music: self.music.clone(),
            darkness: self.darkness,
        }
    }
}

/// All known levels, by name.
#[derive(Debug, Clone, Default)]
pub struct LevelRegistry {
    levels: FxHashMap<String, LevelData>,
}

impl LevelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, level: LevelData) {
        self.levels.insert(level.name.clone(), level);
    }

    pub fn get(&self, name: &str) -> Option<&LevelData> {
        self.levels.get(name)
    }

    pub fn config(&self, name: &str) -> Option<LevelConfig> {
        self.levels.get(name).map(LevelData::config)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.levels.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.levels.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Merge another registry into this one. Levels from `other` replace
    /// levels with the same name.
    pub fn merge(&mut self, other: LevelRegistry) {
        for (name, level) in other.levels {
            self.levels.insert(name, level);
        }
    }
}
