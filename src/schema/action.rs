use serde::{Deserialize, Serialize};

/// The closed action vocabulary understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Wait,
    SetFlag,
    IncrementFlag,
    Teleport,
    PlaySound,
    UnhideObject,
    HideObject,
    ShowDialogue,
    ChangeLevel,
    ShowImage,
    CloseImage,
    ShowNote,
    ShowAnimation,
    ChangeMusic,
    RandomAction,
    ModifyLight,
}

impl ActionKind {
    pub const ALL: [ActionKind; 16] = [
        Self::Wait,
        Self::SetFlag,
        Self::IncrementFlag,
        Self::Teleport,
        Self::PlaySound,
        Self::UnhideObject,
        Self::HideObject,
        Self::ShowDialogue,
        Self::ChangeLevel,
        Self::ShowImage,
        Self::CloseImage,
        Self::ShowNote,
        Self::ShowAnimation,
        Self::ChangeMusic,
        Self::RandomAction,
        Self::ModifyLight,
    ];

    /// Look up an action keyword as written in level data.
    pub fn from_keyword(keyword: &str) -> Option<ActionKind> {
        Self::ALL.into_iter().find(|kind| kind.keyword() == keyword)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Wait => "Wait",
            Self::SetFlag => "SetFlag",
            Self::IncrementFlag => "IncrementFlag",
            Self::Teleport => "Teleport",
            Self::PlaySound => "PlaySound",
            Self::UnhideObject => "UnhideObject",
            Self::HideObject => "HideObject",
            Self::ShowDialogue => "ShowDialogue",
            Self::ChangeLevel => "ChangeLevel",
            Self::ShowImage => "ShowImage",
            Self::CloseImage => "CloseImage",
            Self::ShowNote => "ShowNote",
            Self::ShowAnimation => "ShowAnimation",
            Self::ChangeMusic => "ChangeMusic",
            Self::RandomAction => "RandomAction",
            Self::ModifyLight => "ModifyLight",
        }
    }

    /// Actions that move the player to another zone or level. Objects
    /// firing these are never spent.
    pub fn changes_zone(&self) -> bool {
        matches!(self, Self::Teleport | Self::ChangeLevel)
    }
}

/// The kind tag of an [`ActionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultKind {
    Note,
    Dialogue,
    Image,
    Animation,
}

/// Kind-specific data handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionPayload {
    Note(String),
    Dialogue { text: String, color: (u8, u8, u8) },
    /// Path of the image; `None` when the params named none.
    Image(Option<String>),
    Animation {
        frames: Vec<String>,
        speed: f32,
        looping: bool,
    },
}

/// What a dispatched action asks the presentation layer to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub payload: ActionPayload,
    pub sound: Option<String>,
    /// Gameplay input stays suspended until the UI is closed.
    pub blocking: bool,
    pub pause_music: bool,
}

impl ActionResult {
    pub fn kind(&self) -> ResultKind {
        match self.payload {
            ActionPayload::Note(_) => ResultKind::Note,
            ActionPayload::Dialogue { .. } => ResultKind::Dialogue,
            ActionPayload::Image(_) => ResultKind::Image,
            ActionPayload::Animation { .. } => ResultKind::Animation,
        }
    }
}

/// Background music change requested by `ChangeMusic`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicCue {
    pub path: String,
    pub volume: f32,
    /// Play count; `-1` loops forever.
    pub loops: i32,
    pub fade_ms: u32,
}

/// Lighting change requested by `ModifyLight`. Fields left `None` keep
/// their current setting.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LightingChange {
    pub darkness: Option<bool>,
    pub radius: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_keyword_resolves() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_keyword(kind.keyword()), Some(kind));
        }
        assert_eq!(ActionKind::from_keyword("Explode"), None);
        assert_eq!(ActionKind::from_keyword("setflag"), None);
    }

    #[test]
    fn zone_changing_actions() {
        assert!(ActionKind::Teleport.changes_zone());
        assert!(ActionKind::ChangeLevel.changes_zone());
        assert!(!ActionKind::ShowNote.changes_zone());
    }

    #[test]
    fn result_kind_follows_payload() {
        let result = ActionResult {
            payload: ActionPayload::Dialogue {
                text: "...".to_string(),
                color: (255, 255, 255),
            },
            sound: None,
            blocking: true,
            pause_music: false,
        };
        assert_eq!(result.kind(), ResultKind::Dialogue);
    }
}
