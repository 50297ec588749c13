//! Action dispatcher — executes one action keyword against the world state
//! and the scene.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::core::params::Params;
use crate::core::world_state::{LevelChangeRequest, TeleportRequest, WorldStateStore};
use crate::schema::action::{ActionKind, ActionPayload, ActionResult, LightingChange, MusicCue};
use crate::schema::level::{LevelRegistry, Zone};
use crate::schema::value::Value;

/// Sentinel `sound` value that suppresses any sound.
pub const SILENT: &str = "silent";
/// Sound played by `UnhideObject` when the params name none.
pub const DEFAULT_REVEAL_SOUND: &str = "secret";

/// The game-side scene the dispatcher and evaluator call into.
///
/// Implementations own objects, audio and lighting. Nothing here may fail
/// the frame: unknown ids and missing sounds are the implementation's to
/// ignore.
pub trait Scene {
    fn unhide_object_by_id(&mut self, id: &str);
    fn hide_object_by_id(&mut self, id: &str);
    fn change_zone(&mut self, zone: Zone);
    /// Play a sound from the sound library. Returns false when no sound
    /// with that name is loaded.
    fn play_sound(&mut self, name: &str, volume: Option<f32>) -> bool;
    fn stop_sound(&mut self, name: &str);
    fn play_music(&mut self, cue: &MusicCue);
    fn set_lighting(&mut self, change: LightingChange);
}

/// Maps action keywords to their effects.
pub struct ActionDispatcher {
    levels: LevelRegistry,
    rng: StdRng,
}

impl ActionDispatcher {
    pub fn new(levels: LevelRegistry, seed: u64) -> Self {
        Self {
            levels,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn levels(&self) -> &LevelRegistry {
        &self.levels
    }

    /// Execute an action from its keyword and raw parameter string.
    /// Unknown keywords do nothing.
    pub fn execute(
        &mut self,
        action: &str,
        raw_params: &str,
        world: &mut WorldStateStore,
        scene: &mut dyn Scene,
    ) -> Option<ActionResult> {
        let Some(kind) = ActionKind::from_keyword(action) else {
            warn!(action, "unknown action keyword ignored");
            return None;
        };
        let params = Params::parse(Some(raw_params));
        self.execute_action(kind, &params, world, scene)
    }

    /// Execute an already-resolved action with pre-parsed params.
    pub fn execute_action(
        &mut self,
        kind: ActionKind,
        params: &Params,
        world: &mut WorldStateStore,
        scene: &mut dyn Scene,
    ) -> Option<ActionResult> {
        debug!(action = kind.keyword(), params = params.len(), "executing action");

        // PlaySound and UnhideObject interpret `sound` themselves;
        // RandomAction leaves it to the picked action
        if !matches!(
            kind,
            ActionKind::PlaySound | ActionKind::UnhideObject | ActionKind::RandomAction
        ) {
            if let Some(sound) = params.get_text("sound") {
                if sound != SILENT && !scene.play_sound(&sound, None) {
                    warn!(sound = %sound, "sound not found");
                }
            }
        }

        match kind {
            ActionKind::Wait => {
                debug!("Wait outside a sequence does nothing");
                None
            }
            ActionKind::SetFlag => {
                if let Some(flag) = params.get_text("flag") {
                    let value = params.get("value").cloned().unwrap_or(Value::Bool(true));
                    world.set(&flag, value);
                }
                None
            }
            ActionKind::IncrementFlag => {
                if let Some(flag) = params.get_text("flag") {
                    let amount = params.get("value").cloned().unwrap_or(Value::Int(1));
                    world.increment(&flag, &amount);
                }
                None
            }
            ActionKind::Teleport => {
                match (params.get_f64("x"), params.get_f64("y")) {
                    (Some(x), Some(y)) => {
                        let zone = params.get_text("zone").and_then(|z| Zone::parse(&z));
                        world.request_teleport(TeleportRequest { zone, x, y });
                    }
                    _ => warn!("Teleport needs both x and y"),
                }
                None
            }
            ActionKind::PlaySound => {
                let sound = params.get_text("sound").unwrap_or_default();
                let volume = params.get_f64("volume").unwrap_or(1.0) as f32;
                if !scene.play_sound(&sound, Some(volume)) {
                    warn!(sound = %sound, "sound not found in library");
                }
                None
            }
            ActionKind::UnhideObject => {
                if let Some(id) = params.get_text("id") {
                    scene.unhide_object_by_id(&id);
                    let sound = params
                        .get_text("sound")
                        .unwrap_or_else(|| DEFAULT_REVEAL_SOUND.to_string());
                    if sound != SILENT {
                        scene.play_sound(&sound, None);
                    }
                }
                None
            }
            ActionKind::HideObject => {
                if let Some(id) = params.get_text("id") {
                    scene.hide_object_by_id(&id);
                }
                None
            }
            ActionKind::ChangeLevel => {
                self.change_level(params, world);
                None
            }
            ActionKind::ShowNote => Some(ActionResult {
                payload: ActionPayload::Note(params.get_text("text").unwrap_or_default()),
                ..presentation(params)
            }),
            ActionKind::ShowDialogue => Some(ActionResult {
                payload: ActionPayload::Dialogue {
                    text: params.get_text("text").unwrap_or_else(|| "...".to_string()),
                    color: parse_color(params.get_text("color").as_deref()),
                },
                ..presentation(params)
            }),
            ActionKind::ShowImage => Some(ActionResult {
                payload: ActionPayload::Image(
                    params.get_text("image").or_else(|| params.get_text("path")),
                ),
                ..presentation(params)
            }),
            ActionKind::ShowAnimation => Some(ActionResult {
                payload: animation_payload(params),
                ..presentation(params)
            }),
            ActionKind::CloseImage => None,
            ActionKind::ChangeMusic => {
                match params.get_text("path").or_else(|| params.get_text("music")) {
                    Some(path) => scene.play_music(&MusicCue {
                        path,
                        volume: params.get_f64("volume").unwrap_or(0.6) as f32,
                        loops: params
                            .get_i64("loop")
                            .and_then(|l| i32::try_from(l).ok())
                            .unwrap_or(-1),
                        fade_ms: params
                            .get_i64("fade")
                            .map_or(500, |f| f.clamp(0, i64::from(u32::MAX)) as u32),
                    }),
                    None => warn!("ChangeMusic without a path"),
                }
                None
            }
            ActionKind::RandomAction => self.random_action(params, world, scene),
            ActionKind::ModifyLight => {
                scene.set_lighting(LightingChange {
                    darkness: params.get_bool("darkness"),
                    radius: params
                        .get_i64("radius")
                        .map(|r| r.clamp(0, i64::from(u32::MAX)) as u32),
                });
                None
            }
        }
    }

    fn change_level(&self, params: &Params, world: &mut WorldStateStore) {
        let Some(level) = params.get_text("level") else {
            warn!("ChangeLevel without a level");
            return;
        };
        let Some(config) = self.levels.config(&level) else {
            warn!(level = %level, "ChangeLevel to an unknown level");
            return;
        };
        let Some(json_path) = params.get_text("json") else {
            warn!(level = %level, "ChangeLevel without a json path");
            return;
        };
        let Some(entry_zone) = params.get_text("zone").and_then(|z| Zone::parse(&z)) else {
            warn!(level = %level, "ChangeLevel with an unreadable zone");
            return;
        };
        let player_pos = params.get_f64("x").zip(params.get_f64("y"));

        world.request_level_change(LevelChangeRequest {
            level,
            json_path,
            entry_zone,
            player_pos,
            music_path: config.music,
            darkness: config.darkness,
        });
    }

    /// Execute one keyword picked from `actions=A|B|C`, sharing the
    /// remaining params.
    fn random_action(
        &mut self,
        params: &Params,
        world: &mut WorldStateStore,
        scene: &mut dyn Scene,
    ) -> Option<ActionResult> {
        let choices: Vec<ActionKind> = params
            .get_text("actions")
            .unwrap_or_default()
            .split('|')
            .filter_map(|keyword| {
                let kind = ActionKind::from_keyword(keyword.trim());
                if kind.is_none() {
                    warn!(keyword, "RandomAction skipped unknown keyword");
                }
                kind
            })
            .filter(|kind| !matches!(kind, ActionKind::RandomAction | ActionKind::Wait))
            .collect();

        if choices.is_empty() {
            warn!("RandomAction has nothing to choose from");
            return None;
        }
        let picked = choices[self.rng.gen_range(0..choices.len())];
        debug!(picked = picked.keyword(), "RandomAction picked");
        self.execute_action(picked, params, world, scene)
    }
}

/// Shared result fields; the payload is filled in by the caller.
fn presentation(params: &Params) -> ActionResult {
    ActionResult {
        payload: ActionPayload::Note(String::new()),
        sound: params.get_text("sound"),
        blocking: params.get_bool("blocking").unwrap_or(false),
        pause_music: params.get_bool("pause_music").unwrap_or(false),
    }
}

fn animation_payload(params: &Params) -> ActionPayload {
    let count = params.get_i64("frames").unwrap_or(1).max(0);
    let frames = match params.get_text("path") {
        Some(path) => {
            let base = path.replace(".png", "");
            (0..count).map(|i| format!("{}_{}.png", base, i)).collect()
        }
        None => Vec::new(),
    };
    ActionPayload::Animation {
        frames,
        speed: params.get_f64("speed").unwrap_or(0.1) as f32,
        looping: params.get_bool("loop").unwrap_or(true),
    }
}

/// Parse `r,g,b`, falling back to white.
fn parse_color(input: Option<&str>) -> (u8, u8, u8) {
    const WHITE: (u8, u8, u8) = (255, 255, 255);
    let Some(input) = input else {
        return WHITE;
    };
    let channels: Vec<u8> = input
        .split(',')
        .filter_map(|c| c.trim().parse().ok())
        .collect();
    match channels[..] {
        [r, g, b] => (r, g, b),
        _ => {
            warn!(color = input, "unreadable color, using white");
            WHITE
        }
    }
}
