//! Haunted Manor example — drives the script engine headless through a
//! short scripted walk: read the diary, light the candle, take the stairs,
//! find the key, come back up to the portrait.
//!
//! Run with: cargo run --example haunted_manor

use scripted_events::core::dispatcher::Scene;
use scripted_events::core::engine::{FrameInput, ScriptEngine};
use scripted_events::core::presenter::Presenter;
use scripted_events::schema::action::{LightingChange, MusicCue};
use scripted_events::schema::level::Zone;
use tracing_subscriber::EnvFilter;

const FRAME_MS: f64 = 1000.0 / 60.0;

/// Prints every scene call.
struct ConsoleScene;

impl Scene for ConsoleScene {
    fn unhide_object_by_id(&mut self, id: &str) {
        println!("  [scene] reveal {}", id);
    }
    fn hide_object_by_id(&mut self, id: &str) {
        println!("  [scene] hide {}", id);
    }
    fn change_zone(&mut self, zone: Zone) {
        println!("  [scene] enter zone {}", zone);
    }
    fn play_sound(&mut self, name: &str, _volume: Option<f32>) -> bool {
        println!("  [sound] {}", name);
        true
    }
    fn stop_sound(&mut self, name: &str) {
        println!("  [sound] stop {}", name);
    }
    fn play_music(&mut self, cue: &MusicCue) {
        println!("  [music] {} (fade {}ms)", cue.path, cue.fade_ms);
    }
    fn set_lighting(&mut self, change: LightingChange) {
        println!("  [light] {:?}", change);
    }
}

/// Prints UI elements; a blocking element stays open until dismissed.
#[derive(Default)]
struct ConsolePresenter {
    open: bool,
}

impl Presenter for ConsolePresenter {
    fn show_note(&mut self, text: &str, blocking: bool) {
        println!("  [note] {}", text.replace('\n', " / "));
        self.open |= blocking;
    }
    fn show_dialogue(&mut self, text: &str, color: (u8, u8, u8), blocking: bool) {
        println!("  [dialogue {:?}] {}", color, text);
        self.open |= blocking;
    }
    fn show_image(&mut self, path: Option<&str>, blocking: bool) {
        println!("  [image] {}", path.unwrap_or("<none>"));
        self.open |= blocking;
    }
    fn show_animation(&mut self, frames: &[String], speed: f32, blocking: bool, _looping: bool) {
        println!("  [animation] {} frames at {}s", frames.len(), speed);
        self.open |= blocking;
    }
    fn pause_music(&mut self) {
        println!("  [music] paused");
    }
    fn is_blocking(&self) -> bool {
        self.open
    }
}

fn run(
    engine: &mut ScriptEngine,
    scene: &mut ConsoleScene,
    presenter: &mut ConsolePresenter,
    label: &str,
    input: FrameInput,
    frames: u32,
) {
    println!("--- {} ---", label);
    for _ in 0..frames {
        let outcome = engine.tick(&input, scene, presenter);
        if let Some(id) = outcome.finished_interactable {
            println!("  (finished {})", id);
        }
        if let Some(change) = outcome.level_change {
            println!("  (now in {}, darkness: {})", change.level, change.darkness);
        }
        if outcome.input_suspended && presenter.open {
            println!("  (player closes the window)");
            presenter.open = false;
        }
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let mut engine = ScriptEngine::builder()
        .levels_dir("levels")
        .seed(2026)
        .charge_sound("charge")
        .start_level("manor")
        .build()
        .expect("Failed to build engine");

    let mut scene = ConsoleScene;
    let mut presenter = ConsolePresenter::default();
    let idle = FrameInput::new(FRAME_MS);

    run(&mut engine, &mut scene, &mut presenter, "Arrival", idle.clone(), 2);
    run(
        &mut engine,
        &mut scene,
        &mut presenter,
        "Reading the diary",
        idle.clone().attacking("diary"),
        30,
    );
    run(
        &mut engine,
        &mut scene,
        &mut presenter,
        "Lighting the candle",
        idle.clone().attacking("candle"),
        10,
    );
    run(
        &mut engine,
        &mut scene,
        &mut presenter,
        "The portrait, too early",
        idle.clone().touching("portrait"),
        1,
    );
    run(
        &mut engine,
        &mut scene,
        &mut presenter,
        "Down the stairs",
        idle.clone().touching("stairs"),
        1,
    );
    run(&mut engine, &mut scene, &mut presenter, "Descending", idle.clone(), 40);
    run(
        &mut engine,
        &mut scene,
        &mut presenter,
        "Picking up the key",
        idle.clone().attacking("key"),
        5,
    );
    run(
        &mut engine,
        &mut scene,
        &mut presenter,
        "Back up",
        idle.clone().touching("way_up"),
        2,
    );
    run(
        &mut engine,
        &mut scene,
        &mut presenter,
        "The portrait again",
        idle.clone().touching("portrait"),
        1,
    );

    println!("\nFlags:");
    for flag in ["candle_lit", "has_key", "descended"] {
        match engine.world().get(flag) {
            Some(value) => println!("  {} = {}", flag, value),
            None => println!("  {} unset", flag),
        }
    }
}
