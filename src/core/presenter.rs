//! Presentation routing — hands action results to the game's UI layer.

use crate::schema::action::{ActionPayload, ActionResult};

/// The game-side UI that displays notes, dialogue, images and animations.
pub trait Presenter {
    fn show_note(&mut self, text: &str, blocking: bool);
    fn show_dialogue(&mut self, text: &str, color: (u8, u8, u8), blocking: bool);
    fn show_image(&mut self, path: Option<&str>, blocking: bool);
    fn show_animation(&mut self, frames: &[String], speed: f32, blocking: bool, looping: bool);
    fn pause_music(&mut self);
    /// True while a UI element is open and suspends gameplay input.
    fn is_blocking(&self) -> bool;
}

/// Route one result to the presenter. Music pauses only for images and
/// animations.
pub fn present(result: &ActionResult, presenter: &mut dyn Presenter) {
    let blocking = result.blocking;
    match &result.payload {
        ActionPayload::Note(text) => presenter.show_note(text, blocking),
        ActionPayload::Dialogue { text, color } => {
            presenter.show_dialogue(text, *color, blocking)
        }
        ActionPayload::Image(path) => {
            presenter.show_image(path.as_deref(), blocking);
            if result.pause_music {
                presenter.pause_music();
            }
        }
        ActionPayload::Animation {
            frames,
            speed,
            looping,
        } => {
            presenter.show_animation(frames, *speed, blocking, *looping);
            if result.pause_music {
                presenter.pause_music();
            }
        }
    }
}
