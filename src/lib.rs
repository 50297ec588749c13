//! Scripted Events — level-data driven triggers for frame-based games.
//!
//! Placed triggers and interactables carry an action keyword and a flat
//! `key=value;...` parameter string. At runtime the engine evaluates their
//! conditions against session flags, runs cooperative step sequences, and
//! hands UI results back to the game's presentation layer.

pub mod core;
pub mod schema;
