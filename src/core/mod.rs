pub mod dispatcher;
pub mod engine;
pub mod evaluator;
pub mod interaction;
pub mod params;
pub mod presenter;
pub mod sequence;
pub mod world_state;
