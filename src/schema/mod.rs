pub mod action;
pub mod condition;
pub mod level;
pub mod value;
