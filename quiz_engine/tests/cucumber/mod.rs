mod quiz_world;
mod setups;
mod steps;

pub use quiz_world::{QuizSystem, QuizWorld};
