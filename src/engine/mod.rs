pub mod achievements;
pub mod evaluator;
pub mod quiz;
pub mod selector;
pub mod stats;
