pub mod compare;
pub mod distill;
pub mod evaluator;
pub mod executor;
pub mod runner;
