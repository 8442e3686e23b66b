pub mod generation;
pub mod harness;
