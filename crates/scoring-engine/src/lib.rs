pub mod engine;
pub mod scorers;

#[cfg(test)]
mod scorers_tests;

pub use engine::*;
pub use scorers::*;
