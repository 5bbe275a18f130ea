//! Shared utilities
//!
//! Random number generation and activation functions used across the oracle
//! and the toolbox.

pub mod activations;
pub mod rng;

pub use activations::{sigmoid, Activation};
pub use rng::SimpleRng;
