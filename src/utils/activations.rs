//! Activation functions for the oracle layers
//!
//! The network squashes layer 1 with a sigmoid; layer 2 is left linear.
//! Both are expressed through [`Activation`] so a layer carries its own choice.

/// Sigmoid activation function.
///
/// Returns the sigmoid of the input: 1 / (1 + exp(-x))
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Activation applied after the bias is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    /// `1 / (1 + e^-v)`
    #[default]
    Sigmoid,
    /// Raw sums pass through unchanged.
    Identity,
}

impl Activation {
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Sigmoid => sigmoid(x),
            Activation::Identity => x,
        }
    }
}
