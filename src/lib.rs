//! Fixed-rank tensors and a small feed-forward neural network
//!
//! This library provides a strided tensor container, dense and activation
//! layers with hand-derived gradients, and a full-batch SGD training loop used
//! to drive a game paddle from a feature vector.

pub mod error;
pub mod nn;
pub mod tensor;

// Re-export commonly used types for convenience
pub use error::{NnError, Result};
pub use nn::*;
pub use tensor::{Float, Matrix, Tensor, Vector};
