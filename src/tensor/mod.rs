//! Tensor module containing the fixed-rank container and its operations
//!
//! This module provides the core `Tensor` type, elementwise and matrix
//! arithmetic, and the GEMM kernels the matrix products run on.

mod core;
pub mod kernels;
pub mod ops;
mod scalar;

pub use self::core::{Matrix, Tensor, Vector};
pub use self::scalar::Float;
