//! Kernel implementations for tensor operations
//!
//! This module contains the matrix multiplication kernels used by the
//! rank-2 tensor operations and the dense layer.

/// Operands of a single GEMM call: `C = op(A) @ op(B)`
/// where op(X) is either X or X^T depending on the transpose flag.
///
/// Shapes are the stored (untransposed) `[rows, cols]` of each buffer.
pub(crate) struct GemmParams<'a, T> {
    pub(crate) a_data: &'a [T],
    pub(crate) a_shape: [usize; 2],
    pub(crate) transpose_left: bool,
    pub(crate) b_data: &'a [T],
    pub(crate) b_shape: [usize; 2],
    pub(crate) transpose_right: bool,
    pub(crate) c_data: &'a mut [T],
}

pub mod gemm;

pub use gemm::{matmul, matmul_transpose_left, matmul_transpose_right};
