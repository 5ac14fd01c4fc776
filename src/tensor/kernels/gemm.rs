//! General Matrix Multiply (GEMM) over row-major buffers
//!
//! Transposes are expressed through strides, so `A^T @ B` and `A @ B^T`
//! never materialize the transposed operand.

use std::ops::{Add, Mul};

use super::GemmParams;
use crate::error::{NnError, Result};

/// Effective `[rows, cols]` of an operand after its optional transpose.
fn op_shape(shape: [usize; 2], transpose: bool) -> [usize; 2] {
    if transpose {
        [shape[1], shape[0]]
    } else {
        shape
    }
}

/// Row and column strides of a row-major operand after its optional transpose.
fn op_strides(shape: [usize; 2], transpose: bool) -> (usize, usize) {
    if transpose {
        (1, shape[1])
    } else {
        (shape[1], 1)
    }
}

/// Computes `C = op(A) @ op(B)`, overwriting `c_data`.
pub(crate) fn gemm_core<T>(params: GemmParams<'_, T>) -> Result<()>
where
    T: Copy + Default + Add<Output = T> + Mul<Output = T>,
{
    let GemmParams {
        a_data,
        a_shape,
        transpose_left,
        b_data,
        b_shape,
        transpose_right,
        c_data,
    } = params;

    let [m, k_a] = op_shape(a_shape, transpose_left);
    let [k_b, n] = op_shape(b_shape, transpose_right);

    if k_a != k_b {
        return Err(NnError::DimensionMismatch {
            left: [m, k_a],
            right: [k_b, n],
        });
    }
    debug_assert_eq!(c_data.len(), m * n, "Output buffer size mismatch");

    let (a_row_stride, a_col_stride) = op_strides(a_shape, transpose_left);
    let (b_row_stride, b_col_stride) = op_strides(b_shape, transpose_right);

    for i in 0..m {
        for j in 0..n {
            let mut sum = T::default();
            for p in 0..k_a {
                let a_idx = i * a_row_stride + p * a_col_stride;
                let b_idx = p * b_row_stride + j * b_col_stride;
                sum = sum + a_data[a_idx] * b_data[b_idx];
            }
            c_data[i * n + j] = sum;
        }
    }

    Ok(())
}

fn gemm_alloc<T>(
    a_data: &[T],
    a_shape: [usize; 2],
    transpose_left: bool,
    b_data: &[T],
    b_shape: [usize; 2],
    transpose_right: bool,
) -> Result<(Vec<T>, [usize; 2])>
where
    T: Copy + Default + Add<Output = T> + Mul<Output = T>,
{
    let [m, _] = op_shape(a_shape, transpose_left);
    let [_, n] = op_shape(b_shape, transpose_right);
    let mut result = vec![T::default(); m * n];

    gemm_core(GemmParams {
        a_data,
        a_shape,
        transpose_left,
        b_data,
        b_shape,
        transpose_right,
        c_data: &mut result,
    })?;

    Ok((result, [m, n]))
}

/// `C = A @ B`. Returns the flattened result and its shape.
pub fn matmul<T>(
    a_data: &[T],
    a_shape: [usize; 2],
    b_data: &[T],
    b_shape: [usize; 2],
) -> Result<(Vec<T>, [usize; 2])>
where
    T: Copy + Default + Add<Output = T> + Mul<Output = T>,
{
    gemm_alloc(a_data, a_shape, false, b_data, b_shape, false)
}

/// `C = A^T @ B`, the weight-gradient product of a dense layer.
pub fn matmul_transpose_left<T>(
    a_data: &[T],
    a_shape: [usize; 2],
    b_data: &[T],
    b_shape: [usize; 2],
) -> Result<(Vec<T>, [usize; 2])>
where
    T: Copy + Default + Add<Output = T> + Mul<Output = T>,
{
    gemm_alloc(a_data, a_shape, true, b_data, b_shape, false)
}

/// `C = A @ B^T`, the input-gradient product of a dense layer.
pub fn matmul_transpose_right<T>(
    a_data: &[T],
    a_shape: [usize; 2],
    b_data: &[T],
    b_shape: [usize; 2],
) -> Result<(Vec<T>, [usize; 2])>
where
    T: Copy + Default + Add<Output = T> + Mul<Output = T>,
{
    gemm_alloc(a_data, a_shape, false, b_data, b_shape, true)
}
