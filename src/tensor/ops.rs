//! Tensor arithmetic
//!
//! Elementwise operations are defined for any rank; matrix products,
//! transposition and row reductions only for rank 2. Every operation returns a
//! freshly allocated tensor and leaves its operands untouched, except
//! [`Tensor::scaled_sub_assign`] which is the in-place SGD primitive.

use std::ops::{Add, Mul, Sub, SubAssign};

use tracing::instrument;

use super::kernels::gemm;
use super::{Matrix, Tensor};
use crate::error::{NnError, Result};

impl<T: Copy + Default, const R: usize> Tensor<T, R> {
    fn check_same_shape(&self, other: &Self, op: &'static str) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(NnError::ShapeMismatch {
                op,
                left: self.shape().to_vec(),
                right: other.shape().to_vec(),
            });
        }
        Ok(())
    }

    fn zip_with<F>(&self, other: &Self, op: &'static str, f: F) -> Result<Self>
    where
        F: Fn(T, T) -> T,
    {
        self.check_same_shape(other, op)?;
        let data = self
            .as_slice()
            .iter()
            .zip(other.as_slice())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(self.with_data(data))
    }

    /// Element-wise addition
    #[instrument(level = "trace", skip_all, fields(shape = ?self.shape()))]
    pub fn add(&self, other: &Self) -> Result<Self>
    where
        T: Add<Output = T>,
    {
        self.zip_with(other, "add", |a, b| a + b)
    }

    /// Element-wise subtraction
    #[instrument(level = "trace", skip_all, fields(shape = ?self.shape()))]
    pub fn sub(&self, other: &Self) -> Result<Self>
    where
        T: Sub<Output = T>,
    {
        self.zip_with(other, "sub", |a, b| a - b)
    }

    /// Element-wise (Hadamard) product
    #[instrument(level = "trace", skip_all, fields(shape = ?self.shape()))]
    pub fn hadamard(&self, other: &Self) -> Result<Self>
    where
        T: Mul<Output = T>,
    {
        self.zip_with(other, "hadamard", |a, b| a * b)
    }

    /// Scalar multiplication
    pub fn scale(&self, scalar: T) -> Self
    where
        T: Mul<Output = T>,
    {
        self.apply(|x| x * scalar)
    }

    /// In place `self -= factor * other`
    pub fn scaled_sub_assign(&mut self, other: &Self, factor: T) -> Result<()>
    where
        T: Mul<Output = T> + SubAssign,
    {
        self.check_same_shape(other, "scaled_sub_assign")?;
        self.as_mut_slice()
            .iter_mut()
            .zip(other.as_slice())
            .for_each(|(p, &g)| *p -= factor * g);
        Ok(())
    }
}

impl<T> Tensor<T, 2>
where
    T: Copy + Default + Add<Output = T> + Mul<Output = T>,
{
    /// Matrix multiplication
    #[instrument(skip_all, fields(shape_a = ?self.shape(), shape_b = ?other.shape()))]
    pub fn matmul(&self, other: &Matrix<T>) -> Result<Matrix<T>> {
        let (data, shape) = gemm::matmul(self.as_slice(), *self.shape(), other.as_slice(), *other.shape())?;
        Matrix::from_vec(shape, data)
    }

    /// `self^T @ other` without materializing the transpose
    #[instrument(skip_all, fields(shape_a = ?self.shape(), shape_b = ?other.shape()))]
    pub fn transpose_matmul(&self, other: &Matrix<T>) -> Result<Matrix<T>> {
        let (data, shape) = gemm::matmul_transpose_left(
            self.as_slice(),
            *self.shape(),
            other.as_slice(),
            *other.shape(),
        )?;
        Matrix::from_vec(shape, data)
    }

    /// `self @ other^T` without materializing the transpose
    #[instrument(skip_all, fields(shape_a = ?self.shape(), shape_b = ?other.shape()))]
    pub fn matmul_transpose(&self, other: &Matrix<T>) -> Result<Matrix<T>> {
        let (data, shape) = gemm::matmul_transpose_right(
            self.as_slice(),
            *self.shape(),
            other.as_slice(),
            *other.shape(),
        )?;
        Matrix::from_vec(shape, data)
    }

    /// Sum over rows, producing a `[1, cols]` matrix
    pub fn sum_rows(&self) -> Matrix<T> {
        let cols = self.cols();
        let mut sums = vec![T::default(); cols];
        for row in self.as_slice().chunks(cols.max(1)) {
            for (s, &x) in sums.iter_mut().zip(row) {
                *s = *s + x;
            }
        }
        Matrix::from_parts([1, cols], sums)
    }

    /// Add a `[1, cols]` row to every row of `self`
    pub fn add_row_broadcast(&self, row: &Matrix<T>) -> Result<Matrix<T>> {
        if row.rows() != 1 || row.cols() != self.cols() {
            return Err(NnError::ShapeMismatch {
                op: "add_row_broadcast",
                left: self.shape().to_vec(),
                right: row.shape().to_vec(),
            });
        }

        let cols = self.cols();
        let bias = row.as_slice();
        let data = self
            .as_slice()
            .iter()
            .enumerate()
            .map(|(i, &x)| x + bias[i % cols])
            .collect();
        Ok(self.with_data(data))
    }
}

impl<T: Copy + Default> Tensor<T, 2> {
    /// Transpose a matrix
    pub fn transpose(&self) -> Matrix<T> {
        let rows = self.rows();
        let cols = self.cols();
        let src = self.as_slice();
        let mut data = vec![T::default(); src.len()];

        for i in 0..rows {
            for j in 0..cols {
                data[j * rows + i] = src[i * cols + j];
            }
        }

        Matrix::from_parts([cols, rows], data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Vector;

    fn matrix(shape: [usize; 2], data: &[f32]) -> Matrix<f32> {
        Matrix::from_vec(shape, data.to_vec()).unwrap()
    }

    #[test]
    fn test_add_sub_round_trip() {
        let a = matrix([2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = matrix([2, 3], &[0.5, -1.0, 2.25, 7.0, 0.0, -3.5]);

        let back = a.add(&b).unwrap().sub(&b).unwrap();
        for (x, y) in back.as_slice().iter().zip(a.as_slice()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_add_fill() {
        let t1 = matrix([2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let mut t2 = Matrix::new([2, 3]);
        t2.fill(1.0);

        let t3 = t1.add(&t2).unwrap();
        assert_eq!(t3[(0, 0)], 2.0);
        assert_eq!(t3[(1, 2)], 7.0);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = Matrix::<f32>::new([2, 3]);
        let b = Matrix::<f32>::new([3, 2]);

        assert_eq!(
            a.add(&b).unwrap_err(),
            NnError::ShapeMismatch {
                op: "add",
                left: vec![2, 3],
                right: vec![3, 2]
            }
        );
        assert!(matches!(a.sub(&b), Err(NnError::ShapeMismatch { op: "sub", .. })));
        assert!(a.hadamard(&b).is_err());
    }

    #[test]
    fn test_scale_and_hadamard() {
        let t = matrix([2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let doubled = t.scale(2.0);
        assert_eq!(doubled[(0, 0)], 2.0);
        assert_eq!(doubled[(1, 2)], 12.0);

        let squared = t.hadamard(&t).unwrap();
        assert_eq!(squared.as_slice(), &[1.0, 4.0, 9.0, 16.0, 25.0, 36.0]);
    }

    #[test]
    fn test_vector_ops() {
        let a = Vector::from_vec([3], vec![1, 2, 3]).unwrap();
        let b = Vector::from_vec([3], vec![3, 2, 1]).unwrap();
        assert_eq!(a.add(&b).unwrap().as_slice(), &[4, 4, 4]);
        assert_eq!(a.scale(3).as_slice(), &[3, 6, 9]);
    }

    #[test]
    fn test_matmul_literal() {
        let a = matrix([2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = matrix([3, 2], &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);

        let c = a.matmul(&b).unwrap();
        assert_eq!(c.shape(), &[2, 2]);
        assert_eq!(c[(0, 0)], 58.0);
        assert_eq!(c[(0, 1)], 64.0);
        assert_eq!(c[(1, 0)], 139.0);
        assert_eq!(c[(1, 1)], 154.0);
    }

    #[test]
    fn test_matmul_dimension_mismatch() {
        let a = Matrix::<f32>::new([2, 3]);
        let b = Matrix::<f32>::new([2, 3]);

        assert!(matches!(
            a.matmul(&b),
            Err(NnError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_transposed_matmuls_agree_with_transpose() {
        let a = matrix([3, 2], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = matrix([3, 4], &[1.0, 0.5, -1.0, 2.0, 0.0, 1.0, 1.0, 1.0, 3.0, -2.0, 0.0, 1.0]);

        let fused = a.transpose_matmul(&b).unwrap();
        let explicit = a.transpose().matmul(&b).unwrap();
        assert_eq!(fused, explicit);

        let c = matrix([4, 2], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let fused = a.matmul_transpose(&c).unwrap();
        let explicit = a.matmul(&c.transpose()).unwrap();
        assert_eq!(fused.shape(), &[3, 4]);
        assert_eq!(fused, explicit);
    }

    #[test]
    fn test_transpose() {
        let a = matrix([2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let at = a.transpose();

        assert_eq!(at.shape(), &[3, 2]);
        assert_eq!(at.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(at[(0, 0)], 1.0);
        assert_eq!(at[(2, 1)], 6.0);
        assert_eq!(at.transpose(), a);
    }

    #[test]
    fn test_sum_rows_and_broadcast() {
        let a = matrix([3, 2], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let sums = a.sum_rows();
        assert_eq!(sums.shape(), &[1, 2]);
        assert_eq!(sums.as_slice(), &[9.0, 12.0]);

        let bias = matrix([1, 2], &[10.0, -1.0]);
        let shifted = a.add_row_broadcast(&bias).unwrap();
        assert_eq!(shifted.as_slice(), &[11.0, 1.0, 13.0, 3.0, 15.0, 5.0]);

        let wrong = matrix([1, 3], &[0.0, 0.0, 0.0]);
        assert!(a.add_row_broadcast(&wrong).is_err());
    }

    #[test]
    fn test_scaled_sub_assign() {
        let mut w = matrix([1, 3], &[1.0, 1.0, 1.0]);
        let g = matrix([1, 3], &[1.0, 2.0, -4.0]);
        w.scaled_sub_assign(&g, 0.5).unwrap();
        assert_eq!(w.as_slice(), &[0.5, 0.0, 3.0]);

        let wrong = Matrix::<f32>::new([3, 1]);
        assert!(w.scaled_sub_assign(&wrong, 0.5).is_err());
    }
}
