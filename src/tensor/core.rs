use std::cmp::Ordering;
use std::fmt;
use std::ops::{Index, IndexMut};

use rand::distributions::uniform::SampleUniform;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::instrument;

use crate::error::{NnError, Result};

/// Fixed-rank, row-major, contiguous tensor.
///
/// The rank `R` is part of the type, so vectors (`R = 1`) and matrices
/// (`R = 2`) get their own accessors while sharing one strided storage.
/// `data.len()` always equals the product of `shape`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T, const R: usize> {
    data: Vec<T>,
    shape: [usize; R],
    strides: [usize; R],
}

/// Rank-1 tensor (labels, bias rows).
pub type Vector<T> = Tensor<T, 1>;
/// Rank-2 tensor (batched features, weight matrices).
pub type Matrix<T> = Tensor<T, 2>;

/// Row-major strides: the last dimension varies fastest.
fn row_major_strides<const R: usize>(shape: &[usize; R]) -> [usize; R] {
    let mut strides = [1; R];
    for i in (0..R.saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

impl<T: Copy + Default, const R: usize> Tensor<T, R> {
    /// Create a tensor of the given shape, filled with `T::default()`
    #[instrument(level = "trace", skip_all, fields(shape = ?shape))]
    pub fn new(shape: [usize; R]) -> Self {
        Self::filled(shape, T::default())
    }

    /// Alias of [`Tensor::new`] for numeric element types
    pub fn zeros(shape: [usize; R]) -> Self {
        Self::new(shape)
    }

    /// Create a tensor of the given shape with every element set to `value`
    pub fn filled(shape: [usize; R], value: T) -> Self {
        let numel = shape.iter().product();
        Tensor {
            data: vec![value; numel],
            shape,
            strides: row_major_strides(&shape),
        }
    }

    /// Create a tensor from row-major data; the length must match the shape
    #[instrument(level = "trace", skip(data), fields(shape = ?shape, numel = data.len()))]
    pub fn from_vec(shape: [usize; R], data: Vec<T>) -> Result<Self> {
        let numel: usize = shape.iter().product();
        if numel != data.len() {
            return Err(NnError::InvalidArgument(format!(
                "shape {:?} needs {} elements, got {}",
                shape,
                numel,
                data.len()
            )));
        }

        Ok(Tensor {
            data,
            shape,
            strides: row_major_strides(&shape),
        })
    }

    pub fn shape(&self) -> &[usize; R] {
        &self.shape
    }

    pub fn strides(&self) -> &[usize; R] {
        &self.strides
    }

    /// Total number of elements
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn rank(&self) -> usize {
        R
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat offset of a multi-index, bounds-checked per dimension
    fn offset(&self, index: &[usize; R]) -> Result<usize> {
        let mut offset = 0;
        for ((&i, &dim), &stride) in index.iter().zip(&self.shape).zip(&self.strides) {
            if i >= dim {
                return Err(NnError::IndexOutOfRange {
                    index: index.to_vec(),
                    shape: self.shape.to_vec(),
                });
            }
            offset += i * stride;
        }
        Ok(offset)
    }

    /// Checked access by a full multi-index
    pub fn get_at(&self, index: &[usize; R]) -> Result<&T> {
        let offset = self.offset(index)?;
        Ok(&self.data[offset])
    }

    /// Checked mutable access by a full multi-index
    pub fn get_at_mut(&mut self, index: &[usize; R]) -> Result<&mut T> {
        let offset = self.offset(index)?;
        Ok(&mut self.data[offset])
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Set every element to `value`
    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|x| *x = value);
    }

    /// Return a new tensor with `f` applied to every element
    pub fn apply<F>(&self, f: F) -> Self
    where
        F: Fn(T) -> T,
    {
        Tensor {
            data: self.data.iter().map(|&x| f(x)).collect(),
            shape: self.shape,
            strides: self.strides,
        }
    }

    /// Assemble a tensor whose data length is known to match `shape`
    pub(crate) fn from_parts(shape: [usize; R], data: Vec<T>) -> Self {
        debug_assert_eq!(data.len(), shape.iter().product::<usize>());
        Tensor {
            data,
            shape,
            strides: row_major_strides(&shape),
        }
    }

    /// Build a tensor with this one's shape from already computed data
    pub(crate) fn with_data(&self, data: Vec<T>) -> Self {
        debug_assert_eq!(data.len(), self.data.len());
        Tensor {
            data,
            shape: self.shape,
            strides: self.strides,
        }
    }
}

impl<T, const R: usize> Tensor<T, R>
where
    T: Copy + Default + PartialOrd + SampleUniform,
{
    /// Fill from a uniform distribution over `[min, max)`.
    ///
    /// The range is half-open for integer `T` too: `random_fill(0, 3)` never
    /// yields 3. `min == max` fills with that value. Each call seeds its own
    /// generator from entropy.
    pub fn random_fill(&mut self, min: T, max: T) -> Result<()> {
        let mut rng = StdRng::from_entropy();
        self.random_fill_with(&mut rng, min, max)
    }

    /// Same as [`Tensor::random_fill`] with a caller-owned generator, so a
    /// fixed seed reproduces the values.
    #[instrument(level = "trace", skip_all, fields(shape = ?self.shape))]
    pub fn random_fill_with<G: Rng + ?Sized>(&mut self, rng: &mut G, min: T, max: T) -> Result<()> {
        match min.partial_cmp(&max) {
            Some(Ordering::Less) => {}
            Some(Ordering::Equal) => {
                self.fill(min);
                return Ok(());
            }
            _ => {
                return Err(NnError::InvalidArgument(
                    "random_fill requires min <= max".to_string(),
                ))
            }
        }

        let uniform = Uniform::new(min, max);
        for x in self.data.iter_mut() {
            *x = uniform.sample(rng);
        }
        Ok(())
    }
}

impl<T: Copy + Default> Tensor<T, 1> {
    pub fn len(&self) -> usize {
        self.shape[0]
    }

    pub fn get(&self, i: usize) -> Result<&T> {
        self.get_at(&[i])
    }

    pub fn get_mut(&mut self, i: usize) -> Result<&mut T> {
        self.get_at_mut(&[i])
    }
}

impl<T: Copy + Default> Tensor<T, 2> {
    /// Build a matrix from equally long rows
    pub fn from_rows<V: AsRef<[T]>>(rows: &[V]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);

        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(NnError::InvalidArgument(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            data.extend_from_slice(row);
        }

        Self::from_vec([rows.len(), cols], data)
    }

    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    pub fn cols(&self) -> usize {
        self.shape[1]
    }

    pub fn get(&self, i: usize, j: usize) -> Result<&T> {
        self.get_at(&[i, j])
    }

    pub fn get_mut(&mut self, i: usize, j: usize) -> Result<&mut T> {
        self.get_at_mut(&[i, j])
    }

    /// Borrow one row as a slice
    pub fn row(&self, i: usize) -> Result<&[T]> {
        if i >= self.shape[0] {
            return Err(NnError::IndexOutOfRange {
                index: vec![i],
                shape: self.shape.to_vec(),
            });
        }
        let start = i * self.strides[0];
        Ok(&self.data[start..start + self.shape[1]])
    }
}

impl<T: Copy + Default> Index<usize> for Tensor<T, 1> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        match self.get(i) {
            Ok(x) => x,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<T: Copy + Default> IndexMut<usize> for Tensor<T, 1> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        match self.get_mut(i) {
            Ok(x) => x,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<T: Copy + Default> Index<(usize, usize)> for Tensor<T, 2> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        match self.get(i, j) {
            Ok(x) => x,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<T: Copy + Default> IndexMut<(usize, usize)> for Tensor<T, 2> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        match self.get_mut(i, j) {
            Ok(x) => x,
            Err(e) => panic!("{}", e),
        }
    }
}

fn write_row<T: fmt::Display>(f: &mut fmt::Formatter<'_>, row: &[T]) -> fmt::Result {
    write!(f, "[")?;
    for (i, x) in row.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", x)?;
    }
    write!(f, "]")
}

impl<T: fmt::Display, const R: usize> fmt::Display for Tensor<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match R {
            1 => write_row(f, &self.data),
            2 => {
                let cols = self.shape[1];
                writeln!(f, "[")?;
                for r in 0..self.shape[0] {
                    write!(f, "  ")?;
                    write_row(f, &self.data[r * cols..(r + 1) * cols])?;
                    if r + 1 < self.shape[0] {
                        write!(f, ",")?;
                    }
                    writeln!(f)?;
                }
                write!(f, "]")
            }
            _ => {
                write!(f, "Tensor(shape={:?}) ", self.shape)?;
                write_row(f, &self.data)
            }
        }
    }
}
