use std::fmt;
use std::str::FromStr;

use crate::error::{NnError, Result};
use crate::tensor::{Float, Matrix};

/// Loss functions understood by [`Network::train`](crate::Network::train).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loss {
    /// Mean squared error averaged over every (row, col) entry
    Mse,
}

impl Loss {
    pub fn name(&self) -> &'static str {
        match self {
            Loss::Mse => "mse",
        }
    }

    /// Scalar loss of `predictions` against `targets`
    pub fn value<T: Float>(&self, predictions: &Matrix<T>, targets: &Matrix<T>) -> Result<T> {
        match self {
            Loss::Mse => mse_loss(predictions, targets),
        }
    }

    /// Gradient of the loss with respect to `predictions`
    pub fn gradient<T: Float>(
        &self,
        predictions: &Matrix<T>,
        targets: &Matrix<T>,
    ) -> Result<Matrix<T>> {
        match self {
            Loss::Mse => mse_gradient(predictions, targets),
        }
    }
}

fn batch_elements<T: Float>(predictions: &Matrix<T>) -> Result<usize> {
    let total = predictions.rows() * predictions.cols();
    if total == 0 {
        return Err(NnError::InvalidArgument(
            "loss of an empty batch is undefined".to_string(),
        ));
    }
    Ok(total)
}

/// Mean Squared Error: mean over all entries of (prediction - target)^2
pub fn mse_loss<T: Float>(predictions: &Matrix<T>, targets: &Matrix<T>) -> Result<T> {
    let diff = predictions.sub(targets)?;
    let total = batch_elements(predictions)?;

    let mut sum = T::ZERO;
    for &d in diff.as_slice() {
        sum += d * d;
    }
    Ok(sum / T::from_usize(total))
}

/// MSE gradient: 2 / (rows * cols) * (prediction - target)
pub fn mse_gradient<T: Float>(predictions: &Matrix<T>, targets: &Matrix<T>) -> Result<Matrix<T>> {
    let diff = predictions.sub(targets)?;
    let total = batch_elements(predictions)?;
    let scale = T::from_f64(2.0) / T::from_usize(total);
    Ok(diff.scale(scale))
}

impl FromStr for Loss {
    type Err = NnError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mse" => Ok(Loss::Mse),
            _ => Err(NnError::InvalidArgument(format!(
                "Unknown loss function: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for Loss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
