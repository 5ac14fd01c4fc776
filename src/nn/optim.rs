use std::fmt;
use std::str::FromStr;

use tracing::instrument;

use crate::error::{NnError, Result};
use crate::tensor::{Float, Matrix};

/// Optimizers understood by [`Network::train`](crate::Network::train).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Optimizer {
    Sgd,
}

impl Optimizer {
    pub fn name(&self) -> &'static str {
        match self {
            Optimizer::Sgd => "sgd",
        }
    }
}

impl FromStr for Optimizer {
    type Err = NnError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sgd" => Ok(Optimizer::Sgd),
            _ => Err(NnError::InvalidArgument(format!("Unknown optimizer: {}", s))),
        }
    }
}

impl fmt::Display for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stochastic Gradient Descent optimizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgd<T> {
    pub learning_rate: T,
}

impl<T: Float> Sgd<T> {
    pub fn new(learning_rate: T) -> Self {
        Self { learning_rate }
    }

    /// Update parameters using their gradients
    /// Formula: param = param - learning_rate * grad
    #[instrument(level = "trace", skip_all, fields(shape = ?param.shape(), lr = %self.learning_rate))]
    pub fn step(&self, param: &mut Matrix<T>, grad: &Matrix<T>) -> Result<()> {
        param.scaled_sub_assign(grad, self.learning_rate)
    }
}
