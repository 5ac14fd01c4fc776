//! Network layers with hand-derived gradients
//!
//! A layer caches what its own backward pass needs during forward, and a
//! dense layer caches its parameter gradients during backward. The expected
//! cycle per batch is forward, backward, update_weights; the caches are
//! overwritten every cycle and nothing guards against calling them out of
//! order.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::instrument;

use super::activation::Activation;
use super::optim::Sgd;
use crate::error::{NnError, Result};
use crate::tensor::{Float, Matrix};

/// Fully-connected layer: y = xW + b
#[derive(Debug, Clone)]
pub struct Dense<T> {
    weights: Matrix<T>,
    bias: Matrix<T>,
    last_input: Option<Matrix<T>>,
    weight_gradient: Matrix<T>,
    bias_gradient: Matrix<T>,
}

impl<T: Float> Dense<T> {
    /// Create a layer with Xavier-uniform weights and zero bias, sampled from
    /// a freshly seeded generator.
    pub fn new(input_size: usize, output_size: usize) -> Result<Self> {
        let mut rng = StdRng::from_entropy();
        Self::with_rng(input_size, output_size, &mut rng)
    }

    /// Xavier init: U(-limit, limit) with limit = sqrt(6 / (in + out))
    #[instrument(level = "debug", skip(rng))]
    pub fn with_rng<G: Rng + ?Sized>(input_size: usize, output_size: usize, rng: &mut G) -> Result<Self> {
        if input_size == 0 || output_size == 0 {
            return Err(NnError::InvalidArgument(format!(
                "dense layer needs non-zero sizes, got {} -> {}",
                input_size, output_size
            )));
        }

        let limit = (T::from_f64(6.0) / T::from_usize(input_size + output_size)).sqrt();
        let mut weights = Matrix::new([input_size, output_size]);
        weights.random_fill_with(rng, -limit, limit)?;

        Ok(Self::from_weights(weights))
    }

    fn from_weights(weights: Matrix<T>) -> Self {
        let [input_size, output_size] = *weights.shape();
        Dense {
            weight_gradient: Matrix::zeros([input_size, output_size]),
            bias: Matrix::zeros([1, output_size]),
            bias_gradient: Matrix::zeros([1, output_size]),
            last_input: None,
            weights,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows()
    }

    pub fn output_size(&self) -> usize {
        self.weights.cols()
    }

    /// `[input_size, output_size]` weight matrix
    pub fn weights(&self) -> &Matrix<T> {
        &self.weights
    }

    /// `[1, output_size]` bias row
    pub fn bias(&self) -> &Matrix<T> {
        &self.bias
    }

    /// Weight gradient cached by the latest backward (zeros before any)
    pub fn weight_gradient(&self) -> &Matrix<T> {
        &self.weight_gradient
    }

    /// Bias gradient cached by the latest backward (zeros before any)
    pub fn bias_gradient(&self) -> &Matrix<T> {
        &self.bias_gradient
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.size() + self.bias.size()
    }

    /// Forward pass: input @ weights, then the bias row added to every row
    pub fn forward(&mut self, input: &Matrix<T>) -> Result<Matrix<T>> {
        let output = input.matmul(&self.weights)?.add_row_broadcast(&self.bias)?;
        self.last_input = Some(input.clone());
        Ok(output)
    }

    /// Caches dW = x^T @ grad and db = column sums of grad, returns grad @ W^T
    pub fn backward(&mut self, grad_output: &Matrix<T>) -> Result<Matrix<T>> {
        let _span = tracing::debug_span!("DenseBackward", shape = ?grad_output.shape()).entered();
        let input = self
            .last_input
            .as_ref()
            .ok_or(NnError::MissingForwardPass("dense"))?;

        self.weight_gradient = input.transpose_matmul(grad_output)?;
        self.bias_gradient = grad_output.sum_rows();

        grad_output.matmul_transpose(&self.weights)
    }

    /// One SGD step with whatever gradients are currently cached
    pub fn update_weights(&mut self, learning_rate: T) -> Result<()> {
        let sgd = Sgd::new(learning_rate);
        sgd.step(&mut self.weights, &self.weight_gradient)?;
        sgd.step(&mut self.bias, &self.bias_gradient)
    }
}

/// Elementwise activation with no learnable state
#[derive(Debug, Clone)]
pub struct ActivationLayer<T> {
    activation: Activation,
    last_input: Option<Matrix<T>>,
}

impl<T: Float> ActivationLayer<T> {
    pub fn new(activation: Activation) -> Self {
        ActivationLayer {
            activation,
            last_input: None,
        }
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Applies the activation and caches the pre-activation input
    pub fn forward(&mut self, input: &Matrix<T>) -> Result<Matrix<T>> {
        let act = self.activation;
        let output = input.apply(|x| act.forward(x));
        self.last_input = Some(input.clone());
        Ok(output)
    }

    /// Chain rule: local derivative at the cached input times `grad_output`
    pub fn backward(&mut self, grad_output: &Matrix<T>) -> Result<Matrix<T>> {
        let _span = tracing::debug_span!("ActivationBackward", activation = %self.activation).entered();
        let input = self
            .last_input
            .as_ref()
            .ok_or(NnError::MissingForwardPass("activation"))?;

        let act = self.activation;
        input.apply(|x| act.backward(x)).hadamard(grad_output)
    }
}

/// A network layer: either a learnable dense transform or an activation.
#[derive(Debug, Clone)]
pub enum Layer<T> {
    Dense(Dense<T>),
    Activation(ActivationLayer<T>),
}

impl<T: Float> Layer<T> {
    pub fn dense(input_size: usize, output_size: usize) -> Result<Self> {
        Dense::new(input_size, output_size).map(Layer::Dense)
    }

    /// Activation layer from its name; unknown names are rejected here
    pub fn activation(name: &str) -> Result<Self> {
        let activation = name.parse::<Activation>()?;
        Ok(Layer::Activation(ActivationLayer::new(activation)))
    }

    pub fn forward(&mut self, input: &Matrix<T>) -> Result<Matrix<T>> {
        match self {
            Layer::Dense(layer) => layer.forward(input),
            Layer::Activation(layer) => layer.forward(input),
        }
    }

    pub fn backward(&mut self, grad_output: &Matrix<T>) -> Result<Matrix<T>> {
        match self {
            Layer::Dense(layer) => layer.backward(grad_output),
            Layer::Activation(layer) => layer.backward(grad_output),
        }
    }

    /// No-op for activation layers
    pub fn update_weights(&mut self, learning_rate: T) -> Result<()> {
        match self {
            Layer::Dense(layer) => layer.update_weights(learning_rate),
            Layer::Activation(_) => Ok(()),
        }
    }

    pub fn kind_name(&self) -> String {
        match self {
            Layer::Dense(_) => "dense".to_string(),
            Layer::Activation(layer) => format!("activation_{}", layer.activation.name()),
        }
    }

    pub fn parameter_count(&self) -> usize {
        match self {
            Layer::Dense(layer) => layer.parameter_count(),
            Layer::Activation(_) => 0,
        }
    }

    pub fn as_dense(&self) -> Option<&Dense<T>> {
        match self {
            Layer::Dense(layer) => Some(layer),
            Layer::Activation(_) => None,
        }
    }
}

impl<T: Float> fmt::Display for Layer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Dense(layer) => write!(
                f,
                "dense ({} -> {})",
                layer.input_size(),
                layer.output_size()
            ),
            Layer::Activation(layer) => write!(f, "activation_{}", layer.activation),
        }
    }
}
