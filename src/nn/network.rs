use std::fmt;
use std::path::Path;

use rand::Rng;
use tracing::{debug, info, instrument};

use super::config::TrainConfig;
use super::layer::{Dense, Layer};
use super::loss::Loss;
use super::optim::Optimizer;
use crate::error::{NnError, Result};
use crate::tensor::{Float, Matrix};

pub const DEFAULT_LEARNING_RATE: f64 = 0.001;

/// Ordered stack of layers trained with a named loss and optimizer.
///
/// Insertion order is forward order; backward runs in exact reverse. Loss and
/// optimizer names are stored as given and only resolved when training
/// starts, so an unknown name fails at the first `train`, not at set time.
///
/// Layers keep per-call scratch state, so every method that runs a forward
/// pass takes `&mut self`; one predict or train cycle at a time.
#[derive(Debug, Clone)]
pub struct Network<T> {
    layers: Vec<Layer<T>>,
    learning_rate: T,
    optimizer: String,
    loss_function: String,
}

impl<T: Float> Default for Network<T> {
    fn default() -> Self {
        Network {
            layers: Vec::new(),
            learning_rate: T::from_f64(DEFAULT_LEARNING_RATE),
            optimizer: Optimizer::Sgd.name().to_string(),
            loss_function: Loss::Mse.name().to_string(),
        }
    }
}

impl<T: Float> Network<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dense layer initialized from a freshly seeded generator
    pub fn add_dense_layer(&mut self, input_size: usize, output_size: usize) -> Result<()> {
        self.layers.push(Layer::dense(input_size, output_size)?);
        Ok(())
    }

    /// Append a dense layer initialized from a caller-owned generator
    pub fn add_dense_layer_with_rng<G: Rng + ?Sized>(
        &mut self,
        input_size: usize,
        output_size: usize,
        rng: &mut G,
    ) -> Result<()> {
        let layer = Dense::with_rng(input_size, output_size, rng)?;
        self.layers.push(Layer::Dense(layer));
        Ok(())
    }

    /// Append an activation layer; unknown names fail immediately
    pub fn add_activation(&mut self, name: &str) -> Result<()> {
        self.layers.push(Layer::activation(name)?);
        Ok(())
    }

    pub fn set_optimizer(&mut self, name: &str, learning_rate: T) {
        self.optimizer = name.to_string();
        self.learning_rate = learning_rate;
    }

    pub fn set_loss_function(&mut self, name: &str) {
        self.loss_function = name.to_string();
    }

    pub fn layers(&self) -> &[Layer<T>] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn learning_rate(&self) -> T {
        self.learning_rate
    }

    pub fn optimizer(&self) -> &str {
        &self.optimizer
    }

    pub fn loss_function(&self) -> &str {
        &self.loss_function
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    /// Run `input` through every layer's forward pass.
    ///
    /// Parameters are never touched; only the layers' forward caches are.
    #[instrument(skip_all, fields(shape = ?input.shape(), layers = self.layers.len()))]
    pub fn predict(&mut self, input: &Matrix<T>) -> Result<Matrix<T>> {
        let mut output = input.clone();
        for layer in self.layers.iter_mut() {
            output = layer.forward(&output)?;
        }
        Ok(output)
    }

    /// Current loss of the network on `(x, y)` without training
    pub fn evaluate(&mut self, x: &Matrix<T>, y: &Matrix<T>) -> Result<T> {
        let loss = self.loss_function.parse::<Loss>()?;
        let predictions = self.predict(x)?;
        loss.value(&predictions, y)
    }

    /// Train for `epochs` full-batch epochs, logging the loss every 10th epoch
    /// (or every `PONG_NN_LOG_INTERVAL`) when `verbose`. Returns the loss of every epoch, measured before that
    /// epoch's update.
    pub fn train(
        &mut self,
        x: &Matrix<T>,
        y: &Matrix<T>,
        epochs: usize,
        verbose: bool,
    ) -> Result<Vec<T>> {
        self.train_with(x, y, &TrainConfig::for_run(epochs, verbose))
    }

    #[instrument(skip_all, fields(batch = x.rows(), epochs = config.epochs, lr = %self.learning_rate))]
    pub fn train_with(
        &mut self,
        x: &Matrix<T>,
        y: &Matrix<T>,
        config: &TrainConfig,
    ) -> Result<Vec<T>> {
        let mut history = Vec::with_capacity(config.epochs);
        if config.epochs == 0 {
            return Ok(history);
        }

        let loss = self.loss_function.parse::<Loss>()?;
        let optimizer = self.optimizer.parse::<Optimizer>()?;

        for epoch in 0..config.epochs {
            let predictions = self.predict(x)?;
            let value = loss.value(&predictions, y)?;

            if config.should_log(epoch) {
                info!(epoch, loss = %value, "Epoch {}, Loss: {}", epoch, value);
            }

            let grad = loss.gradient(&predictions, y)?;
            self.backward(grad)?;

            match optimizer {
                Optimizer::Sgd => {
                    for layer in self.layers.iter_mut() {
                        layer.update_weights(self.learning_rate)?;
                    }
                }
            }

            history.push(value);
        }

        debug!(final_loss = ?history.last(), "training finished");
        Ok(history)
    }

    /// Backpropagate the loss gradient through the layers in reverse order
    fn backward(&mut self, loss_gradient: Matrix<T>) -> Result<()> {
        let mut grad = loss_gradient;
        for layer in self.layers.iter_mut().rev() {
            grad = layer.backward(&grad)?;
        }
        Ok(())
    }

    /// One line per layer, e.g. `Layer 0: dense (2 -> 3)`
    pub fn architecture(&self) -> Vec<String> {
        self.layers
            .iter()
            .enumerate()
            .map(|(i, layer)| format!("Layer {}: {}", i, layer))
            .collect()
    }

    pub fn log_architecture(&self) {
        info!(
            layers = self.layers.len(),
            parameters = self.parameter_count(),
            "Neural Network Architecture"
        );
        for line in self.architecture() {
            info!("{}", line);
        }
    }

    /// Persisting trained parameters is not supported.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        debug!(path = %path.as_ref().display(), "save requested");
        Err(NnError::Unsupported("saving network parameters"))
    }

    /// Restoring trained parameters is not supported.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        debug!(path = %path.as_ref().display(), "load requested");
        Err(NnError::Unsupported("loading network parameters"))
    }
}

impl<T: Float> fmt::Display for Network<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Neural Network Architecture:")?;
        for line in self.architecture() {
            writeln!(f, "{}", line)?;
        }
        write!(
            f,
            "optimizer={} lr={} loss={}",
            self.optimizer, self.learning_rate, self.loss_function
        )
    }
}
