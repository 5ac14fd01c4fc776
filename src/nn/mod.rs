//! Feed-forward network built from dense and activation layers
//!
//! Gradients are derived by hand per layer type and propagated by
//! [`Network::train`] in reverse layer order.

pub mod activation;
pub mod config;
pub mod layer;
pub mod loss;
pub mod network;
pub mod optim;

pub use activation::Activation;
pub use config::TrainConfig;
pub use layer::{ActivationLayer, Dense, Layer};
pub use loss::{mse_gradient, mse_loss, Loss};
pub use network::Network;
pub use optim::{Optimizer, Sgd};
