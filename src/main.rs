use pong_nn::{Matrix, Network, Result};
use rand::Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// XOR inputs and targets
fn xor_data() -> Result<(Matrix<f32>, Matrix<f32>)> {
    let x = Matrix::from_rows(&[[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]])?;
    let y = Matrix::from_rows(&[[0.0], [1.0], [1.0], [0.0]])?;
    Ok((x, y))
}

/// Random paddle states `[ball_x, ball_y, ball_speed_x, ball_speed_y, paddle_y]`
/// with the target action "move toward the ball"
fn generate_paddle_data(n_samples: usize) -> Result<(Matrix<f32>, Matrix<f32>)> {
    let mut rng = rand::thread_rng();
    let mut features = Vec::with_capacity(n_samples);
    let mut targets = Vec::with_capacity(n_samples);

    for _ in 0..n_samples {
        let ball_x: f32 = rng.gen();
        let ball_y: f32 = rng.gen();
        let speed_x: f32 = rng.gen_range(-1.0..1.0);
        let speed_y: f32 = rng.gen_range(-1.0..1.0);
        let paddle_y: f32 = rng.gen();

        features.push([ball_x, ball_y, speed_x, speed_y, paddle_y]);
        targets.push([(ball_y - paddle_y) * 0.5]);
    }

    Ok((Matrix::from_rows(&features)?, Matrix::from_rows(&targets)?))
}

fn log_predictions(label: &str, x: &Matrix<f32>, predictions: &Matrix<f32>, y: &Matrix<f32>) -> Result<()> {
    info!("{}", label);
    for i in 0..x.rows() {
        info!(
            "Input: {:?} -> Prediction: {:.4}, Expected: {}",
            x.row(i)?,
            predictions.get(i, 0)?,
            y.get(i, 0)?
        );
    }
    Ok(())
}

fn run_xor() -> Result<()> {
    let mut nn = Network::<f32>::new();
    nn.add_dense_layer(2, 3)?;
    nn.add_activation("relu")?;
    nn.add_dense_layer(3, 1)?;
    nn.add_activation("sigmoid")?;
    nn.set_optimizer("sgd", 0.1);
    nn.set_loss_function("mse");
    nn.log_architecture();

    let (x, y) = xor_data()?;

    let before = nn.predict(&x)?;
    log_predictions("Predictions before training:", &x, &before, &y)?;

    let history = nn.train(&x, &y, 1000, false)?;

    let after = nn.predict(&x)?;
    log_predictions("Predictions after training:", &x, &after, &y)?;
    info!(
        initial = ?history.first(),
        final_loss = ?history.last(),
        "XOR training complete"
    );
    Ok(())
}

fn run_paddle() -> Result<()> {
    let mut nn = Network::<f32>::new();
    nn.add_dense_layer(5, 8)?;
    nn.add_activation("tanh")?;
    nn.add_dense_layer(8, 4)?;
    nn.add_activation("tanh")?;
    nn.add_dense_layer(4, 1)?;
    nn.add_activation("tanh")?;
    nn.set_optimizer("sgd", 0.01);
    nn.set_loss_function("mse");
    nn.log_architecture();

    let (x, y) = generate_paddle_data(10)?;
    nn.train(&x, &y, 50, true)?;

    let state = Matrix::from_rows(&[[0.5, 0.3, 0.1, 0.2, 0.8]])?;
    let action = nn.predict(&state)?.into_vec();
    info!("Action prediction: {:?}", action);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("=== XOR ===");
    run_xor()?;

    info!("=== Paddle controller ===");
    run_paddle()?;

    Ok(())
}
