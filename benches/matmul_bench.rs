use pong_nn::{Matrix, Network};
use std::time::Instant;

#[derive(Clone, Copy)]
enum MatmulVariant {
    Plain,
    TransposeLeft,
    TransposeRight,
    ExplicitTranspose,
}

impl MatmulVariant {
    fn name(&self) -> &'static str {
        match self {
            MatmulVariant::Plain => "A @ B",
            MatmulVariant::TransposeLeft => "A^T @ B",
            MatmulVariant::TransposeRight => "A @ B^T",
            MatmulVariant::ExplicitTranspose => "T(A^T) @ B",
        }
    }
}

struct BenchmarkResult {
    variant: String,
    latency_ms: f64,
    speedup: f64,
}

fn random_matrix(rows: usize, cols: usize) -> Matrix<f32> {
    let mut m = Matrix::new([rows, cols]);
    m.random_fill(-1.0, 1.0).expect("valid range");
    m
}

/// Operands laid out so every variant computes an `[m, n]` product
fn operands(variant: MatmulVariant, m: usize, k: usize, n: usize) -> (Matrix<f32>, Matrix<f32>) {
    match variant {
        MatmulVariant::Plain => (random_matrix(m, k), random_matrix(k, n)),
        MatmulVariant::TransposeLeft | MatmulVariant::ExplicitTranspose => {
            (random_matrix(k, m), random_matrix(k, n))
        }
        MatmulVariant::TransposeRight => (random_matrix(m, k), random_matrix(n, k)),
    }
}

fn run(variant: MatmulVariant, a: &Matrix<f32>, b: &Matrix<f32>) -> Matrix<f32> {
    let result = match variant {
        MatmulVariant::Plain => a.matmul(b),
        MatmulVariant::TransposeLeft => a.transpose_matmul(b),
        MatmulVariant::TransposeRight => a.matmul_transpose(b),
        MatmulVariant::ExplicitTranspose => a.transpose().matmul(b),
    };
    result.expect("compatible shapes")
}

fn benchmark_variant(variant: MatmulVariant, m: usize, k: usize, n: usize, iterations: usize) -> f64 {
    let (a, b) = operands(variant, m, k, n);

    // Warm-up
    for _ in 0..3 {
        let _ = run(variant, &a, &b);
    }

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = run(variant, &a, &b);
    }
    let elapsed = start.elapsed();

    elapsed.as_secs_f64() * 1000.0 / iterations as f64
}

fn benchmark_shape(m: usize, k: usize, n: usize, iterations: usize) -> Vec<BenchmarkResult> {
    let variants = [
        MatmulVariant::Plain,
        MatmulVariant::TransposeLeft,
        MatmulVariant::TransposeRight,
        MatmulVariant::ExplicitTranspose,
    ];

    let mut results: Vec<BenchmarkResult> = variants
        .iter()
        .map(|&variant| BenchmarkResult {
            variant: variant.name().to_string(),
            latency_ms: benchmark_variant(variant, m, k, n, iterations),
            speedup: 0.0,
        })
        .collect();

    // Speedup relative to the plain product
    let baseline_latency = results[0].latency_ms;
    for result in &mut results {
        result.speedup = baseline_latency / result.latency_ms;
    }

    results
}

fn print_results_table(shape_name: &str, m: usize, k: usize, n: usize, results: &[BenchmarkResult]) {
    println!("\n{} ({}x{}x{})", shape_name, m, k, n);
    println!("{}", "=".repeat(70));
    println!(
        "{:<15} {:>15} {:>15} {:>15}",
        "Variant", "Latency (ms)", "Speedup", "GFLOPS"
    );
    println!("{}", "-".repeat(70));

    let ops = 2.0 * m as f64 * k as f64 * n as f64;

    for result in results {
        let gflops = ops / (result.latency_ms / 1000.0) / 1e9;
        println!(
            "{:<15} {:>15.3} {:>15.2}x {:>15.2}",
            result.variant, result.latency_ms, result.speedup, gflops
        );
    }
}

/// Milliseconds per full-batch epoch of the paddle controller network
fn benchmark_training_epoch(batch: usize, epochs: usize) -> f64 {
    let mut nn = Network::<f32>::new();
    nn.add_dense_layer(5, 16).expect("valid layer");
    nn.add_activation("tanh").expect("known activation");
    nn.add_dense_layer(16, 16).expect("valid layer");
    nn.add_activation("tanh").expect("known activation");
    nn.add_dense_layer(16, 1).expect("valid layer");
    nn.add_activation("tanh").expect("known activation");
    nn.set_optimizer("sgd", 0.05);

    let x = random_matrix(batch, 5);
    let y = random_matrix(batch, 1);

    let start = Instant::now();
    nn.train(&x, &y, epochs, false).expect("training runs");
    start.elapsed().as_secs_f64() * 1000.0 / epochs as f64
}

fn main() {
    println!("Matrix Multiplication Benchmarks");
    println!("=================================\n");

    // (name, m, k, n, iterations)
    let benchmarks = vec![
        ("Small Square", 32, 32, 32, 100),
        ("Medium Square", 128, 128, 128, 20),
        ("Dense Forward (batch 256)", 256, 16, 16, 100),
        ("Weight Gradient", 16, 256, 16, 100),
        ("Tall Matrix", 1000, 100, 10, 20),
        ("Wide Matrix", 10, 100, 1000, 20),
    ];

    for (name, m, k, n, iterations) in benchmarks {
        let results = benchmark_shape(m, k, n, iterations);
        print_results_table(name, m, k, n, &results);
    }

    println!("\n{}", "=".repeat(70));
    for batch in [1, 64, 1024] {
        let latency_ms = benchmark_training_epoch(batch, 50);
        println!("Training epoch (5-16-16-1, batch {:>5}): {:>10.3} ms", batch, latency_ms);
    }

    println!("\n{}", "=".repeat(70));
    println!("Benchmark complete!");
}
