//! Toy regression: teach a tiny MLP that `f(a, b) = a + b`.
//!
//! Trains a 2→32→1 ReLU network with Adam on 1000 random pairs and prints
//! the loss curve plus a few spot checks. Purely a sandbox, unrelated to
//! the audio pipeline.
//!
//! Run with: `cargo run --example learn_addition`

use ndarray::{Array, Array1, Array2, Axis, Dimension};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SAMPLES: usize = 1000;
const HIDDEN: usize = 32;
const EPOCHS: usize = 1000;
const LEARNING_RATE: f32 = 0.01;

/// Per-parameter Adam state.
struct Adam<D: Dimension> {
    m: Array<f32, D>,
    v: Array<f32, D>,
}

impl<D: Dimension> Adam<D> {
    const BETA1: f32 = 0.9;
    const BETA2: f32 = 0.999;
    const EPS: f32 = 1e-8;

    fn like(param: &Array<f32, D>) -> Self {
        Self {
            m: Array::zeros(param.raw_dim()),
            v: Array::zeros(param.raw_dim()),
        }
    }

    fn step(&mut self, param: &mut Array<f32, D>, grad: &Array<f32, D>, t: i32) {
        self.m = &self.m * Self::BETA1 + grad * (1.0 - Self::BETA1);
        self.v = &self.v * Self::BETA2 + &(grad * grad) * (1.0 - Self::BETA2);
        let m_hat = &self.m / (1.0 - Self::BETA1.powi(t));
        let v_hat = &self.v / (1.0 - Self::BETA2.powi(t));
        *param = &*param - &(m_hat / (v_hat.mapv(f32::sqrt) + Self::EPS) * LEARNING_RATE);
    }
}

fn relu(z: &Array2<f32>) -> Array2<f32> {
    z.mapv(|v| v.max(0.0))
}

fn relu_mask(z: &Array2<f32>) -> Array2<f32> {
    z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
}

fn main() {
    let mut rng = StdRng::seed_from_u64(0);

    // Dataset: pairs (a, b) -> target a + b
    let x: Array2<f32> = Array::from_shape_fn((SAMPLES, 2), |_| rng.gen_range(-10.0..10.0));
    let y: Array2<f32> = x.sum_axis(Axis(1)).insert_axis(Axis(1));

    let mut w1: Array2<f32> = Array::from_shape_fn((2, HIDDEN), |_| rng.gen_range(-0.5..0.5));
    let mut b1: Array1<f32> = Array::zeros(HIDDEN);
    let scale = 1.0 / (HIDDEN as f32).sqrt();
    let mut w2: Array2<f32> = Array::from_shape_fn((HIDDEN, 1), |_| rng.gen_range(-scale..scale));
    let mut b2: Array1<f32> = Array::zeros(1);

    let mut adam_w1 = Adam::like(&w1);
    let mut adam_b1 = Adam::like(&b1);
    let mut adam_w2 = Adam::like(&w2);
    let mut adam_b2 = Adam::like(&b2);

    for epoch in 1..=EPOCHS {
        // Forward
        let z1 = x.dot(&w1) + &b1;
        let h = relu(&z1);
        let pred = h.dot(&w2) + &b2;

        let diff = &pred - &y;
        let loss = diff.mapv(|d| d * d).mean().unwrap_or(0.0);

        // Backward (MSE)
        let d_pred = &diff * (2.0 / SAMPLES as f32);
        let grad_w2 = h.t().dot(&d_pred);
        let grad_b2 = d_pred.sum_axis(Axis(0));
        let d_z1 = d_pred.dot(&w2.t()) * relu_mask(&z1);
        let grad_w1 = x.t().dot(&d_z1);
        let grad_b1 = d_z1.sum_axis(Axis(0));

        let t = epoch as i32;
        adam_w1.step(&mut w1, &grad_w1, t);
        adam_b1.step(&mut b1, &grad_b1, t);
        adam_w2.step(&mut w2, &grad_w2, t);
        adam_b2.step(&mut b2, &grad_b2, t);

        if epoch % 100 == 0 || epoch == 1 {
            println!("Epoch {epoch:4} - Loss: {loss:.6}");
        }
    }

    // Spot checks
    let tests = ndarray::arr2(&[[1.0f32, 2.0], [5.5, -2.5], [10.0, 3.0], [-4.0, -6.0]]);
    let out = relu(&(tests.dot(&w1) + &b1)).dot(&w2) + &b2;
    for (input, pred) in tests.axis_iter(Axis(0)).zip(out.axis_iter(Axis(0))) {
        println!(
            "{} + {} -> model: {:.4}  (expected: {:.4})",
            input[0],
            input[1],
            pred[0],
            input[0] + input[1]
        );
    }
}
