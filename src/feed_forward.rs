//! # Feed-Forward Block

use ndarray::{Array1, Array2};
use libm::tanhf;

pub const DEFAULT_FFN_HIDDEN_DIM: usize = 16;

const WEIGHT_FREQUENCY: f32 = 0.7;

// GELU approximation
pub fn gelu_new(x: f32) -> f32 {
    0.5 * x * (1.0 + tanhf((2.0f32 / std::f32::consts::PI).sqrt() * (x + 0.044715 * x.powi(3))))
}

fn synthetic_weights(fan_in: usize, fan_out: usize) -> Array2<f32> {
    let scale = 1.0 / (fan_in.max(1) as f32).sqrt();
    Array2::from_shape_fn((fan_in, fan_out), |(r, c)| {
        (((r + 1) * (c + 1)) as f32 * WEIGHT_FREQUENCY).sin() * scale
    })
}

/// Activations of one pass through the position-wise feed-forward block.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedForwardActivations {
    /// `[seq_len, hidden_dim]`, after GELU.
    pub hidden: Array2<f32>,
    /// `[seq_len, d_model]`.
    pub output: Array2<f32>,
}

/// `FFN(x) = GELU(x W1 + b1) W2 + b2` with fixed, made-up weights.
#[derive(Debug, Clone)]
pub struct FeedForward {
    w1: Array2<f32>, // [d_model, hidden_dim]
    b1: Array1<f32>, // [hidden_dim]
    w2: Array2<f32>, // [hidden_dim, d_model]
    b2: Array1<f32>, // [d_model]
}

impl FeedForward {
    pub fn new(d_model: usize, hidden_dim: usize) -> Self {
        Self {
            w1: synthetic_weights(d_model, hidden_dim),
            b1: Array1::zeros(hidden_dim),
            w2: synthetic_weights(hidden_dim, d_model),
            b2: Array1::zeros(d_model),
        }
    }

    pub fn d_model(&self) -> usize {
        self.w1.nrows()
    }

    pub fn hidden_dim(&self) -> usize {
        self.w1.ncols()
    }

    /// Applies the block to every row of `input` (`[seq_len, d_model]`).
    pub fn forward(&self, input: &Array2<f32>) -> FeedForwardActivations {
        let hidden = (input.dot(&self.w1) + &self.b1).mapv(gelu_new);
        let output = hidden.dot(&self.w2) + &self.b2;
        FeedForwardActivations { hidden, output }
    }
}
