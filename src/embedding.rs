//! Illustrative token embeddings.
//!
//! Nothing here is learned: each entry is a sine of the position and
//! dimension indices, jittered by the supplied random source so repeated
//! runs look like different "lookups".

use crate::vocab::is_special;
use ndarray::Array2;
use rand::Rng;

pub const DEFAULT_D_MODEL: usize = 8;

const TOKEN_FREQUENCY: f32 = 0.5;
const SPECIAL_FREQUENCY: f32 = 0.3;
const SPECIAL_AMPLITUDE: f32 = 0.5;
const JITTER_MIN: f32 = 0.8;
const JITTER_MAX: f32 = 1.2;

/// `[tokens.len(), d_model]` embedding matrix.
///
/// Ordinary tokens: `sin((i+1)(j+1) * 0.5) * U[0.8, 1.2)`.
/// Special tokens: `sin((i+1)(j+1) * 0.3) * 0.5`, with no randomness.
pub fn generate_embeddings<R: Rng + ?Sized>(tokens: &[String], d_model: usize, rng: &mut R) -> Array2<f32> {
    Array2::from_shape_fn((tokens.len(), d_model), |(i, j)| {
        let phase = ((i + 1) * (j + 1)) as f32;
        if is_special(&tokens[i]) {
            (phase * SPECIAL_FREQUENCY).sin() * SPECIAL_AMPLITUDE
        } else {
            (phase * TOKEN_FREQUENCY).sin() * rng.gen_range(JITTER_MIN..JITTER_MAX)
        }
    })
}

/// Embeddings plus positional encodings, element-wise.
pub fn combine(embeddings: &Array2<f32>, positional: &Array2<f32>) -> Array2<f32> {
    embeddings + positional
}
