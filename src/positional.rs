//! # Positional Encoding
//!
//! Fixed sinusoidal position vectors, identical for every input.

use ndarray::Array2;

/// Sinusoidal encoding of position `pos` in dimension `i`.
///
/// `angle = pos / 10000^(2 * floor(i / 2) / d_model)`; even dimensions take
/// `sin(angle)`, odd ones `cos(angle)`.
pub fn positional_value(pos: usize, i: usize, d_model: usize) -> f32 {
    let exponent = (2 * (i / 2)) as f64 / d_model as f64;
    let angle = pos as f64 / 10000f64.powf(exponent);
    let value = if i % 2 == 0 { angle.sin() } else { angle.cos() };
    value as f32
}

/// `[seq_len, d_model]` matrix of positional encodings.
pub fn positional_encodings(seq_len: usize, d_model: usize) -> Array2<f32> {
    Array2::from_shape_fn((seq_len, d_model), |(pos, i)| positional_value(pos, i, d_model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_position_zero() {
        for i in 0..8 {
            let expected = if i % 2 == 0 { 0.0 } else { 1.0 };
            assert_abs_diff_eq!(positional_value(0, i, 8), expected, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_known_values() {
        assert_abs_diff_eq!(positional_value(1, 0, 8), 1.0f32.sin(), epsilon = 1e-6);
        assert_abs_diff_eq!(positional_value(1, 1, 8), 1.0f32.cos(), epsilon = 1e-6);
        // dims 2 and 3 share the frequency 1 / 10000^(2/8) = 0.1
        assert_abs_diff_eq!(positional_value(1, 2, 8), 0.1f32.sin(), epsilon = 1e-6);
        assert_abs_diff_eq!(positional_value(3, 3, 8), 0.3f32.cos(), epsilon = 1e-6);
    }

    #[test]
    fn test_matrix_shape_and_range() {
        let pe = positional_encodings(12, 8);
        assert_eq!(pe.shape(), &[12, 8]);
        assert!(pe.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(positional_encodings(12, 8), positional_encodings(12, 8));
        assert_eq!(positional_value(7, 5, 8), positional_value(7, 5, 8));
    }
}
