//! # Heuristic Self-Attention
//!
//! Produces a plausible-looking attention pattern without any query/key
//! projections: weights decay with token distance, lean towards `[CLS]` and
//! `[SEP]`, ignore `[PAD]`, and get a little noise. Every row is normalized
//! into a probability distribution.

use crate::vocab::{is_special, CLS_TOKEN, PAD_TOKEN, SEP_TOKEN};
use ndarray::{Array2, ArrayView1};
use ndarray_stats::QuantileExt;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_N_HEADS: usize = 8;

const DISTANCE_DECAY: f32 = 0.3;
const BOUNDARY_BOOST: f32 = 1.5;
const PAD_DAMPING: f32 = 0.1;
const SAME_LENGTH_BOOST: f32 = 1.2;
const NOISE_MAX: f32 = 0.1;
const HEAD_JITTER_MIN: f32 = 0.8;
const HEAD_JITTER_MAX: f32 = 1.2;

fn raw_weight(tokens: &[String], query: usize, key: usize) -> f32 {
    let distance = (query as f32 - key as f32).abs();
    let mut weight = (-DISTANCE_DECAY * distance).exp();

    let key_token = tokens[key].as_str();
    if key_token == CLS_TOKEN || key_token == SEP_TOKEN {
        weight *= BOUNDARY_BOOST;
    }
    if key_token == PAD_TOKEN {
        weight *= PAD_DAMPING;
    }

    let query_token = tokens[query].as_str();
    if !is_special(query_token)
        && !is_special(key_token)
        && query_token.chars().count() == key_token.chars().count()
    {
        weight *= SAME_LENGTH_BOOST;
    }
    weight
}

/// `[n, n]` attention matrix for `tokens`; each row sums to 1.
pub fn attention_weights<R: Rng + ?Sized>(tokens: &[String], rng: &mut R) -> Array2<f32> {
    let n = tokens.len();
    let mut weights = Array2::from_shape_fn((n, n), |(query, key)| {
        raw_weight(tokens, query, key) + rng.gen_range(0.0..NOISE_MAX)
    });
    normalize_rows(&mut weights);
    weights
}

/// Divides every row by its sum. Rows that sum to zero are left alone.
pub fn normalize_rows(weights: &mut Array2<f32>) {
    for mut row in weights.rows_mut() {
        let sum = row.sum();
        if sum > 0.0 {
            row.mapv_inplace(|w| w / sum);
        }
    }
}

/// Where one query token puts its attention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionFocus {
    pub query: usize,
    /// Most-attended key position.
    pub strongest: usize,
    /// `(key position, weight)`, heaviest first.
    pub ranked: Vec<(usize, f32)>,
}

/// Focus summary for row `query`, or `None` if the row does not exist.
pub fn focus(weights: &Array2<f32>, query: usize) -> Option<AttentionFocus> {
    if query >= weights.nrows() {
        return None;
    }
    let row: ArrayView1<f32> = weights.row(query);
    let strongest = row.argmax().ok()?;

    let mut ranked: Vec<(usize, f32)> = row.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    Some(AttentionFocus { query, strongest, ranked })
}

/// `[n_heads, n]` per-head variations of row `query`, each entry scaled by
/// `U[0.8, 1.2)`. Purely cosmetic, rows are not renormalized.
pub fn head_views<R: Rng + ?Sized>(weights: &Array2<f32>, query: usize, n_heads: usize, rng: &mut R) -> Array2<f32> {
    if query >= weights.nrows() {
        return Array2::zeros((n_heads, 0));
    }
    let row = weights.row(query);
    Array2::from_shape_fn((n_heads, row.len()), |(_, key)| {
        row[key] * rng.gen_range(HEAD_JITTER_MIN..HEAD_JITTER_MAX)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn reference_tokens() -> Vec<String> {
        tokens(&[
            "[CLS]", "The", "cat", "sat", "on", "the", "mat", "[SEP]", "[PAD]", "[PAD]", "[PAD]", "[PAD]",
        ])
    }

    #[test]
    fn test_rows_sum_to_one() {
        let mut rng = StdRng::seed_from_u64(3);
        let weights = attention_weights(&reference_tokens(), &mut rng);
        assert_eq!(weights.shape(), &[12, 12]);
        for row in weights.rows() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-5);
            assert!(row.iter().all(|&w| w > 0.0));
        }
    }

    #[test]
    fn test_raw_weight_rules() {
        let toks = reference_tokens();
        // distance decay only: "on"(4) -> "the"(5) differ in length
        assert_abs_diff_eq!(raw_weight(&toks, 4, 5), (-0.3f32).exp(), epsilon = 1e-6);
        // key is [CLS]
        assert_abs_diff_eq!(raw_weight(&toks, 1, 0), (-0.3f32).exp() * 1.5, epsilon = 1e-6);
        // key is [PAD]
        assert_abs_diff_eq!(raw_weight(&toks, 8, 8), 0.1, epsilon = 1e-6);
        // "cat"(2) -> "sat"(3): same length, both ordinary
        assert_abs_diff_eq!(raw_weight(&toks, 2, 3), (-0.3f32).exp() * 1.2, epsilon = 1e-6);
        // special query never gets the length boost
        assert_abs_diff_eq!(raw_weight(&toks, 7, 7), 1.5, epsilon = 1e-6);
    }

    #[test]
    fn test_padding_gets_little_attention() {
        let mut rng = StdRng::seed_from_u64(11);
        let weights = attention_weights(&reference_tokens(), &mut rng);
        // "mat" attends to [SEP] far more than to the adjacent padding
        assert!(weights[[6, 7]] > weights[[6, 8]]);
    }

    #[test]
    fn test_normalize_rows_leaves_zero_rows() {
        let mut m = Array2::from_shape_vec((2, 2), vec![1.0, 3.0, 0.0, 0.0]).unwrap();
        normalize_rows(&mut m);
        assert_abs_diff_eq!(m[[0, 0]], 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(m[[0, 1]], 0.75, epsilon = 1e-6);
        assert_eq!(m[[1, 0]], 0.0);
    }

    #[test]
    fn test_focus_ranks_keys() {
        let m = Array2::from_shape_vec((2, 3), vec![0.2, 0.5, 0.3, 0.6, 0.3, 0.1]).unwrap();
        let f = focus(&m, 0).unwrap();
        assert_eq!(f.strongest, 1);
        assert_eq!(f.ranked.iter().map(|(k, _)| *k).collect::<Vec<_>>(), vec![1, 2, 0]);
        assert_eq!(focus(&m, 1).unwrap().strongest, 0);
        assert!(focus(&m, 2).is_none());
    }

    #[test]
    fn test_head_views_shape_and_band() {
        let mut rng = StdRng::seed_from_u64(5);
        let weights = attention_weights(&reference_tokens(), &mut rng);
        let heads = head_views(&weights, 2, DEFAULT_N_HEADS, &mut rng);
        assert_eq!(heads.shape(), &[DEFAULT_N_HEADS, 12]);
        for h in 0..DEFAULT_N_HEADS {
            for k in 0..12 {
                let base = weights[[2, k]];
                assert!(heads[[h, k]] >= base * 0.8 - 1e-6 && heads[[h, k]] <= base * 1.2 + 1e-6);
            }
        }
    }
}
