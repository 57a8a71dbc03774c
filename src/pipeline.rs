//! # Walkthrough Pipeline
//!
//! Runs every stage for one input text and keeps the results together.
//! [`Visualizer`] is the interactive session: it holds the latest
//! walkthrough and only recomputes when the input actually changes.

use crate::attention::{self, AttentionFocus};
use crate::config::WalkthroughConfig;
use crate::embedding::{combine, generate_embeddings};
use crate::feed_forward::{FeedForward, FeedForwardActivations};
use crate::positional::positional_encodings;
use crate::sequence::{bound_input, IdResolver, SequenceAssembler, TokenKind, TokenSequence, TokenStats};
use crate::tokenizer::WordPieceTokenizer;
use crate::vocab::{VocabError, Vocabulary};
use log::debug;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shortcut inputs offered next to the free-text box.
pub const EXAMPLE_TEXTS: &[&str] = &[
    "The cat sat on the mat",
    "Attention is all you need",
    "Transformers are revolutionizing natural language processing",
    "The quick brown fox jumps over the lazy dog",
    "Tokenization splits unbelievable words",
    "Time flies like an arrow",
];

/// Tokenizer for `config`: the vocabulary file if one is configured, the
/// built-in table otherwise.
pub fn build_tokenizer(config: &WalkthroughConfig) -> Result<WordPieceTokenizer, VocabError> {
    let vocab = match &config.vocab_path {
        Some(path) => Vocabulary::load(path)?,
        None => Vocabulary::builtin(),
    };
    Ok(WordPieceTokenizer::new(vocab).with_max_chars_per_word(config.max_chars_per_word))
}

/// Everything computed for one input text.
#[derive(Debug, Clone)]
pub struct Walkthrough {
    pub run_id: String,
    pub input_text: String,
    pub sequence: TokenSequence,
    pub token_ids: Vec<u32>,
    pub embeddings: Array2<f32>,
    pub positional: Array2<f32>,
    pub combined: Array2<f32>,
    pub attention: Array2<f32>,
    pub feed_forward: FeedForwardActivations,
}

impl Walkthrough {
    pub fn compute<R: Rng + ?Sized>(
        text: &str,
        config: &WalkthroughConfig,
        tokenizer: &WordPieceTokenizer,
        rng: &mut R,
    ) -> Self {
        let input_text = bound_input(text, config.max_input_chars);

        let sequence = SequenceAssembler::new(config.max_seq_len, config.max_input_chars)
            .assemble(&input_text, tokenizer);
        let token_ids = IdResolver::new(tokenizer.vocab()).resolve_all(&sequence);

        let embeddings = generate_embeddings(sequence.tokens(), config.d_model, rng);
        let positional = positional_encodings(sequence.len(), config.d_model);
        let combined = combine(&embeddings, &positional);
        let attention = attention::attention_weights(sequence.tokens(), rng);
        let feed_forward = FeedForward::new(config.d_model, config.ffn_hidden_dim).forward(&combined);

        let run_id = Uuid::new_v4().to_string();
        debug!("Walkthrough {} computed for {:?}: {:?}", run_id, input_text, sequence.tokens());

        Self {
            run_id,
            input_text,
            sequence,
            token_ids,
            embeddings,
            positional,
            combined,
            attention,
            feed_forward,
        }
    }

    pub fn focus(&self, query: usize) -> Option<AttentionFocus> {
        attention::focus(&self.attention, query)
    }

    pub fn report(&self) -> WalkthroughReport {
        WalkthroughReport {
            run_id: self.run_id.clone(),
            input_text: self.input_text.clone(),
            tokens: self.sequence.tokens().to_vec(),
            token_ids: self.token_ids.clone(),
            token_kinds: self.sequence.kinds(),
            stats: self.sequence.stats(),
            truncated: self.sequence.is_truncated(),
            embeddings: to_rows(&self.embeddings),
            positional_encodings: to_rows(&self.positional),
            combined_input: to_rows(&self.combined),
            attention: to_rows(&self.attention),
            ffn_hidden: to_rows(&self.feed_forward.hidden),
            ffn_output: to_rows(&self.feed_forward.output),
        }
    }
}

fn to_rows(matrix: &Array2<f32>) -> Vec<Vec<f32>> {
    matrix.rows().into_iter().map(|row| row.to_vec()).collect()
}

/// Serializable form of a [`Walkthrough`], matrices as nested rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkthroughReport {
    pub run_id: String,
    pub input_text: String,
    pub tokens: Vec<String>,
    pub token_ids: Vec<u32>,
    pub token_kinds: Vec<TokenKind>,
    pub stats: TokenStats,
    pub truncated: bool,
    pub embeddings: Vec<Vec<f32>>,
    pub positional_encodings: Vec<Vec<f32>>,
    pub combined_input: Vec<Vec<f32>>,
    pub attention: Vec<Vec<f32>>,
    pub ffn_hidden: Vec<Vec<f32>>,
    pub ffn_output: Vec<Vec<f32>>,
}

/// Interactive session over a single, changing input text.
#[derive(Debug)]
pub struct Visualizer {
    config: WalkthroughConfig,
    tokenizer: WordPieceTokenizer,
    rng: StdRng,
    current: Option<Walkthrough>,
}

impl Visualizer {
    pub fn new(config: WalkthroughConfig, tokenizer: WordPieceTokenizer) -> Self {
        Self::with_rng(config, tokenizer, StdRng::from_entropy())
    }

    /// Reproducible session, mainly for tests and `--seed`.
    pub fn with_seed(config: WalkthroughConfig, tokenizer: WordPieceTokenizer, seed: u64) -> Self {
        Self::with_rng(config, tokenizer, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: WalkthroughConfig, tokenizer: WordPieceTokenizer, rng: StdRng) -> Self {
        Self { config, tokenizer, rng, current: None }
    }

    pub fn config(&self) -> &WalkthroughConfig {
        &self.config
    }

    pub fn current(&self) -> Option<&Walkthrough> {
        self.current.as_ref()
    }

    /// Walkthrough for `text`, recomputed only if `text` differs from the
    /// previous input.
    pub fn update(&mut self, text: &str) -> &Walkthrough {
        let bounded = bound_input(text, self.config.max_input_chars);
        let walkthrough = match self.current.take() {
            Some(previous) if previous.input_text == bounded => previous,
            _ => Walkthrough::compute(&bounded, &self.config, &self.tokenizer, &mut self.rng),
        };
        self.current.insert(walkthrough)
    }

    /// `[n_heads, seq_len]` head views of attention row `query` in the
    /// current walkthrough.
    pub fn head_views(&mut self, query: usize) -> Option<Array2<f32>> {
        let current = self.current.as_ref()?;
        if query >= current.sequence.len() {
            return None;
        }
        Some(attention::head_views(&current.attention, query, self.config.n_heads, &mut self.rng))
    }
}
