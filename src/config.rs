//! # Configuration
//!
//! Sizes and limits for a walkthrough, read from a JSON file. Missing
//! fields fall back to the defaults.

use crate::attention::DEFAULT_N_HEADS;
use crate::embedding::DEFAULT_D_MODEL;
use crate::feed_forward::DEFAULT_FFN_HIDDEN_DIM;
use crate::sequence::{DEFAULT_MAX_INPUT_CHARS, DEFAULT_MAX_SEQ_LEN};
use crate::tokenizer::DEFAULT_MAX_CHARS_PER_WORD;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to deserialize JSON from {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WalkthroughConfig {
    #[serde(alias = "max_position_embeddings")]
    pub max_seq_len: usize,
    #[serde(alias = "hidden_size", alias = "n_embd")]
    pub d_model: usize,
    #[serde(alias = "intermediate_size", alias = "n_inner")]
    pub ffn_hidden_dim: usize,
    #[serde(alias = "num_attention_heads", alias = "n_head")]
    pub n_heads: usize,
    pub max_input_chars: usize,
    pub max_chars_per_word: usize,
    /// JSON `{token: id}` file replacing the built-in vocabulary.
    pub vocab_path: Option<PathBuf>,
}

impl Default for WalkthroughConfig {
    fn default() -> Self {
        Self {
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            d_model: DEFAULT_D_MODEL,
            ffn_hidden_dim: DEFAULT_FFN_HIDDEN_DIM,
            n_heads: DEFAULT_N_HEADS,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            max_chars_per_word: DEFAULT_MAX_CHARS_PER_WORD,
            vocab_path: None,
        }
    }
}

impl WalkthroughConfig {
    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        let mut file = File::open(config_path).map_err(|source| ConfigError::Io {
            path: config_path.to_path_buf(),
            source,
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(|source| ConfigError::Io {
            path: config_path.to_path_buf(),
            source,
        })?;

        let config: WalkthroughConfig = serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
            path: config_path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("max_seq_len", self.max_seq_len),
            ("d_model", self.d_model),
            ("ffn_hidden_dim", self.ffn_hidden_dim),
            ("n_heads", self.n_heads),
            ("max_input_chars", self.max_input_chars),
            ("max_chars_per_word", self.max_chars_per_word),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be greater than zero", name)));
            }
        }
        Ok(())
    }
}
