//! # Walkthrough Stages

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The steps of the forward-pass walkthrough, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Input,
    Tokenization,
    Embeddings,
    Positional,
    Attention,
    FeedForward,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Input,
        Stage::Tokenization,
        Stage::Embeddings,
        Stage::Positional,
        Stage::Attention,
        Stage::FeedForward,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Stage::Input => "Input Text",
            Stage::Tokenization => "Tokenization",
            Stage::Embeddings => "Token Embeddings",
            Stage::Positional => "Positional Encoding",
            Stage::Attention => "Attention Mechanism",
            Stage::FeedForward => "Feed Forward",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Stage::Input => "Raw input text ready for processing",
            Stage::Tokenization => "Text → Token IDs using WordPiece",
            Stage::Embeddings => "Token IDs → Dense vectors",
            Stage::Positional => "Adding sinusoidal position information",
            Stage::Attention => "Self-attention weight computation",
            Stage::FeedForward => "Position-wise FFN transformation",
        }
    }

    pub fn info(&self) -> StageInfo {
        StageInfo {
            stage: *self,
            title: self.title().to_string(),
            description: self.description().to_string(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Serializable stage listing for front ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageInfo {
    pub stage: Stage,
    pub title: String,
    pub description: String,
}
