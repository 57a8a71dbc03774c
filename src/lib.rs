//! Step-by-step, illustrative walk through the input side of a transformer:
//! WordPiece tokenization, fixed-length sequence assembly, ID lookup, and
//! synthetic embedding, positional, attention and feed-forward tensors.

pub mod attention;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod export;
pub mod feed_forward;
pub mod pipeline;
pub mod positional;
pub mod render;
pub mod sequence;
pub mod stage;
pub mod tokenizer;
pub mod ui;
pub mod vocab;

pub use config::{ConfigError, WalkthroughConfig};
pub use pipeline::{build_tokenizer, Visualizer, Walkthrough, WalkthroughReport, EXAMPLE_TEXTS};
pub use sequence::{IdResolver, SequenceAssembler, TokenKind, TokenSequence};
pub use stage::Stage;
pub use tokenizer::WordPieceTokenizer;
pub use vocab::{VocabError, Vocabulary};
