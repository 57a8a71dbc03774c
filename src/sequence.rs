//! # Sequence Assembly and ID Resolution
//!
//! Turns raw text into the fixed-length `[CLS] … [SEP] [PAD]*` sequence the
//! rest of the walkthrough works on, and maps every token to a numeric ID.

use crate::tokenizer::WordPieceTokenizer;
use crate::vocab::{
    is_special, Vocabulary, CLS_TOKEN, CONTINUATION_PREFIX, PAD_TOKEN, PLACEHOLDER_SPREAD, REFERENCE_VOCAB_SIZE,
    SEP_TOKEN,
};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_MAX_SEQ_LEN: usize = 12;
pub const DEFAULT_MAX_INPUT_CHARS: usize = 200;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Special,
    Subword,
    Word,
}

impl TokenKind {
    pub fn of(token: &str) -> Self {
        if is_special(token) {
            TokenKind::Special
        } else if token.starts_with(CONTINUATION_PREFIX) {
            TokenKind::Subword
        } else {
            TokenKind::Word
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TokenKind::Special => "Special",
            TokenKind::Subword => "Subword",
            TokenKind::Word => "Word",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenStats {
    pub total: usize,
    pub content: usize,
    pub special: usize,
    pub padding: usize,
}

/// A fixed-length token sequence. The first token is always `[CLS]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSequence {
    tokens: Vec<String>,
    untruncated_len: usize,
}

impl TokenSequence {
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&str> {
        self.tokens.get(position).map(String::as_str)
    }

    pub fn kinds(&self) -> Vec<TokenKind> {
        self.tokens.iter().map(|t| TokenKind::of(t)).collect()
    }

    /// Whether the fixed length cut off content or the trailing `[SEP]`.
    pub fn is_truncated(&self) -> bool {
        self.untruncated_len > self.tokens.len()
    }

    pub fn stats(&self) -> TokenStats {
        let padding = self.tokens.iter().filter(|t| t.as_str() == PAD_TOKEN).count();
        let special = self.tokens.iter().filter(|t| is_special(t)).count();
        TokenStats {
            total: self.tokens.len(),
            content: self.tokens.len() - special,
            special,
            padding,
        }
    }
}

/// Bounds `text` to at most `max_chars` characters.
pub fn bound_input(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[derive(Debug, Clone, Copy)]
pub struct SequenceAssembler {
    pub max_seq_len: usize,
    pub max_input_chars: usize,
}

impl SequenceAssembler {
    pub fn new(max_seq_len: usize, max_input_chars: usize) -> Self {
        Self { max_seq_len, max_input_chars }
    }

    /// Builds `[CLS]`, the content tokens, `[SEP]`, then pads with `[PAD]`
    /// and truncates to exactly `max_seq_len`.
    ///
    /// Truncation is applied after `[SEP]` is appended, so long input loses
    /// its `[SEP]`. That is reported through [`TokenSequence::is_truncated`]
    /// but not corrected.
    pub fn assemble(&self, text: &str, tokenizer: &WordPieceTokenizer) -> TokenSequence {
        let bounded = bound_input(text, self.max_input_chars);

        let mut tokens = Vec::with_capacity(self.max_seq_len.max(2));
        tokens.push(CLS_TOKEN.to_string());
        tokens.extend(tokenizer.tokenize(&bounded));
        tokens.push(SEP_TOKEN.to_string());

        let untruncated_len = tokens.len();
        while tokens.len() < self.max_seq_len {
            tokens.push(PAD_TOKEN.to_string());
        }
        tokens.truncate(self.max_seq_len);

        if untruncated_len > self.max_seq_len {
            warn!(
                "Sequence of {} tokens truncated to {}; {} is dropped",
                untruncated_len, self.max_seq_len, SEP_TOKEN
            );
        }

        TokenSequence { tokens, untruncated_len }
    }
}

impl Default for SequenceAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SEQ_LEN, DEFAULT_MAX_INPUT_CHARS)
    }
}

/// Maps tokens to IDs, handing out deterministic placeholder IDs above the
/// vocabulary's range for tokens it has never seen.
#[derive(Debug, Clone, Copy)]
pub struct IdResolver<'a> {
    vocab: &'a Vocabulary,
    placeholder_base: u32,
}

impl<'a> IdResolver<'a> {
    pub fn new(vocab: &'a Vocabulary) -> Self {
        let placeholder_base = (vocab.max_id() + 1).max(REFERENCE_VOCAB_SIZE);
        Self { vocab, placeholder_base }
    }

    pub fn resolve(&self, token: &str) -> u32 {
        if let Some(id) = self.vocab.lookup(token) {
            return id;
        }
        if let Some(id) = self.vocab.lookup(&token.to_lowercase()) {
            return id;
        }
        self.placeholder_id(token)
    }

    pub fn resolve_all(&self, sequence: &TokenSequence) -> Vec<u32> {
        sequence.tokens().iter().map(|t| self.resolve(t)).collect()
    }

    pub fn is_placeholder(&self, id: u32) -> bool {
        id >= self.placeholder_base
    }

    fn placeholder_id(&self, token: &str) -> u32 {
        let stem = token.strip_prefix(CONTINUATION_PREFIX).unwrap_or(token);
        let code_sum = stem.chars().fold(0u32, |acc, c| acc.wrapping_add(c as u32));
        // Vocabulary IDs stop at MAX_TOKEN_ID, so this cannot overflow.
        self.placeholder_base + code_sum % PLACEHOLDER_SPREAD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::UNK_TOKEN;

    fn assemble(text: &str) -> TokenSequence {
        SequenceAssembler::default().assemble(text, &WordPieceTokenizer::default())
    }

    #[test]
    fn test_reference_sentence() {
        let seq = assemble("The cat sat on the mat");
        assert_eq!(
            seq.tokens(),
            &[
                "[CLS]", "The", "cat", "sat", "on", "the", "mat", "[SEP]", "[PAD]", "[PAD]", "[PAD]", "[PAD]"
            ]
        );
        assert!(!seq.is_truncated());
    }

    #[test]
    fn test_reference_sentence_ids() {
        let tokenizer = WordPieceTokenizer::default();
        let seq = SequenceAssembler::default().assemble("The cat sat on the mat", &tokenizer);
        let ids = IdResolver::new(tokenizer.vocab()).resolve_all(&seq);
        assert_eq!(ids, vec![101, 1996, 4937, 2938, 2006, 1996, 13523, 102, 0, 0, 0, 0]);
    }

    #[test]
    fn test_empty_input() {
        let seq = assemble("");
        assert_eq!(seq.len(), DEFAULT_MAX_SEQ_LEN);
        assert_eq!(seq.get(0), Some(CLS_TOKEN));
        assert_eq!(seq.get(1), Some(SEP_TOKEN));
        assert!(seq.tokens()[2..].iter().all(|t| t == PAD_TOKEN));
        assert_eq!(seq.tokens()[2..].len(), 10);
    }

    #[test]
    fn test_long_input_truncates_and_drops_sep() {
        let seq = assemble("the quick brown fox jumps over the lazy dog and the cat sat on the mat");
        assert_eq!(seq.len(), DEFAULT_MAX_SEQ_LEN);
        assert_eq!(seq.get(0), Some(CLS_TOKEN));
        assert!(seq.is_truncated());
        assert!(!seq.tokens().iter().any(|t| t == SEP_TOKEN));
        assert_eq!(seq.get(10), Some("and"));
        assert_eq!(seq.get(11), Some("the"));
    }

    #[test]
    fn test_exact_fit_keeps_sep() {
        // 10 content tokens + [CLS] + [SEP] == 12
        let seq = assemble("a b c d e f g h i j");
        assert!(!seq.is_truncated());
        assert_eq!(seq.get(11), Some(SEP_TOKEN));
    }

    #[test]
    fn test_input_is_bounded_by_chars() {
        let assembler = SequenceAssembler::new(DEFAULT_MAX_SEQ_LEN, 7);
        let seq = assembler.assemble("the cat sat", &WordPieceTokenizer::default());
        // "the cat" survives the bound, "sat" does not.
        assert_eq!(&seq.tokens()[..4], &["[CLS]", "the", "cat", "[SEP]"]);
    }

    #[test]
    fn test_bound_input_respects_char_boundaries() {
        assert_eq!(bound_input("héllo", 2), "hé");
        assert_eq!(bound_input("abc", 10), "abc");
    }

    #[test]
    fn test_tiny_max_len() {
        let seq = SequenceAssembler::new(1, DEFAULT_MAX_INPUT_CHARS).assemble("cat", &WordPieceTokenizer::default());
        assert_eq!(seq.tokens(), &[CLS_TOKEN]);
        assert!(seq.is_truncated());
    }

    #[test]
    fn test_kinds_and_stats() {
        let seq = assemble("Transformers rock");
        let kinds = seq.kinds();
        assert_eq!(kinds[0], TokenKind::Special);
        assert_eq!(kinds[1], TokenKind::Word); // transform
        assert_eq!(kinds[2], TokenKind::Subword); // ##ers

        let stats = assemble("The cat sat on the mat").stats();
        assert_eq!(
            stats,
            TokenStats { total: 12, content: 6, special: 6, padding: 4 }
        );
    }

    #[test]
    fn test_resolver_uses_lowercase_fallback() {
        let vocab = Vocabulary::builtin();
        let resolver = IdResolver::new(&vocab);
        assert_eq!(resolver.resolve("The"), 1996);
        assert_eq!(resolver.resolve("the"), 1996);
        assert_eq!(resolver.resolve(UNK_TOKEN), 100);
    }

    #[test]
    fn test_placeholder_ids_are_out_of_range_and_stable() {
        let vocab = Vocabulary::builtin();
        let resolver = IdResolver::new(&vocab);
        let id = resolver.resolve("##5");
        assert!(id >= REFERENCE_VOCAB_SIZE);
        assert!(id > vocab.max_id());
        assert!(resolver.is_placeholder(id));
        assert_eq!(id, resolver.resolve("##5"));
        assert!(!resolver.is_placeholder(4937));
    }

    #[test]
    fn test_placeholders_stay_above_a_vocabulary_at_the_id_ceiling() {
        use crate::vocab::{MASK_TOKEN, MAX_TOKEN_ID};
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"[PAD]": 0, "[UNK]": 1, "[CLS]": 2, "[SEP]": 3, "[MASK]": {}}}"#,
            MAX_TOKEN_ID
        )
        .unwrap();
        let vocab = Vocabulary::load(file.path()).unwrap();
        let resolver = IdResolver::new(&vocab);

        for token in ["zzz", "##q", "\u{10FFFF}\u{10FFFF}"] {
            let id = resolver.resolve(token);
            assert!(id > MAX_TOKEN_ID, "{} got {}", token, id);
            assert_ne!(Some(id), vocab.lookup(MASK_TOKEN));
            assert!(resolver.is_placeholder(id));
        }
    }
}
