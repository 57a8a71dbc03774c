//! # WordPiece Tokenizer
//!
//! Greedy longest-match-first subword splitting over a fixed [`Vocabulary`].

use crate::vocab::{is_special, Vocabulary, CONTINUATION_PREFIX, UNK_TOKEN};
use log::debug;

/// BERT's WordPiece gives up on words longer than this.
pub const DEFAULT_MAX_CHARS_PER_WORD: usize = 100;

/// Greedy longest-match-first subword tokenizer over a fixed [`Vocabulary`].
#[derive(Debug, Clone)]
pub struct WordPieceTokenizer {
    vocab: Vocabulary,
    max_chars_per_word: usize,
}

impl WordPieceTokenizer {
    pub fn new(vocab: Vocabulary) -> Self {
        Self { vocab, max_chars_per_word: DEFAULT_MAX_CHARS_PER_WORD }
    }

    pub fn with_max_chars_per_word(mut self, max_chars_per_word: usize) -> Self {
        self.max_chars_per_word = max_chars_per_word;
        self
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Splits `text` on whitespace and tokenizes every word in order.
    /// No special tokens are added here.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace()
            .flat_map(|word| self.tokenize_word(word))
            .collect()
    }

    /// Tokenizes a single word.
    ///
    /// A whole-word hit keeps the caller's casing (`The` stays `The`); every
    /// subword is emitted lower-cased. If some position of the word cannot be
    /// matched at all, the whole word collapses to a single `[UNK]`.
    pub fn tokenize_word(&self, word: &str) -> Vec<String> {
        if word.is_empty() {
            return vec![UNK_TOKEN.to_string()];
        }
        // Literal special tokens typed by the user, e.g. `[MASK]`.
        if is_special(word) && self.vocab.contains(word) {
            return vec![word.to_string()];
        }

        let lowered = word.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();
        if chars.len() > self.max_chars_per_word {
            debug!("Word of {} chars exceeds limit {}, emitting {}", chars.len(), self.max_chars_per_word, UNK_TOKEN);
            return vec![UNK_TOKEN.to_string()];
        }

        if self.vocab.contains(&lowered) {
            return vec![word.to_string()];
        }

        let mut pieces = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            match self.longest_match(&chars, start) {
                Some((piece, end)) => {
                    pieces.push(piece);
                    start = end;
                }
                None => {
                    debug!("No subword of '{}' matches at char {}, emitting {}", word, start, UNK_TOKEN);
                    return vec![UNK_TOKEN.to_string()];
                }
            }
        }

        if pieces.is_empty() {
            pieces.push(UNK_TOKEN.to_string());
        }
        debug!("Tokenized '{}' into {:?}", word, pieces);
        pieces
    }

    // Longest candidate starting at `start`, trying the full remainder first.
    fn longest_match(&self, chars: &[char], start: usize) -> Option<(String, usize)> {
        let mut end = chars.len();
        while end > start {
            let substr: String = chars[start..end].iter().collect();
            let candidate = if start == 0 {
                substr.clone()
            } else {
                format!("{}{}", CONTINUATION_PREFIX, substr)
            };

            if self.vocab.contains(&candidate) {
                return Some((candidate, end));
            }
            // A standalone single character is an acceptable last resort.
            if end - start == 1 && self.vocab.contains(&substr) {
                return Some((candidate, end));
            }
            end -= 1;
        }
        None
    }
}

impl Default for WordPieceTokenizer {
    fn default() -> Self {
        Self::new(Vocabulary::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> WordPieceTokenizer {
        WordPieceTokenizer::default()
    }

    #[test]
    fn test_whole_word_in_vocab() {
        let tk = tokenizer();
        assert_eq!(tk.tokenize_word("cat"), vec!["cat"]);
        assert_eq!(tk.vocab().lookup("cat"), Some(4937));
    }

    #[test]
    fn test_whole_word_keeps_original_casing() {
        let tk = tokenizer();
        assert_eq!(tk.tokenize_word("The"), vec!["The"]);
        assert_eq!(tk.tokenize_word("CAT"), vec!["CAT"]);
    }

    #[test]
    fn test_subwords_are_lowercased() {
        let tk = tokenizer();
        assert_eq!(tk.tokenize_word("Transformers"), vec!["transform", "##ers"]);
        assert_eq!(tk.tokenize_word("Tokenization"), vec!["token", "##ization"]);
    }

    #[test]
    fn test_greedy_longest_match() {
        let tk = tokenizer();
        assert_eq!(tk.tokenize_word("unbelievable"), vec!["un", "##believ", "##able"]);
        assert_eq!(tk.tokenize_word("embeddings"), vec!["em", "##bed", "##ding", "##s"]);
        assert_eq!(tk.tokenize_word("revolutionizing"), vec!["revolution", "##izing"]);
    }

    #[test]
    fn test_single_character_fallback() {
        let tk = tokenizer();
        // "##5" is not in the vocabulary but "5" is.
        assert_eq!(tk.tokenize_word("cats5"), vec!["cat", "##s", "##5"]);
    }

    #[test]
    fn test_unmatchable_word_is_unknown() {
        let tk = tokenizer();
        assert_eq!(tk.tokenize_word("€€€"), vec![UNK_TOKEN]);
        assert_eq!(tk.tokenize_word("日本"), vec![UNK_TOKEN]);
    }

    #[test]
    fn test_partial_match_collapses_to_single_unknown() {
        let tk = tokenizer();
        assert_eq!(tk.tokenize_word("cat€"), vec![UNK_TOKEN]);
    }

    #[test]
    fn test_overlong_word_is_unknown() {
        let tk = tokenizer().with_max_chars_per_word(10);
        assert_eq!(tk.tokenize_word("abcdefghijk"), vec![UNK_TOKEN]);
        assert_eq!(tk.tokenize_word("abcdefghij").len(), 10);
    }

    #[test]
    fn test_literal_special_token_passes_through() {
        let tk = tokenizer();
        assert_eq!(tk.tokenize_word("[MASK]"), vec!["[MASK]"]);
    }

    #[test]
    fn test_tokenize_text() {
        let tk = tokenizer();
        assert_eq!(
            tk.tokenize("The cat sat on the mat"),
            vec!["The", "cat", "sat", "on", "the", "mat"]
        );
        assert_eq!(
            tk.tokenize("  Transformers   are\tgreat\n"),
            vec!["transform", "##ers", "are", "g", "##r", "##e", "##a", "##t"]
        );
        assert!(tk.tokenize("").is_empty());
        assert!(tk.tokenize("   ").is_empty());
    }
}
