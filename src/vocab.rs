//! # Vocabulary Table
//!
//! A flat, read-only mapping from token string to integer ID. Whole words,
//! `##`-prefixed continuations, single characters and the bracketed special
//! tokens all live in the same map.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use thiserror::Error;

pub const PAD_TOKEN: &str = "[PAD]";
pub const UNK_TOKEN: &str = "[UNK]";
pub const CLS_TOKEN: &str = "[CLS]";
pub const SEP_TOKEN: &str = "[SEP]";
pub const MASK_TOKEN: &str = "[MASK]";

pub const SPECIAL_TOKENS: [&str; 5] = [PAD_TOKEN, UNK_TOKEN, CLS_TOKEN, SEP_TOKEN, MASK_TOKEN];

/// Marks a subword that continues the previous one inside the same word.
pub const CONTINUATION_PREFIX: &str = "##";

/// Size of the `bert-base-uncased` vocabulary the built-in IDs are borrowed from.
pub const REFERENCE_VOCAB_SIZE: u32 = 30522;

/// Width of the ID window reserved above the table for placeholder IDs.
pub const PLACEHOLDER_SPREAD: u32 = 1000;

/// Highest ID a loaded vocabulary may use; the placeholder window must fit above it.
pub const MAX_TOKEN_ID: u32 = u32::MAX - PLACEHOLDER_SPREAD;

// IDs follow bert-base-uncased where the word occurs in the reference sentence;
// the rest are only illustrative.
const BUILTIN_ENTRIES: &[(&str, u32)] = &[
    // special tokens
    ("[PAD]", 0), ("[UNK]", 100), ("[CLS]", 101), ("[SEP]", 102), ("[MASK]", 103),
    // punctuation
    ("!", 999), ("\"", 1000), ("#", 1001), ("$", 1002), ("%", 1003), ("&", 1004),
    ("'", 1005), ("(", 1006), (")", 1007), ("*", 1008), ("+", 1009), (",", 1010),
    ("-", 1011), (".", 1012), ("/", 1013), (":", 1024), (";", 1025), ("<", 1026),
    ("=", 1027), (">", 1028), ("?", 1029), ("@", 1030), ("[", 1031), ("\\", 1032),
    ("]", 1033), ("^", 1034), ("_", 1035), ("`", 1036),
    // digits
    ("0", 1014), ("1", 1015), ("2", 1016), ("3", 1017), ("4", 1018),
    ("5", 1019), ("6", 1020), ("7", 1021), ("8", 1022), ("9", 1023),
    // single letters
    ("a", 1037), ("b", 1038), ("c", 1039), ("d", 1040), ("e", 1041), ("f", 1042),
    ("g", 1043), ("h", 1044), ("i", 1045), ("j", 1046), ("k", 1047), ("l", 1048),
    ("m", 1049), ("n", 1050), ("o", 1051), ("p", 1052), ("q", 1053), ("r", 1054),
    ("s", 1055), ("t", 1056), ("u", 1057), ("v", 1058), ("w", 1059), ("x", 1060),
    ("y", 1061), ("z", 1062),
    // single-letter continuations
    ("##s", 2015), ("##a", 2050), ("##e", 2063), ("##i", 2072), ("##n", 2078),
    ("##o", 2080), ("##d", 2094), ("##r", 2099), ("##y", 2100), ("##t", 2102),
    ("##l", 2140), ("##m", 2213), ("##u", 2226), ("##h", 2232), ("##k", 2243),
    ("##c", 2278), ("##g", 2290), ("##p", 2361), ("##z", 2480), ("##b", 2497),
    ("##f", 2546), ("##x", 2595), ("##v", 2615), ("##w", 2860), ("##j", 3501),
    ("##q", 4160),
    // common words
    ("the", 1996), ("of", 1997), ("and", 1998), ("in", 1999), ("to", 2000),
    ("was", 2001), ("he", 2002), ("is", 2003), ("as", 2004), ("for", 2005),
    ("on", 2006), ("with", 2007), ("that", 2008), ("it", 2009), ("his", 2010),
    ("by", 2011), ("at", 2012), ("from", 2013), ("her", 2014), ("she", 2016),
    ("you", 2017), ("had", 2018), ("an", 2019), ("were", 2020), ("but", 2021),
    ("be", 2022), ("this", 2023), ("are", 2024), ("not", 2025), ("my", 2026),
    ("they", 2027), ("one", 2028), ("which", 2029), ("or", 2030), ("have", 2031),
    ("him", 2032), ("me", 2033), ("first", 2034), ("all", 2035), ("also", 2036),
    ("their", 2037), ("has", 2038), ("up", 2039), ("who", 2040), ("out", 2041),
    ("been", 2042), ("when", 2043), ("after", 2044), ("there", 2045), ("into", 2046),
    ("new", 2047), ("two", 2048), ("its", 2049), ("time", 2051), ("we", 2057),
    ("over", 2058), ("like", 2066),
    // example vocabulary
    ("cat", 4937), ("sat", 2938), ("mat", 13523), ("dog", 3899), ("quick", 4248),
    ("brown", 2829), ("fox", 4419), ("jumps", 14523), ("lazy", 13971),
    ("hello", 7592), ("world", 2088), ("attention", 3086), ("need", 2342),
    ("learning", 4083), ("machine", 3698), ("deep", 2784), ("model", 2944),
    ("language", 2653), ("natural", 3019), ("processing", 6364), ("neural", 15756),
    ("network", 2897), ("token", 19204), ("transform", 10938), ("revolution", 4329),
    ("un", 4895), ("word", 2773), ("words", 2616), ("split", 3975), ("text", 3793),
    ("sentence", 6251), ("position", 2597), ("encoding", 17181), ("input", 7953),
    ("output", 6434), ("layer", 6741), ("vector", 9207), ("query", 23032),
    ("key", 3145), ("value", 3643), ("bank", 2924), ("river", 2314), ("money", 2769),
    ("flies", 10029), ("arrow", 8612), ("fruit", 5909), ("banana", 15212),
    ("love", 2293), ("read", 3191), ("book", 2338), ("sun", 3103), ("rises", 9466),
    ("east", 2264), ("em", 7861),
    // subword continuations
    ("##er", 2121), ("##ers", 2545), ("##ing", 2075), ("##ed", 2098), ("##ly", 2135),
    ("##ization", 3989), ("##izing", 6026), ("##ize", 4697), ("##able", 3085),
    ("##believ", 28024), ("##ation", 3370), ("##al", 2389), ("##ness", 2791),
    ("##ment", 3672), ("##ful", 3993), ("##less", 3238), ("##ous", 3560),
    ("##ive", 3512), ("##ity", 3012), ("##tion", 3508), ("##bed", 8270),
    ("##ding", 4667),
];

#[derive(Debug, Error)]
pub enum VocabError {
    #[error("failed to read vocabulary file: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse vocabulary JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("vocabulary is missing special token {0}")]
    MissingSpecialToken(String),
    #[error("token {token:?} has id {id}, above the maximum of {max}")]
    IdOutOfRange { token: String, id: u32, max: u32 },
}

/// Token string to ID table. Immutable once built.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    entries: HashMap<String, u32>,
    max_id: u32,
}

impl Vocabulary {
    /// The built-in teaching vocabulary.
    pub fn builtin() -> Self {
        let entries = BUILTIN_ENTRIES
            .iter()
            .map(|&(token, id)| (token.to_string(), id))
            .collect();
        Self::from_entries(entries)
    }

    fn from_entries(entries: HashMap<String, u32>) -> Self {
        let max_id = entries.values().copied().max().unwrap_or(0);
        Self { entries, max_id }
    }

    /// Loads a `{ "token": id }` JSON object. All five special tokens must be
    /// present and no ID may exceed [`MAX_TOKEN_ID`].
    pub fn load(path: &Path) -> Result<Self, VocabError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let entries: HashMap<String, u32> = serde_json::from_reader(reader)?;

        for special in SPECIAL_TOKENS {
            if !entries.contains_key(special) {
                return Err(VocabError::MissingSpecialToken(special.to_string()));
            }
        }
        if let Some((token, id)) = entries.iter().find(|(_, id)| **id > MAX_TOKEN_ID) {
            return Err(VocabError::IdOutOfRange { token: token.clone(), id: *id, max: MAX_TOKEN_ID });
        }
        log::debug!("Loaded {} vocabulary entries from {:?}", entries.len(), path);
        Ok(Self::from_entries(entries))
    }

    /// Case-sensitive exact match.
    pub fn lookup(&self, token: &str) -> Option<u32> {
        self.entries.get(token).copied()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest ID in the table.
    pub fn max_id(&self) -> u32 {
        self.max_id
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Bracketed markers such as `[CLS]` or `[PAD]`.
pub fn is_special(token: &str) -> bool {
    token.len() > 2 && token.starts_with('[') && token.ends_with(']')
}
