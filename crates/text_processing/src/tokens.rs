//! Shared text normalization
//!
//! Classification and entity matching both work on the same token stream:
//! lower-cased text split on Unicode word boundaries, which keeps Devanagari
//! words (with their vowel signs and nukta) intact.

use std::collections::BTreeSet;

use unicode_segmentation::UnicodeSegmentation;

/// Lower-case `text` and split it into words
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase().unicode_words().map(str::to_string).collect()
}

/// Tokens of `text` as an ordered set
pub fn token_set(text: &str) -> BTreeSet<String> {
    tokenize(text).into_iter().collect()
}
