use lazy_static::lazy_static;
use regex::Regex;
pub use rust_stemmers::Algorithm;
use rust_stemmers::Stemmer;
use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORDS: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
}

/// Splits raw text into normalized word stems: NFKC normalization,
/// lowercasing, then Snowball stemming. Every extracted word produces a
/// stem, so stem positions line up with token positions.
pub struct WordStemmer {
    stemmer: Stemmer,
}

impl WordStemmer {
    pub fn new(algorithm: Algorithm) -> Self {
        Self { stemmer: Stemmer::create(algorithm) }
    }

    pub fn english() -> Self {
        Self::new(Algorithm::English)
    }

    /// Returns the stems of every word in the text, in order.
    pub fn stems(&self, text: &str) -> Vec<String> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        WORDS
            .find_iter(&normalized)
            .map(|m| self.stemmer.stem(m.as_str()).to_string())
            .collect()
    }

    /// Returns the sorted set of unique stems in the text.
    pub fn unique_stems(&self, text: &str) -> BTreeSet<String> {
        self.stems(text).into_iter().collect()
    }
}

impl Default for WordStemmer {
    fn default() -> Self {
        Self::english()
    }
}
