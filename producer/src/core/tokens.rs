//! Word-based token estimation

use crate::traits::TokenCounter;

/// Estimates tokens as `ceil(words * tokens_per_word)`
#[derive(Debug, Clone, Copy)]
pub struct WordTokenCounter {
    tokens_per_word: f32,
}

impl WordTokenCounter {
    pub fn new() -> Self {
        // English averages ~1.3 tokens per word
        Self::with_ratio(1.3)
    }

    pub fn with_ratio(tokens_per_word: f32) -> Self {
        Self {
            tokens_per_word: tokens_per_word.max(0.0),
        }
    }
}

impl Default for WordTokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCounter for WordTokenCounter {
    fn count(&self, text: &str) -> u64 {
        let words = text.split_whitespace().count() as f64;
        (words * self.tokens_per_word as f64).ceil() as u64
    }
}
