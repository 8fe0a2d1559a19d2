use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static WORD_PATTERN: OnceLock<Regex> = OnceLock::new();

fn word_pattern() -> &'static Regex {
    // Tokens of two or more word characters, as bag-of-words tooling does by default.
    WORD_PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").unwrap())
}

/// How tag strings are split into terms. The same tokenizer must be used
/// for building the vocabulary and for vectorizing every movie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tokenizer {
    /// Split on whitespace, leave tokens untouched.
    #[default]
    Whitespace,
    /// Lowercase, then extract runs of at least two word characters.
    Word,
}

impl Tokenizer {
    pub fn for_each_token<F>(&self, text: &str, mut f: F)
    where
        F: FnMut(&str),
    {
        match self {
            Tokenizer::Whitespace => text.split_whitespace().for_each(f),
            Tokenizer::Word => {
                let lower = text.to_lowercase();
                for m in word_pattern().find_iter(&lower) {
                    f(m.as_str());
                }
            }
        }
    }

    #[cfg(test)]
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        self.for_each_token(text, |t| tokens.push(t.to_string()));
        tokens
    }
}
