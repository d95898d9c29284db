use lazy_static::lazy_static;
use regex::Regex;

pub trait Tokenizer {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

#[derive(Debug)]
pub struct WhitespaceTokenizer {}

impl WhitespaceTokenizer {
    pub fn new() -> Self {
        WhitespaceTokenizer {}
    }
}

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.split_whitespace().collect()
    }
}

lazy_static! {
    static ref WORD_PATTERN: Regex = Regex::new(r"[\p{Alphabetic}\p{N}]+").unwrap();
}

/// Extracts alphanumeric runs, dropping punctuation between them.
#[derive(Debug)]
pub struct WordTokenizer {}

impl WordTokenizer {
    pub fn new() -> Self {
        WordTokenizer {}
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        WORD_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_tokenizer_splits_on_blanks() {
        let tokenizer = WhitespaceTokenizer::new();
        assert_eq!(tokenizer.tokenize("a  b\tc\n"), vec!["a", "b", "c"]);
    }

    #[test]
    fn word_tokenizer_drops_punctuation() {
        let tokenizer = WordTokenizer::new();
        assert_eq!(
            tokenizer.tokenize("cat, dog; bird-house"),
            vec!["cat", "dog", "bird", "house"]
        );
    }

    #[test]
    fn word_tokenizer_keeps_accented_words() {
        let tokenizer = WordTokenizer::new();
        assert_eq!(tokenizer.tokenize("São Paulo"), vec!["São", "Paulo"]);
    }
}
