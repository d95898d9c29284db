use crate::analyzer::char_filter::CharFilter;
use crate::analyzer::error::Result;
use crate::analyzer::token_filter::TokenFilter;
use crate::analyzer::tokenizer::Tokenizer;
use std::collections::HashMap;

/// Pipeline from raw text to index terms. The index builder and the
/// query side must run the same analyzer configuration, otherwise
/// queries silently miss.
#[derive(Debug)]
pub struct Analyzer<C: CharFilter, T: TokenFilter, I: Tokenizer> {
    char_filter: C,
    token_filter: T,
    tokenizer: I,
}

impl<C, T, I> Analyzer<C, T, I>
where
    C: CharFilter,
    T: TokenFilter,
    I: Tokenizer,
{
    pub fn new(char_filter: C, token_filter: T, tokenizer: I) -> Self {
        Analyzer {
            char_filter,
            token_filter,
            tokenizer,
        }
    }

    pub fn analyze(&self, text: &str) -> Result<Vec<String>> {
        let text = self.char_filter.filter(text);
        let mut tokens = Vec::new();

        for token in self.tokenizer.tokenize(&text) {
            match self.token_filter.filter(token) {
                None => (),
                Some(t) => tokens.push(t.into_owned()),
            }
        }

        Ok(tokens)
    }

    /// Term frequencies of one document or query.
    pub fn term_bag(&self, text: &str) -> Result<HashMap<String, u32>> {
        let mut bag = HashMap::new();

        for term in self.analyze(text)? {
            *bag.entry(term).or_insert(0u32) += 1;
        }

        Ok(bag)
    }
}
