pub mod analyzer;
pub mod char_filter;
pub mod token_filter;
pub mod tokenizer;
mod error;

pub use analyzer::Analyzer;
pub use char_filter::{BasicCharFilter, CharFilter, HtmlCharFilter};
pub use error::Error;
pub use error::Result;
pub use token_filter::{BasicTokenFilter, StopWordTokenFilter, TokenFilter};
pub use tokenizer::{Tokenizer, WhitespaceTokenizer, WordTokenizer};
