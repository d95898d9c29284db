use crate::analyzer::error::{Error, Result};
use lazy_static::lazy_static;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::io::{BufRead, BufReader, Read};

pub trait TokenFilter {
    fn filter<'a>(&self, token: &'a str) -> Option<Cow<'a, str>>;
}

const PUNCTUATION: &[char] = &[';', '!', '?', ':', ',', '.'];

lazy_static! {
    static ref ACCENT_FOLD: HashMap<char, char> = {
        let from = "áéíóúâêôçãẽõü";
        let to = "aeiouaeocaeou";
        from.chars().zip(to.chars()).collect()
    };
}

fn normalize(token: &str, fold_accents: bool) -> String {
    token
        .chars()
        .filter(|c| !PUNCTUATION.contains(c))
        .flat_map(char::to_lowercase)
        .map(|c| {
            if fold_accents {
                *ACCENT_FOLD.get(&c).unwrap_or(&c)
            } else {
                c
            }
        })
        .collect()
}

fn emit<'a>(token: &'a str, normalized: String) -> Option<Cow<'a, str>> {
    if normalized.is_empty() {
        None
    } else if normalized == token {
        Some(Cow::Borrowed(token))
    } else {
        Some(Cow::Owned(normalized))
    }
}

#[derive(Debug)]
pub struct BasicTokenFilter {}

impl BasicTokenFilter {
    pub fn new() -> Self {
        BasicTokenFilter {}
    }
}

impl TokenFilter for BasicTokenFilter {
    fn filter<'a>(&self, token: &'a str) -> Option<Cow<'a, str>> {
        emit(token, normalize(token, false))
    }
}

/// Rejects stop words before normalization, so the stop list is
/// matched against tokens exactly as the tokenizer produced them.
#[derive(Debug)]
pub struct StopWordTokenFilter {
    stop_words: HashSet<String>,
    fold_accents: bool,
}

impl StopWordTokenFilter {
    /// Reads a stop list of comma-separated words, one or more per line.
    pub fn new(reader: impl Read, fold_accents: bool) -> Result<Self> {
        let mut stop_words = HashSet::new();

        for (line_no, line) in BufReader::new(reader).lines().enumerate() {
            let line = line.map_err(|cause| Error::StopWordFile {
                line: line_no + 1,
                cause,
            })?;

            for word in line.split(',') {
                let word = word.trim();
                if !word.is_empty() {
                    stop_words.insert(word.to_string());
                }
            }
        }

        Ok(StopWordTokenFilter {
            stop_words,
            fold_accents,
        })
    }
}

impl TokenFilter for StopWordTokenFilter {
    fn filter<'a>(&self, token: &'a str) -> Option<Cow<'a, str>> {
        if self.stop_words.contains(token) {
            return None;
        }

        emit(token, normalize(token, self.fold_accents))
    }
}
