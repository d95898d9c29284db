use crate::query::error::Result;
use std::collections::HashSet;
use std::io::{BufRead, BufReader, Read};

/// Reads a relevance judgment: a single line of comma-separated doc
/// ids.
pub fn read_relevant_docs(reader: impl Read) -> Result<HashSet<u32>> {
    let mut line = String::new();
    BufReader::new(reader).read_line(&mut line)?;

    let mut docs = HashSet::new();
    for field in line.trim().split(',') {
        let field = field.trim();
        if field.is_empty() {
            continue;
        }
        docs.insert(field.parse::<u32>()?);
    }

    Ok(docs)
}

/// Relevant answers among the first `n`, with `n` capped at the
/// answer length.
pub fn count_topn_relevant(n: usize, answers: &[u32], relevant: &HashSet<u32>) -> usize {
    answers
        .iter()
        .take(n)
        .filter(|doc_id| relevant.contains(doc_id))
        .count()
}

/// Counting rule of the evaluation harness: precision divides by the
/// full answer length, recall by the judgment size. An empty answer
/// list or judgment set yields zero rather than a division by zero.
pub fn precision_recall(n: usize, answers: &[u32], relevant: &HashSet<u32>) -> (f64, f64) {
    let hits = count_topn_relevant(n, answers, relevant);

    let precision = if answers.is_empty() {
        0f64
    } else {
        hits as f64 / answers.len() as f64
    };
    let recall = if relevant.is_empty() {
        0f64
    } else {
        hits as f64 / relevant.len() as f64
    };

    (precision, recall)
}
