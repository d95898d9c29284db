use crate::store::error::{Error, Result};
use crate::store::posting::Posting;
use crate::store::term::Vocabulary;
use std::collections::{HashMap, HashSet};

/// An inverted index over `(term, doc_id, term_freq)` occurrences.
///
/// Ingestion (`add`) is only valid before `finalize`; reads are only
/// valid after. `HashIndex` keeps everything in memory, `FileIndex`
/// spills to disk and merges externally.
pub trait Index {
    fn add(&mut self, term: &str, doc_id: u32, term_freq: u32) -> Result<()>;

    /// Seals the index. A second call is an error, never a reset.
    fn finalize(&mut self) -> Result<()>;

    fn term_id(&self, term: &str) -> Option<u32>;

    /// Postings of one term in ascending doc id order. Unknown terms
    /// yield an empty sequence.
    fn occurrences<'a>(&'a self, term: &str) -> Result<Box<dyn Iterator<Item = Posting> + 'a>>;

    fn document_count_with_term(&self, term: &str) -> u32;

    /// Number of distinct doc ids seen by `add`, including documents
    /// whose terms were all filtered out elsewhere.
    fn document_count(&self) -> u32;

    fn vocabulary(&self) -> Vec<&str>;
}

/// Hash-of-lists index, fully in memory. The reference realization
/// used by tests and by corpora small enough to skip the file path.
#[derive(Debug, Default)]
pub struct HashIndex {
    vocab: Vocabulary,
    postings: HashMap<String, Vec<Posting>>,
    documents: HashSet<u32>,
    sealed: bool,
}

impl HashIndex {
    pub fn new() -> Self {
        HashIndex {
            vocab: Vocabulary::new(),
            postings: HashMap::new(),
            documents: HashSet::new(),
            sealed: false,
        }
    }

    /// Counts a document that contributed no postings (for example,
    /// one whose terms were all stop words) toward `document_count`.
    pub fn register_document(&mut self, doc_id: u32) -> Result<()> {
        if self.sealed {
            return Err(Error::InvalidState);
        }

        self.documents.insert(doc_id);
        Ok(())
    }
}

impl Index for HashIndex {
    fn add(&mut self, term: &str, doc_id: u32, term_freq: u32) -> Result<()> {
        if self.sealed {
            return Err(Error::InvalidState);
        }

        let term_id = self.vocab.intern(term)?;
        self.documents.insert(doc_id);
        self.postings
            .entry(term.to_string())
            .or_insert_with(Vec::new)
            .push(Posting::new(term_id, doc_id, term_freq));

        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        if self.sealed {
            return Err(Error::InvalidState);
        }

        for (term, list) in self.postings.iter_mut() {
            list.sort();
            list.dedup_by(|dup, kept| {
                if dup.key() == kept.key() {
                    kept.term_freq = kept.term_freq.saturating_add(dup.term_freq);
                    true
                } else {
                    false
                }
            });

            if let Some(entry) = self.vocab.get_mut(term) {
                entry.set_doc_count(list.len() as u32);
            }
        }

        self.sealed = true;
        Ok(())
    }

    fn term_id(&self, term: &str) -> Option<u32> {
        self.vocab.get(term).map(|entry| entry.term_id())
    }

    fn occurrences<'a>(&'a self, term: &str) -> Result<Box<dyn Iterator<Item = Posting> + 'a>> {
        if !self.sealed {
            return Err(Error::InvalidState);
        }

        match self.postings.get(term) {
            None => Ok(Box::new(std::iter::empty())),
            Some(list) => Ok(Box::new(list.iter().copied())),
        }
    }

    fn document_count_with_term(&self, term: &str) -> u32 {
        self.vocab.get(term).map_or(0, |entry| entry.doc_count())
    }

    fn document_count(&self) -> u32 {
        self.documents.len() as u32
    }

    fn vocabulary(&self) -> Vec<&str> {
        self.vocab.terms().collect()
    }
}
