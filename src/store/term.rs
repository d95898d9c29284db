use crate::store::error::{Error, Result};
use std::collections::HashMap;

/// Per-term slot in the vocabulary. The posting offset and document
/// count stay unset until the index is finalized.
#[derive(Debug, Clone)]
pub struct TermEntry {
    term_id: u32,
    posting_start: Option<u64>,
    doc_count: u32,
}

impl TermEntry {
    pub(crate) fn new(term_id: u32) -> Self {
        TermEntry {
            term_id,
            posting_start: None,
            doc_count: 0,
        }
    }

    pub(crate) fn restore(term_id: u32, posting_start: u64, doc_count: u32) -> Self {
        TermEntry {
            term_id,
            posting_start: Some(posting_start),
            doc_count,
        }
    }

    #[inline(always)]
    pub fn term_id(&self) -> u32 {
        self.term_id
    }

    #[inline(always)]
    pub fn posting_start(&self) -> Option<u64> {
        self.posting_start
    }

    #[inline(always)]
    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    pub(crate) fn set_posting_start(&mut self, offset: u64) {
        self.posting_start = Some(offset);
    }

    pub(crate) fn bump_doc_count(&mut self) {
        self.doc_count += 1;
    }

    pub(crate) fn set_doc_count(&mut self, doc_count: u32) {
        self.doc_count = doc_count;
    }
}

/// Bijection between term strings and dense term ids, plus the
/// per-term file metadata. Ids are handed out in first-sighting
/// order, so they are gap-free in `0..len`.
#[derive(Debug, Default)]
pub struct Vocabulary {
    terms: HashMap<String, TermEntry>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Vocabulary {
            terms: HashMap::new(),
        }
    }

    /// Existing id for a known term, or the next free id.
    pub fn intern(&mut self, term: &str) -> Result<u32> {
        if let Some(entry) = self.terms.get(term) {
            return Ok(entry.term_id());
        }

        if self.terms.len() > u32::MAX as usize {
            return Err(Error::VocabularyFull);
        }

        let term_id = self.terms.len() as u32;
        self.terms.insert(term.to_string(), TermEntry::new(term_id));

        Ok(term_id)
    }

    pub fn get(&self, term: &str) -> Option<&TermEntry> {
        self.terms.get(term)
    }

    pub(crate) fn get_mut(&mut self, term: &str) -> Option<&mut TermEntry> {
        self.terms.get_mut(term)
    }

    pub(crate) fn insert_restored(&mut self, term: String, entry: TermEntry) {
        self.terms.insert(term, entry);
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TermEntry)> {
        self.terms.iter().map(|(term, entry)| (term.as_str(), entry))
    }

    /// Owned `term_id -> term` table for the finalize scan.
    pub(crate) fn reverse_map(&self) -> Vec<String> {
        let mut by_id = vec![String::new(); self.terms.len()];

        for (term, entry) in self.terms.iter() {
            by_id[entry.term_id() as usize] = term.clone();
        }

        by_id
    }
}
