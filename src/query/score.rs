use crate::query::error::Result;
use crate::store::Index;
use std::collections::HashMap;

/// `freq` must be at least 1.
#[inline(always)]
pub fn calc_tf(freq: u32) -> f64 {
    1f64 + (freq as f64).log2()
}

/// Zero when every document carries the term.
#[inline(always)]
pub fn calc_idf(doc_count: u32, docs_with_term: u32) -> f64 {
    (doc_count as f64 / docs_with_term as f64).log2()
}

#[inline(always)]
pub fn tf_idf(doc_count: u32, freq: u32, docs_with_term: u32) -> f64 {
    calc_tf(freq) * calc_idf(doc_count, docs_with_term)
}

/// Euclidean norm of every document's tf-idf vector, computed once
/// per sealed index. Must be rebuilt whenever the index is rebuilt.
#[derive(Debug)]
pub struct PrecomputedNorms {
    doc_count: u32,
    norms: HashMap<u32, f64>,
}

impl PrecomputedNorms {
    pub fn compute<I: Index + ?Sized>(index: &I) -> Result<Self> {
        let doc_count = index.document_count();
        let mut squared: HashMap<u32, f64> = HashMap::new();

        for term in index.vocabulary() {
            let docs_with_term = index.document_count_with_term(term);
            if docs_with_term == 0 {
                continue;
            }

            for posting in index.occurrences(term)? {
                let weight = tf_idf(doc_count, posting.term_freq, docs_with_term);
                *squared.entry(posting.doc_id).or_insert(0f64) += weight * weight;
            }
        }

        let norms = squared
            .into_iter()
            .map(|(doc_id, sum)| (doc_id, sum.sqrt()))
            .collect();

        Ok(PrecomputedNorms { doc_count, norms })
    }

    #[inline(always)]
    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    /// Zero for documents without postings.
    #[inline(always)]
    pub fn norm(&self, doc_id: u32) -> f64 {
        self.norms.get(&doc_id).copied().unwrap_or(0f64)
    }

    /// Every document that contributed at least one posting.
    pub fn doc_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.norms.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.norms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.norms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::HashIndex;

    #[test]
    fn tf_grows_logarithmically() {
        assert_eq!(calc_tf(1), 1.0);
        assert_eq!(calc_tf(2), 2.0);
        assert_eq!(calc_tf(4), 3.0);
    }

    #[test]
    fn idf_is_zero_for_ubiquitous_terms() {
        assert_eq!(calc_idf(4, 4), 0.0);
        assert_eq!(calc_idf(4, 1), 2.0);
        assert_eq!(calc_idf(4, 2), 1.0);
    }

    #[test]
    fn norms_cover_exactly_the_posting_documents() {
        let mut index = HashIndex::new();
        index.add("cat", 1, 2).unwrap();
        index.add("dog", 1, 1).unwrap();
        index.add("cat", 2, 1).unwrap();
        index.register_document(9).unwrap();
        index.finalize().unwrap();

        let norms = PrecomputedNorms::compute(&index).unwrap();
        assert_eq!(norms.doc_count(), 3);
        assert_eq!(norms.len(), 2);
        assert_eq!(norms.norm(9), 0.0);
        assert!(norms.norm(1) > 0.0);
    }

    #[test]
    fn norm_matches_the_hand_computed_vector() {
        // two docs; "cat" in both (idf 0), "dog" only in doc 1 (idf 1)
        let mut index = HashIndex::new();
        index.add("cat", 1, 1).unwrap();
        index.add("dog", 1, 2).unwrap();
        index.add("cat", 2, 1).unwrap();
        index.finalize().unwrap();

        let norms = PrecomputedNorms::compute(&index).unwrap();
        // doc 1: sqrt((1*0)^2 + ((1+log2 2)*1)^2) = 2
        assert!((norms.norm(1) - 2.0).abs() < 1e-12);
        // doc 2 only holds a zero-idf term
        assert_eq!(norms.norm(2), 0.0);
    }
}
