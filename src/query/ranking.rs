use crate::query::error::Result;
use crate::query::score::{tf_idf, PrecomputedNorms};
use crate::store::Index;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    Boolean(Operator),
    Vector,
}

/// Ranked answer to one query. Boolean rankings leave `scores` empty.
#[derive(Debug)]
pub struct Ranking {
    pub doc_ids: Vec<u32>,
    pub scores: HashMap<u32, f64>,
}

impl Ranking {
    fn empty() -> Self {
        Ranking {
            doc_ids: Vec::new(),
            scores: HashMap::new(),
        }
    }
}

/// Evaluates a preprocessed query bag against a sealed index. Query
/// terms missing from the vocabulary are dropped silently; an empty
/// answer is a valid answer.
#[derive(Debug)]
pub struct RankingEvaluator<'a, I: Index> {
    index: &'a I,
    norms: &'a PrecomputedNorms,
}

impl<'a, I: Index> RankingEvaluator<'a, I> {
    pub fn new(index: &'a I, norms: &'a PrecomputedNorms) -> Self {
        RankingEvaluator { index, norms }
    }

    pub fn rank(&self, query: &HashMap<String, u32>, model: Model) -> Result<Ranking> {
        match model {
            Model::Boolean(operator) => self.boolean(query, operator),
            Model::Vector => self.cosine(query),
        }
    }

    fn boolean(&self, query: &HashMap<String, u32>, operator: Operator) -> Result<Ranking> {
        let mut doc_sets = Vec::new();

        for term in query.keys() {
            if self.index.term_id(term).is_none() {
                continue;
            }

            let docs: HashSet<u32> = self.index.occurrences(term)?.map(|p| p.doc_id).collect();
            doc_sets.push(docs);
        }

        let mut doc_sets = doc_sets.into_iter();
        let combined = match doc_sets.next() {
            None => return Ok(Ranking::empty()),
            Some(first) => match operator {
                Operator::And => doc_sets.fold(first, |acc, set| {
                    acc.intersection(&set).copied().collect()
                }),
                Operator::Or => doc_sets.fold(first, |acc, set| {
                    acc.union(&set).copied().collect()
                }),
            },
        };

        let mut doc_ids: Vec<u32> = combined.into_iter().collect();
        doc_ids.sort_unstable();

        Ok(Ranking {
            doc_ids,
            scores: HashMap::new(),
        })
    }

    fn cosine(&self, query: &HashMap<String, u32>) -> Result<Ranking> {
        let doc_count = self.norms.doc_count();
        let mut matched_any = false;
        let mut scores: HashMap<u32, f64> = HashMap::new();

        for (term, &query_freq) in query.iter() {
            let docs_with_term = self.index.document_count_with_term(term);
            if docs_with_term == 0 {
                continue;
            }
            matched_any = true;

            let query_weight = tf_idf(doc_count, query_freq, docs_with_term);

            for posting in self.index.occurrences(term)? {
                let doc_weight = tf_idf(doc_count, posting.term_freq, docs_with_term);
                *scores.entry(posting.doc_id).or_insert(0f64) += query_weight * doc_weight;
            }
        }

        if !matched_any {
            return Ok(Ranking::empty());
        }

        // every indexed document is ranked; the unmatched trail with
        // score zero in ascending doc id order
        for doc_id in self.norms.doc_ids() {
            scores.entry(doc_id).or_insert(0f64);
        }

        for (doc_id, score) in scores.iter_mut() {
            let norm = self.norms.norm(*doc_id);
            *score = if norm == 0f64 { 0f64 } else { *score / norm };
        }

        let mut doc_ids: Vec<u32> = scores.keys().copied().collect();
        doc_ids.sort_unstable_by(|a, b| {
            let (score_a, score_b) = (scores[a], scores[b]);
            if score_a > score_b {
                Ordering::Less
            } else if score_a < score_b {
                Ordering::Greater
            } else {
                a.cmp(b)
            }
        });

        Ok(Ranking { doc_ids, scores })
    }
}
