use crate::analyzer::analyzer::Analyzer;
use crate::analyzer::char_filter::CharFilter;
use crate::analyzer::token_filter::TokenFilter;
use crate::analyzer::tokenizer::Tokenizer;
use crate::query::error::Result;
use crate::query::ranking::{Model, Ranking, RankingEvaluator};
use crate::query::score::PrecomputedNorms;
use crate::store::Index;

/// Front door for free-text queries against a sealed index. Norms are
/// computed once here; the analyzer must match the one the index was
/// built with, otherwise queries silently miss.
#[derive(Debug)]
pub struct QueryRunner<'a, X, C, T, I>
where
    X: Index,
    C: CharFilter,
    T: TokenFilter,
    I: Tokenizer,
{
    index: &'a X,
    analyzer: Analyzer<C, T, I>,
    norms: PrecomputedNorms,
}

impl<'a, X, C, T, I> QueryRunner<'a, X, C, T, I>
where
    X: Index,
    C: CharFilter,
    T: TokenFilter,
    I: Tokenizer,
{
    pub fn new(index: &'a X, analyzer: Analyzer<C, T, I>) -> Result<Self> {
        let norms = PrecomputedNorms::compute(index)?;

        Ok(QueryRunner {
            index,
            analyzer,
            norms,
        })
    }

    pub fn query(&self, sentence: &str, model: Model) -> Result<Ranking> {
        let bag = self.analyzer.term_bag(sentence)?;
        let evaluator = RankingEvaluator::new(self.index, &self.norms);

        evaluator.rank(&bag, model)
    }
}
