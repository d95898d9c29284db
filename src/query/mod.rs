mod error;
pub mod eval;
pub mod query;
pub mod ranking;
pub mod score;

pub use error::Error;
pub use error::Result;
pub use query::QueryRunner;
pub use ranking::{Model, Operator, Ranking, RankingEvaluator};
pub use score::PrecomputedNorms;
