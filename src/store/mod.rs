pub mod builder;
pub mod constants;
pub mod index;
pub mod posting;
pub mod term;
mod error;

pub use builder::Config;
pub use builder::FileIndex;
pub use error::Error;
pub use error::Result;
pub use index::HashIndex;
pub use index::Index;
pub use posting::Posting;
pub use term::Vocabulary;
