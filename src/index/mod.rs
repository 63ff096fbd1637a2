//! Indexing: tokenization, the single-writer `Indexer`, and the
//! `InvertedIndex` read view it produces.

pub mod indexer;
pub mod inverted;
pub mod tokenizer;

pub use indexer::{BuildStats, Indexer};
pub use inverted::InvertedIndex;
pub use tokenizer::{Term, Tokenizer, TokenizeMode};
