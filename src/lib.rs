//! wikidex: a full-text search engine core.
//!
//! Three pieces compose the system: a single-writer [`index::Indexer`]
//! that tokenizes incoming documents into positional postings, a
//! [`storage::Store`] that durably holds documents, vocabulary, and
//! postings behind a small KV-shaped contract, and a [`search::Searcher`]
//! that turns a query into ranked hits. [`source::WikiSource`] is the one
//! concrete document feed wired up by the CLI; anything that can produce
//! [`model::Document`] values works as a source.

pub mod config;
pub mod error;
pub mod index;
pub mod model;
pub mod search;
pub mod source;
pub mod storage;

pub use config::{IndexerConfig, StoreConfig};
pub use error::{Result, WikidexError};
pub use index::{BuildStats, Indexer, InvertedIndex};
pub use model::{Document, PostingList, Token};
pub use search::scoring::ScoreKind;
pub use search::{Hit, Searcher};
pub use source::WikiSource;
pub use storage::Store;
