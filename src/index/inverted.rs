//! Read-facing view over a freshly built index, plus the residual write
//! that hands its still-unspilled state to the store.

use crate::error::Result;
use crate::model::{PostingList, Token};
use crate::storage::Store;
use ahash::AHashMap;

pub struct InvertedIndex {
    token_map: AHashMap<String, Token>,
    ii_map: AHashMap<(u64, u64), PostingList>,
    total_docs: u64,
}

impl InvertedIndex {
    pub(crate) fn new(
        token_map: AHashMap<String, Token>,
        ii_map: AHashMap<(u64, u64), PostingList>,
        total_docs: u64,
    ) -> Self {
        Self { token_map, ii_map, total_docs }
    }

    /// Cold-opens a read view over an already-built store: no residual
    /// token/posting state, just `total_docs` read once and cached. This
    /// is what `Searcher` uses — it never re-queries `doc_count` per
    /// search, holding only this snapshot.
    pub fn load(store: &Store) -> Self {
        Self { token_map: AHashMap::new(), ii_map: AHashMap::new(), total_docs: store.doc_count() as u64 }
    }

    pub fn lookup_token(&self, surface: &str) -> Option<&Token> {
        self.token_map.get(surface)
    }

    pub fn posting(&self, token_id: u64, doc_id: u64) -> Option<&PostingList> {
        self.ii_map.get(&(token_id, doc_id))
    }

    pub fn distinct_tokens(&self) -> usize {
        self.token_map.len()
    }

    /// Total document count as of construction — `load` reads it fresh
    /// from the store; `Indexer::build` carries over the count observed
    /// at the end of the build.
    pub fn total_docs(&self) -> u64 {
        self.total_docs
    }

    /// Flushes every posting still held in memory, then upserts every
    /// token's final statistics. Does not close the store — callers
    /// decide when the build's write phase is over.
    pub fn write_to(&self, store: &Store) -> Result<()> {
        for posting in self.ii_map.values() {
            store.add_posting_list(posting)?;
        }
        for token in self.token_map.values() {
            store.update_token(token)?;
        }
        Ok(())
    }
}
