//! Single-writer document indexer.
//!
//! Mirrors the original system's `Indexer`: documents are tokenized and
//! accumulated into an in-memory posting table (`ii_map`, keyed by
//! `(token_id, doc_id)`), which is periodically spilled to the store once
//! too many distinct token ids have been touched since the last flush —
//! the same trigger the original's nested `map[token_id]map[doc_id]`
//! gets for free from its outer map's `len()`.

use crate::config::IndexerConfig;
use crate::error::Result;
use crate::index::tokenizer::{Term, Tokenizer, TokenizeMode};
use crate::model::{Document, PostingList, Token};
use crate::storage::Store;
use ahash::{AHashMap, AHashSet};
use std::sync::Arc;

/// Counters returned once a build finishes, standing in for the metrics
/// the teacher would otherwise emit through its logging stack.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    pub docs_indexed: u64,
    pub total_doc_length: u64,
    pub distinct_tokens: usize,
    pub spills: u64,
}

pub struct Indexer {
    store: Arc<Store>,
    tokenizer: Arc<dyn Tokenizer>,
    config: IndexerConfig,

    token_cache: AHashMap<String, Token>,
    ii_map: AHashMap<(u64, u64), PostingList>,
    /// Distinct token ids touched since the last flush — the spill
    /// trigger counts these, not `ii_map.len()`. A token shared by many
    /// documents occupies many `ii_map` entries but only one slot here,
    /// matching the original `map[token_id]map[doc_id]*PostingList`'s
    /// `len()` semantics.
    buffered_token_ids: AHashSet<u64>,

    docs_indexed: u64,
    total_doc_length: u64,
    spills: u64,
}

impl Indexer {
    pub fn new(store: Arc<Store>, tokenizer: Arc<dyn Tokenizer>, config: IndexerConfig) -> Self {
        Self {
            store,
            tokenizer,
            config,
            token_cache: AHashMap::new(),
            ii_map: AHashMap::new(),
            buffered_token_ids: AHashSet::new(),
            docs_indexed: 0,
            total_doc_length: 0,
            spills: 0,
        }
    }

    /// Assigns the document an id via the store, tokenizes every field in
    /// index mode, and folds each term's occurrence into the staging
    /// posting table. Spills to the store if the number of distinct
    /// token ids buffered since the last flush has grown past
    /// `tokens_kept_in_memory`.
    pub fn add_doc(&mut self, doc: &mut Document) -> Result<()> {
        self.store.add_doc(doc)?;

        for field_value in doc.fields.values() {
            self.total_doc_length += field_value.len() as u64;
            let terms = self.tokenizer.tokenize(field_value, TokenizeMode::Index);
            for term in terms {
                self.add_term_to_posting(term, doc.doc_id, field_value.len())?;
            }
        }

        self.docs_indexed += 1;

        if self.buffered_token_ids.len() >= self.config.tokens_kept_in_memory {
            self.flush_posting_list()?;
        }

        Ok(())
    }

    fn add_term_to_posting(&mut self, term: Term, doc_id: u64, doc_len: usize) -> Result<()> {
        let mut token = self.lookup_token(&term.surface)?;
        let key = (token.id, doc_id);

        self.buffered_token_ids.insert(token.id);

        let first_occurrence = !self.ii_map.contains_key(&key);
        let posting = self
            .ii_map
            .entry(key)
            .or_insert_with(|| PostingList::new(token.id, doc_id, doc_len));
        // The field processed last wins `doc_len` when a term occurs in
        // more than one field of the same document.
        posting.doc_len = doc_len;
        posting.pos_list.push(term.start);

        if first_occurrence {
            token.doc_count += 1;
        }
        token.pos_count += 1;
        self.token_cache.insert(term.surface, token);

        Ok(())
    }

    fn lookup_token(&mut self, surface: &str) -> Result<Token> {
        if let Some(tok) = self.token_cache.get(surface) {
            return Ok(tok.clone());
        }
        let tok = self.store.alloc_token(surface);
        self.token_cache.insert(surface.to_string(), tok.clone());
        Ok(tok)
    }

    /// Drains the staging posting table into the store and resets it.
    fn flush_posting_list(&mut self) -> Result<()> {
        for posting in self.ii_map.values() {
            self.store.add_posting_list(posting)?;
        }
        self.ii_map.clear();
        self.buffered_token_ids.clear();
        self.spills += 1;
        Ok(())
    }

    /// Finishes the build, returning the read-facing `InvertedIndex` (with
    /// whatever postings hadn't yet been spilled still resident) and the
    /// counters collected along the way.
    pub fn build(self) -> (super::inverted::InvertedIndex, BuildStats) {
        let stats = BuildStats {
            docs_indexed: self.docs_indexed,
            total_doc_length: self.total_doc_length,
            distinct_tokens: self.token_cache.len(),
            spills: self.spills,
        };
        let total_docs = self.store.doc_count() as u64;
        let index = super::inverted::InvertedIndex::new(self.token_cache, self.ii_map, total_docs);
        (index, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::index::tokenizer::WhitespaceTokenizer;
    use tempfile::TempDir;

    fn new_indexer(dir: &TempDir) -> Indexer {
        let store = Arc::new(Store::open(dir.path().join("wiki.db"), StoreConfig::for_testing()).unwrap());
        Indexer::new(store, Arc::new(WhitespaceTokenizer::default()), IndexerConfig::for_testing())
    }

    #[test]
    fn repeated_terms_accumulate_positions() {
        let dir = TempDir::new().unwrap();
        let mut indexer = new_indexer(&dir);

        let mut doc = Document::new("wiki").with_field("Text", "red blue red");
        indexer.add_doc(&mut doc).unwrap();

        let (index, stats) = indexer.build();
        assert_eq!(stats.docs_indexed, 1);

        let red = index.lookup_token("red").unwrap();
        assert_eq!(red.doc_count, 1);
        assert_eq!(red.pos_count, 2);

        let posting = index.posting(red.id, doc.doc_id).unwrap();
        assert_eq!(posting.pos_list.len(), 2);
        assert_eq!(posting.doc_len, "red blue red".len());
    }

    #[test]
    fn distinct_docs_increment_doc_count_once_each() {
        let dir = TempDir::new().unwrap();
        let mut indexer = new_indexer(&dir);

        let mut a = Document::new("wiki").with_field("Text", "blue sky");
        let mut b = Document::new("wiki").with_field("Text", "blue sea");
        indexer.add_doc(&mut a).unwrap();
        indexer.add_doc(&mut b).unwrap();

        let (index, _) = indexer.build();
        let blue = index.lookup_token("blue").unwrap();
        assert_eq!(blue.doc_count, 2);
        assert_eq!(blue.pos_count, 2);
    }

    #[test]
    fn spills_when_staging_table_exceeds_threshold() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(Store::open(dir.path().join("wiki.db"), StoreConfig::for_testing()).unwrap());
        // tokens_kept_in_memory = 1: every new distinct posting forces a spill.
        let mut indexer = Indexer::new(store.clone(), Arc::new(WhitespaceTokenizer::default()), IndexerConfig::for_testing());

        let mut doc = Document::new("wiki").with_field("Text", "alpha beta gamma");
        indexer.add_doc(&mut doc).unwrap();

        let (_, stats) = indexer.build();
        assert!(stats.spills > 0);
    }

    #[test]
    fn spill_trigger_counts_distinct_token_ids_not_posting_entries() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(Store::open(dir.path().join("wiki.db"), StoreConfig::for_testing()).unwrap());
        let config = IndexerConfig { tokens_kept_in_memory: 2 };
        let mut indexer = Indexer::new(store, Arc::new(WhitespaceTokenizer::default()), config);

        // One token ("fox") repeated across many documents occupies one
        // ii_map entry per document but must count as a single distinct
        // token id — five documents sharing it should not spill.
        for _ in 0..5 {
            let mut doc = Document::new("wiki").with_field("Text", "fox");
            indexer.add_doc(&mut doc).unwrap();
        }
        assert_eq!(indexer.spills, 0);
        assert_eq!(indexer.buffered_token_ids.len(), 1);

        // A second distinct token id crosses the threshold of 2 and spills.
        let mut doc = Document::new("wiki").with_field("Text", "owl");
        indexer.add_doc(&mut doc).unwrap();
        assert_eq!(indexer.spills, 1);
    }
}
