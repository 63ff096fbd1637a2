//! Query-time search: tokenize the query, fetch every matching posting
//! list, merge disjunctively across terms, score, and rank.

pub mod scoring;

use crate::error::Result;
use crate::index::tokenizer::{TokenizeMode, Tokenizer};
use crate::index::InvertedIndex;
use crate::model::{Document, PostingList, Token};
use crate::storage::Store;
use ahash::AHashMap;
use scoring::{MatchedTerm, ScoreKind};
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Hit {
    pub doc_id: u64,
    pub doc: Document,
    pub score: f64,
}

pub struct Searcher {
    store: Arc<Store>,
    tokenizer: Arc<dyn Tokenizer>,
    index: InvertedIndex,
}

impl Searcher {
    /// `index` is the searcher's read snapshot of corpus statistics —
    /// normally `InvertedIndex::load(&store)` for a store opened cold,
    /// or the `InvertedIndex` a build just produced. The searcher never
    /// re-derives `total_docs` from the store itself.
    pub fn new(store: Arc<Store>, tokenizer: Arc<dyn Tokenizer>, index: InvertedIndex) -> Self {
        Self { store, tokenizer, index }
    }

    /// Tokenizes `query` in search mode, fetches every term's posting
    /// list by prefix scan, merges disjunctively into one hit per
    /// matching document, scores with `kind`, and returns the top `n`
    /// by descending score. Documents that vanished since indexing are
    /// silently skipped rather than failing the whole search.
    pub fn search(&self, query: &str, kind: ScoreKind, top_n: usize) -> Result<Vec<Hit>> {
        let terms = self.tokenizer.tokenize(query, TokenizeMode::Search);

        let mut candidates: AHashMap<u64, Vec<(Token, PostingList)>> = AHashMap::new();
        for term in &terms {
            let token = self.store.get_token(&term.surface)?;
            self.store.scan_posting_list_by_token(token.id, |pl| {
                candidates.entry(pl.doc_id).or_default().push((token.clone(), pl.clone()));
            });
        }

        let total_docs = (self.index.total_docs() as f64).max(1.0);
        let mut hits = Vec::with_capacity(candidates.len());
        for (doc_id, matched) in candidates {
            let doc = match self.store.get_doc(doc_id) {
                Ok(doc) => doc,
                Err(_) => continue,
            };
            let refs: Vec<MatchedTerm> =
                matched.iter().map(|(token, posting)| MatchedTerm { token, posting }).collect();
            let score = scoring::score(kind, &refs, &doc, total_docs);
            hits.push(Hit { doc_id, doc, score });
        }

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(top_n);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IndexerConfig, StoreConfig};
    use crate::index::indexer::Indexer;
    use crate::index::tokenizer::WhitespaceTokenizer;
    use crate::model::Document;
    use tempfile::TempDir;

    fn build_store(docs: &[(&str, &str)]) -> Arc<Store> {
        let dir = TempDir::new().unwrap();
        // Leak the tempdir path so the store outlives this helper; tests
        // that need cleanup can use their own TempDir directly.
        let path = dir.into_path();
        let store = Arc::new(Store::open(path.join("wiki.db"), StoreConfig::default()).unwrap());
        let mut indexer = Indexer::new(store.clone(), Arc::new(WhitespaceTokenizer::default()), IndexerConfig::default());
        for (_title, text) in docs {
            let mut doc = Document::new("wiki").with_field("Text", *text);
            indexer.add_doc(&mut doc).unwrap();
        }
        let (index, _) = indexer.build();
        index.write_to(&store).unwrap();
        store
    }

    fn searcher_for(store: Arc<Store>) -> Searcher {
        let index = InvertedIndex::load(&store);
        Searcher::new(store, Arc::new(WhitespaceTokenizer::default()), index)
    }

    #[test]
    fn disjunctive_merge_finds_docs_matching_any_term() {
        let store = build_store(&[("a", "red fox"), ("b", "blue fox"), ("c", "green leaf")]);
        let searcher = searcher_for(store);

        let hits = searcher.search("red blue", ScoreKind::TfIdf, 10).unwrap();
        let doc_ids: Vec<_> = hits.iter().map(|h| h.doc_id).collect();
        assert_eq!(doc_ids.len(), 2);
    }

    #[test]
    fn results_are_sorted_descending_by_score() {
        let store = build_store(&[("a", "fox fox fox fox"), ("b", "fox leaf leaf leaf")]);
        let searcher = searcher_for(store);

        let hits = searcher.search("fox", ScoreKind::Bm25, 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn top_n_truncates_results() {
        let store = build_store(&[("a", "fox"), ("b", "fox"), ("c", "fox")]);
        let searcher = searcher_for(store);

        let hits = searcher.search("fox", ScoreKind::TfIdf, 2).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn unknown_query_term_yields_no_hits_not_an_error() {
        let store = build_store(&[("a", "fox")]);
        let searcher = searcher_for(store);

        let hits = searcher.search("nonexistentword", ScoreKind::TfIdf, 10).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn deleted_document_is_skipped_not_fatal() {
        let store = build_store(&[("a", "fox"), ("b", "fox")]);
        store.del_doc(1).unwrap();
        let searcher = searcher_for(store);

        let hits = searcher.search("fox", ScoreKind::TfIdf, 10).unwrap();
        assert!(hits.iter().all(|h| h.doc_id != 1));
    }
}
