//! Scoring functions. All three share the same inverse document frequency
//! term; they differ in how they weigh a term's frequency within a
//! document and how they normalize for document length.

use crate::model::{Document, PostingList, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreKind {
    TfIdf,
    LuceneTfIdf,
    Bm25,
}

impl ScoreKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "tfidf" | "tf-idf" => Some(Self::TfIdf),
            "lucene" => Some(Self::LuceneTfIdf),
            "bm25" => Some(Self::Bm25),
            _ => None,
        }
    }
}

pub struct MatchedTerm<'a> {
    pub token: &'a Token,
    pub posting: &'a PostingList,
}

const BM25_K1: f64 = 1.2;

fn idf(token: &Token, total_docs: f64) -> f64 {
    (total_docs / (token.doc_count as f64 + 1.0)).log2()
}

/// `tf = |pos_list| / doc_len`, `idf = log2(N / (doc_count + 1))`.
fn tf_idf(matches: &[MatchedTerm], total_docs: f64) -> f64 {
    matches
        .iter()
        .map(|m| {
            let tf = m.posting.pos_list.len() as f64 / m.posting.doc_len.max(1) as f64;
            tf * idf(m.token, total_docs)
        })
        .sum()
}

/// `tf = sqrt(|pos_list|)`, `field_norm = 1/sqrt(doc_len)` — doc_len here
/// is the posting's own, i.e. the length of the field it was recorded
/// against.
fn lucene_tf_idf(matches: &[MatchedTerm], total_docs: f64) -> f64 {
    matches
        .iter()
        .map(|m| {
            let tf = (m.posting.pos_list.len() as f64).sqrt();
            let field_norm = 1.0 / (m.posting.doc_len.max(1) as f64).sqrt();
            tf * idf(m.token, total_docs) * field_norm
        })
        .sum()
}

/// `k1 = 1.2`, no `b`. `field_norm` is computed from the live document's
/// `Text` field length rather than the posting's stored `doc_len` — the
/// one place these formulas read from the document instead of the
/// posting, because `doc_len` is only ever as fresh as the field that
/// last wrote it.
fn bm25(matches: &[MatchedTerm], doc: &Document, total_docs: f64) -> f64 {
    let live_len = doc.fields.get("Text").map(|s| s.len()).unwrap_or(1).max(1) as f64;
    let field_norm = 1.0 / live_len.sqrt();

    matches
        .iter()
        .map(|m| {
            let tf = m.posting.pos_list.len() as f64;
            let weight = (tf * (BM25_K1 + 1.0)) / (tf + BM25_K1);
            idf(m.token, total_docs) * weight * field_norm
        })
        .sum()
}

pub fn score(kind: ScoreKind, matches: &[MatchedTerm], doc: &Document, total_docs: f64) -> f64 {
    match kind {
        ScoreKind::TfIdf => tf_idf(matches, total_docs),
        ScoreKind::LuceneTfIdf => lucene_tf_idf(matches, total_docs),
        ScoreKind::Bm25 => bm25(matches, doc, total_docs),
    }
}
