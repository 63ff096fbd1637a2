//! Core data model: documents, vocabulary entries, and posting lists.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A document submitted to the indexer.
///
/// `doc_id` is zero until `Store::add_doc` assigns it; zero is the
/// reserved "unassigned" marker and never appears on a persisted record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub doc_id: u64,
    pub index: String,
    pub fields: HashMap<String, String>,
}

impl Document {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            doc_id: 0,
            index: index.into(),
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// A vocabulary entry. `surface` is reconstructed from the tokens bucket
/// key rather than stored in the persisted value (see `storage::store`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub id: u64,
    pub surface: String,
    pub doc_count: u64,
    pub pos_count: u64,
}

impl Token {
    pub fn new(id: u64, surface: impl Into<String>) -> Self {
        Self {
            id,
            surface: surface.into(),
            doc_count: 0,
            pos_count: 0,
        }
    }
}

/// Positional occurrences of one term in one document.
///
/// Identity is the pair `(token_id, doc_id)`. `pos_list` is non-decreasing
/// and holds byte offsets into the field text that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostingList {
    pub token_id: u64,
    pub doc_id: u64,
    pub doc_len: usize,
    pub pos_list: Vec<usize>,
}

impl PostingList {
    pub fn new(token_id: u64, doc_id: u64, doc_len: usize) -> Self {
        Self {
            token_id,
            doc_id,
            doc_len,
            pos_list: Vec::new(),
        }
    }
}
