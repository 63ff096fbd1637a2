//! Tunables for the store and indexer.
//!
//! Mirrors the teacher's habit of keeping every durability/throughput knob
//! in one small, `Default`-able, `serde`-able config struct per subsystem,
//! with named presets for common profiles instead of callers hand-rolling
//! the fields.

use serde::{Deserialize, Serialize};

/// Knobs for `Store`'s batching and durability behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Number of pending entries (per bucket) before an automatic flush.
    /// Spec default: 4096.
    pub flush_threshold: usize,

    /// Whether `Close` calls `fsync` on the log file after its final flush.
    /// Durability is only ever established at `Close` — this does not add
    /// an intermediate sync point, it only controls whether `Close` itself
    /// is backed by a real fsync or left to the OS page cache.
    pub sync_on_close: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            flush_threshold: 4096,
            sync_on_close: true,
        }
    }
}

impl StoreConfig {
    /// Smallest threshold that still lets tests exercise the flush path
    /// without building a large corpus.
    pub fn for_testing() -> Self {
        Self {
            flush_threshold: 4,
            sync_on_close: false,
        }
    }
}

/// Knobs for `Indexer`'s spill policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Distinct token count in the staging posting table that triggers a
    /// spill to the store. Spec default: 40960
    /// (`TokenPostingListKeptInMemory`).
    pub tokens_kept_in_memory: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            tokens_kept_in_memory: 40_960,
        }
    }
}

impl IndexerConfig {
    pub fn for_testing() -> Self {
        Self {
            tokens_kept_in_memory: 1,
        }
    }
}
