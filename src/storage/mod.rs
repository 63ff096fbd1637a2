//! Storage layer: a checksummed append log replayed into three in-memory
//! buckets (docs, tokens, postings), and the big-endian key codec that
//! keeps the postings bucket scannable by prefix.

pub mod checksum;
pub mod codec;
pub mod store;

pub use checksum::{Checksum, ChecksumError, ChecksumType};
pub use store::Store;
