//! Binary key encoding.
//!
//! All integer keys are 8-byte big-endian so lexicographic byte order
//! equals numeric order — this is what lets a prefix scan over the
//! postings bucket deliver hits in ascending `doc_id` order without an
//! auxiliary sort.

pub const POSTING_KEY_LEN: usize = 16;

/// Encodes a `u64` id as big-endian bytes (`doc` bucket key).
pub fn encode_id(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

pub fn decode_id(bytes: &[u8]) -> Option<u64> {
    let arr: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(arr))
}

/// Encodes the composite postings key `token_id || doc_id`.
pub fn encode_posting_key(token_id: u64, doc_id: u64) -> [u8; POSTING_KEY_LEN] {
    let mut key = [0u8; POSTING_KEY_LEN];
    key[..8].copy_from_slice(&token_id.to_be_bytes());
    key[8..].copy_from_slice(&doc_id.to_be_bytes());
    key
}

pub fn decode_posting_key(bytes: &[u8]) -> Option<(u64, u64)> {
    if bytes.len() != POSTING_KEY_LEN {
        return None;
    }
    let token_id = decode_id(&bytes[..8])?;
    let doc_id = decode_id(&bytes[8..])?;
    Some((token_id, doc_id))
}

/// Prefix used to scan every posting for a given `token_id`.
pub fn posting_prefix(token_id: u64) -> [u8; 8] {
    token_id.to_be_bytes()
}
