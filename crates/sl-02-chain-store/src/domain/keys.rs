//! # Key Layout
//!
//! Single-byte table prefixes followed by big-endian ids, so prefix scans
//! return heights in order.

use shared_types::{GroupId, Hash};

/// `b || block_hash` -> block.
pub const BLOCK_PREFIX: u8 = b'b';
/// `h || height` -> block hash.
pub const HEIGHT_PREFIX: u8 = b'h';
/// `t || txn_hash` -> hash of the including block.
pub const TXN_PREFIX: u8 = b't';
/// `l` -> tip hash.
pub const TIP_KEY: &[u8] = b"l";
/// `g || group || height` -> block-head.
pub const HEAD_PREFIX: u8 = b'g';

fn prefixed(prefix: u8, id: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + id.len());
    key.push(prefix);
    key.extend_from_slice(id);
    key
}

/// Key of a block record.
pub fn block_key(hash: &Hash) -> Vec<u8> {
    prefixed(BLOCK_PREFIX, hash)
}

/// Key of a height index entry.
pub fn height_key(height: u32) -> Vec<u8> {
    prefixed(HEIGHT_PREFIX, &height.to_be_bytes())
}

/// Key of a transaction index entry.
pub fn txn_key(txn_hash: &Hash) -> Vec<u8> {
    prefixed(TXN_PREFIX, txn_hash)
}

/// Prefix of every head of `group`.
pub fn head_group_prefix(group: GroupId) -> Vec<u8> {
    prefixed(HEAD_PREFIX, &group.to_be_bytes())
}

/// Key of the head of `group` at `height`.
pub fn head_key(group: GroupId, height: u32) -> Vec<u8> {
    let mut key = head_group_prefix(group);
    key.extend_from_slice(&height.to_be_bytes());
    key
}
