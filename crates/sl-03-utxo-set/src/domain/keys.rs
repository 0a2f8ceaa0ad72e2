//! # Key Layout
//!
//! `u || txn_hash || index` -> output, and the owner index
//! `o || pub_key_hash || txn_hash || index` -> empty.

use shared_crypto::PubKeyHash;
use shared_types::OutPoint;

/// Output table prefix.
pub const UTXO_PREFIX: u8 = b'u';
/// Owner index prefix.
pub const OWNER_PREFIX: u8 = b'o';

const OUTPOINT_LEN: usize = 36;

fn outpoint_bytes(outpoint: &OutPoint) -> [u8; OUTPOINT_LEN] {
    let mut bytes = [0u8; OUTPOINT_LEN];
    bytes[..32].copy_from_slice(&outpoint.txn_hash);
    bytes[32..].copy_from_slice(&outpoint.index.to_be_bytes());
    bytes
}

/// Key of an unspent output.
pub fn utxo_key(outpoint: &OutPoint) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + OUTPOINT_LEN);
    key.push(UTXO_PREFIX);
    key.extend_from_slice(&outpoint_bytes(outpoint));
    key
}

/// Prefix of every owner index entry of `owner`.
pub fn owner_prefix(owner: &PubKeyHash) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + owner.len() + OUTPOINT_LEN);
    key.push(OWNER_PREFIX);
    key.extend_from_slice(owner);
    key
}

/// Owner index entry.
pub fn owner_key(owner: &PubKeyHash, outpoint: &OutPoint) -> Vec<u8> {
    let mut key = owner_prefix(owner);
    key.extend_from_slice(&outpoint_bytes(outpoint));
    key
}

/// Outpoint encoded at the end of an owner index key.
pub fn outpoint_from_owner_key(key: &[u8]) -> Option<OutPoint> {
    let tail = key.len().checked_sub(OUTPOINT_LEN)?;
    let bytes = &key[tail..];
    let txn_hash = bytes[..32].try_into().ok()?;
    let index = u32::from_be_bytes(bytes[32..].try_into().ok()?);
    Some(OutPoint::new(txn_hash, index))
}
