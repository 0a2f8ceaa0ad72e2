//! # Merkle Tree
//!
//! Inclusion paths over a block's transaction hashes.

use crate::domain::RelayError;
use shared_crypto::Sha256Hasher;
use shared_types::{Hash, MerklePath, Position, ProofNode, ZERO_HASH};

/// Hash two nodes together.
fn hash_concat(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256Hasher::new();
    hasher.update(left).update(right);
    hasher.finalize()
}

fn next_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            hash_concat(left, right)
        })
        .collect()
}

/// Merkle root of `txn_hashes`.
pub fn compute_merkle_root(txn_hashes: &[Hash]) -> Hash {
    if txn_hashes.is_empty() {
        return ZERO_HASH;
    }

    let mut level = txn_hashes.to_vec();
    while level.len() > 1 {
        level = next_level(&level);
    }
    level[0]
}

/// Sibling path from leaf `index` to the root.
pub fn find_path(txn_hashes: &[Hash], index: usize) -> Result<MerklePath, RelayError> {
    if index >= txn_hashes.len() {
        return Err(RelayError::IndexOutOfRange {
            index,
            len: txn_hashes.len(),
        });
    }

    let mut nodes = Vec::new();
    let mut level = txn_hashes.to_vec();
    let mut index = index;

    while level.len() > 1 {
        let node = if index % 2 == 0 {
            // Odd last node pairs with itself.
            let sibling = level.get(index + 1).unwrap_or(&level[index]);
            ProofNode::right(*sibling)
        } else {
            ProofNode::left(level[index - 1])
        };
        nodes.push(node);
        level = next_level(&level);
        index /= 2;
    }

    Ok(MerklePath { nodes })
}

/// Whether `path` leads from `txn_hash` to `root`. Never fails.
pub fn verify_path(txn_hash: &Hash, path: &MerklePath, root: &Hash) -> bool {
    let computed = path
        .nodes
        .iter()
        .fold(*txn_hash, |current, node| match node.position {
            Position::Left => hash_concat(&node.hash, &current),
            Position::Right => hash_concat(&current, &node.hash),
        });
    &computed == root
}
