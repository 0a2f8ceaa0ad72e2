//! # Relay Proofs
//!
//! A transaction mined in one group that pays owners in another group is
//! relayed to each destination with its inclusion path.

use crate::algorithms::merkle::{find_path, verify_path};
use crate::domain::RelayError;
use shared_types::{Block, BlockHead, GroupId, RelayTxn};
use sl_01_group_router::group_of;
use std::collections::BTreeSet;

/// Relay for transaction `index` of `block` into `to_group`.
pub fn build_relay(block: &Block, index: usize, to_group: GroupId) -> Result<RelayTxn, RelayError> {
    let txn = block.txns.get(index).ok_or(RelayError::IndexOutOfRange {
        index,
        len: block.txns.len(),
    })?;
    let merkle_path = find_path(&block.txn_hashes(), index)?;
    Ok(RelayTxn {
        from_group: block.group,
        to_group,
        height: block.height,
        merkle_path,
        txn: txn.clone(),
    })
}

/// One relay per (transaction, foreign destination group) of `block`.
/// Coinbases are never relayed.
pub fn cross_group_relays(block: &Block, max_group_num: u32) -> Result<Vec<RelayTxn>, RelayError> {
    let mut relays = Vec::new();
    for (index, txn) in block.txns.iter().enumerate() {
        if txn.is_coinbase() {
            continue;
        }
        let targets: BTreeSet<GroupId> = txn
            .vout
            .iter()
            .map(|output| group_of(&output.pub_key_hash, max_group_num))
            .filter(|group| *group != block.group)
            .collect();
        for to_group in targets {
            relays.push(build_relay(block, index, to_group)?);
        }
    }
    Ok(relays)
}

/// Check `relay` against the stored head of its source block.
pub fn verify_relay(relay: &RelayTxn, head: &BlockHead) -> Result<(), RelayError> {
    if head.group != relay.from_group {
        return Err(RelayError::GroupMismatch {
            expected: relay.from_group,
            actual: head.group,
        });
    }
    if head.height != relay.height {
        return Err(RelayError::HeightMismatch {
            expected: relay.height,
            actual: head.height,
        });
    }
    if !verify_path(&relay.txn.hash(), &relay.merkle_path, &head.merkle_root) {
        return Err(RelayError::ProofInvalid);
    }
    Ok(())
}
