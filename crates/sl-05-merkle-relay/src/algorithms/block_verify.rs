//! # Block Self-Verification
//!
//! Checks a block can stand on its own, without any chain context. Heads
//! get the header checks (parent-link shape, proof of work); full blocks
//! must also carry a body that starts with a coinbase and hashes to the
//! header's root. A full block stripped of its body is therefore rejected
//! even though it keeps the real block's hash.

use crate::algorithms::merkle::compute_merkle_root;
use crate::domain::RelayError;
use shared_types::{leading_zero_bits, Block, ZERO_HASH};

/// Set `block.merkle_root` to commit to its transactions.
pub fn commit_body(mut block: Block) -> Block {
    block.merkle_root = compute_merkle_root(&block.txn_hashes());
    block
}

/// Header-only checks of a block-head against a network minimum
/// difficulty of `min_bits`. Any body present is ignored.
pub fn verify_head(block: &Block, min_bits: u32) -> Result<(), RelayError> {
    let genesis_link_ok = block.is_genesis() == (block.prev_hash == ZERO_HASH);
    if !genesis_link_ok {
        return Err(RelayError::BadParentLink(block.height));
    }

    if block.bits < min_bits {
        return Err(RelayError::DifficultyTooLow {
            required: min_bits,
            declared: block.bits,
        });
    }

    let actual = leading_zero_bits(&block.hash());
    if actual < block.bits {
        return Err(RelayError::InsufficientWork {
            required: block.bits,
            actual,
        });
    }

    Ok(())
}

/// Verify a full block: header checks, a coinbase first, and a body that
/// commits to the header's root.
pub fn verify_block(block: &Block, min_bits: u32) -> Result<(), RelayError> {
    verify_head(block, min_bits)?;

    if !block.txns.first().is_some_and(|txn| txn.is_coinbase()) {
        return Err(RelayError::MissingCoinbase);
    }
    if compute_merkle_root(&block.txn_hashes()) != block.merkle_root {
        return Err(RelayError::MerkleRootMismatch);
    }

    Ok(())
}
