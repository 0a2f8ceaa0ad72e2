//! # Mining Capability
//!
//! A [`Miner`] turns a candidate block into one whose header hash has at
//! least `block.bits` leading zero bits. [`NonceMiner`] does it by brute
//! force over the nonce.

use shared_crypto::PubKeyHash;
use shared_types::{Block, GroupId};
use sl_01_group_router::group_of;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Proof-of-work search.
///
/// CPU-bound; callers on an async runtime run it with `spawn_blocking`.
pub trait Miner: Send + Sync {
    /// Solve `candidate`, or give up with `None`.
    fn mine(&self, candidate: Block) -> Option<Block>;
}

/// Nonce search starting from the candidate's nonce.
#[derive(Debug, Clone)]
pub struct NonceMiner {
    max_attempts: u64,
}

impl Default for NonceMiner {
    fn default() -> Self {
        Self {
            max_attempts: u64::MAX,
        }
    }
}

impl NonceMiner {
    /// Give up after `max_attempts` hashes.
    pub fn with_max_attempts(max_attempts: u64) -> Self {
        Self { max_attempts }
    }
}

impl Miner for NonceMiner {
    fn mine(&self, mut candidate: Block) -> Option<Block> {
        for _ in 0..self.max_attempts {
            if candidate.meets_difficulty() {
                return Some(candidate);
            }
            candidate.nonce = candidate.nonce.wrapping_add(1);
        }
        None
    }
}

/// Owner to pay for a block in `group`: the first owner living in that
/// group, else the first owner at all.
pub fn payout_owner(owners: &[PubKeyHash], group: GroupId, max_group_num: u32) -> Option<PubKeyHash> {
    if let Some(owner) = owners
        .iter()
        .find(|owner| group_of(owner, max_group_num) == group)
    {
        return Some(*owner);
    }
    let fallback = owners.first().copied();
    if fallback.is_some() {
        warn!(
            "[runtime] no mining address lives in group {}; its rewards are not spendable there",
            group
        );
    }
    fallback
}

/// Seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0) // Fallback to epoch if system time is before UNIX_EPOCH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_miner_meets_target() {
        let candidate = Block {
            height: 1,
            prev_hash: [1u8; 32],
            bits: 8,
            ..Block::default()
        };
        let mined = NonceMiner::default().mine(candidate).unwrap();
        assert!(mined.meets_difficulty());
        assert_eq!(mined.bits, 8);
    }

    #[test]
    fn test_nonce_miner_gives_up() {
        let candidate = Block {
            bits: 255,
            ..Block::default()
        };
        assert_eq!(NonceMiner::with_max_attempts(16).mine(candidate), None);
    }

    #[test]
    fn test_payout_owner_prefers_group_resident() {
        let in_group = |group| {
            (0u8..=255)
                .map(|i| [i; 20])
                .find(|owner| group_of(owner, 4) == group)
                .unwrap()
        };
        let owners = vec![in_group(1), in_group(2)];
        assert_eq!(payout_owner(&owners, 2, 4), Some(in_group(2)));
        assert_eq!(payout_owner(&owners, 3, 4), Some(in_group(1)));
        assert_eq!(payout_owner(&[], 3, 4), None);
    }
}
