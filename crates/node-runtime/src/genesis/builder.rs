//! # Genesis Block Builder

use crate::mining::{unix_now, Miner};
use shared_crypto::PubKeyHash;
use shared_types::{Block, GroupId, Transaction, ZERO_HASH};
use sl_05_merkle_relay::commit_body;
use thiserror::Error;

/// Genesis block creation errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    /// The miner gave up before meeting the difficulty.
    #[error("no proof of work found for the genesis of group {0}")]
    NotMined(GroupId),

    /// Invalid genesis configuration.
    #[error("invalid genesis configuration: {0}")]
    InvalidConfig(String),
}

/// Builder for creating genesis blocks.
#[derive(Debug, Clone)]
pub struct GenesisBuilder {
    owner: PubKeyHash,
    reward: i64,
    bits: u32,
    timestamp: Option<u64>,
}

impl GenesisBuilder {
    /// Genesis paying `owner`.
    pub fn new(owner: PubKeyHash) -> Self {
        Self {
            owner,
            reward: crate::config::DEFAULT_REWARD,
            bits: 0,
            timestamp: None,
        }
    }

    /// Coinbase reward.
    pub fn reward(mut self, reward: i64) -> Self {
        self.reward = reward;
        self
    }

    /// Proof-of-work difficulty.
    pub fn bits(mut self, bits: u32) -> Self {
        self.bits = bits;
        self
    }

    /// Fixed timestamp; the current time is used otherwise.
    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Build and mine the genesis of `group`.
    pub fn build(&self, group: GroupId, miner: &dyn Miner) -> Result<Block, GenesisError> {
        if self.reward <= 0 {
            return Err(GenesisError::InvalidConfig(format!(
                "reward must be positive, got {}",
                self.reward
            )));
        }

        let candidate = commit_body(Block {
            group,
            height: 0,
            prev_hash: ZERO_HASH,
            timestamp: self.timestamp.unwrap_or_else(unix_now),
            bits: self.bits,
            txns: vec![Transaction::coinbase(self.owner, self.reward, group, 0)],
            ..Block::default()
        });
        miner.mine(candidate).ok_or(GenesisError::NotMined(group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mining::NonceMiner;
    use sl_05_merkle_relay::verify_block;

    #[test]
    fn test_genesis_is_self_verifying() {
        let genesis = GenesisBuilder::new([7u8; 20])
            .bits(6)
            .timestamp(1_700_000_000)
            .build(2, &NonceMiner::default())
            .unwrap();

        assert_eq!(genesis.group, 2);
        assert!(genesis.is_genesis());
        assert_eq!(genesis.prev_hash, ZERO_HASH);
        assert!(genesis.txns[0].is_coinbase());
        assert_eq!(genesis.txns[0].output_value(), 10);
        assert_eq!(verify_block(&genesis, 6), Ok(()));
    }

    #[test]
    fn test_deterministic_with_fixed_timestamp() {
        let builder = GenesisBuilder::new([7u8; 20]).timestamp(5);
        let miner = NonceMiner::default();
        assert_eq!(
            builder.build(0, &miner).unwrap().hash(),
            builder.build(0, &miner).unwrap().hash()
        );
        assert_ne!(
            builder.build(0, &miner).unwrap().hash(),
            builder.build(1, &miner).unwrap().hash()
        );
    }

    #[test]
    fn test_rejects_bad_reward() {
        assert!(matches!(
            GenesisBuilder::new([7u8; 20]).reward(0).build(0, &NonceMiner::default()),
            Err(GenesisError::InvalidConfig(_))
        ));
        assert!(matches!(
            GenesisBuilder::new([7u8; 20])
                .bits(255)
                .build(0, &NonceMiner::with_max_attempts(4)),
            Err(GenesisError::NotMined(0))
        ));
    }
}
