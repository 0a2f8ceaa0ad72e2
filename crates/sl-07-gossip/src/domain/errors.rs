//! # Gossip Errors
//!
//! Only local failures are errors; bad messages are outcomes.

use crate::domain::outcome::GossipOutcome;
use shared_crypto::CryptoError;
use sl_02_chain_store::ChainStoreError;
use sl_03_utxo_set::UtxoError;
use sl_06_chain_sync::SyncError;
use thiserror::Error;

/// Gossip and node-service errors.
#[derive(Debug, Error)]
pub enum GossipError {
    /// Sync engine or group state failure.
    #[error("sync: {0}")]
    Sync(#[from] SyncError),

    /// Chain or head store failure.
    #[error("chain store: {0}")]
    Chain(#[from] ChainStoreError),

    /// UTXO set failure.
    #[error("utxo set: {0}")]
    Utxo(#[from] UtxoError),

    /// Malformed address.
    #[error("address: {0}")]
    Crypto(#[from] CryptoError),

    /// A locally built transaction was not admitted.
    #[error("transaction not admitted: {0:?}")]
    NotAdmitted(GossipOutcome),
}

impl GossipError {
    /// Whether this points at corrupted local state.
    pub fn is_invariant_violation(&self) -> bool {
        match self {
            Self::Utxo(err) => err.is_invariant_violation(),
            Self::Sync(SyncError::Utxo(err)) => err.is_invariant_violation(),
            Self::Chain(ChainStoreError::Corrupt(_))
            | Self::Sync(SyncError::Chain(ChainStoreError::Corrupt(_))) => true,
            _ => false,
        }
    }
}
