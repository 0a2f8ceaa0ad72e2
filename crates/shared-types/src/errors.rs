//! # Error Types
//!
//! Errors that cross subsystem or peer boundaries.

use crate::entities::OutPoint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a transaction failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxnError {
    /// A non-coinbase transaction with no inputs.
    #[error("transaction has no inputs")]
    NoInputs,

    /// An output carries a zero or negative value.
    #[error("output value must be positive")]
    NonPositiveOutput,

    /// A `-1` input inside a transaction that is not a coinbase.
    #[error("coinbase marker input in a regular transaction")]
    MisplacedCoinbaseInput,

    /// The referenced output is unknown or already spent.
    #[error("referenced output {}:{} not available", hex::encode(.0.txn_hash), .0.index)]
    MissingReference(OutPoint),

    /// The input's cached value disagrees with the referenced output.
    #[error("cached value {cached} differs from output value {actual}")]
    ValueMismatch {
        /// Output being spent.
        outpoint: OutPoint,
        /// Value claimed by the input.
        cached: i64,
        /// Value of the output.
        actual: i64,
    },

    /// The spending key does not own the referenced output.
    #[error("input key does not own output {}:{}", hex::encode(.0.txn_hash), .0.index)]
    OwnerMismatch(OutPoint),

    /// A signature does not verify.
    #[error("signature on input {0} does not verify")]
    BadSignature(usize),

    /// Outputs exceed inputs.
    #[error("outputs {outputs} exceed inputs {inputs}")]
    Overspend {
        /// Sum of input values.
        inputs: i64,
        /// Sum of output values.
        outputs: i64,
    },
}

/// Error returned to a peer in a [`crate::PeerResponse::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RequestError {
    /// The responder has no chain for the requested group.
    #[error("no genesis for group")]
    NoGenesis,

    /// A requested block does not exist or does not anchor.
    #[error("no such block")]
    NoSuchBlock,

    /// Requester and responder disagree on genesis.
    #[error("genesis mismatch")]
    GenesisMismatch,

    /// The responder does not serve the group.
    #[error("group not served")]
    GroupNotServed,

    /// The request is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The responder failed to read its own state.
    #[error("responder unavailable: {0}")]
    Unavailable(String),
}

/// Failure to complete a call to a peer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No known peer serves the group.
    #[error("no peer serves group {0}")]
    NoPeerForGroup(u32),

    /// The address is unknown or unreachable.
    #[error("peer {0} unreachable")]
    Unreachable(String),

    /// The peer answered with an error.
    #[error("peer rejected request: {0}")]
    Rejected(RequestError),

    /// The peer answered with a response of the wrong kind.
    #[error("unexpected response from peer")]
    UnexpectedResponse,
}

impl TransportError {
    /// Whether retrying later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NoPeerForGroup(_) | Self::Unreachable(_))
    }
}
