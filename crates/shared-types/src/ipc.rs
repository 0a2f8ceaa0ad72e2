//! # Peer Message Payloads
//!
//! Requests a node answers for its peers, and the gossip messages it
//! propagates. Any transport that can carry serde values can carry these;
//! the in-process devnet passes them by value.
//!
//! ## Design Rules
//!
//! - Every request names the group it is about; groups a node does not
//!   serve are answered with [`RequestError::GroupNotServed`].
//! - The sender's address travels beside the request (transport metadata),
//!   never inside the payload.

use crate::entities::*;
use crate::errors::RequestError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Network address of a peer node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerAddress(pub String);

impl PeerAddress {
    /// Create an address.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerAddress {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// =============================================================================
// SYNCHRONIZATION
// =============================================================================

/// Chain summary exchanged in the version handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Group the summary describes.
    pub group: GroupId,
    /// Height of the sender's tip.
    pub height: u32,
    /// Hash of the sender's genesis.
    pub genesis_hash: Hash,
    /// Hash of the sender's tip.
    pub tip_hash: Hash,
}

// =============================================================================
// GOSSIP
// =============================================================================

/// A transaction relayed from the group that mined it into the group that
/// owns one of its outputs, proven by a Merkle path against the source
/// block's head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayTxn {
    /// Group whose chain contains the transaction.
    pub from_group: GroupId,
    /// Group the transaction is relayed into.
    pub to_group: GroupId,
    /// Height of the source block in `from_group`.
    pub height: u32,
    /// Inclusion path from the transaction hash to the source block's root.
    pub merkle_path: MerklePath,
    /// The relayed transaction.
    pub txn: Transaction,
}

/// The four gossip kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GossipMessage {
    /// A new transaction for `group`'s mempool.
    Txn {
        /// Group the transaction spends in.
        group: GroupId,
        /// The transaction.
        txn: Transaction,
    },
    /// A cross-group relay.
    RelayTxn(RelayTxn),
    /// A full block; its group is `block.group`.
    Block(Block),
    /// A header-only block for cross-group proof checks.
    BlockHead(BlockHead),
}

/// Discriminant of a [`GossipMessage`], for logging and locking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GossipKind {
    /// [`GossipMessage::Txn`].
    Txn,
    /// [`GossipMessage::RelayTxn`].
    RelayTxn,
    /// [`GossipMessage::Block`].
    Block,
    /// [`GossipMessage::BlockHead`].
    BlockHead,
}

impl GossipMessage {
    /// Kind of this message.
    pub fn kind(&self) -> GossipKind {
        match self {
            Self::Txn { .. } => GossipKind::Txn,
            Self::RelayTxn(_) => GossipKind::RelayTxn,
            Self::Block(_) => GossipKind::Block,
            Self::BlockHead(_) => GossipKind::BlockHead,
        }
    }

    /// The group whose peers should receive this message.
    pub fn target_group(&self) -> GroupId {
        match self {
            Self::Txn { group, .. } => *group,
            Self::RelayTxn(relay) => relay.to_group,
            Self::Block(block) | Self::BlockHead(block) => block.group,
        }
    }
}

impl fmt::Display for GossipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Txn => "txn",
            Self::RelayTxn => "relay",
            Self::Block => "block",
            Self::BlockHead => "head",
        };
        f.write_str(name)
    }
}

// =============================================================================
// REQUEST / RESPONSE
// =============================================================================

/// A request from one peer to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerRequest {
    /// Fetch the genesis block of `group`.
    GetGenesis {
        /// Group.
        group: GroupId,
    },
    /// Fetch the hash of the block at `height` in `group`.
    GetHash {
        /// Group.
        group: GroupId,
        /// Height.
        height: u32,
    },
    /// Fetch blocks `from..=to` of `group`. The block at `from` must have
    /// `prev_hash == expected_prev_hash`; `from == 0` is rejected.
    GetBlocks {
        /// Group.
        group: GroupId,
        /// First height, at least 1.
        from: u32,
        /// Last height, inclusive; clipped to the responder's tip.
        to: u32,
        /// Hash the first block must chain onto.
        expected_prev_hash: Hash,
    },
    /// Version handshake carrying the requester's chain summary.
    Version(VersionInfo),
    /// Balance of an encoded address.
    GetBalance {
        /// Encoded address.
        address: String,
    },
    /// A gossip message.
    Gossip(GossipMessage),
}

/// Answer to a [`PeerRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerResponse {
    /// Answer to `GetGenesis`.
    Genesis(Block),
    /// Answer to `GetHash`.
    Hash(Hash),
    /// Answer to `GetBlocks`.
    Blocks(Vec<Block>),
    /// Answer to `Version`: the responder's own summary.
    Version(VersionInfo),
    /// Answer to `GetBalance`.
    Balance(i64),
    /// Gossip received.
    Accepted,
    /// The request failed.
    Error(RequestError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gossip_target_group() {
        let block = Block {
            group: 3,
            ..Block::default()
        };
        assert_eq!(GossipMessage::Block(block.clone()).target_group(), 3);
        assert_eq!(GossipMessage::BlockHead(block.head()).kind(), GossipKind::BlockHead);

        let relay = RelayTxn {
            from_group: 1,
            to_group: 2,
            height: 4,
            merkle_path: MerklePath::default(),
            txn: Transaction::default(),
        };
        assert_eq!(GossipMessage::RelayTxn(relay).target_group(), 2);
    }

    #[test]
    fn test_request_wire_roundtrip() {
        let request = PeerRequest::GetBlocks {
            group: 1,
            from: 3,
            to: 9,
            expected_prev_hash: [4u8; 32],
        };
        let bytes = bincode::serialize(&request).unwrap();
        let back: PeerRequest = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, request);
    }
}
