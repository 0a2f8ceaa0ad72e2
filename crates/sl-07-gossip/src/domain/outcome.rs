//! # Gossip Outcome
//!
//! What a handler did with a message. Senders never see this; it exists
//! for logging and tests.

use shared_types::GroupId;
use sl_06_chain_sync::ReconcileOutcome;

/// Result of handling one gossip message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GossipOutcome {
    /// The message is for a group this node does not serve.
    NotServed,
    /// Already pooled, mined or stored.
    Duplicate,
    /// Failed validation.
    Rejected(String),
    /// The relay's source head has not arrived yet. Transient.
    MissingHead {
        /// Source group.
        group: GroupId,
        /// Source height.
        height: u32,
    },
    /// Admitted and re-gossiped.
    Accepted,
    /// The sender is behind or forked; our tip was sent back to it.
    SenderBehind,
    /// The block was ahead of our tip; reconciliation ran.
    Reconciled(ReconcileOutcome),
    /// No local genesis; a bootstrap was started.
    Bootstrapping,
}

impl GossipOutcome {
    /// Whether the message was admitted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}
