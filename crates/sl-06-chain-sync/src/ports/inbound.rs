//! # Inbound Ports

use async_trait::async_trait;
use shared_types::{PeerAddress, PeerRequest, PeerResponse};

/// Entry point for every request a peer sends this node.
///
/// Gossip requests answer [`PeerResponse::Accepted`] whatever happened to
/// the message; only read requests carry typed errors back.
#[async_trait]
pub trait PeerRequestHandler: Send + Sync {
    /// Handle one request from `from`.
    async fn handle(&self, from: &PeerAddress, request: PeerRequest) -> PeerResponse;

    /// Address other peers reach this node at.
    fn address(&self) -> &PeerAddress;
}
