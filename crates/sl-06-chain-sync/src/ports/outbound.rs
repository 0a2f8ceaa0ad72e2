//! # Outbound Ports
//!
//! The transport a node uses to reach other peers. Implementations know
//! their own node's address and never deliver to it.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::{
    Block, GossipMessage, GroupId, PeerAddress, PeerRequest, PeerResponse, RequestError,
    TransportError, VersionInfo,
};
use std::sync::atomic::{AtomicBool, Ordering};

/// Peer transport - outbound port.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Call any one reachable peer serving `group`. Returns which peer
    /// answered.
    async fn call_peer(
        &self,
        group: GroupId,
        request: PeerRequest,
    ) -> Result<(PeerAddress, PeerResponse), TransportError>;

    /// Call one specific peer.
    async fn call_address(
        &self,
        address: &PeerAddress,
        request: PeerRequest,
    ) -> Result<PeerResponse, TransportError>;

    /// Send gossip to every peer serving `group`, except `exclude`.
    /// Returns how many peers it was handed to.
    async fn broadcast_group(
        &self,
        group: GroupId,
        message: GossipMessage,
        exclude: Option<&PeerAddress>,
    ) -> usize;

    /// Send gossip to every known peer, except `exclude`.
    async fn broadcast_all(&self, message: GossipMessage, exclude: Option<&PeerAddress>) -> usize;
}

/// Turn a typed error response into a transport error.
pub fn expect_response(response: PeerResponse) -> Result<PeerResponse, TransportError> {
    match response {
        PeerResponse::Error(err) => Err(TransportError::Rejected(err)),
        other => Ok(other),
    }
}

// =============================================================================
// MOCK IMPLEMENTATION FOR TESTING
// =============================================================================

/// A gossip message the mock was asked to send.
#[derive(Debug, Clone, PartialEq)]
pub struct SentGossip {
    /// Target group, `None` for a network-wide broadcast.
    pub group: Option<GroupId>,
    /// Message.
    pub message: GossipMessage,
    /// Excluded peer.
    pub exclude: Option<PeerAddress>,
}

/// Single scripted peer holding one group's chain.
pub struct MockPeerTransport {
    peer: PeerAddress,
    group: GroupId,
    chain: RwLock<Vec<Block>>,
    unreachable: AtomicBool,
    fail_get_blocks: AtomicBool,
    requests: Mutex<Vec<PeerRequest>>,
    sent: Mutex<Vec<SentGossip>>,
}

impl MockPeerTransport {
    /// Peer `peer` serving `group` with `chain` (index = height).
    pub fn new(peer: impl Into<PeerAddress>, group: GroupId, chain: Vec<Block>) -> Self {
        Self {
            peer: peer.into(),
            group,
            chain: RwLock::new(chain),
            unreachable: AtomicBool::new(false),
            fail_get_blocks: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// The scripted peer's address.
    pub fn peer(&self) -> &PeerAddress {
        &self.peer
    }

    /// Replace the peer's chain.
    pub fn set_chain(&self, chain: Vec<Block>) {
        *self.chain.write() = chain;
    }

    /// Make every call fail.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Make only `GetBlocks` fail.
    pub fn set_fail_get_blocks(&self, fail: bool) {
        self.fail_get_blocks.store(fail, Ordering::SeqCst);
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<PeerRequest> {
        self.requests.lock().clone()
    }

    /// Every gossip message sent so far.
    pub fn sent(&self) -> Vec<SentGossip> {
        self.sent.lock().clone()
    }

    fn version(&self) -> Option<VersionInfo> {
        let chain = self.chain.read();
        let (genesis, tip) = (chain.first()?, chain.last()?);
        Some(VersionInfo {
            group: self.group,
            height: tip.height,
            genesis_hash: genesis.hash(),
            tip_hash: tip.hash(),
        })
    }

    fn answer(&self, request: PeerRequest) -> Result<PeerResponse, TransportError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(TransportError::Unreachable(self.peer.to_string()));
        }
        self.requests.lock().push(request.clone());

        let chain = self.chain.read();
        let response = match request {
            PeerRequest::GetGenesis { .. } => match chain.first() {
                Some(genesis) => PeerResponse::Genesis(genesis.clone()),
                None => PeerResponse::Error(RequestError::NoGenesis),
            },
            PeerRequest::GetHash { height, .. } => match chain.get(height as usize) {
                Some(block) => PeerResponse::Hash(block.hash()),
                None => PeerResponse::Error(RequestError::NoSuchBlock),
            },
            PeerRequest::GetBlocks {
                from,
                to,
                expected_prev_hash,
                ..
            } => {
                if self.fail_get_blocks.load(Ordering::SeqCst) {
                    return Err(TransportError::Unreachable(self.peer.to_string()));
                }
                let anchored = from
                    .checked_sub(1)
                    .and_then(|prev| chain.get(prev as usize))
                    .map_or(false, |prev| prev.hash() == expected_prev_hash);
                if anchored {
                    let end = (to as usize + 1).min(chain.len()).max(from as usize);
                    PeerResponse::Blocks(chain[from as usize..end].to_vec())
                } else {
                    PeerResponse::Error(RequestError::NoSuchBlock)
                }
            }
            PeerRequest::Version(_) => {
                drop(chain);
                match self.version() {
                    Some(info) => PeerResponse::Version(info),
                    None => PeerResponse::Error(RequestError::NoGenesis),
                }
            }
            PeerRequest::GetBalance { .. } => PeerResponse::Balance(0),
            PeerRequest::Gossip(_) => PeerResponse::Accepted,
        };
        Ok(response)
    }
}

#[async_trait]
impl PeerTransport for MockPeerTransport {
    async fn call_peer(
        &self,
        group: GroupId,
        request: PeerRequest,
    ) -> Result<(PeerAddress, PeerResponse), TransportError> {
        if group != self.group {
            return Err(TransportError::NoPeerForGroup(group));
        }
        let response = self.answer(request)?;
        Ok((self.peer.clone(), response))
    }

    async fn call_address(
        &self,
        address: &PeerAddress,
        request: PeerRequest,
    ) -> Result<PeerResponse, TransportError> {
        if *address != self.peer {
            return Err(TransportError::Unreachable(address.to_string()));
        }
        self.answer(request)
    }

    async fn broadcast_group(
        &self,
        group: GroupId,
        message: GossipMessage,
        exclude: Option<&PeerAddress>,
    ) -> usize {
        self.sent.lock().push(SentGossip {
            group: Some(group),
            message,
            exclude: exclude.cloned(),
        });
        usize::from(group == self.group && exclude != Some(&self.peer))
    }

    async fn broadcast_all(&self, message: GossipMessage, exclude: Option<&PeerAddress>) -> usize {
        self.sent.lock().push(SentGossip {
            group: None,
            message,
            exclude: exclude.cloned(),
        });
        usize::from(exclude != Some(&self.peer))
    }
}
