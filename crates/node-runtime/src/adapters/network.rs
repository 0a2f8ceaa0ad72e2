//! # In-Process Peer Network
//!
//! Every node of a devnet registers its request handler with one shared
//! [`LocalNetwork`] and reaches the others through its own
//! [`LocalTransport`]. A transport never delivers to its own node.
//!
//! Requests run the peer's handler on the caller's task. Gossip is handed
//! to one spawned task per recipient, so a sender never waits on the
//! handlers it feeds.

use async_trait::async_trait;
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use shared_types::{GossipMessage, GroupId, PeerAddress, PeerRequest, PeerResponse, TransportError};
use sl_06_chain_sync::{PeerRequestHandler, PeerTransport};
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use tracing::{info, trace};

type Handler = Arc<dyn PeerRequestHandler>;

struct Registration {
    handler: Weak<dyn PeerRequestHandler>,
    groups: Vec<GroupId>,
    online: bool,
}

/// Registry of in-process peers.
///
/// Holds handlers weakly: a node that is dropped simply becomes
/// unreachable.
#[derive(Default)]
pub struct LocalNetwork {
    peers: RwLock<BTreeMap<PeerAddress, Registration>>,
}

impl LocalNetwork {
    /// Empty network.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `handler` as serving `groups`, replacing any earlier
    /// registration under its address.
    pub fn register(&self, handler: &Handler, groups: Vec<GroupId>) {
        let address = handler.address().clone();
        info!("[runtime] peer {} joined, serving groups {:?}", address, groups);
        self.peers.write().insert(
            address,
            Registration {
                handler: Arc::downgrade(handler),
                groups,
                online: true,
            },
        );
    }

    /// Forget a peer.
    pub fn unregister(&self, address: &PeerAddress) -> bool {
        self.peers.write().remove(address).is_some()
    }

    /// Cut a peer off (or reconnect it) without forgetting it.
    pub fn set_online(&self, address: &PeerAddress, online: bool) {
        if let Some(peer) = self.peers.write().get_mut(address) {
            peer.online = online;
        }
    }

    /// Registered addresses.
    pub fn peers(&self) -> Vec<PeerAddress> {
        self.peers.read().keys().cloned().collect()
    }

    /// Transport for the node at `local`.
    pub fn transport(self: &Arc<Self>, local: PeerAddress) -> LocalTransport {
        LocalTransport {
            network: Arc::clone(self),
            local,
        }
    }

    fn handler(&self, address: &PeerAddress) -> Option<Handler> {
        let peers = self.peers.read();
        let peer = peers.get(address)?;
        if !peer.online {
            return None;
        }
        peer.handler.upgrade()
    }

    /// Online peers other than `local` and `exclude`, optionally only those
    /// serving `group`.
    fn candidates(
        &self,
        local: &PeerAddress,
        group: Option<GroupId>,
        exclude: Option<&PeerAddress>,
    ) -> Vec<(PeerAddress, Handler)> {
        self.peers
            .read()
            .iter()
            .filter(|(address, _)| *address != local && Some(*address) != exclude)
            .filter(|(_, peer)| peer.online)
            .filter(|(_, peer)| group.map_or(true, |group| peer.groups.contains(&group)))
            .filter_map(|(address, peer)| Some((address.clone(), peer.handler.upgrade()?)))
            .collect()
    }
}

/// One node's view of a [`LocalNetwork`].
#[derive(Clone)]
pub struct LocalTransport {
    network: Arc<LocalNetwork>,
    local: PeerAddress,
}

impl LocalTransport {
    /// Address of the owning node.
    pub fn local(&self) -> &PeerAddress {
        &self.local
    }

    fn deliver(&self, targets: Vec<(PeerAddress, Handler)>, message: GossipMessage) -> usize {
        let count = targets.len();
        for (address, handler) in targets {
            let from = self.local.clone();
            let message = message.clone();
            tokio::spawn(async move {
                let kind = message.kind();
                let response = handler.handle(&from, PeerRequest::Gossip(message)).await;
                trace!("[runtime] {} {} -> {}: {:?}", kind, from, address, response);
            });
        }
        count
    }
}

#[async_trait]
impl PeerTransport for LocalTransport {
    async fn call_peer(
        &self,
        group: GroupId,
        request: PeerRequest,
    ) -> Result<(PeerAddress, PeerResponse), TransportError> {
        let chosen = self
            .network
            .candidates(&self.local, Some(group), None)
            .choose(&mut rand::thread_rng())
            .cloned();
        let (address, handler) = chosen.ok_or(TransportError::NoPeerForGroup(group))?;
        let response = handler.handle(&self.local, request).await;
        Ok((address, response))
    }

    async fn call_address(
        &self,
        address: &PeerAddress,
        request: PeerRequest,
    ) -> Result<PeerResponse, TransportError> {
        let handler = if *address == self.local {
            None
        } else {
            self.network.handler(address)
        };
        let handler = handler.ok_or_else(|| TransportError::Unreachable(address.to_string()))?;
        Ok(handler.handle(&self.local, request).await)
    }

    async fn broadcast_group(
        &self,
        group: GroupId,
        message: GossipMessage,
        exclude: Option<&PeerAddress>,
    ) -> usize {
        let targets = self.network.candidates(&self.local, Some(group), exclude);
        self.deliver(targets, message)
    }

    async fn broadcast_all(&self, message: GossipMessage, exclude: Option<&PeerAddress>) -> usize {
        let targets = self.network.candidates(&self.local, None, exclude);
        self.deliver(targets, message)
    }
}
