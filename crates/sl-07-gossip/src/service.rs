//! # Node Service
//!
//! Implements [`PeerRequestHandler`]: routes reads to the sync engine,
//! gossip to the handlers, and answers `GetBalance`. Also the local wallet
//! entry point for submitting transfers.

use crate::domain::{GossipError, GossipOutcome};
use crate::gossip::GossipService;
use async_trait::async_trait;
use shared_crypto::{address_to_pub_key_hash, Secp256k1KeyPair};
use shared_types::{GossipKind, Hash, PeerAddress, PeerRequest, PeerResponse, RequestError};
use sl_06_chain_sync::{NodeState, PeerRequestHandler, SyncEngine};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Everything one node answers to.
pub struct NodeService {
    gossip: GossipService,
}

impl NodeService {
    /// Service for the node at `address`.
    pub fn new(address: PeerAddress, engine: SyncEngine) -> Self {
        Self {
            gossip: GossipService::new(address, engine),
        }
    }

    /// Gossip handlers.
    pub fn gossip(&self) -> &GossipService {
        &self.gossip
    }

    /// Sync engine.
    pub fn engine(&self) -> &SyncEngine {
        self.gossip.engine()
    }

    /// Node state.
    pub fn state(&self) -> &Arc<NodeState> {
        self.engine().state()
    }

    /// Sum of unspent outputs owned by `address`, read from the group the
    /// address belongs to.
    pub async fn get_balance(&self, address: &str) -> Result<i64, RequestError> {
        let owner = address_to_pub_key_hash(address)
            .map_err(|err| RequestError::InvalidRequest(err.to_string()))?;
        let group = self.state().router().group_of(&owner);
        let context = self
            .state()
            .group(group)
            .map_err(|_| RequestError::GroupNotServed)?;
        let ledger = context.read().await;
        ledger
            .utxo
            .balance(&owner)
            .map_err(|err| RequestError::Unavailable(err.to_string()))
    }

    /// Build, sign and submit a payment of `amount` from `keypair` to
    /// `to`. Returns the transaction hash once it sits in the sender's
    /// group mempool.
    pub async fn transfer(
        &self,
        keypair: &Secp256k1KeyPair,
        to: &str,
        amount: i64,
    ) -> Result<Hash, GossipError> {
        let recipient = address_to_pub_key_hash(to)?;
        let group = self.state().router().group_of(&keypair.pub_key_hash());
        let context = self.state().group(group)?;

        let txn = {
            let ledger = context.read().await;
            let pool = context.mempool();
            ledger
                .utxo
                .new_transfer(keypair, recipient, amount, |outpoint| pool.is_claimed(outpoint))?
        };
        let hash = txn.hash();

        match self
            .gossip
            .handle_txn(self.gossip.address(), group, txn)
            .await?
        {
            GossipOutcome::Accepted => {
                info!("[sl-07] submitted transfer of {} to {} in group {}", amount, to, group);
                Ok(hash)
            }
            other => Err(GossipError::NotAdmitted(other)),
        }
    }

    fn log_gossip(&self, from: &PeerAddress, kind: GossipKind, result: &Result<GossipOutcome, GossipError>) {
        match result {
            Ok(outcome) => debug!("[sl-07] {} from {}: {:?}", kind, from, outcome),
            Err(err) if err.is_invariant_violation() => {
                error!("[sl-07] {} from {} hit corrupted state: {}", kind, from, err)
            }
            Err(err) => warn!("[sl-07] {} from {} failed: {}", kind, from, err),
        }
    }
}

fn respond<T>(result: Result<T, RequestError>, wrap: impl FnOnce(T) -> PeerResponse) -> PeerResponse {
    match result {
        Ok(value) => wrap(value),
        Err(err) => PeerResponse::Error(err),
    }
}

#[async_trait]
impl PeerRequestHandler for NodeService {
    async fn handle(&self, from: &PeerAddress, request: PeerRequest) -> PeerResponse {
        let engine = self.engine();
        match request {
            PeerRequest::GetGenesis { group } => {
                respond(engine.serve_get_genesis(group).await, PeerResponse::Genesis)
            }
            PeerRequest::GetHash { group, height } => {
                respond(engine.serve_get_hash(group, height).await, PeerResponse::Hash)
            }
            PeerRequest::GetBlocks {
                group,
                from: start,
                to,
                expected_prev_hash,
            } => respond(
                engine
                    .serve_get_blocks(group, start, to, expected_prev_hash)
                    .await,
                PeerResponse::Blocks,
            ),
            PeerRequest::Version(info) => {
                respond(engine.serve_version(from, info).await, PeerResponse::Version)
            }
            PeerRequest::GetBalance { address } => {
                respond(self.get_balance(&address).await, PeerResponse::Balance)
            }
            PeerRequest::Gossip(message) => {
                let kind = message.kind();
                let result = self.gossip.handle(from, message).await;
                self.log_gossip(from, kind, &result);
                PeerResponse::Accepted
            }
        }
    }

    fn address(&self) -> &PeerAddress {
        self.gossip.address()
    }
}
