//! # Sync Engine
//!
//! Drives bootstrap, handshake and reconciliation for the node's groups and
//! answers the read requests peers use to do the same against us.
//!
//! ## Reconciliation
//!
//! 1. Take the group's exclusive lock.
//! 2. Binary-search the highest height `r` where local and peer agree.
//! 3. Snapshot the tip, move the tip pointer down to `r`.
//! 4. Fetch `[r+1, H]` anchored at the hash of `r`; on failure put the tip
//!    back and stop.
//! 5. Roll back local blocks above `r`, highest first.
//! 6. Replay fetched blocks while each chains onto the running tip.

use crate::algorithms::DivergenceSearch;
use crate::config::SyncConfig;
use crate::domain::{GroupContext, GroupLedger, NodeState, ReconcileOutcome, SyncError};
use crate::ports::{expect_response, PeerTransport};
use shared_types::{
    hash_prefix, Block, GroupId, Hash, PeerAddress, PeerRequest, PeerResponse, RequestError,
    TransportError, VersionInfo,
};
use sl_02_chain_store::ChainStoreError;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Chain synchronization for every group a node serves.
#[derive(Clone)]
pub struct SyncEngine {
    state: Arc<NodeState>,
    transport: Arc<dyn PeerTransport>,
    config: SyncConfig,
}

fn unavailable(err: impl Display) -> RequestError {
    error!("[sl-06] failed to read local state: {}", err);
    RequestError::Unavailable(err.to_string())
}

impl SyncEngine {
    /// Create an engine over `state`, reaching peers through `transport`.
    pub fn new(state: Arc<NodeState>, transport: Arc<dyn PeerTransport>, config: SyncConfig) -> Self {
        Self {
            state,
            transport,
            config,
        }
    }

    /// Node state.
    pub fn state(&self) -> &Arc<NodeState> {
        &self.state
    }

    /// Peer transport.
    pub fn transport(&self) -> &Arc<dyn PeerTransport> {
        &self.transport
    }

    /// Configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Local `(height, genesis, tip)` of `group`, `None` before genesis.
    pub async fn local_version(&self, group: GroupId) -> Result<Option<VersionInfo>, SyncError> {
        let context = self.state.group(group)?;
        let ledger = context.read().await;
        ledger.version_info()
    }

    // =========================================================================
    // PEER CALLS
    // =========================================================================

    async fn fetch_genesis(&self, group: GroupId) -> Result<Block, SyncError> {
        let (peer, response) = self
            .transport
            .call_peer(group, PeerRequest::GetGenesis { group })
            .await?;
        match expect_response(response)? {
            PeerResponse::Genesis(block) => {
                debug!("[sl-06] group {} genesis received from {}", group, peer);
                Ok(block)
            }
            _ => Err(TransportError::UnexpectedResponse.into()),
        }
    }

    /// Peer's hash at `height`; `None` when the peer has no block there.
    async fn fetch_hash(
        &self,
        peer: &PeerAddress,
        group: GroupId,
        height: u32,
    ) -> Result<Option<Hash>, SyncError> {
        let response = self
            .transport
            .call_address(peer, PeerRequest::GetHash { group, height })
            .await?;
        match expect_response(response) {
            Ok(PeerResponse::Hash(hash)) => Ok(Some(hash)),
            Ok(_) => Err(TransportError::UnexpectedResponse.into()),
            Err(TransportError::Rejected(RequestError::NoSuchBlock)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Peer's blocks `(anchor_height, to]`, checked to chain onto `anchor`.
    async fn fetch_range(
        &self,
        peer: &PeerAddress,
        group: GroupId,
        anchor_height: u32,
        to: u32,
        anchor: Hash,
    ) -> Result<Vec<Block>, SyncError> {
        let from = anchor_height + 1;
        let request = PeerRequest::GetBlocks {
            group,
            from,
            to,
            expected_prev_hash: anchor,
        };
        let response = self.transport.call_address(peer, request).await?;
        let PeerResponse::Blocks(blocks) = expect_response(response)? else {
            return Err(TransportError::UnexpectedResponse.into());
        };

        let first = blocks.first().ok_or(SyncError::EmptyRange(from))?;
        if first.height != from || first.prev_hash != anchor {
            return Err(SyncError::AnchorMismatch(anchor_height));
        }
        Ok(blocks)
    }

    async fn exchange_version(
        &self,
        group: GroupId,
        local: VersionInfo,
    ) -> Result<(PeerAddress, VersionInfo), SyncError> {
        let (peer, response) = self
            .transport
            .call_peer(group, PeerRequest::Version(local))
            .await?;
        match expect_response(response)? {
            PeerResponse::Version(info) if info.group == group => Ok((peer, info)),
            _ => Err(TransportError::UnexpectedResponse.into()),
        }
    }

    // =========================================================================
    // BOOTSTRAP / HANDSHAKE
    // =========================================================================

    /// Obtain a genesis for `group` if it has none, retrying with a fixed
    /// delay. Returns whether a genesis was installed by this call.
    pub async fn bootstrap(&self, group: GroupId) -> Result<bool, SyncError> {
        let context = self.state.group(group)?;
        if context.read().await.height()?.is_some() {
            return Ok(false);
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.fetch_genesis(group).await {
                Ok(genesis) => {
                    let mut ledger = context.write().await;
                    match ledger.install_genesis(&genesis, self.config.min_difficulty_bits) {
                        Ok(installed) => {
                            drop(ledger);
                            if installed {
                                self.state.record_head(&genesis)?;
                            }
                            return Ok(installed);
                        }
                        Err(
                            err @ (SyncError::Relay(_)
                            | SyncError::WrongGroup { .. }
                            | SyncError::NotGenesis(_)),
                        ) => {
                            warn!("[sl-06] group {}: rejected genesis: {}", group, err);
                        }
                        Err(err) => return Err(err),
                    }
                }
                Err(err) => {
                    warn!(
                        "[sl-06] group {}: genesis fetch attempt {} failed: {}",
                        group, attempts, err
                    );
                }
            }

            if !self.config.may_retry(attempts) {
                return Err(SyncError::BootstrapExhausted { group, attempts });
            }
            tokio::time::sleep(self.config.retry_delay()).await;
        }
    }

    /// Exchange version summaries with any peer of `group`, retrying with a
    /// fixed delay. Returns the answering peer and its summary.
    pub async fn handshake(&self, group: GroupId) -> Result<(PeerAddress, VersionInfo), SyncError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let local = self
                .local_version(group)
                .await?
                .ok_or(SyncError::NoGenesis(group))?;

            match self.exchange_version(group, local).await {
                Ok((peer, remote)) => {
                    debug!(
                        "[sl-06] group {}: {} is at height {} (tip {})",
                        group,
                        peer,
                        remote.height,
                        hash_prefix(&remote.tip_hash)
                    );
                    return Ok((peer, remote));
                }
                Err(err) => {
                    warn!(
                        "[sl-06] group {}: handshake attempt {} failed: {}",
                        group, attempts, err
                    );
                }
            }

            if !self.config.may_retry(attempts) {
                return Err(SyncError::HandshakeExhausted { group, attempts });
            }
            tokio::time::sleep(self.config.retry_delay()).await;
        }
    }

    /// Bootstrap, handshake, then reconcile against the answering peer.
    pub async fn synchronize(&self, group: GroupId) -> Result<ReconcileOutcome, SyncError> {
        self.bootstrap(group).await?;
        let (peer, remote) = self.handshake(group).await?;
        self.reconcile(group, remote.height, &peer).await
    }

    /// [`SyncEngine::synchronize`] for every served group, in window order.
    pub async fn synchronize_all(&self) -> Vec<(GroupId, Result<ReconcileOutcome, SyncError>)> {
        let mut results = Vec::new();
        for group in self.state.served_groups() {
            results.push((group, self.synchronize(group).await));
        }
        results
    }

    // =========================================================================
    // RECONCILIATION
    // =========================================================================

    /// Bring `group` in line with `peer`, which claims height `peer_height`.
    ///
    /// No-op unless the peer is strictly ahead. A failed fetch leaves the
    /// chain and UTXO set exactly as they were.
    pub async fn reconcile(
        &self,
        group: GroupId,
        peer_height: u32,
        peer: &PeerAddress,
    ) -> Result<ReconcileOutcome, SyncError> {
        let context = self.state.group(group)?;
        let mut ledger = context.write().await;

        let Some(local_height) = ledger.height()? else {
            return Ok(ReconcileOutcome::NoGenesis);
        };
        if peer_height <= local_height {
            return Ok(ReconcileOutcome::UpToDate);
        }
        info!(
            "[sl-06] group {}: reconciling height {} against {} at height {}",
            group, local_height, peer, peer_height
        );

        let mut search = DivergenceSearch::new(local_height);
        while let Some(height) = search.next_probe() {
            let remote = self.fetch_hash(peer, group, height).await?;
            let local = ledger.chain.hash_at(height)?;
            search.record(height, remote.is_some() && remote == local);
        }
        let Some(divergence) = search.result() else {
            warn!(
                "[sl-06] group {}: {} does not share our genesis, not reconciling",
                group, peer
            );
            return Ok(ReconcileOutcome::TotalDivergence);
        };

        let origin = ledger.chain.tip_hash()?.ok_or(ChainStoreError::Empty)?;
        let anchor = ledger
            .chain
            .hash_at(divergence)?
            .ok_or_else(|| ChainStoreError::Corrupt(format!("no block at height {divergence}")))?;
        let detaching = divergence < local_height;
        if detaching {
            ledger.chain.set_tip(&anchor)?;
        }

        let fetched = match self
            .fetch_range(peer, group, divergence, peer_height, anchor)
            .await
        {
            Ok(blocks) => blocks,
            Err(err) => {
                if detaching {
                    ledger.chain.set_tip(&origin)?;
                }
                warn!(
                    "[sl-06] group {}: fetching blocks above {} from {} failed: {}",
                    group, divergence, peer, err
                );
                return Err(err);
            }
        };

        let rolled_back = self.roll_back(&context, &mut ledger, origin, anchor)?;

        let mut applied = 0;
        let mut tip = anchor;
        for block in &fetched {
            if block.prev_hash != tip {
                debug!(
                    "[sl-06] group {}: replay stopped at height {}, gap in fetched range",
                    group, block.height
                );
                break;
            }
            if let Err(err) = ledger.apply_block(block, self.config.min_difficulty_bits) {
                warn!(
                    "[sl-06] group {}: replay stopped at height {}: {}",
                    group, block.height, err
                );
                break;
            }
            context.purge_mempool(block);
            if let Err(err) = self.state.record_head(block) {
                warn!("[sl-06] group {}: head not recorded: {}", group, err);
            }
            tip = block.hash();
            applied += 1;
        }

        info!(
            "[sl-06] group {}: reconciled at {}, rolled back {}, applied {}, tip {}",
            group,
            divergence,
            rolled_back,
            applied,
            hash_prefix(&tip)
        );
        Ok(ReconcileOutcome::Reconciled {
            divergence,
            rolled_back,
            applied,
        })
    }

    /// Undo detached blocks from `origin` down to (excluding) `anchor`,
    /// children before parents.
    fn roll_back(
        &self,
        context: &GroupContext,
        ledger: &mut GroupLedger,
        origin: Hash,
        anchor: Hash,
    ) -> Result<u32, SyncError> {
        let mut rolled_back = 0;
        let mut cursor = origin;
        while cursor != anchor {
            let block = ledger
                .chain
                .block_by_hash(&cursor)?
                .ok_or(ChainStoreError::UnknownBlock(cursor))?;
            if let Err(err) = ledger.utxo.reverse(&block) {
                error!(
                    "[sl-06] group {}: cannot reverse block {} at height {}: {}",
                    context.group(),
                    hash_prefix(&cursor),
                    block.height,
                    err
                );
                return Err(err.into());
            }
            ledger.chain.remove_detached(&cursor)?;
            cursor = block.prev_hash;
            rolled_back += 1;
        }
        Ok(rolled_back)
    }

    // =========================================================================
    // SERVING
    // =========================================================================

    fn served(&self, group: GroupId) -> Result<Arc<GroupContext>, RequestError> {
        self.state
            .group(group)
            .map_err(|_| RequestError::GroupNotServed)
    }

    /// Answer `GetGenesis`.
    pub async fn serve_get_genesis(&self, group: GroupId) -> Result<Block, RequestError> {
        let context = self.served(group)?;
        let ledger = context.read().await;
        ledger
            .chain
            .genesis()
            .map_err(unavailable)?
            .ok_or(RequestError::NoGenesis)
    }

    /// Answer `GetHash`.
    pub async fn serve_get_hash(&self, group: GroupId, height: u32) -> Result<Hash, RequestError> {
        let context = self.served(group)?;
        let ledger = context.read().await;
        ledger
            .chain
            .hash_at(height)
            .map_err(unavailable)?
            .ok_or(RequestError::NoSuchBlock)
    }

    /// Answer `GetBlocks`: active blocks `from..=to` (clipped to the tip),
    /// only if the block at `from - 1` is `expected_prev_hash`.
    pub async fn serve_get_blocks(
        &self,
        group: GroupId,
        from: u32,
        to: u32,
        expected_prev_hash: Hash,
    ) -> Result<Vec<Block>, RequestError> {
        if from == 0 {
            return Err(RequestError::InvalidRequest("height 0 use GetGenesis".into()));
        }
        if to < from {
            return Err(RequestError::InvalidRequest(format!("empty range {from}..={to}")));
        }

        let context = self.served(group)?;
        let ledger = context.read().await;
        if ledger.chain.hash_at(from - 1).map_err(unavailable)? != Some(expected_prev_hash) {
            return Err(RequestError::NoSuchBlock);
        }
        let blocks = ledger
            .chain
            .blocks_in_range(from, to)
            .map_err(unavailable)?;
        if blocks.is_empty() {
            return Err(RequestError::NoSuchBlock);
        }
        Ok(blocks)
    }

    /// Answer `Version`. A requester that is ahead of us triggers a
    /// detached reconciliation against it.
    pub async fn serve_version(
        &self,
        from: &PeerAddress,
        remote: VersionInfo,
    ) -> Result<VersionInfo, RequestError> {
        let group = remote.group;
        let context = self.served(group)?;
        let local = context
            .read()
            .await
            .version_info()
            .map_err(unavailable)?
            .ok_or(RequestError::NoGenesis)?;

        if local.genesis_hash != remote.genesis_hash {
            debug!(
                "[sl-06] group {}: {} has genesis {}, ours is {}",
                group,
                from,
                hash_prefix(&remote.genesis_hash),
                hash_prefix(&local.genesis_hash)
            );
            return Err(RequestError::GenesisMismatch);
        }

        if remote.height > local.height {
            let engine = self.clone();
            let peer = from.clone();
            tokio::spawn(async move {
                match engine.reconcile(group, remote.height, &peer).await {
                    Ok(outcome) => debug!("[sl-06] group {}: {:?}", group, outcome),
                    Err(err) => warn!(
                        "[sl-06] group {}: reconciliation against {} failed: {}",
                        group, peer, err
                    ),
                }
            });
        }
        Ok(local)
    }
}
