//! # Gossip Service
//!
//! The four inbound gossip handlers. Each one:
//!
//! 1. drops messages for groups this node does not serve,
//! 2. takes its kind's admission lock,
//! 3. drops what is already known,
//! 4. validates and applies,
//! 5. re-gossips in the background, excluding the sender.

use crate::domain::{GossipError, GossipOutcome};
use shared_types::{
    hash_prefix, Block, BlockHead, GossipMessage, GroupId, PeerAddress, PeerRequest, RelayTxn,
    Transaction,
};
use sl_04_mempool::EntryKind;
use sl_05_merkle_relay::{verify_head, verify_relay};
use sl_06_chain_sync::{GroupContext, SyncEngine};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

enum BlockAction {
    Bootstrap,
    Duplicate,
    ReverseGossip(Block),
    Applied,
    Rejected(String),
    Reconcile,
}

/// Inbound gossip handlers of one node.
pub struct GossipService {
    address: PeerAddress,
    engine: SyncEngine,
    txn_lock: Mutex<()>,
    relay_lock: Mutex<()>,
    block_lock: Mutex<()>,
    head_lock: Mutex<()>,
}

impl GossipService {
    /// Handlers for the node reachable at `address`.
    pub fn new(address: PeerAddress, engine: SyncEngine) -> Self {
        Self {
            address,
            engine,
            txn_lock: Mutex::new(()),
            relay_lock: Mutex::new(()),
            block_lock: Mutex::new(()),
            head_lock: Mutex::new(()),
        }
    }

    /// This node's address.
    pub fn address(&self) -> &PeerAddress {
        &self.address
    }

    /// Sync engine used for gaps and bootstrap.
    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    fn served(&self, group: GroupId) -> Option<Arc<GroupContext>> {
        self.engine.state().group(group).ok()
    }

    fn min_bits(&self) -> u32 {
        self.engine.config().min_difficulty_bits
    }

    /// Dispatch one message to its handler.
    pub async fn handle(
        &self,
        from: &PeerAddress,
        message: GossipMessage,
    ) -> Result<GossipOutcome, GossipError> {
        match message {
            GossipMessage::Txn { group, txn } => self.handle_txn(from, group, txn).await,
            GossipMessage::RelayTxn(relay) => self.handle_relay(from, relay).await,
            GossipMessage::Block(block) => self.handle_block(from, block).await,
            GossipMessage::BlockHead(head) => self.handle_head(from, head).await,
        }
    }

    // =========================================================================
    // RE-GOSSIP
    // =========================================================================

    fn regossip_group(&self, group: GroupId, message: GossipMessage, exclude: &PeerAddress) {
        let transport = Arc::clone(self.engine.transport());
        let exclude = exclude.clone();
        tokio::spawn(async move {
            let kind = message.kind();
            let sent = transport.broadcast_group(group, message, Some(&exclude)).await;
            debug!("[sl-07] {} re-gossiped to {} peers of group {}", kind, sent, group);
        });
    }

    fn regossip_all(&self, message: GossipMessage, exclude: &PeerAddress) {
        let transport = Arc::clone(self.engine.transport());
        let exclude = exclude.clone();
        tokio::spawn(async move {
            let kind = message.kind();
            let sent = transport.broadcast_all(message, Some(&exclude)).await;
            debug!("[sl-07] {} re-gossiped to {} peers", kind, sent);
        });
    }

    fn send_tip(&self, to: &PeerAddress, tip: Block) {
        let transport = Arc::clone(self.engine.transport());
        let to = to.clone();
        tokio::spawn(async move {
            let request = PeerRequest::Gossip(GossipMessage::Block(tip));
            if let Err(err) = transport.call_address(&to, request).await {
                debug!("[sl-07] could not send tip back to {}: {}", to, err);
            }
        });
    }

    // =========================================================================
    // TRANSACTIONS
    // =========================================================================

    /// Admit a loose transaction into `group`'s mempool.
    pub async fn handle_txn(
        &self,
        from: &PeerAddress,
        group: GroupId,
        txn: Transaction,
    ) -> Result<GossipOutcome, GossipError> {
        let Some(context) = self.served(group) else {
            debug!("[sl-07] txn for group {} dropped, not served", group);
            return Ok(GossipOutcome::NotServed);
        };
        let _admission = self.txn_lock.lock().await;

        let hash = txn.hash();
        if context.mempool().contains(&hash) {
            return Ok(GossipOutcome::Duplicate);
        }
        let ledger = context.read().await;
        if ledger.chain.contains_txn(&hash)? {
            return Ok(GossipOutcome::Duplicate);
        }

        let admitted = {
            let mut pool = context.mempool();
            match ledger.utxo.mem_verify_transaction(&txn, |outpoint| pool.is_claimed(outpoint)) {
                Ok(()) => pool
                    .add(txn.clone(), EntryKind::Local)
                    .map(|_| ())
                    .map_err(|err| err.to_string()),
                Err(err) if err.is_invariant_violation() => return Err(err.into()),
                Err(err) => Err(err.to_string()),
            }
        };
        drop(ledger);

        match admitted {
            Ok(()) => {
                debug!("[sl-07] group {} pooled txn {}", group, hash_prefix(&hash));
                self.regossip_group(group, GossipMessage::Txn { group, txn }, from);
                Ok(GossipOutcome::Accepted)
            }
            Err(reason) => {
                debug!(
                    "[sl-07] group {} dropped txn {}: {}",
                    group,
                    hash_prefix(&hash),
                    reason
                );
                Ok(GossipOutcome::Rejected(reason))
            }
        }
    }

    // =========================================================================
    // RELAYED TRANSACTIONS
    // =========================================================================

    /// Admit a transaction proven against another group's head.
    pub async fn handle_relay(
        &self,
        from: &PeerAddress,
        relay: RelayTxn,
    ) -> Result<GossipOutcome, GossipError> {
        let Some(context) = self.served(relay.to_group) else {
            debug!("[sl-07] relay for group {} dropped, not served", relay.to_group);
            return Ok(GossipOutcome::NotServed);
        };
        let router = self.engine.state().router();
        if !router.is_valid_group(relay.from_group) || relay.from_group == relay.to_group {
            return Ok(GossipOutcome::Rejected(format!(
                "relay from group {} into {}",
                relay.from_group, relay.to_group
            )));
        }
        if relay.txn.is_coinbase() {
            return Ok(GossipOutcome::Rejected("coinbases are not relayed".into()));
        }
        let _admission = self.relay_lock.lock().await;

        let hash = relay.txn.hash();
        if context.mempool().contains(&hash) {
            return Ok(GossipOutcome::Duplicate);
        }

        let head = self
            .engine
            .state()
            .heads()
            .read()
            .get(relay.from_group, relay.height)?;
        let Some(head) = head else {
            debug!(
                "[sl-07] relay {} waits for head of group {} at {}",
                hash_prefix(&hash),
                relay.from_group,
                relay.height
            );
            return Ok(GossipOutcome::MissingHead {
                group: relay.from_group,
                height: relay.height,
            });
        };
        if let Err(err) = verify_relay(&relay, &head) {
            debug!("[sl-07] relay {} rejected: {}", hash_prefix(&hash), err);
            return Ok(GossipOutcome::Rejected(err.to_string()));
        }

        let ledger = context.read().await;
        if ledger.chain.contains_txn(&hash)? {
            return Ok(GossipOutcome::Duplicate);
        }
        let admitted = {
            let mut pool = context.mempool();
            let mut conflict = None;
            for input in &relay.txn.vin {
                let Some(outpoint) = input.outpoint() else {
                    continue;
                };
                let spent_here =
                    ledger.utxo.tracks(&input.owner()) && !ledger.utxo.is_unspent(&outpoint)?;
                if pool.is_claimed(&outpoint) || spent_here {
                    conflict = Some(format!(
                        "output {}:{} unavailable",
                        hash_prefix(&outpoint.txn_hash),
                        outpoint.index
                    ));
                    break;
                }
            }
            match conflict {
                Some(reason) => Err(reason),
                None => {
                    let kind = EntryKind::Relayed {
                        from_group: relay.from_group,
                        height: relay.height,
                    };
                    pool.add(relay.txn.clone(), kind)
                        .map(|_| ())
                        .map_err(|err| err.to_string())
                }
            }
        };
        drop(ledger);

        match admitted {
            Ok(()) => {
                info!(
                    "[sl-07] group {} pooled relay {} from group {} height {}",
                    relay.to_group,
                    hash_prefix(&hash),
                    relay.from_group,
                    relay.height
                );
                let to_group = relay.to_group;
                self.regossip_group(to_group, GossipMessage::RelayTxn(relay), from);
                Ok(GossipOutcome::Accepted)
            }
            Err(reason) => Ok(GossipOutcome::Rejected(reason)),
        }
    }

    // =========================================================================
    // BLOCKS
    // =========================================================================

    /// Append a block that extends the tip; otherwise teach the sender or
    /// catch up with it.
    pub async fn handle_block(
        &self,
        from: &PeerAddress,
        block: Block,
    ) -> Result<GossipOutcome, GossipError> {
        let group = block.group;
        let Some(context) = self.served(group) else {
            debug!("[sl-07] block for group {} dropped, not served", group);
            return Ok(GossipOutcome::NotServed);
        };
        let _admission = self.block_lock.lock().await;

        let action = {
            let mut ledger = context.write().await;
            match ledger.chain.tip()? {
                None => BlockAction::Bootstrap,
                Some(tip) if block.height <= tip.height => {
                    if ledger.chain.hash_at(block.height)? == Some(block.hash()) {
                        BlockAction::Duplicate
                    } else {
                        BlockAction::ReverseGossip(tip)
                    }
                }
                Some(tip) if block.height == tip.height + 1 && block.prev_hash == tip.hash() => {
                    match ledger.apply_block(&block, self.min_bits()) {
                        Ok(()) => BlockAction::Applied,
                        Err(err) if err.is_rejection() => BlockAction::Rejected(err.to_string()),
                        Err(err) => return Err(err.into()),
                    }
                }
                Some(_) => BlockAction::Reconcile,
            }
        };

        match action {
            BlockAction::Bootstrap => {
                let engine = self.engine.clone();
                tokio::spawn(async move {
                    if let Err(err) = engine.synchronize(group).await {
                        warn!("[sl-07] group {}: bootstrap failed: {}", group, err);
                    }
                });
                Ok(GossipOutcome::Bootstrapping)
            }
            BlockAction::Duplicate => Ok(GossipOutcome::Duplicate),
            BlockAction::ReverseGossip(tip) => {
                if *from != self.address {
                    debug!(
                        "[sl-07] group {}: {} sent height {}, returning tip {}",
                        group, from, block.height, tip.height
                    );
                    self.send_tip(from, tip);
                }
                Ok(GossipOutcome::SenderBehind)
            }
            BlockAction::Applied => {
                context.purge_mempool(&block);
                self.engine.state().record_head(&block)?;
                info!(
                    "[sl-07] group {} accepted block {} at height {}",
                    group,
                    hash_prefix(&block.hash()),
                    block.height
                );
                self.regossip_group(group, GossipMessage::Block(block), from);
                Ok(GossipOutcome::Accepted)
            }
            BlockAction::Rejected(reason) => {
                debug!(
                    "[sl-07] group {} rejected block at height {}: {}",
                    group, block.height, reason
                );
                Ok(GossipOutcome::Rejected(reason))
            }
            BlockAction::Reconcile => {
                info!(
                    "[sl-07] group {}: block at height {} from {} does not extend our tip",
                    group, block.height, from
                );
                let outcome = self.engine.reconcile(group, block.height, from).await?;
                Ok(GossipOutcome::Reconciled(outcome))
            }
        }
    }

    // =========================================================================
    // BLOCK HEADS
    // =========================================================================

    /// Store a self-verifying head of any group.
    pub async fn handle_head(
        &self,
        from: &PeerAddress,
        head: BlockHead,
    ) -> Result<GossipOutcome, GossipError> {
        if !self.engine.state().router().is_valid_group(head.group) {
            debug!("[sl-07] head for unknown group {} dropped", head.group);
            return Ok(GossipOutcome::NotServed);
        }
        let _admission = self.head_lock.lock().await;

        let head = head.head();
        if self
            .engine
            .state()
            .heads()
            .read()
            .contains(head.group, head.height)?
        {
            return Ok(GossipOutcome::Duplicate);
        }
        if let Err(err) = verify_head(&head, self.min_bits()) {
            debug!(
                "[sl-07] head of group {} at {} rejected: {}",
                head.group, head.height, err
            );
            return Ok(GossipOutcome::Rejected(err.to_string()));
        }
        if !self.engine.state().record_head(&head)? {
            return Ok(GossipOutcome::Duplicate);
        }

        debug!(
            "[sl-07] stored head {} of group {} at {}",
            hash_prefix(&head.hash()),
            head.group,
            head.height
        );
        self.regossip_all(GossipMessage::BlockHead(head), from);
        Ok(GossipOutcome::Accepted)
    }
}
