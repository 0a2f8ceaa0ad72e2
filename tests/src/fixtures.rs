//! Shared scenario setup.
//!
//! Blocks are forged here and written straight into a node's ledger, which
//! lets a test build diverging chains on nodes that share a network without
//! gossip merging them first.

use async_trait::async_trait;
use node_runtime::{LocalNetwork, Node, NodeConfig};
use parking_lot::Mutex;
use shared_crypto::{encode_address, PubKeyHash, Secp256k1KeyPair};
use shared_types::{
    Block, GroupId, PeerAddress, PeerRequest, PeerResponse, RequestError, Transaction,
};
use sl_01_group_router::{group_of, GroupConfig};
use sl_05_merkle_relay::commit_body;
use sl_06_chain_sync::PeerRequestHandler;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const REWARD: i64 = 10;

/// Raw contents of a group's chain and UTXO stores.
pub type Snapshot = (Vec<(Vec<u8>, Vec<u8>)>, Vec<(Vec<u8>, Vec<u8>)>);

pub fn key(seed: u8) -> Secp256k1KeyPair {
    Secp256k1KeyPair::from_bytes([seed; 32]).unwrap()
}

pub fn key_in_group(group: GroupId, max_group_num: u32, skip: usize) -> Secp256k1KeyPair {
    (1u8..=255)
        .map(key)
        .filter(|key| group_of(&key.pub_key_hash(), max_group_num) == group)
        .nth(skip)
        .unwrap()
}

pub fn address_of(key: &Secp256k1KeyPair) -> String {
    encode_address(&key.pub_key_hash())
}

/// One group, served by everybody.
pub fn single_group() -> GroupConfig {
    GroupConfig {
        base_group: 0,
        group_num: 1,
        max_group_num: 1,
    }
}

pub fn founder_config(address: &str, groups: GroupConfig, owner: &Secp256k1KeyPair) -> NodeConfig {
    let mut config = NodeConfig::for_testing(address);
    config.founder = true;
    config.groups = groups;
    config.mining.reward = REWARD;
    config.mining.mining_addresses = vec![address_of(owner)];
    config
}

pub fn follower_config(address: &str, groups: GroupConfig) -> NodeConfig {
    let mut config = NodeConfig::for_testing(address);
    config.groups = groups;
    config
}

pub async fn start(network: &Arc<LocalNetwork>, config: NodeConfig) -> Node {
    let node = Node::new(config, Arc::clone(network)).unwrap();
    node.initialize().await.unwrap();
    node
}

pub async fn tip(node: &Node, group: GroupId) -> Block {
    let context = node.state().group(group).unwrap();
    let ledger = context.read().await;
    ledger.chain.tip().unwrap().unwrap()
}

pub async fn hash_at(node: &Node, group: GroupId, height: u32) -> Option<shared_types::Hash> {
    let context = node.state().group(group).unwrap();
    let ledger = context.read().await;
    ledger.chain.hash_at(height).unwrap()
}

/// Block on top of `node`'s tip paying `owner`, carrying `txns` after the
/// coinbase. Not applied anywhere.
pub async fn forge(node: &Node, group: GroupId, owner: &PubKeyHash, txns: Vec<Transaction>) -> Block {
    let parent = tip(node, group).await;
    let height = parent.height + 1;
    let mut body = vec![Transaction::coinbase(*owner, REWARD, group, height)];
    body.extend(txns);
    commit_body(Block {
        group,
        height,
        prev_hash: parent.hash(),
        timestamp: parent.timestamp + 1,
        bits: 0,
        nonce: 0,
        txns: body,
        ..Block::default()
    })
}

/// Write `block` onto `node`'s tip the way an accepted block lands.
pub async fn append(node: &Node, block: &Block) {
    let context = node.state().group(block.group).unwrap();
    context.write().await.apply_block(block, 0).unwrap();
    context.purge_mempool(block);
    node.state().record_head(block).unwrap();
}

/// Forge and append `count` coinbase-only blocks on `node`.
pub async fn extend(node: &Node, group: GroupId, owner: &PubKeyHash, count: u32) -> Vec<Block> {
    let mut blocks = Vec::new();
    for _ in 0..count {
        let block = forge(node, group, owner, Vec::new()).await;
        append(node, &block).await;
        blocks.push(block);
    }
    blocks
}

pub async fn snapshot(node: &Node, group: GroupId) -> Snapshot {
    let context = node.state().group(group).unwrap();
    let ledger = context.read().await;
    (
        ledger.chain.store().prefix_scan(b"").unwrap(),
        ledger.utxo.store().prefix_scan(b"").unwrap(),
    )
}

/// Poll `check` until it holds or a few seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..500 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Peer that answers like `inner` but refuses every `GetBlocks`.
pub struct FlakyPeer {
    address: PeerAddress,
    inner: Arc<dyn PeerRequestHandler>,
    refused: Mutex<u32>,
}

impl FlakyPeer {
    pub fn new(address: &str, inner: Arc<dyn PeerRequestHandler>) -> Arc<Self> {
        Arc::new(Self {
            address: address.into(),
            inner,
            refused: Mutex::new(0),
        })
    }

    pub fn refused(&self) -> u32 {
        *self.refused.lock()
    }
}

#[async_trait]
impl PeerRequestHandler for FlakyPeer {
    async fn handle(&self, from: &PeerAddress, request: PeerRequest) -> PeerResponse {
        if matches!(request, PeerRequest::GetBlocks { .. }) {
            *self.refused.lock() += 1;
            return PeerResponse::Error(RequestError::Unavailable("disk offline".into()));
        }
        self.inner.handle(from, request).await
    }

    fn address(&self) -> &PeerAddress {
        &self.address
    }
}
