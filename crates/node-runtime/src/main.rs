//! # Shard-Ledger Devnet
//!
//! Runs `SL_DEVNET_NODES` in-process peers over one `LocalNetwork`:
//! node 0 founds every group, the others bootstrap from it. Every node
//! mines to `SL_MINING_ADDRESS`; without one, a throwaway devnet wallet is
//! generated and its secret key logged.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults + `SL_*` environment)
//! 2. Validate it
//! 3. Start the founder, then the followers
//! 4. Log tips until Ctrl+C
//! 5. Shut every node down

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use node_runtime::telemetry::init_tracing;
use node_runtime::{load_config, LocalNetwork, Node};
use shared_crypto::{encode_address, Secp256k1KeyPair};
use shared_types::hash_prefix;

const TIP_LOG_INTERVAL: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let mut config = load_config();
    if config.mining.mining_addresses.is_empty() {
        let wallet = Secp256k1KeyPair::generate();
        let address = encode_address(&wallet.pub_key_hash());
        info!("Devnet wallet {} (secret {})", address, hex::encode(wallet.to_bytes()));
        config.mining.mining_addresses = vec![address];
        config.mining.enabled = true;
    }
    config.validate().context("invalid configuration")?;

    info!("===========================================");
    info!("  Shard-Ledger devnet v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "  {} node(s), {} group(s)",
        config.devnet_nodes, config.groups.max_group_num
    );
    info!("===========================================");

    let network = LocalNetwork::new();
    let mut nodes = Vec::new();
    for node_config in config.devnet() {
        let address = node_config.address.clone();
        let node = Node::new(node_config, network.clone())
            .with_context(|| format!("failed to create node {}", address))?;
        node.initialize()
            .await
            .with_context(|| format!("failed to initialize node {}", address))?;
        node.start()?;
        nodes.push(node);
    }

    info!("Devnet is running. Press Ctrl+C to stop.");
    let mut ticker = tokio::time::interval(TIP_LOG_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for node in &nodes {
                    for tip in node.tips().await? {
                        info!(
                            "{} group {}: height {:?} tip {}",
                            node.address(),
                            tip.group,
                            tip.height,
                            tip.hash.as_ref().map(hash_prefix).unwrap_or_default()
                        );
                    }
                }
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
        }
    }

    for node in &nodes {
        node.shutdown().await;
    }
    info!("Shutdown complete");
    Ok(())
}
