//! # Devnet
//!
//! The layout the `node-runtime` binary starts: a founder serving every
//! group plus followers serving windows of them. Only the founder mines
//! here, so every follower must end up with the founder's tip in each
//! group it serves.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use node_runtime::{GroupTip, LocalNetwork, Node, NodeConfig};
    use sl_01_group_router::GroupConfig;
    use std::collections::HashMap;

    fn devnet() -> Vec<NodeConfig> {
        let mut base = NodeConfig::for_testing("dev");
        base.groups = GroupConfig {
            base_group: 0,
            group_num: 2,
            max_group_num: 4,
        };
        base.devnet_nodes = 3;
        base.mining.enabled = true;
        base.mining.interval_ms = 100;
        base.mining.mining_addresses = vec![address_of(&key_in_group(0, 4, 0))];

        let mut configs = base.devnet();
        for follower in configs.iter_mut().skip(1) {
            follower.mining.enabled = false;
        }
        configs
    }

    async fn in_sync(founder: &Node, followers: &[Node]) -> bool {
        let Ok(tips) = founder.tips().await else {
            return false;
        };
        let by_group: HashMap<_, GroupTip> = tips.into_iter().map(|tip| (tip.group, tip)).collect();
        for follower in followers {
            let Ok(tips) = follower.tips().await else {
                return false;
            };
            if tips.iter().any(|tip| by_group.get(&tip.group) != Some(tip)) {
                return false;
            }
        }
        true
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_followers_track_mining_founder() {
        let network = LocalNetwork::new();
        let mut nodes = Vec::new();
        for config in devnet() {
            let node = Node::new(config, network.clone()).unwrap();
            node.initialize().await.unwrap();
            node.start().unwrap();
            nodes.push(node);
        }
        let (founder, followers) = nodes.split_first().unwrap();
        assert_eq!(followers[0].state().served_groups(), vec![0, 1]);
        assert_eq!(followers[1].state().served_groups(), vec![1, 2]);

        assert!(
            eventually(|| async move {
                founder
                    .tips()
                    .await
                    .unwrap()
                    .iter()
                    .all(|tip| tip.height >= Some(2))
            })
            .await
        );
        assert!(eventually(|| async move { in_sync(founder, followers).await }).await);

        for node in &nodes {
            node.shutdown().await;
        }
        assert!(network.peers().is_empty());
    }
}
