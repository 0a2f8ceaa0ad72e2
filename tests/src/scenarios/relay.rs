//! # Cross-Group Relay
//!
//! Two groups. The founder serves both; `node-b` serves group 1 only.
//! Alice (group 0) pays bob (group 1). The block carrying the payment is
//! mined in group 0, and `node-b` learns about bob's output through a
//! relay proof checked against group 0's block head.
//!
//! A relay that arrives before its head is a transient miss; the same
//! relay succeeds once the head has been gossiped.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use node_runtime::{LocalNetwork, Node};
    use shared_types::Block;
    use sl_01_group_router::GroupConfig;
    use sl_05_merkle_relay::build_relay;
    use sl_07_gossip::GossipOutcome;
    use std::sync::Arc;

    const MAX_GROUPS: u32 = 2;

    fn both_groups() -> GroupConfig {
        GroupConfig {
            base_group: 0,
            group_num: 2,
            max_group_num: MAX_GROUPS,
        }
    }

    fn group_one() -> GroupConfig {
        GroupConfig {
            base_group: 1,
            group_num: 1,
            max_group_num: MAX_GROUPS,
        }
    }

    struct Setup {
        _network: Arc<LocalNetwork>,
        founder: Node,
        b: Node,
        payment: Block,
    }

    async fn setup() -> Setup {
        let alice = key_in_group(0, MAX_GROUPS, 0);
        let bob = key_in_group(1, MAX_GROUPS, 0);
        let network = LocalNetwork::new();
        let founder = start(&network, founder_config("founder", both_groups(), &alice)).await;
        let b = start(&network, follower_config("node-b", group_one())).await;

        let txn = {
            let context = founder.state().group(0).unwrap();
            let ledger = context.read().await;
            ledger
                .utxo
                .new_transfer(&alice, bob.pub_key_hash(), 4, |_| false)
                .unwrap()
        };
        let payment = forge(&founder, 0, &alice.pub_key_hash(), vec![txn]).await;
        append(&founder, &payment).await;
        Setup {
            _network: network,
            founder,
            b,
            payment,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_relay_waits_for_its_head() {
        let Setup {
            founder, b, payment, ..
        } = setup().await;
        let relay = build_relay(&payment, 1, 1).unwrap();
        let gossip = b.service().gossip();

        assert_eq!(
            gossip.handle_relay(founder.address(), relay.clone()).await.unwrap(),
            GossipOutcome::MissingHead {
                group: 0,
                height: 1
            }
        );
        assert!(b.state().group(1).unwrap().mempool().is_empty());

        assert_eq!(
            gossip.handle_head(founder.address(), payment.head()).await.unwrap(),
            GossipOutcome::Accepted
        );
        assert_eq!(
            gossip.handle_relay(founder.address(), relay.clone()).await.unwrap(),
            GossipOutcome::Accepted
        );
        assert!(b.state().group(1).unwrap().mempool().contains(&relay.txn.hash()));
        assert_eq!(
            gossip.handle_relay(founder.address(), relay.clone()).await.unwrap(),
            GossipOutcome::Duplicate
        );

        // Mining the relayed payment in group 1 credits bob there.
        let bob = key_in_group(1, MAX_GROUPS, 0);
        let block = forge(&b, 1, &bob.pub_key_hash(), vec![relay.txn]).await;
        append(&b, &block).await;
        assert!(b.state().group(1).unwrap().mempool().is_empty());
        assert_eq!(
            b.service().get_balance(&address_of(&bob)).await,
            Ok(4 + REWARD)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_tampered_relay_is_rejected() {
        let Setup {
            founder, b, payment, ..
        } = setup().await;
        let gossip = b.service().gossip();
        gossip.handle_head(founder.address(), payment.head()).await.unwrap();

        let mut relay = build_relay(&payment, 1, 1).unwrap();
        relay.txn.vout[0].value += 1;
        assert!(matches!(
            gossip.handle_relay(founder.address(), relay).await.unwrap(),
            GossipOutcome::Rejected(_)
        ));

        // Group 0 is not served here, so a plain txn for it goes nowhere.
        let txn = build_relay(&payment, 1, 1).unwrap().txn;
        assert_eq!(
            gossip.handle_txn(founder.address(), 0, txn).await.unwrap(),
            GossipOutcome::NotServed
        );
        assert!(b.state().group(1).unwrap().mempool().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_relay_into_source_group_is_rejected() {
        let Setup {
            founder, payment, ..
        } = setup().await;
        let relay = build_relay(&payment, 1, 0).unwrap();
        assert!(matches!(
            founder
                .service()
                .gossip()
                .handle_relay(&"node-b".into(), relay)
                .await
                .unwrap(),
            GossipOutcome::Rejected(_)
        ));
    }
}
