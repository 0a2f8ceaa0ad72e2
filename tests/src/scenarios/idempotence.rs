//! # Idempotent Gossip
//!
//! The second delivery of a block, transaction or head, from the same or
//! another sender, changes nothing. Neither does a later block carrying an
//! already-mined transaction, or a block stripped of its body.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use node_runtime::{LocalNetwork, Node};
    use shared_types::PeerAddress;
    use sl_07_gossip::GossipOutcome;
    use std::sync::Arc;

    async fn pair() -> (Arc<LocalNetwork>, Node, Node) {
        let network = LocalNetwork::new();
        let a = start(&network, founder_config("node-a", single_group(), &key(1))).await;
        let b = start(&network, follower_config("node-b", single_group())).await;
        (network, a, b)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_block_delivered_twice_applies_once() {
        let (_network, a, b) = pair().await;
        let block = forge(&a, 0, &key(1).pub_key_hash(), Vec::new()).await;
        let gossip = b.service().gossip();

        assert_eq!(
            gossip.handle_block(&"node-c".into(), block.clone()).await.unwrap(),
            GossipOutcome::Accepted
        );
        let after_first = snapshot(&b, 0).await;
        for sender in [a.address().clone(), PeerAddress::from("node-c")] {
            assert_eq!(
                gossip.handle_block(&sender, block.clone()).await.unwrap(),
                GossipOutcome::Duplicate
            );
        }
        assert_eq!(snapshot(&b, 0).await, after_first);
        assert_eq!(tip(&b, 0).await.height, 1);

        // Re-gossip carried it to the founder as well.
        let a = &a;
        assert!(eventually(|| async move { tip(a, 0).await.height == 1 }).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_txn_delivered_twice_is_pooled_once() {
        let (_network, a, b) = pair().await;
        let txn = {
            let context = b.state().group(0).unwrap();
            let ledger = context.read().await;
            ledger
                .utxo
                .new_transfer(&key(1), key(2).pub_key_hash(), 5, |_| false)
                .unwrap()
        };
        let gossip = b.service().gossip();

        assert_eq!(
            gossip.handle_txn(a.address(), 0, txn.clone()).await.unwrap(),
            GossipOutcome::Accepted
        );
        assert_eq!(
            gossip.handle_txn(&"node-c".into(), 0, txn.clone()).await.unwrap(),
            GossipOutcome::Duplicate
        );
        assert_eq!(b.state().group(0).unwrap().mempool().len(), 1);

        // Once mined it stays a duplicate, not a fresh spend.
        let block = forge(&b, 0, &key(3).pub_key_hash(), vec![txn.clone()]).await;
        append(&b, &block).await;
        assert_eq!(
            gossip.handle_txn(a.address(), 0, txn).await.unwrap(),
            GossipOutcome::Duplicate
        );
        assert!(b.state().group(0).unwrap().mempool().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_head_delivered_twice_is_stored_once() {
        let (_network, a, b) = pair().await;
        let head = forge(&a, 0, &key(1).pub_key_hash(), Vec::new()).await.head();
        let gossip = b.service().gossip();

        assert_eq!(
            gossip.handle_head(a.address(), head.clone()).await.unwrap(),
            GossipOutcome::Accepted
        );
        assert_eq!(
            gossip.handle_head(&"node-c".into(), head.clone()).await.unwrap(),
            GossipOutcome::Duplicate
        );
        let stored = b.state().heads().read().heads_of(0).unwrap();
        assert_eq!(stored.iter().filter(|h| h.height == 1).count(), 1);

        // Heads only carry trust; the chain itself did not move.
        assert_eq!(tip(&b, 0).await.height, 0);

        let mut foreign = head;
        foreign.group = 9;
        assert_eq!(
            gossip.handle_head(a.address(), foreign).await.unwrap(),
            GossipOutcome::NotServed
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_block_reincluding_mined_txn_rejected() {
        let (_network, a, b) = pair().await;
        let txn = {
            let context = b.state().group(0).unwrap();
            let ledger = context.read().await;
            ledger
                .utxo
                .new_transfer(&key(1), key(2).pub_key_hash(), 5, |_| false)
                .unwrap()
        };
        let mined = forge(&b, 0, &key(3).pub_key_hash(), vec![txn.clone()]).await;
        append(&b, &mined).await;
        let after_mined = snapshot(&b, 0).await;

        let replayed = forge(&b, 0, &key(3).pub_key_hash(), vec![txn]).await;
        let outcome = b
            .service()
            .gossip()
            .handle_block(a.address(), replayed)
            .await
            .unwrap();
        assert!(matches!(outcome, GossipOutcome::Rejected(_)), "{outcome:?}");
        assert_eq!(snapshot(&b, 0).await, after_mined);
        assert_eq!(tip(&b, 0).await.hash(), mined.hash());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_block_without_body_rejected_then_real_block_accepted() {
        let (_network, a, b) = pair().await;
        let block = forge(&a, 0, &key(1).pub_key_hash(), Vec::new()).await;
        let gossip = b.service().gossip();
        let before = snapshot(&b, 0).await;

        let outcome = gossip
            .handle_block(&"node-c".into(), block.head())
            .await
            .unwrap();
        assert!(matches!(outcome, GossipOutcome::Rejected(_)), "{outcome:?}");
        assert_eq!(snapshot(&b, 0).await, before);

        assert_eq!(
            gossip.handle_block(&"node-c".into(), block.clone()).await.unwrap(),
            GossipOutcome::Accepted
        );
        assert_eq!(tip(&b, 0).await, block);
    }
}
