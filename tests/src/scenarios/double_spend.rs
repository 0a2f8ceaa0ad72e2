//! # Double-Spend Rejection
//!
//! Alice's transfer `T` spends her genesis output and is gossiped to both
//! nodes. A second transfer `T'` spending the same output is dropped by
//! each of them, and only `T` ever gets mined.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use node_runtime::LocalNetwork;
    use shared_types::Transaction;
    use sl_07_gossip::GossipOutcome;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_conflicting_transfer_is_dropped_everywhere() {
        let alice = key(1);
        let bob = key(2);
        let network = LocalNetwork::new();
        let a = start(&network, founder_config("node-a", single_group(), &alice)).await;
        let b = start(&network, follower_config("node-b", single_group())).await;

        let first = a
            .service()
            .transfer(&alice, &address_of(&bob), 4)
            .await
            .unwrap();
        let group_b = &b.state().group(0).unwrap();
        assert!(eventually(|| async move { group_b.mempool().contains(&first) }).await);

        // Same output, built without looking at the mempool.
        let second: Transaction = {
            let context = a.state().group(0).unwrap();
            let ledger = context.read().await;
            ledger
                .utxo
                .new_transfer(&alice, bob.pub_key_hash(), 3, |_| false)
                .unwrap()
        };
        assert_ne!(second.hash(), first);

        for (node, sender) in [(&a, b.address()), (&b, a.address())] {
            let outcome = node
                .service()
                .gossip()
                .handle_txn(sender, 0, second.clone())
                .await
                .unwrap();
            assert!(matches!(outcome, GossipOutcome::Rejected(_)), "{outcome:?}");

            let context = node.state().group(0).unwrap();
            let pool = context.mempool();
            assert_eq!(pool.len(), 1);
            assert!(pool.contains(&first));
        }

        let pending = a.state().group(0).unwrap().mempool().select_for_block();
        let block = forge(&a, 0, &alice.pub_key_hash(), pending).await;
        append(&a, &block).await;
        assert!(a.state().group(0).unwrap().mempool().is_empty());
        assert_eq!(a.service().get_balance(&address_of(&bob)).await, Ok(4));
        assert_eq!(
            a.service().get_balance(&address_of(&alice)).await,
            Ok(2 * REWARD - 4)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overspend_is_refused_at_the_wallet() {
        let alice = key(1);
        let network = LocalNetwork::new();
        let a = start(&network, founder_config("node-a", single_group(), &alice)).await;

        assert!(a
            .service()
            .transfer(&alice, &address_of(&key(2)), REWARD + 1)
            .await
            .is_err());
        assert!(a.state().group(0).unwrap().mempool().is_empty());
    }
}
