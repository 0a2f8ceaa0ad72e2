//! # Fork Resolution
//!
//! Two nodes agree up to height 2, then each extends its own branch:
//! A to height 5, B to height 6.
//!
//! ```text
//! A: G ─ 1 ─ 2 ─ 3a ─ 4a ─ 5a
//! B: G ─ 1 ─ 2 ─ 3b ─ 4b ─ 5b ─ 6b
//! ```
//!
//! Block 6b reaching A does not extend A's tip, so A reconciles against
//! the sender: divergence at 2, three blocks rolled back, four replayed.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use node_runtime::{LocalNetwork, Node};
    use sl_06_chain_sync::ReconcileOutcome;
    use sl_07_gossip::GossipOutcome;
    use std::sync::Arc;

    struct Forked {
        _network: Arc<LocalNetwork>,
        a: Node,
        b: Node,
    }

    async fn forked() -> Forked {
        let alice = key(1);
        let bob = key(2);
        let network = LocalNetwork::new();
        let a = start(&network, founder_config("node-a", single_group(), &alice)).await;
        let b = start(&network, follower_config("node-b", single_group())).await;

        for _ in 0..2 {
            let block = forge(&a, 0, &alice.pub_key_hash(), Vec::new()).await;
            append(&a, &block).await;
            append(&b, &block).await;
        }
        extend(&a, 0, &alice.pub_key_hash(), 3).await;
        extend(&b, 0, &bob.pub_key_hash(), 4).await;
        Forked {
            _network: network,
            a,
            b,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_block_beyond_fork_triggers_reconciliation() {
        let Forked { a, b, .. } = forked().await;
        let block6 = tip(&b, 0).await;
        assert_eq!(block6.height, 6);

        let outcome = a
            .service()
            .gossip()
            .handle_block(b.address(), block6.clone())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            GossipOutcome::Reconciled(ReconcileOutcome::Reconciled {
                divergence: 2,
                rolled_back: 3,
                applied: 4,
            })
        );

        assert_eq!(tip(&a, 0).await.hash(), block6.hash());
        for height in 0..=6 {
            assert_eq!(hash_at(&a, 0, height).await, hash_at(&b, 0, height).await);
        }
        assert!(a.state().heads().read().contains(0, 6).unwrap());

        // Alice keeps genesis plus the two shared blocks, bob owns 3b..6b.
        let service = a.service();
        assert_eq!(service.get_balance(&address_of(&key(1))).await, Ok(3 * REWARD));
        assert_eq!(service.get_balance(&address_of(&key(2))).await, Ok(4 * REWARD));
        assert_eq!(snapshot(&a, 0).await.1, snapshot(&b, 0).await.1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_stale_sender_is_sent_our_tip() {
        let Forked { a, b, .. } = forked().await;
        let block5a = tip(&a, 0).await;

        // B is ahead: it answers A's block with its own tip, and A then
        // reconciles onto B's branch.
        let outcome = b
            .service()
            .gossip()
            .handle_block(a.address(), block5a)
            .await
            .unwrap();
        assert_eq!(outcome, GossipOutcome::SenderBehind);

        let expected = tip(&b, 0).await.hash();
        let a = &a;
        assert!(eventually(|| async move { tip(a, 0).await.hash() == expected }).await);
        assert_eq!(tip(&b, 0).await.hash(), expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_block_from_own_branch_is_duplicate() {
        let Forked { a, b, .. } = forked().await;
        let shared = b.service().engine().state().group(0).unwrap();
        let block2 = shared.read().await.chain.block_by_height(2).unwrap().unwrap();

        let before = snapshot(&a, 0).await;
        let outcome = a
            .service()
            .gossip()
            .handle_block(b.address(), block2)
            .await
            .unwrap();
        assert_eq!(outcome, GossipOutcome::Duplicate);
        assert_eq!(snapshot(&a, 0).await, before);
    }
}
