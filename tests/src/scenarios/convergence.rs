//! # Reconciliation Convergence
//!
//! Local chain of height 4, peer chain of height 6, agreeing up to height
//! `k`. For every `k` from 0 to 4 the divergence point found is exactly
//! `k` and the local node ends on the peer's chain. With different
//! geneses (`k = -1`) nothing is touched, and neither is anything when
//! the peer stops serving blocks halfway through.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use node_runtime::{LocalNetwork, Node};
    use sl_06_chain_sync::{PeerRequestHandler, ReconcileOutcome};
    use std::sync::Arc;

    const LOCAL_HEIGHT: u32 = 4;
    const PEER_HEIGHT: u32 = 6;

    /// Local node and peer sharing blocks up to `shared` (`None`: not even
    /// genesis).
    async fn pair(network: &Arc<LocalNetwork>, shared: Option<u32>) -> (Node, Node) {
        let alice = key(1);
        let local = start(network, founder_config("local", single_group(), &alice)).await;
        let peer = match shared {
            Some(_) => start(network, follower_config("peer", single_group())).await,
            None => start(network, founder_config("peer", single_group(), &key(2))).await,
        };

        let shared = shared.unwrap_or(0);
        for _ in 0..shared {
            let block = forge(&local, 0, &alice.pub_key_hash(), Vec::new()).await;
            append(&local, &block).await;
            append(&peer, &block).await;
        }
        extend(&local, 0, &key(3).pub_key_hash(), LOCAL_HEIGHT - shared).await;
        extend(&peer, 0, &key(4).pub_key_hash(), PEER_HEIGHT - shared).await;
        (local, peer)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_divergence_found_for_every_shared_prefix() {
        for k in 0..=LOCAL_HEIGHT {
            let network = LocalNetwork::new();
            let (local, peer) = pair(&network, Some(k)).await;

            let outcome = local
                .service()
                .engine()
                .reconcile(0, PEER_HEIGHT, peer.address())
                .await
                .unwrap();
            assert_eq!(
                outcome,
                ReconcileOutcome::Reconciled {
                    divergence: k,
                    rolled_back: LOCAL_HEIGHT - k,
                    applied: PEER_HEIGHT - k,
                },
                "shared prefix up to {k}"
            );
            assert_eq!(snapshot(&local, 0).await, snapshot(&peer, 0).await, "k = {k}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_different_genesis_is_left_alone() {
        let network = LocalNetwork::new();
        let (local, peer) = pair(&network, None).await;
        let before = snapshot(&local, 0).await;

        let outcome = local
            .service()
            .engine()
            .reconcile(0, PEER_HEIGHT, peer.address())
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::TotalDivergence);
        assert_eq!(snapshot(&local, 0).await, before);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_peer_not_ahead_is_a_no_op() {
        let network = LocalNetwork::new();
        let (local, peer) = pair(&network, Some(2)).await;
        let before = snapshot(&local, 0).await;

        let outcome = local
            .service()
            .engine()
            .reconcile(0, LOCAL_HEIGHT, peer.address())
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::UpToDate);
        assert_eq!(snapshot(&local, 0).await, before);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failed_fetch_restores_local_chain() {
        let network = LocalNetwork::new();
        let (local, peer) = pair(&network, Some(2)).await;
        let inner: Arc<dyn PeerRequestHandler> = peer.service().clone();
        let flaky = FlakyPeer::new("flaky", inner);
        let handler: Arc<dyn PeerRequestHandler> = flaky.clone();
        network.register(&handler, vec![0]);

        let before = snapshot(&local, 0).await;
        let old_tip = tip(&local, 0).await;
        let result = local
            .service()
            .engine()
            .reconcile(0, PEER_HEIGHT, &"flaky".into())
            .await;
        assert!(result.is_err());
        assert!(flaky.refused() >= 1);
        assert_eq!(snapshot(&local, 0).await, before);
        assert_eq!(tip(&local, 0).await, old_tip);

        // The real peer still works from the untouched state.
        let outcome = local
            .service()
            .engine()
            .reconcile(0, PEER_HEIGHT, peer.address())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ReconcileOutcome::Reconciled {
                divergence: 2,
                rolled_back: LOCAL_HEIGHT - 2,
                applied: PEER_HEIGHT - 2,
            }
        );
        assert_eq!(hash_at(&local, 0, PEER_HEIGHT).await, hash_at(&peer, 0, PEER_HEIGHT).await);
    }
}
