//! # Reconciliation Outcome

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The peer is not ahead; nothing was done.
    UpToDate,
    /// No local genesis; the caller should bootstrap instead.
    NoGenesis,
    /// Even genesis differs; the chains cannot be reconciled.
    TotalDivergence,
    /// The local chain now follows the peer's.
    Reconciled {
        /// Highest height both chains agreed on.
        divergence: u32,
        /// Local blocks rolled back.
        rolled_back: u32,
        /// Peer blocks replayed.
        applied: u32,
    },
}

impl ReconcileOutcome {
    /// Whether the pass changed local state.
    pub fn mutated(&self) -> bool {
        matches!(self, Self::Reconciled { rolled_back, applied, .. } if rolled_back + applied > 0)
    }
}
