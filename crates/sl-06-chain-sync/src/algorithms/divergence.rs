//! # Divergence Search
//!
//! Binary search for the highest height at which two chains agree, as a
//! step-wise state machine so the caller can fetch each remote hash over
//! the network between steps.
//!
//! Chains share a prefix and differ above it, so "agrees at m" is monotone
//! in m and the search converges in `O(log h)` probes.

use shared_types::Hash;

/// Binary search over local heights `[0, local_height]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivergenceSearch {
    low: i64,
    high: i64,
}

impl DivergenceSearch {
    /// Start a search over a local chain of height `local_height`.
    pub fn new(local_height: u32) -> Self {
        Self {
            low: 0,
            high: i64::from(local_height),
        }
    }

    /// Next height to compare, `None` once converged.
    pub fn next_probe(&self) -> Option<u32> {
        if self.high < self.low {
            return None;
        }
        let mid = self.low + (self.high - self.low) / 2;
        u32::try_from(mid).ok()
    }

    /// Record whether both chains hold the same hash at `height`.
    pub fn record(&mut self, height: u32, agrees: bool) {
        let height = i64::from(height);
        if agrees {
            self.low = height + 1;
        } else {
            self.high = height - 1;
        }
    }

    /// Highest agreeing height; `None` when even genesis differs.
    pub fn result(&self) -> Option<u32> {
        u32::try_from(self.high).ok()
    }
}

/// Run the search over two fully known hash lists (index = height).
pub fn find_divergence(local: &[Hash], remote: &[Hash]) -> Option<u32> {
    let Some(local_height) = local.len().checked_sub(1) else {
        return None;
    };
    let mut search = DivergenceSearch::new(local_height as u32);
    while let Some(m) = search.next_probe() {
        let agrees = remote.get(m as usize) == local.get(m as usize);
        search.record(m, agrees);
    }
    search.result()
}
