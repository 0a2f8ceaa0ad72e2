//! End-to-end scenarios, one module per behaviour.

pub mod convergence;
pub mod devnet;
pub mod double_spend;
pub mod fork_resolution;
pub mod idempotence;
pub mod relay;
