//! # Domain
//!
//! Per-group state handles, sync outcomes and errors.

pub mod context;
pub mod errors;
pub mod outcome;

pub use context::{GroupContext, GroupLedger, NodeState, StoreScope};
pub use errors::SyncError;
pub use outcome::ReconcileOutcome;
