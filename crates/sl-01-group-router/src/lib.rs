//! # SL-01 Group Router
//!
//! Maps owner hashes to groups and decides which groups this node serves.
//!
//! **Subsystem ID:** 1
//!
//! ## Purpose
//!
//! The ledger is split into `max_group_num` groups. Every output belongs to
//! the group of its owner hash, and every node serves a contiguous circular
//! window of `group_num` groups starting at `base_group`. Inbound traffic for
//! a group outside that window must never touch local state.
//!
//! ## Module Structure
//!
//! ```text
//! sl-01-group-router/
//! ├── algorithms/      # group_of, in_group (pure)
//! ├── config.rs        # GroupConfig
//! └── router.rs        # GroupRouter bound to one node's window
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod config;
pub mod router;

pub use algorithms::{group_of, in_group};
pub use config::{GroupConfig, GroupConfigError, DEFAULT_MAX_GROUP_NUM};
pub use router::GroupRouter;
