//! # SL-05 Merkle Relay Prover
//!
//! Proves a transaction belongs to a block so another group can admit it
//! holding only that block's head.
//!
//! **Subsystem ID:** 5
//!
//! ## Tree Shape
//!
//! Leaves are transaction hashes in block order. Each level pairs nodes
//! left to right and hashes `SHA-256(left || right)`; an odd last node is
//! paired with itself. A single transaction is its own root with an empty
//! path; an empty body has the zero root.
//!
//! ## Module Structure
//!
//! ```text
//! sl-05-merkle-relay/
//! ├── algorithms/
//! │   ├── merkle.rs        # root, find_path, verify_path
//! │   └── block_verify.rs  # header / PoW / body self-verification
//! ├── domain/              # RelayError
//! └── relay.rs             # RelayTxn build / verify
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;
pub mod relay;

pub use algorithms::{
    commit_body, compute_merkle_root, find_path, verify_block, verify_head, verify_path,
};
pub use domain::RelayError;
pub use relay::{build_relay, cross_group_relays, verify_relay};
