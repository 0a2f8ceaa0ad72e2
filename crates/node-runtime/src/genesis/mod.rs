//! # Genesis Module
//!
//! Founder-side genesis creation. A genesis block of group `g`:
//!
//! - Height: 0
//! - Parent hash: 32 zero bytes
//! - Body: one coinbase paying the founder's reward owner for `g`
//! - Merkle root: over that coinbase
//! - Proof of work: the configured mining difficulty
//!
//! Non-founder nodes never build a genesis; they fetch one with
//! `GetGenesis` (sl-06 bootstrap).

pub mod builder;

pub use builder::{GenesisBuilder, GenesisError};
