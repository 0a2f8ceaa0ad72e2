//! # Shared Types Crate
//!
//! Domain entities, canonical encoding and peer message types used across
//! the Shard-Ledger subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every cross-subsystem type is defined here.
//! - **One hash function**: block identity, transaction identity, signature
//!   pre-images and Merkle leaves all use [`encoding::canonical_hash`] over the
//!   explicit encoding in [`encoding`], never the wire serialization.
//! - **Wire-agnostic messages**: [`ipc`] types derive serde so any transport
//!   can carry them, but their encoding is not part of any hash.

pub mod encoding;
pub mod entities;
pub mod errors;
pub mod ipc;

pub use encoding::{canonical_hash, CanonicalEncode, CanonicalEncoder};
pub use entities::*;
pub use errors::*;
pub use ipc::*;
