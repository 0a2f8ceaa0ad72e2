//! # Algorithms

pub mod block_verify;
pub mod merkle;

pub use block_verify::{commit_body, verify_block, verify_head};
pub use merkle::{compute_merkle_root, find_path, verify_path};
