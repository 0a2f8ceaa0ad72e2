//! # Algorithms

pub mod divergence;

pub use divergence::{find_divergence, DivergenceSearch};
