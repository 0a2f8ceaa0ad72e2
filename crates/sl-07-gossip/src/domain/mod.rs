//! # Domain

pub mod errors;
pub mod outcome;

pub use errors::GossipError;
pub use outcome::GossipOutcome;
