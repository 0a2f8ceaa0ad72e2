//! # Domain Module

pub mod errors;
pub mod keys;

pub use errors::*;
