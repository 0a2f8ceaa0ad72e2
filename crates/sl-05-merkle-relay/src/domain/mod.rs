//! # Domain Module

pub mod errors;

pub use errors::*;
