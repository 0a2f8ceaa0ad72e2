//! # Group Assignment Algorithms

pub mod group_assignment;

pub use group_assignment::{group_of, in_group};
