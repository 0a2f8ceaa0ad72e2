//! # Group Router
//!
//! A [`GroupConfig`] bound to the assignment functions.

use crate::algorithms::{group_of, in_group};
use crate::config::GroupConfig;
use shared_crypto::PubKeyHash;
use shared_types::GroupId;

/// Routes owners to groups and answers "is this group mine".
#[derive(Clone, Debug)]
pub struct GroupRouter {
    config: GroupConfig,
}

impl GroupRouter {
    /// Create a router for a node's window.
    pub fn new(config: GroupConfig) -> Self {
        Self { config }
    }

    /// The window.
    pub fn config(&self) -> &GroupConfig {
        &self.config
    }

    /// Total number of groups.
    pub fn max_group_num(&self) -> u32 {
        self.config.max_group_num
    }

    /// Group owning outputs locked to `pub_key_hash`.
    pub fn group_of(&self, pub_key_hash: &PubKeyHash) -> GroupId {
        group_of(pub_key_hash, self.config.max_group_num)
    }

    /// Whether this node serves `group`.
    pub fn serves(&self, group: GroupId) -> bool {
        in_group(
            group,
            self.config.base_group,
            self.config.group_num,
            self.config.max_group_num,
        )
    }

    /// Whether `group` is a valid id at all.
    pub fn is_valid_group(&self, group: GroupId) -> bool {
        group < self.config.max_group_num
    }

    /// Served groups in window order, starting at the base group.
    pub fn served_groups(&self) -> Vec<GroupId> {
        let max = self.config.max_group_num;
        if max == 0 {
            return Vec::new();
        }
        (0..self.config.group_num.min(max))
            .map(|offset| (self.config.base_group + offset) % max)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_served_groups_wrap() {
        let router = GroupRouter::new(GroupConfig {
            base_group: 3,
            group_num: 2,
            max_group_num: 4,
        });
        assert_eq!(router.served_groups(), vec![3, 0]);
        for group in router.served_groups() {
            assert!(router.serves(group));
        }
        assert!(!router.serves(1));
    }

    #[test]
    fn test_group_of_agrees_with_free_function() {
        let router = GroupRouter::new(GroupConfig::default());
        let owner = [7u8; 20];
        assert_eq!(router.group_of(&owner), group_of(&owner, 4));
        assert!(router.is_valid_group(3));
        assert!(!router.is_valid_group(4));
    }
}
