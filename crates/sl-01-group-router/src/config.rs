//! # Group Configuration

use serde::{Deserialize, Serialize};
use shared_types::GroupId;
use thiserror::Error;

/// Number of groups the ledger is split into unless configured otherwise.
pub const DEFAULT_MAX_GROUP_NUM: u32 = 4;

/// The groups this node serves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// First served group.
    pub base_group: GroupId,
    /// Number of consecutive groups served.
    pub group_num: u32,
    /// Total number of groups in the network.
    pub max_group_num: u32,
}

/// Invalid group configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupConfigError {
    /// `max_group_num` is zero.
    #[error("max_group_num must be positive")]
    NoGroups,

    /// `group_num` is zero or larger than `max_group_num`.
    #[error("group_num {group_num} must be in 1..={max_group_num}")]
    BadGroupNum {
        /// Configured window size.
        group_num: u32,
        /// Configured group count.
        max_group_num: u32,
    },

    /// `base_group` is not a valid group id.
    #[error("base_group {base_group} must be below {max_group_num}")]
    BadBaseGroup {
        /// Configured first group.
        base_group: GroupId,
        /// Configured group count.
        max_group_num: u32,
    },
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            base_group: 0,
            group_num: 1,
            max_group_num: DEFAULT_MAX_GROUP_NUM,
        }
    }
}

impl GroupConfig {
    /// Serve every group; handy for single-node tests.
    pub fn for_testing() -> Self {
        Self {
            base_group: 0,
            group_num: DEFAULT_MAX_GROUP_NUM,
            max_group_num: DEFAULT_MAX_GROUP_NUM,
        }
    }

    /// Check the window is well-formed.
    pub fn validate(&self) -> Result<(), GroupConfigError> {
        if self.max_group_num == 0 {
            return Err(GroupConfigError::NoGroups);
        }
        if self.group_num == 0 || self.group_num > self.max_group_num {
            return Err(GroupConfigError::BadGroupNum {
                group_num: self.group_num,
                max_group_num: self.max_group_num,
            });
        }
        if self.base_group >= self.max_group_num {
            return Err(GroupConfigError::BadBaseGroup {
                base_group: self.base_group,
                max_group_num: self.max_group_num,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GroupConfig::default();
        assert_eq!(config.max_group_num, 4);
        assert_eq!(config.group_num, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_windows() {
        let zero = GroupConfig {
            max_group_num: 0,
            ..GroupConfig::default()
        };
        assert_eq!(zero.validate(), Err(GroupConfigError::NoGroups));

        let wide = GroupConfig {
            group_num: 5,
            ..GroupConfig::default()
        };
        assert!(matches!(wide.validate(), Err(GroupConfigError::BadGroupNum { .. })));

        let base = GroupConfig {
            base_group: 4,
            ..GroupConfig::default()
        };
        assert!(matches!(base.validate(), Err(GroupConfigError::BadBaseGroup { .. })));
    }
}
