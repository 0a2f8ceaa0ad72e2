//! # Group Assignment
//!
//! Deterministic owner-hash to group mapping and the circular served-window
//! predicate.

use shared_crypto::{sha256, PubKeyHash};
use shared_types::GroupId;

/// Group of an owner hash: the first four bytes of `SHA-256(pub_key_hash)`,
/// big-endian, modulo `max_group_num`.
///
/// Stable across restarts and platforms. A zero group count maps to group 0.
pub fn group_of(pub_key_hash: &PubKeyHash, max_group_num: u32) -> GroupId {
    if max_group_num == 0 {
        return 0;
    }

    let digest = sha256(pub_key_hash);
    let value = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    value % max_group_num
}

/// Whether `target` lies in `[base, base + group_num) mod max_group_num`.
///
/// Ids outside `[0, max_group_num)` are never in any window.
pub fn in_group(target: GroupId, base: GroupId, group_num: u32, max_group_num: u32) -> bool {
    if max_group_num == 0 || target >= max_group_num {
        return false;
    }

    let base = base % max_group_num;
    let offset = (target + max_group_num - base) % max_group_num;
    offset < group_num.min(max_group_num)
}
