//! Point ledger
//!
//! The effective balance of an account is derived, never stored:
//!
//! - user: `base_offset(mode) + points - sum(debits)`
//! - admin: `base_offset(mode) + points + sum(signed amounts)`

use serde::Serialize;

use crate::config::NetworkPolicy;
use crate::tree::{Node, Sign};

/// Breakdown of an effective balance
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub base_offset: i64,
    pub points: i64,
    /// Contribution of the notification log (negative for debits)
    pub ledger: i64,
    pub effective: i64,
}

/// Compute the effective balance of `node` under `policy`
pub fn effective_balance(node: &Node, policy: &NetworkPolicy) -> Balance {
    let base_offset = policy.base_offset(node.mode);

    let ledger = if node.is_admin() {
        node.notifications.iter().map(|n| n.signed_amount()).sum()
    } else {
        -node
            .notifications
            .iter()
            .filter(|n| n.sign == Sign::Debit)
            .map(|n| n.amount)
            .sum::<i64>()
    };

    Balance {
        base_offset,
        points: node.points,
        ledger,
        effective: base_offset + node.points + ledger,
    }
}
