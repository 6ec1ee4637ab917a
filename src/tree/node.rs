//! Node (account) model
//!
//! Identity, parent, position and mode are fixed at creation. `points` is a
//! cached score owned by the propagator; `points_to_send` and the
//! notification log are owned by the ledger.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::position::{Mode, Position};
use crate::types::TreeError;

/// Unique node identifier
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeId(ObjectId);

impl NodeId {
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    pub fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ObjectId> for NodeId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl FromStr for NodeId {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ObjectId::parse_str(s)?))
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

/// Direction of a ledger entry
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Credit,
    Debit,
}

impl Sign {
    /// `+1` for credits, `-1` for debits
    pub fn value(&self) -> i64 {
        match self {
            Self::Credit => 1,
            Self::Debit => -1,
        }
    }

    pub fn from_value(value: i32) -> Self {
        if value < 0 {
            Self::Debit
        } else {
            Self::Credit
        }
    }
}

/// Entry in a node's append-only notification log
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
    pub amount: i64,
    pub sign: Sign,
}

impl Notification {
    pub fn credit(message: impl Into<String>, amount: i64) -> Self {
        Self::new(message, amount, Sign::Credit)
    }

    pub fn debit(message: impl Into<String>, amount: i64) -> Self {
        Self::new(message, amount, Sign::Debit)
    }

    fn new(message: impl Into<String>, amount: i64, sign: Sign) -> Self {
        Self {
            message: message.into(),
            timestamp: Utc::now(),
            is_read: false,
            amount,
            sign,
        }
    }

    /// Amount with its sign applied
    pub fn signed_amount(&self) -> i64 {
        self.sign.value() * self.amount
    }
}

/// Display and contact fields
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    /// National identity card number, unique across accounts
    pub national_id: String,
    /// Public handle, unique across accounts
    pub handle: String,
    pub email: String,
    pub phone: String,
}

/// A participant placed in the tree
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    /// `None` only for roots
    pub position: Option<Position>,
    pub mode: Mode,
    pub role: Role,
    pub points: i64,
    pub points_to_send: i64,
    pub notifications: Vec<Notification>,
    pub profile: Profile,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_by: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    /// Bumped on every ledger or profile write
    pub version: u64,
}

impl Node {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn summary(&self) -> NodeSummary {
        NodeSummary {
            id: self.id,
            parent: self.parent,
            position: self.position,
            mode: self.mode,
        }
    }

    pub fn unread_notifications(&self) -> usize {
        self.notifications.iter().filter(|n| !n.is_read).count()
    }
}

/// Structural view of a node, as returned by children lookups
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub position: Option<Position>,
    pub mode: Mode,
}

/// Fields supplied when a node is created
#[derive(Clone, Debug)]
pub struct NewNode {
    pub parent: Option<NodeId>,
    pub position: Option<Position>,
    pub mode: Mode,
    pub profile: Profile,
    pub password_hash: String,
    pub created_by: Option<String>,
    pub points: i64,
    pub points_to_send: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_parse() {
        let id = NodeId::new();
        let parsed: NodeId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-an-id".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_signed_amount() {
        assert_eq!(Notification::credit("in", 40).signed_amount(), 40);
        assert_eq!(Notification::debit("out", 40).signed_amount(), -40);
        assert_eq!(Sign::from_value(-1), Sign::Debit);
        assert_eq!(Sign::from_value(1), Sign::Credit);
    }
}
