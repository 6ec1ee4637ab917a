//! Tree store contract
//!
//! The scoring core only reads structure through this trait and only writes
//! the cached `points` field. Ledger and profile writes are versioned so that
//! a transfer never tears a concurrent write on the same node.

use async_trait::async_trait;

use super::node::{NewNode, Node, NodeId, NodeSummary, Notification, Profile};
use crate::types::Result;

/// Ledger mutation applied to a single node
#[derive(Clone, Debug, Default)]
pub struct LedgerUpdate {
    /// When set, the write only succeeds if the node is still at this version
    pub expected_version: Option<u64>,
    /// Entry appended to the notification log
    pub notification: Option<Notification>,
    /// Added to `points_to_send` (negative to spend)
    pub points_to_send_delta: i64,
}

impl LedgerUpdate {
    /// Version-checked update, used for anything that spends a balance
    pub fn checked(version: u64) -> Self {
        Self {
            expected_version: Some(version),
            ..Default::default()
        }
    }

    /// Unchecked update, used for credits which commute with other writes
    pub fn unchecked() -> Self {
        Self::default()
    }

    pub fn with_notification(mut self, notification: Notification) -> Self {
        self.notification = Some(notification);
        self
    }

    pub fn with_points_to_send(mut self, delta: i64) -> Self {
        self.points_to_send_delta = delta;
        self
    }
}

/// Profile mutation applied to a single node
#[derive(Clone, Debug)]
pub struct ProfileUpdate {
    pub expected_version: u64,
    pub profile: Profile,
    /// Replacement password hash, if the password changed
    pub password_hash: Option<String>,
}

/// Persistent collection of nodes indexed by parent
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Create a node. The first node ever created becomes the admin.
    async fn create(&self, node: NewNode) -> Result<Node>;

    async fn find_by_id(&self, id: &NodeId) -> Result<Option<Node>>;

    async fn find_by_handle(&self, handle: &str) -> Result<Option<Node>>;

    async fn find_admin(&self) -> Result<Option<Node>>;

    /// Any node other than `exclude` already holding one of the unique
    /// business keys
    async fn find_duplicate(
        &self,
        email: &str,
        handle: &str,
        national_id: &str,
        exclude: Option<&NodeId>,
    ) -> Result<Option<Node>>;

    /// Direct children of `parent`, in insertion order
    async fn find_children(&self, parent: &NodeId) -> Result<Vec<NodeSummary>>;

    /// Direct children of every id in `parents`. Siblings keep insertion order.
    async fn find_children_of(&self, parents: &[NodeId]) -> Result<Vec<NodeSummary>> {
        let mut children = Vec::new();
        for parent in parents {
            children.extend(self.find_children(parent).await?);
        }
        Ok(children)
    }

    /// Overwrite the cached score. Returns false if the node does not exist.
    async fn set_points(&self, id: &NodeId, points: i64) -> Result<bool>;

    /// Apply a ledger mutation, failing with `Conflict` on a stale version
    async fn apply_ledger(&self, id: &NodeId, update: LedgerUpdate) -> Result<()>;

    /// Replace profile fields, failing with `Conflict` on a stale version
    async fn update_profile(&self, id: &NodeId, update: ProfileUpdate) -> Result<()>;

    /// Mark every notification read, returning how many changed
    async fn mark_notifications_read(&self, id: &NodeId) -> Result<usize>;

    async fn touch_last_login(&self, id: &NodeId) -> Result<()>;

    async fn list_ids(&self) -> Result<Vec<NodeId>>;

    async fn count(&self) -> Result<u64>;
}
