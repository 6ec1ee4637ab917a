//! In-memory tree store
//!
//! Thread-safe store indexed by id and by parent. Used by tests and
//! anywhere a MongoDB instance is unavailable.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use super::node::{NewNode, Node, NodeId, NodeSummary, Role};
use super::store::{LedgerUpdate, ProfileUpdate, TreeStore};
use crate::types::{Result, TreeError};

/// In-memory tree store
#[derive(Default)]
pub struct MemoryTreeStore {
    nodes: DashMap<NodeId, Node>,
    /// Children ids per parent, in insertion order
    children: DashMap<NodeId, Vec<NodeId>>,
    /// Serializes creation so admin assignment and uniqueness are race-free
    create_lock: Mutex<()>,
}

impl MemoryTreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn duplicate_of(
        &self,
        email: &str,
        handle: &str,
        national_id: &str,
        exclude: Option<&NodeId>,
    ) -> Option<Node> {
        self.nodes
            .iter()
            .filter(|entry| Some(entry.key()) != exclude)
            .find(|entry| {
                let p = &entry.profile;
                p.email == email || p.handle == handle || p.national_id == national_id
            })
            .map(|entry| entry.value().clone())
    }

    fn check_version(node: &Node, expected: u64) -> Result<()> {
        if node.version != expected {
            return Err(TreeError::Conflict(format!(
                "node {} is at version {}, expected {}",
                node.id, node.version, expected
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TreeStore for MemoryTreeStore {
    async fn create(&self, new: NewNode) -> Result<Node> {
        let _guard = self.create_lock.lock().await;

        let p = &new.profile;
        if self.duplicate_of(&p.email, &p.handle, &p.national_id, None).is_some() {
            return Err(TreeError::Duplicate(format!(
                "email, handle or national id already registered ({})",
                p.handle
            )));
        }

        let role = if self.nodes.is_empty() {
            Role::Admin
        } else {
            Role::User
        };

        let node = Node {
            id: NodeId::new(),
            parent: new.parent,
            position: new.position,
            mode: new.mode,
            role,
            points: new.points,
            points_to_send: new.points_to_send,
            notifications: Vec::new(),
            profile: new.profile,
            password_hash: new.password_hash,
            created_by: new.created_by,
            last_login: None,
            version: 0,
        };

        if let Some(parent) = node.parent {
            self.children.entry(parent).or_default().push(node.id);
        }
        self.nodes.insert(node.id, node.clone());

        debug!(node_id = %node.id, role = ?node.role, "Memory store: created node");
        Ok(node)
    }

    async fn find_by_id(&self, id: &NodeId) -> Result<Option<Node>> {
        Ok(self.nodes.get(id).map(|n| n.value().clone()))
    }

    async fn find_by_handle(&self, handle: &str) -> Result<Option<Node>> {
        Ok(self
            .nodes
            .iter()
            .find(|n| n.profile.handle == handle)
            .map(|n| n.value().clone()))
    }

    async fn find_admin(&self) -> Result<Option<Node>> {
        Ok(self
            .nodes
            .iter()
            .find(|n| n.role == Role::Admin)
            .map(|n| n.value().clone()))
    }

    async fn find_duplicate(
        &self,
        email: &str,
        handle: &str,
        national_id: &str,
        exclude: Option<&NodeId>,
    ) -> Result<Option<Node>> {
        Ok(self.duplicate_of(email, handle, national_id, exclude))
    }

    async fn find_children(&self, parent: &NodeId) -> Result<Vec<NodeSummary>> {
        let ids = match self.children.get(parent) {
            Some(ids) => ids.value().clone(),
            None => return Ok(Vec::new()),
        };

        Ok(ids
            .iter()
            .filter_map(|id| self.nodes.get(id).map(|n| n.summary()))
            .collect())
    }

    async fn set_points(&self, id: &NodeId, points: i64) -> Result<bool> {
        match self.nodes.get_mut(id) {
            Some(mut node) => {
                node.points = points;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn apply_ledger(&self, id: &NodeId, update: LedgerUpdate) -> Result<()> {
        let mut node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| TreeError::NotFound(format!("node {}", id)))?;

        if let Some(expected) = update.expected_version {
            Self::check_version(&node, expected)?;
        }

        node.points_to_send += update.points_to_send_delta;
        if let Some(notification) = update.notification {
            node.notifications.push(notification);
        }
        node.version += 1;
        Ok(())
    }

    async fn update_profile(&self, id: &NodeId, update: ProfileUpdate) -> Result<()> {
        let _guard = self.create_lock.lock().await;

        let p = &update.profile;
        if self
            .duplicate_of(&p.email, &p.handle, &p.national_id, Some(id))
            .is_some()
        {
            return Err(TreeError::Duplicate(format!(
                "email, handle or national id already used by another account ({})",
                p.handle
            )));
        }

        let mut node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| TreeError::NotFound(format!("node {}", id)))?;
        Self::check_version(&node, update.expected_version)?;

        node.profile = update.profile;
        if let Some(hash) = update.password_hash {
            node.password_hash = hash;
        }
        node.version += 1;
        Ok(())
    }

    async fn mark_notifications_read(&self, id: &NodeId) -> Result<usize> {
        let mut node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| TreeError::NotFound(format!("node {}", id)))?;

        let mut changed = 0;
        for notification in node.notifications.iter_mut().filter(|n| !n.is_read) {
            notification.is_read = true;
            changed += 1;
        }
        if changed > 0 {
            node.version += 1;
        }
        Ok(changed)
    }

    async fn touch_last_login(&self, id: &NodeId) -> Result<()> {
        let mut node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| TreeError::NotFound(format!("node {}", id)))?;
        node.last_login = Some(chrono::Utc::now());
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<NodeId>> {
        let mut ids: Vec<NodeId> = self.nodes.iter().map(|n| *n.key()).collect();
        ids.sort();
        Ok(ids)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.nodes.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::{Notification, Profile};
    use crate::tree::position::{Mode, Position};

    fn new_node(handle: &str, parent: Option<NodeId>, position: Option<Position>) -> NewNode {
        NewNode {
            parent,
            position,
            mode: Mode::Normal,
            profile: Profile {
                first_name: "First".into(),
                last_name: "Last".into(),
                national_id: format!("ID-{}", handle),
                handle: handle.into(),
                email: format!("{}@example.com", handle),
                phone: "0600000000".into(),
            },
            password_hash: String::new(),
            created_by: None,
            points: 0,
            points_to_send: 0,
        }
    }

    #[tokio::test]
    async fn test_first_node_is_admin() {
        let store = MemoryTreeStore::new();
        let root = store.create(new_node("root", None, None)).await.unwrap();
        let child = store
            .create(new_node("child", Some(root.id), Some(Position::Left)))
            .await
            .unwrap();

        assert_eq!(root.role, Role::Admin);
        assert_eq!(child.role, Role::User);
        assert_eq!(store.find_admin().await.unwrap().unwrap().id, root.id);
    }

    #[tokio::test]
    async fn test_children_in_insertion_order() {
        let store = MemoryTreeStore::new();
        let root = store.create(new_node("root", None, None)).await.unwrap();
        let b = store
            .create(new_node("b", Some(root.id), Some(Position::Right)))
            .await
            .unwrap();
        let c = store
            .create(new_node("c", Some(root.id), Some(Position::Left)))
            .await
            .unwrap();

        let children = store.find_children(&root.id).await.unwrap();
        let ids: Vec<NodeId> = children.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![b.id, c.id]);
        assert!(store.find_children(&b.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let store = MemoryTreeStore::new();
        store.create(new_node("root", None, None)).await.unwrap();
        let err = store.create(new_node("root", None, None)).await.unwrap_err();
        assert!(matches!(err, TreeError::Duplicate(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_profile_update_cannot_take_other_handle() {
        for _ in 0..20 {
            let store = MemoryTreeStore::new();
            store.create(new_node("root", None, None)).await.unwrap();
            let alice = store.create(new_node("alice", None, None)).await.unwrap();
            store.create(new_node("bob", None, None)).await.unwrap();

            let mut profile = alice.profile.clone();
            profile.handle = "bob".into();
            let err = store
                .update_profile(
                    &alice.id,
                    ProfileUpdate {
                        expected_version: alice.version,
                        profile,
                        password_hash: None,
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, TreeError::Duplicate(_)));

            let own = &alice.profile;
            assert!(store
                .find_duplicate(&own.email, &own.handle, &own.national_id, Some(&alice.id))
                .await
                .unwrap()
                .is_none());
        }
    }

    #[tokio::test]
    async fn test_stale_ledger_write_conflicts() {
        let store = MemoryTreeStore::new();
        let root = store.create(new_node("root", None, None)).await.unwrap();

        store
            .apply_ledger(
                &root.id,
                LedgerUpdate::checked(0)
                    .with_points_to_send(-10)
                    .with_notification(Notification::debit("spent", 10)),
            )
            .await
            .unwrap();

        let err = store
            .apply_ledger(&root.id, LedgerUpdate::checked(0).with_points_to_send(-10))
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        let node = store.find_by_id(&root.id).await.unwrap().unwrap();
        assert_eq!(node.points_to_send, -10);
        assert_eq!(node.notifications.len(), 1);
        assert_eq!(node.version, 1);
    }

    #[tokio::test]
    async fn test_set_points_leaves_version() {
        let store = MemoryTreeStore::new();
        let root = store.create(new_node("root", None, None)).await.unwrap();

        assert!(store.set_points(&root.id, 180).await.unwrap());
        assert!(!store.set_points(&NodeId::new(), 90).await.unwrap());

        let node = store.find_by_id(&root.id).await.unwrap().unwrap();
        assert_eq!(node.points, 180);
        assert_eq!(node.version, 0);
    }
}
