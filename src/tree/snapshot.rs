//! Bounded subtree snapshot
//!
//! Materializes the subtree under an evaluation root, level by level, into an
//! arena with precomputed child lists. Counting and reporting run as pure
//! functions over the snapshot, so store latency is paid once per level
//! instead of once per recursive call.

use std::collections::HashMap;

use tracing::trace;

use super::node::{NodeId, NodeSummary};
use super::position::{Mode, Position};
use super::store::TreeStore;
use crate::types::{Result, TreeError};

/// A node inside a snapshot arena
#[derive(Clone, Debug)]
pub struct SnapshotNode {
    pub id: NodeId,
    pub position: Option<Position>,
    pub mode: Mode,
    /// Generation relative to the snapshot root (root is 0)
    pub depth: usize,
    /// Arena index of the parent, `None` for the root
    pub parent: Option<usize>,
    /// Arena indices of direct children, in store order
    pub children: Vec<usize>,
}

/// Arena of the subtree under one root, cut off at `horizon` generations
#[derive(Clone, Debug)]
pub struct TreeSnapshot {
    nodes: Vec<SnapshotNode>,
    index: HashMap<NodeId, usize>,
    horizon: usize,
}

impl TreeSnapshot {
    /// Index of the root node in the arena
    pub const ROOT: usize = 0;

    /// Load the subtree under `root` down to `horizon` generations
    pub async fn load(store: &dyn TreeStore, root: &NodeId, horizon: usize) -> Result<Self> {
        let root_node = store
            .find_by_id(root)
            .await?
            .ok_or_else(|| TreeError::NotFound(format!("node {}", root)))?;

        Self::load_under(store, root_node.summary(), horizon).await
    }

    /// Load the subtree under an already fetched root
    pub async fn load_under(
        store: &dyn TreeStore,
        root_summary: NodeSummary,
        horizon: usize,
    ) -> Result<Self> {
        let root = root_summary.id;
        let mut snapshot = Self::with_root(root_summary, horizon);
        let mut frontier = vec![root];

        for depth in 1..=horizon {
            if frontier.is_empty() {
                break;
            }
            let children = store.find_children_of(&frontier).await?;
            frontier = children
                .into_iter()
                .filter_map(|child| snapshot.attach(child, depth).map(|_| child.id))
                .collect();
            trace!(root = %root, depth, width = frontier.len(), "Snapshot level loaded");
        }

        Ok(snapshot)
    }

    /// Start a snapshot holding only `root`
    pub fn with_root(root: NodeSummary, horizon: usize) -> Self {
        let mut index = HashMap::new();
        index.insert(root.id, Self::ROOT);
        Self {
            nodes: vec![SnapshotNode {
                id: root.id,
                position: root.position,
                mode: root.mode,
                depth: 0,
                parent: None,
                children: Vec::new(),
            }],
            index,
            horizon,
        }
    }

    /// Attach `child` under its parent. Children whose parent is not in the
    /// arena, or that are already present, are ignored.
    pub fn attach(&mut self, child: NodeSummary, depth: usize) -> Option<usize> {
        if self.index.contains_key(&child.id) {
            return None;
        }
        let parent_idx = *self.index.get(&child.parent?)?;
        if self.nodes[parent_idx].depth + 1 != depth {
            return None;
        }

        let idx = self.nodes.len();
        self.nodes.push(SnapshotNode {
            id: child.id,
            position: child.position,
            mode: child.mode,
            depth,
            parent: Some(parent_idx),
            children: Vec::new(),
        });
        self.nodes[parent_idx].children.push(idx);
        self.index.insert(child.id, idx);
        Some(idx)
    }

    pub fn root(&self) -> &SnapshotNode {
        &self.nodes[Self::ROOT]
    }

    pub fn node(&self, idx: usize) -> &SnapshotNode {
        &self.nodes[idx]
    }

    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn children(&self, idx: usize) -> &[usize] {
        &self.nodes[idx].children
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Number of nodes in the arena, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Strict ancestors of `idx` below the root, nearest first
    pub fn ancestors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.nodes[idx].parent, move |&i| self.nodes[i].parent)
            .take_while(|&i| i != Self::ROOT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: NodeId, parent: Option<NodeId>, position: Option<Position>) -> NodeSummary {
        NodeSummary {
            id,
            parent,
            position,
            mode: Mode::Normal,
        }
    }

    #[test]
    fn test_attach_builds_adjacency() {
        let (r, a, b, c) = (NodeId::new(), NodeId::new(), NodeId::new(), NodeId::new());
        let mut snap = TreeSnapshot::with_root(summary(r, None, None), 5);

        assert_eq!(snap.attach(summary(a, Some(r), Some(Position::Left)), 1), Some(1));
        assert_eq!(snap.attach(summary(b, Some(r), Some(Position::Right)), 1), Some(2));
        assert_eq!(snap.attach(summary(c, Some(a), Some(Position::Left)), 2), Some(3));

        assert_eq!(snap.children(TreeSnapshot::ROOT), &[1, 2]);
        assert_eq!(snap.children(1), &[3]);
        assert_eq!(snap.node(3).depth, 2);
        assert_eq!(snap.ancestors(3).collect::<Vec<_>>(), vec![1]);
        assert_eq!(snap.ancestors(1).count(), 0);
    }

    #[test]
    fn test_attach_ignores_orphans_and_repeats() {
        let (r, a) = (NodeId::new(), NodeId::new());
        let mut snap = TreeSnapshot::with_root(summary(r, None, None), 5);

        assert_eq!(
            snap.attach(summary(a, Some(NodeId::new()), Some(Position::Left)), 1),
            None
        );
        assert_eq!(snap.attach(summary(a, Some(r), Some(Position::Left)), 1), Some(1));
        assert_eq!(snap.attach(summary(a, Some(r), Some(Position::Left)), 1), None);
        assert_eq!(snap.len(), 2);
    }
}
