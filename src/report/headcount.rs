//! Raw generation headcount
//!
//! Number of nodes at each generation below a root, every level reported
//! even when empty. Shown on the account summary.

use serde::Serialize;

use crate::tree::{NodeId, TreeSnapshot, TreeStore};
use crate::types::Result;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LevelCount {
    pub generation: usize,
    pub count: u64,
}

/// Count nodes per generation, 1..=`depth`, below `root`
pub async fn generation_headcount(
    store: &dyn TreeStore,
    root: &NodeId,
    depth: usize,
) -> Result<Vec<LevelCount>> {
    let snapshot = TreeSnapshot::load(store, root, depth).await?;
    Ok(headcount(&snapshot, depth))
}

/// Count nodes per generation in an already loaded snapshot
pub fn headcount(snapshot: &TreeSnapshot, depth: usize) -> Vec<LevelCount> {
    let mut counts = vec![0u64; depth + 1];
    for idx in 1..snapshot.len() {
        let d = snapshot.node(idx).depth;
        if d <= depth {
            counts[d] += 1;
        }
    }

    counts
        .into_iter()
        .enumerate()
        .skip(1)
        .map(|(generation, count)| LevelCount { generation, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{MemoryTreeStore, Mode, NewNode, Position, Profile};

    fn new_node(handle: &str, parent: Option<NodeId>, position: Option<Position>) -> NewNode {
        NewNode {
            parent,
            position,
            mode: Mode::Normal,
            profile: Profile {
                handle: handle.into(),
                email: format!("{}@example.com", handle),
                national_id: handle.into(),
                ..Default::default()
            },
            password_hash: String::new(),
            created_by: None,
            points: 0,
            points_to_send: 0,
        }
    }

    #[tokio::test]
    async fn test_headcount_reports_empty_levels() {
        let store = MemoryTreeStore::new();
        let root = store.create(new_node("r", None, None)).await.unwrap();
        let a = store
            .create(new_node("a", Some(root.id), Some(Position::Left)))
            .await
            .unwrap();
        store
            .create(new_node("b", Some(root.id), Some(Position::Right)))
            .await
            .unwrap();
        store
            .create(new_node("c", Some(a.id), Some(Position::Left)))
            .await
            .unwrap();

        let levels = generation_headcount(&store, &root.id, 6).await.unwrap();
        assert_eq!(levels.len(), 6);
        assert_eq!(levels[0], LevelCount { generation: 1, count: 2 });
        assert_eq!(levels[1], LevelCount { generation: 2, count: 1 });
        assert!(levels[2..].iter().all(|l| l.count == 0));
    }
}
