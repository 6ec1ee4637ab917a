//! Generation census
//!
//! Read-only report of how many descendants sit at each generation below a
//! root, bucketed by inherited position: a node takes the bucket of its
//! nearest strict ancestor that already has one, and its own position
//! otherwise. In practice every descendant ends up under the branch of the
//! root through which it descends.
//!
//! ## Premium variant
//!
//! When the root is premium the census is weighted:
//! 1. a premium node counts `premium_weight` instead of 1 at its generation
//! 2. every premium strict ancestor of a node also credits `premium_weight`
//!    at the node's generation relative to that ancestor
//!
//! Both credits apply to the same node, so premium lineages are counted more
//! than once. Generations whose buckets sum to zero are left out.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::tree::{Mode, NodeId, Position, Side, TreeSnapshot, TreeStore};
use crate::types::Result;

/// Census of one generation
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationEntry {
    pub generation: usize,
    pub buckets: BTreeMap<Position, u64>,
}

impl GenerationEntry {
    pub fn bucket(&self, position: Position) -> u64 {
        self.buckets.get(&position).copied().unwrap_or(0)
    }

    /// Sum of every bucket on one coarse side
    pub fn side(&self, side: Side) -> u64 {
        self.buckets
            .iter()
            .filter(|(position, _)| position.side() == side)
            .map(|(_, count)| count)
            .sum()
    }

    pub fn total(&self) -> u64 {
        self.buckets.values().sum()
    }
}

/// Census of every non-empty generation under a root
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub root: NodeId,
    /// Mode of the root, which selects the weighting
    pub mode: Mode,
    pub generations: Vec<GenerationEntry>,
}

impl GenerationReport {
    pub fn generation(&self, generation: usize) -> Option<&GenerationEntry> {
        self.generations.iter().find(|g| g.generation == generation)
    }
}

/// Builds generation reports
#[derive(Clone, Copy, Debug)]
pub struct GenerationReporter {
    horizon: usize,
    premium_weight: u64,
}

impl GenerationReporter {
    pub fn new(horizon: usize, premium_weight: u64) -> Self {
        Self {
            horizon,
            premium_weight,
        }
    }

    /// Load the subtree under `root` and report on it
    pub async fn compute(&self, store: &dyn TreeStore, root: &NodeId) -> Result<GenerationReport> {
        let snapshot = TreeSnapshot::load(store, root, self.horizon).await?;
        Ok(self.report(&snapshot))
    }

    /// Report on an already loaded snapshot
    pub fn report(&self, snapshot: &TreeSnapshot) -> GenerationReport {
        let root = snapshot.root();
        let premium = root.mode.is_premium();
        let mut levels: Vec<BTreeMap<Position, u64>> = vec![BTreeMap::new(); self.horizon + 1];

        // Parents precede children in the arena, so one forward pass resolves
        // every inherited bucket.
        let mut buckets: Vec<Option<Position>> = vec![None; snapshot.len()];

        for idx in 1..snapshot.len() {
            let node = snapshot.node(idx);
            let inherited = node
                .parent
                .filter(|&p| p != TreeSnapshot::ROOT)
                .and_then(|p| buckets[p]);
            let bucket = inherited.or(node.position);
            buckets[idx] = bucket;

            let Some(bucket) = bucket else { continue };
            if node.depth == 0 || node.depth > self.horizon {
                continue;
            }

            let own_weight = if premium && node.mode.is_premium() {
                self.premium_weight
            } else {
                1
            };
            *levels[node.depth].entry(bucket).or_insert(0) += own_weight;

            if !premium {
                continue;
            }
            for ancestor in snapshot.ancestors(idx) {
                let ancestor = snapshot.node(ancestor);
                if ancestor.mode.is_premium() {
                    let relative = node.depth - ancestor.depth;
                    *levels[relative].entry(bucket).or_insert(0) += self.premium_weight;
                }
            }
        }

        let generations = levels
            .into_iter()
            .enumerate()
            .skip(1)
            .map(|(generation, buckets)| GenerationEntry {
                generation,
                buckets,
            })
            .filter(|entry| entry.total() > 0)
            .collect();

        GenerationReport {
            root: root.id,
            mode: root.mode,
            generations,
        }
    }
}

impl Default for GenerationReporter {
    fn default() -> Self {
        Self::new(5, 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeSummary;

    struct Builder {
        snapshot: TreeSnapshot,
        ids: Vec<NodeId>,
    }

    impl Builder {
        fn new(mode: Mode) -> Self {
            let root = NodeId::new();
            Self {
                snapshot: TreeSnapshot::with_root(
                    NodeSummary {
                        id: root,
                        parent: None,
                        position: None,
                        mode,
                    },
                    5,
                ),
                ids: vec![root],
            }
        }

        /// Attach under the node with arena index `parent`, returning the new index
        fn add(&mut self, parent: usize, position: Position, mode: Mode) -> usize {
            let id = NodeId::new();
            let depth = self.snapshot.node(parent).depth + 1;
            let idx = self
                .snapshot
                .attach(
                    NodeSummary {
                        id,
                        parent: Some(self.ids[parent]),
                        position: Some(position),
                        mode,
                    },
                    depth,
                )
                .unwrap();
            self.ids.push(id);
            idx
        }
    }

    #[test]
    fn test_single_level_has_one_entry() {
        let mut b = Builder::new(Mode::Normal);
        b.add(0, Position::Left, Mode::Normal);
        b.add(0, Position::Right, Mode::Normal);

        let report = GenerationReporter::default().report(&b.snapshot);
        assert_eq!(report.generations.len(), 1);
        let first = &report.generations[0];
        assert_eq!(first.generation, 1);
        assert_eq!(first.bucket(Position::Left), 1);
        assert_eq!(first.bucket(Position::Right), 1);
    }

    #[test]
    fn test_descendants_inherit_branch_of_root_child() {
        let mut b = Builder::new(Mode::Normal);
        let l = b.add(0, Position::Left, Mode::Normal);
        let lr = b.add(l, Position::Right, Mode::Normal);
        b.add(lr, Position::Right, Mode::Normal);
        b.add(0, Position::Right, Mode::Normal);

        let report = GenerationReporter::default().report(&b.snapshot);
        assert_eq!(report.generations.len(), 3);

        let second = report.generation(2).unwrap();
        assert_eq!(second.bucket(Position::Left), 1);
        assert_eq!(second.bucket(Position::Right), 0);

        let third = report.generation(3).unwrap();
        assert_eq!(third.bucket(Position::Left), 1);
        assert_eq!(third.side(Side::Right), 0);
    }

    #[test]
    fn test_empty_tree_reports_nothing() {
        let b = Builder::new(Mode::Normal);
        let report = GenerationReporter::default().report(&b.snapshot);
        assert!(report.generations.is_empty());
    }

    #[test]
    fn test_premium_weights_and_ancestor_replication() {
        // P(root, premium) -> A(LL, premium) -> B(LR, normal)
        let mut b = Builder::new(Mode::Premium);
        let a = b.add(0, Position::LeftLeft, Mode::Premium);
        b.add(a, Position::LeftRight, Mode::Normal);

        let report = GenerationReporter::default().report(&b.snapshot);

        // gen 1: A counts 3 for being premium, plus A's replication of B at
        // B's depth below A (1) adds another 3
        let first = report.generation(1).unwrap();
        assert_eq!(first.bucket(Position::LeftLeft), 6);

        // gen 2: B is normal and counts 1 under the inherited LL bucket
        let second = report.generation(2).unwrap();
        assert_eq!(second.bucket(Position::LeftLeft), 1);
        assert_eq!(second.total(), 1);
    }

    #[test]
    fn test_stacked_premium_ancestors_each_replicate() {
        // P(root, premium) -> A(LL, premium) -> B(LR, premium) -> C(L, normal)
        let mut b = Builder::new(Mode::Premium);
        let a = b.add(0, Position::LeftLeft, Mode::Premium);
        let bb = b.add(a, Position::LeftRight, Mode::Premium);
        b.add(bb, Position::Left, Mode::Normal);

        let report = GenerationReporter::default().report(&b.snapshot);
        assert_eq!(report.generations.len(), 3);

        // A own 3, A replicating B at 1, B replicating C at 1
        let first = report.generation(1).unwrap();
        assert_eq!(first.bucket(Position::LeftLeft), 9);
        assert_eq!(first.total(), 9);

        // B own 3, A replicating C at 2
        let second = report.generation(2).unwrap();
        assert_eq!(second.bucket(Position::LeftLeft), 6);
        assert_eq!(second.total(), 6);

        // C is normal and counted once at its own depth
        let third = report.generation(3).unwrap();
        assert_eq!(third.bucket(Position::LeftLeft), 1);
        assert_eq!(third.total(), 1);
    }

    #[test]
    fn test_premium_weighting_off_for_normal_root() {
        let mut b = Builder::new(Mode::Normal);
        let a = b.add(0, Position::LeftLeft, Mode::Premium);
        b.add(a, Position::Right, Mode::Normal);

        let report = GenerationReporter::default().report(&b.snapshot);
        assert_eq!(report.generation(1).unwrap().total(), 1);
        assert_eq!(report.generation(2).unwrap().bucket(Position::LeftLeft), 1);
    }
}
