//! Subtree branch counting
//!
//! Depth-first descent over a snapshot. Each descendant within the
//! generation budget is tallied under its own position; nothing below the
//! budget contributes.

use serde::Serialize;

use crate::tree::{Mode, Position, Quadrant, Side, TreeSnapshot};

/// Descendant counts per branch
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BranchCounts {
    pub left: u64,
    pub right: u64,
    /// Quadrant buckets, only tracked for premium evaluation
    pub left_left: u64,
    pub left_right: u64,
    pub right_left: u64,
    pub right_right: u64,
}

impl BranchCounts {
    pub fn side(&self, side: Side) -> u64 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn quadrant(&self, quadrant: Quadrant) -> u64 {
        match quadrant {
            Quadrant::LeftLeft => self.left_left,
            Quadrant::LeftRight => self.left_right,
            Quadrant::RightLeft => self.right_left,
            Quadrant::RightRight => self.right_right,
        }
    }

    /// Tally one node placed at `position`
    pub fn record(&mut self, position: Position, mode: Mode) {
        match position.side() {
            Side::Left => self.left += 1,
            Side::Right => self.right += 1,
        }

        if !mode.is_premium() {
            return;
        }
        match position.quadrant() {
            Some(Quadrant::LeftLeft) => self.left_left += 1,
            Some(Quadrant::LeftRight) => self.left_right += 1,
            Some(Quadrant::RightLeft) => self.right_left += 1,
            Some(Quadrant::RightRight) => self.right_right += 1,
            None => {}
        }
    }

    /// Fold another set of counts into this one
    pub fn merge(&mut self, other: &BranchCounts) {
        self.left += other.left;
        self.right += other.right;
        self.left_left += other.left_left;
        self.left_right += other.left_right;
        self.right_left += other.right_left;
        self.right_right += other.right_right;
    }

    pub fn total(&self) -> u64 {
        self.left + self.right
    }
}

/// Count the descendants of `idx` within `max_gen` generations
pub fn count_subtree(
    snapshot: &TreeSnapshot,
    idx: usize,
    mode: Mode,
    max_gen: usize,
) -> BranchCounts {
    count_generation(snapshot, idx, mode, 1, max_gen)
}

fn count_generation(
    snapshot: &TreeSnapshot,
    idx: usize,
    mode: Mode,
    generation: usize,
    max_gen: usize,
) -> BranchCounts {
    let mut totals = BranchCounts::default();
    if generation > max_gen {
        return totals;
    }

    for &child in snapshot.children(idx) {
        if let Some(position) = snapshot.node(child).position {
            totals.record(position, mode);
        }
        if generation < max_gen {
            let below = count_generation(snapshot, child, mode, generation + 1, max_gen);
            totals.merge(&below);
        }
    }

    totals
}
