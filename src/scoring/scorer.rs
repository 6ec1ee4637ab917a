//! Balance scoring
//!
//! Binary score: `pair_reward * min(left, right)`. Premium nodes add a bonus
//! over the four cross pairings of left quadrants with right quadrants.

use serde::Serialize;

use super::counter::{count_subtree, BranchCounts};
use crate::tree::{Mode, TreeSnapshot};

/// Score of one evaluation root
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub binary: i64,
    pub premium_bonus: i64,
}

impl Score {
    pub fn total(&self) -> i64 {
        self.binary + self.premium_bonus
    }
}

/// Counts and score of one evaluation root
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub counts: BranchCounts,
    pub score: Score,
}

/// Converts branch counts into points
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalanceScorer {
    pair_reward: i64,
    generation_horizon: usize,
}

impl BalanceScorer {
    pub fn new(pair_reward: i64, generation_horizon: usize) -> Self {
        Self {
            pair_reward,
            generation_horizon,
        }
    }

    pub fn generation_horizon(&self) -> usize {
        self.generation_horizon
    }

    /// Score a set of counts under `mode`
    pub fn score(&self, counts: &BranchCounts, mode: Mode) -> Score {
        let binary = self.pairs(counts.left.min(counts.right));
        let premium_bonus = match mode {
            Mode::Normal => 0,
            Mode::Premium => self.pairs(
                counts.left_left.min(counts.right_left)
                    + counts.left_left.min(counts.right_right)
                    + counts.left_right.min(counts.right_left)
                    + counts.left_right.min(counts.right_right),
            ),
        };
        Score {
            binary,
            premium_bonus,
        }
    }

    /// Count and score the subtree under `idx`, using that node's own mode
    pub fn evaluate(&self, snapshot: &TreeSnapshot, idx: usize) -> Evaluation {
        let mode = snapshot.node(idx).mode;
        let counts = count_subtree(snapshot, idx, mode, self.generation_horizon);
        Evaluation {
            counts,
            score: self.score(&counts, mode),
        }
    }

    fn pairs(&self, pairs: u64) -> i64 {
        self.pair_reward.saturating_mul(i64::try_from(pairs).unwrap_or(i64::MAX))
    }
}

impl Default for BalanceScorer {
    fn default() -> Self {
        Self::new(90, 5)
    }
}
