//! Balance scoring
//!
//! - **counter**: depth-bounded branch counting over a snapshot
//! - **scorer**: pairing formula for normal and premium nodes
//! - **propagate**: rescoring every ancestor after a structural change

pub mod counter;
pub mod propagate;
pub mod scorer;

pub use counter::{count_subtree, BranchCounts};
pub use propagate::{AncestorPropagator, Pass, PropagationReport};
pub use scorer::{BalanceScorer, Evaluation, Score};
