//! Read-only reports over the tree
//!
//! - **generation**: per-generation census bucketed by inherited position
//! - **headcount**: raw node count per generation

pub mod generation;
pub mod headcount;

pub use generation::{GenerationEntry, GenerationReport, GenerationReporter};
pub use headcount::{generation_headcount, headcount, LevelCount};
