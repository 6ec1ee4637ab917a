//! Shared types for the sponsor tree

mod error;

pub use error::{Result, TreeError};
