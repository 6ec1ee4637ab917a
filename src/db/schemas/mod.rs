//! Database schemas for the sponsor tree

mod metadata;
mod node;

pub use metadata::Metadata;
pub use node::{NodeDoc, NodeSummaryDoc, NotificationDoc, NODE_COLLECTION};
