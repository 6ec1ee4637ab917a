//! Tree model and storage
//!
//! - **position**: placement modes and the closed position enumerations
//! - **node**: node, notification and profile types
//! - **store**: the `TreeStore` contract consumed by scoring and services
//! - **memory**: in-memory `TreeStore`
//! - **snapshot**: bounded subtree arena used by counting and reporting

pub mod memory;
pub mod node;
pub mod position;
pub mod snapshot;
pub mod store;

pub use memory::MemoryTreeStore;
pub use node::{NewNode, Node, NodeId, NodeSummary, Notification, Profile, Role, Sign};
pub use position::{Mode, Position, Quadrant, Side};
pub use snapshot::{SnapshotNode, TreeSnapshot};
pub use store::{LedgerUpdate, ProfileUpdate, TreeStore};
