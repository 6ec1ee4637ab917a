//! Database layer
//!
//! MongoDB persistence for the tree: a thin typed collection wrapper, the
//! node document schema, and the `TreeStore` implementation built on them.

pub mod mongo;
pub mod schemas;
pub mod tree_store;

pub use mongo::{MongoClient, MongoCollection};
pub use tree_store::MongoTreeStore;
