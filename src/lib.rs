//! Sponsor tree - placement, balance scoring and point ledger
//!
//! Backend core of a referral network. Every account is a node placed under
//! a parent at a position from its mode's enumeration, and carries a cached
//! score derived from how balanced its bounded subtree is.
//!
//! ## Modules
//!
//! - **tree**: node model, the `TreeStore` contract, in-memory store, snapshots
//! - **scoring**: subtree counting, balance scoring, ancestor propagation
//! - **report**: per-generation census and raw headcounts
//! - **ledger**: effective balance derived from the notification log
//! - **services**: registration, transfers and account queries
//! - **db**: MongoDB persistence

pub mod auth;
pub mod config;
pub mod db;
pub mod ledger;
pub mod report;
pub mod scoring;
pub mod services;
pub mod tree;
pub mod types;

pub use config::{Args, NetworkPolicy};
pub use services::NetworkService;
pub use types::{Result, TreeError};
