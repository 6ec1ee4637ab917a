//! Credential handling
//!
//! Passwords are stored as Argon2id PHC strings and checked when an account
//! confirms a transfer.

pub mod password;

pub use password::{hash_password, verify_password};
