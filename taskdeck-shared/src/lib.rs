//! # TaskDeck Shared Library
//!
//! This crate contains the types, database models, and auth utilities shared
//! by the TaskDeck API server (and any future binaries).
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Password hashing, token keys, and auth middleware
//! - `db`: Connection pooling and migrations
//! - `visibility`: Caller identity and the task visibility predicate

pub mod auth;
pub mod db;
pub mod models;
pub mod visibility;

/// Current version of the TaskDeck shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
