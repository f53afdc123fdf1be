//! SQLite-backed cache store for intercepted request/response pairs.
//!
//! This module provides a persistent store of named partitions using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Versioned partitions, created on first open and deleted as a whole
//! - Last-write-wins entries keyed by request URL, kept in insertion order
//! - Atomic bulk population for install-time manifests
//! - Size-capped trimming that keeps the most recently added entries

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod partitions;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{CacheEntry, StoredResponse};
pub use partitions::PartitionInfo;
