//! Core types and shared functionality for senial-sw.
//!
//! This crate provides:
//! - Cache store with SQLite backend (versioned partitions of request/response entries)
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheEntry, StoredResponse};
pub use config::{AppConfig, CacheNames};
pub use error::Error;
