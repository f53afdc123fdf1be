//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting and trimming the worker's
//! cache partitions.

pub mod get;
pub mod list;
pub mod purge;

pub use get::{CacheGetParams, get_impl};
pub use list::{CacheListParams, list_impl};
pub use purge::{CachePurgeParams, purge_impl};
