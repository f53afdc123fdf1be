//! Offline-first service worker for senial-sw.
//!
//! This crate routes intercepted requests to a caching strategy, runs the
//! install/activate lifecycle over versioned cache partitions, and handles
//! push, notification, message and sync events.

pub mod events;
pub mod fetch;
pub mod host;
pub mod lifecycle;
pub mod request;
pub mod route;
pub mod strategy;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use events::{ClickOutcome, PushPayload, SyncOutcome, WorkerMessage};
pub use fetch::{FetchClient, FetchConfig, FetchResponse, Fetcher};
pub use host::{Client, Clients, Notification, NotificationAction, Notifications};
pub use lifecycle::{ActivationReport, EvictionTask, Lifecycle, WorkerConfig, WorkerState};
pub use request::{OFFLINE_CONTENT, OFFLINE_RESOURCE, ResponseSource, WorkerRequest, WorkerResponse};
pub use route::{Classification, Route, RouteRules, Strategy, classify};
pub use strategy::StrategyContext;
pub use worker::{FetchOutcome, ServiceWorker, WorkerStatus};
