//! ordo Core Library
//!
//! This crate provides the core functionality for ordo, a minimal
//! personal task list: short text items kept in a strict, user-controlled
//! order and synchronized live through a remote record store.
//!
//! # Architecture
//!
//! Items carry an integer `order` key (multiples of 1000). The
//! [`ListManager`] assigns and renumbers keys on create, move, and
//! delete; the store pushes full collection snapshots over a live
//! subscription, and each snapshot replaces local state wholesale.
//!
//! # Quick Start
//!
//! ```text
//! let store = Arc::new(MemoryStore::new());
//! let mut manager = ListManager::new(store.clone());
//! let mut sub = store.subscribe().await?;
//!
//! manager.ingest_snapshot(sub.recv().await.unwrap());
//! manager.create("buy milk").await?;
//! manager.ingest_snapshot(sub.recv().await.unwrap());
//! ```
//!
//! # Modules
//!
//! - `manager`: ordered item list manager (main entry point)
//! - `models`: item and direction data structures
//! - `store`: record store boundary and its implementations
//! - `auth`: access modes for the store boundary
//! - `config`: application configuration

pub mod auth;
pub mod config;
pub mod manager;
pub mod models;
pub mod store;

pub use auth::AccessMode;
pub use config::Config;
pub use manager::{ListError, ListManager, ListResult};
pub use models::{order_for_position, Direction, Item, ORDER_STEP};
pub use store::{
    ConnectionStatus, LocalStore, MemoryStore, RecordStore, RemoteConfig, RemoteStore, StoreError,
    StoreResult, Subscription,
};
