//! # docrepo Core
//!
//! Generic repository layer over partitioned document stores.
//!
//! This crate provides:
//! - The [`Entity`] contract (identity plus partition key)
//! - [`StoreHandle`] for idempotent database and container provisioning
//! - [`Repository`] for typed create, read, update and delete
//! - Bounded concurrent bulk creation with per-item outcomes
//! - Paginated query execution over the [`Filter`] DSL
//!
//! ## Lifecycle
//!
//! A [`StoreHandle`] is constructed unready and must be initialized before a
//! [`Repository`] can be built over it. [`Repository::connect`] performs
//! both steps.
//!
//! ## Example
//!
//! ```rust
//! use docrepo_core::prelude::*;
//! use docrepo_storage::InMemoryBackend;
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! struct Reading {
//!     id: String,
//!     partition_key: String,
//!     value: f64,
//! }
//!
//! impl Entity for Reading {
//!     const CONTAINER: &'static str = "readings";
//!     fn id(&self) -> &str { &self.id }
//!     fn partition_key(&self) -> &str { &self.partition_key }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let store = Arc::new(StoreHandle::new(
//!     Arc::new(InMemoryBackend::new()),
//!     RepositoryConfig::for_entity::<Reading>("telemetry").max_concurrency(8),
//! ));
//! store.initialize().await.unwrap();
//! let repo = Repository::<Reading>::new(store).unwrap();
//!
//! let batch = (0..3)
//!     .map(|i| Reading { id: format!("r{}", i), partition_key: "sensor-1".into(), value: i as f64 })
//!     .collect();
//! let outcomes = repo.create_many(batch).await;
//! assert!(outcomes.iter().all(ItemOutcome::success));
//!
//! let high = repo.get_by_filter(Filter::field("value").ge(1.0)).await.unwrap();
//! assert_eq!(high.len(), 2);
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bulk;
mod config;
mod entity;
mod error;
mod query;
mod repository;
mod store;

pub use bulk::{BulkItemError, ItemOutcome};
pub use config::RepositoryConfig;
pub use entity::Entity;
pub use error::{RepoResult, RepositoryError};
pub use repository::Repository;
pub use store::{ProvisionStatus, Provisioned, StoreHandle};

pub use docrepo_storage::{CompareOp, DocumentBackend, Field, Filter, IndexingPolicy, StatusCode};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        Entity, Filter, ItemOutcome, RepoResult, Repository, RepositoryConfig, RepositoryError,
        StoreHandle,
    };
}
