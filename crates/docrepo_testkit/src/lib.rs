//! # docrepo Testkit
//!
//! Test utilities for docrepo.
//!
//! This crate provides:
//! - A sample entity with random generation
//! - Ready-made repositories over the in-memory backend
//! - Property-based test generators using proptest
//! - Bulk ingest reporting shared by the benchmarks and the CLI
//!
//! ## Usage
//!
//! ```rust
//! use docrepo_testkit::prelude::*;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let repo = TestRepository::new().await;
//! let entity = SampleEntity::random();
//! repo.create(&entity).await.unwrap();
//! assert_eq!(repo.get_by_id(&entity.id).await.unwrap(), entity);
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod ingest;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::ingest::*;
}

pub use fixtures::*;
pub use generators::*;
pub use ingest::*;
