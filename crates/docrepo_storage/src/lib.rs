//! # docrepo Storage
//!
//! Document backend trait and reference implementation for docrepo.
//!
//! This crate is the narrow interface between the repository core and a
//! partitioned document database. Backends store JSON documents; they know
//! nothing about the entity types the repository maps onto them.
//!
//! ## Design Principles
//!
//! - Backends address documents by `id` plus partition key
//! - Every network round trip is an `async fn`
//! - Rejections carry the backend status code ([`StorageError::Status`])
//! - Queries are expressed with the [`Filter`] DSL and paged with opaque
//!   continuation tokens
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing, benchmarks and ephemeral stores
//!
//! ## Example
//!
//! ```rust
//! use docrepo_storage::{Filter, QueryRequest};
//!
//! let request = QueryRequest::new(Filter::field("locator").eq(42), 100);
//! assert!(request.continuation.is_none());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod filter;
mod memory;
mod types;

pub use backend::DocumentBackend;
pub use error::{StorageError, StorageResult};
pub use filter::{CompareOp, Field, Filter};
pub use memory::{Fault, InMemoryBackend, Operation};
pub use types::{
    ContainerPath, ContainerProperties, Document, FeedPage, IndexingMode, IndexingPolicy,
    ItemResponse, QueryRequest, StatusCode, DEFAULT_PARTITION_KEY_PATH, MIN_THROUGHPUT,
};
