//! Document backend trait definition.

use crate::error::StorageResult;
use crate::types::{
    ContainerPath, ContainerProperties, Document, FeedPage, ItemResponse, QueryRequest, StatusCode,
};
use async_trait::async_trait;

/// A partitioned document store.
///
/// Backends store JSON documents in containers grouped by database. Every
/// document lives in exactly one partition, identified by the value found at
/// the container's partition key path. Point operations address a document
/// by `id` plus partition key.
///
/// # Invariants
///
/// - `id` is unique within a partition, not across partitions
/// - `create_item` reports [`StatusCode::CREATED`] on success
/// - `replace_item` reports [`StatusCode::OK`] on success
/// - `delete_item` reports [`StatusCode::NO_CONTENT`] on success
/// - Rejections are returned as [`crate::StorageError::Status`]
/// - Backends must be `Send + Sync` for concurrent access
///
/// Endpoints and credentials are arguments of a concrete backend's
/// constructor; this trait never sees them.
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing and benchmarks
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Creates a database unless it already exists.
    ///
    /// Returns [`StatusCode::CREATED`] if the database was created and
    /// [`StatusCode::OK`] if it already existed.
    async fn create_database_if_not_exists(&self, database: &str) -> StorageResult<StatusCode>;

    /// Creates a container unless it already exists.
    ///
    /// Returns [`StatusCode::CREATED`] if the container was created and
    /// [`StatusCode::OK`] if a container with a compatible partition key
    /// path already existed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The database does not exist
    /// - The partition key path or throughput is invalid
    /// - A container with the same name has a different partition key path
    async fn create_container_if_not_exists(
        &self,
        database: &str,
        properties: &ContainerProperties,
        throughput: Option<u32>,
    ) -> StorageResult<StatusCode>;

    /// Inserts a new document into the given partition.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The document has no `id` or an empty one
    /// - The partition key inside the document differs from `partition_key`
    /// - A document with the same `id` already exists in the partition
    async fn create_item(
        &self,
        container: &ContainerPath,
        partition_key: &str,
        document: Document,
    ) -> StorageResult<ItemResponse>;

    /// Reads one document by `id` and partition key.
    async fn read_item(
        &self,
        container: &ContainerPath,
        id: &str,
        partition_key: &str,
    ) -> StorageResult<ItemResponse>;

    /// Replaces the document stored at `id` in the given partition.
    ///
    /// The replacement must keep the same `id` and partition key. A document
    /// is never moved between partitions.
    async fn replace_item(
        &self,
        container: &ContainerPath,
        id: &str,
        partition_key: &str,
        document: Document,
    ) -> StorageResult<ItemResponse>;

    /// Deletes the document stored at `id` in the given partition.
    async fn delete_item(
        &self,
        container: &ContainerPath,
        id: &str,
        partition_key: &str,
    ) -> StorageResult<ItemResponse>;

    /// Fetches one page of documents matching the request's filter.
    ///
    /// Callers keep requesting pages, passing the returned continuation
    /// token, until the backend returns a page without one.
    async fn query_items(
        &self,
        container: &ContainerPath,
        request: &QueryRequest,
    ) -> StorageResult<FeedPage>;
}
