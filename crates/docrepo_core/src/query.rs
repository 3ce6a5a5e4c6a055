//! Paginated query execution.

use crate::entity::Entity;
use crate::error::{RepoResult, RepositoryError};
use crate::store::StoreHandle;
use docrepo_storage::{Filter, QueryRequest, StorageError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Drains every page of a filtered query and decodes the results.
///
/// Pages are requested with the configured page size and concatenated in the
/// order the backend returns them. The whole result set is materialized
/// before the call returns. A backend that hands back the token it was just
/// given would never finish, so that ends the query with an error.
pub(crate) struct QueryExecutor {
    store: Arc<StoreHandle>,
}

impl QueryExecutor {
    pub(crate) fn new(store: Arc<StoreHandle>) -> Self {
        Self { store }
    }

    /// Runs `filter` across all partitions.
    pub(crate) async fn execute<T: Entity>(&self, filter: Filter) -> RepoResult<Vec<T>> {
        self.run(QueryRequest::new(filter, self.page_size())).await
    }

    /// Runs `filter` within a single partition.
    pub(crate) async fn execute_in_partition<T: Entity>(
        &self,
        filter: Filter,
        partition_key: &str,
    ) -> RepoResult<Vec<T>> {
        self.run(QueryRequest::new(filter, self.page_size()).in_partition(partition_key))
            .await
    }

    fn page_size(&self) -> usize {
        self.store.config().effective_page_size()
    }

    async fn run<T: Entity>(&self, mut request: QueryRequest) -> RepoResult<Vec<T>> {
        let container = self.store.container();
        let mut results = Vec::new();
        let mut pages = 0usize;

        loop {
            let page = self
                .store
                .deadline("query page", self.store.backend().query_items(container, &request))
                .await?
                .map_err(RepositoryError::Query)?;
            pages += 1;

            for document in page.items {
                results.push(serde_json::from_value(document)?);
            }

            match page.continuation {
                Some(token) if request.continuation.as_deref() == Some(token.as_str()) => {
                    warn!(container = %container, pages, token = %token, "continuation did not advance");
                    return Err(RepositoryError::Query(StorageError::InvalidContinuation(token)));
                }
                Some(token) => request = request.with_continuation(Some(token)),
                None => break,
            }
        }

        debug!(container = %container, pages, count = results.len(), "query drained");
        Ok(results)
    }
}
