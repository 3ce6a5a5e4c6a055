//! Typed repository over a ready store handle.

use crate::bulk::{BulkWriter, ItemOutcome};
use crate::config::RepositoryConfig;
use crate::entity::Entity;
use crate::error::{RepoResult, RepositoryError};
use crate::query::QueryExecutor;
use crate::store::StoreHandle;
use docrepo_storage::{DocumentBackend, Filter, StatusCode};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Create, read, update and delete operations for one entity type.
///
/// A repository is a thin typed view over a shared [`StoreHandle`]. It holds
/// no locks and no cache; cloning it is cheap and clones share the handle.
///
/// # Example
///
/// ```rust
/// use docrepo_core::{Entity, Filter, Repository, RepositoryConfig};
/// use docrepo_storage::InMemoryBackend;
/// use serde::{Deserialize, Serialize};
/// use std::sync::Arc;
///
/// #[derive(Debug, Serialize, Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct Note {
///     id: String,
///     partition_key: String,
///     text: String,
/// }
///
/// impl Entity for Note {
///     const CONTAINER: &'static str = "notes";
///     fn id(&self) -> &str { &self.id }
///     fn partition_key(&self) -> &str { &self.partition_key }
/// }
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let repo: Repository<Note> = Repository::connect(
///     Arc::new(InMemoryBackend::new()),
///     RepositoryConfig::for_entity::<Note>("app"),
/// )
/// .await
/// .unwrap();
///
/// repo.create(&Note { id: "n1".into(), partition_key: "u1".into(), text: "hi".into() })
///     .await
///     .unwrap();
///
/// let found = repo.get_by_filter(Filter::field("text").eq("hi")).await.unwrap();
/// assert_eq!(found.len(), 1);
/// # });
/// ```
pub struct Repository<T: Entity> {
    store: Arc<StoreHandle>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> std::fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &std::any::type_name::<T>())
            .field("container", &self.store.container())
            .finish()
    }
}

impl<T: Entity> Repository<T> {
    /// Wraps a ready store handle.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotInitialized`] if the handle has not been
    /// initialized.
    pub fn new(store: Arc<StoreHandle>) -> RepoResult<Self> {
        store.ensure_ready()?;
        Ok(Self {
            store,
            _entity: PhantomData,
        })
    }

    /// Builds a store handle, initializes it and wraps it.
    pub async fn connect(
        backend: Arc<dyn DocumentBackend>,
        config: RepositoryConfig,
    ) -> RepoResult<Self> {
        let store = Arc::new(StoreHandle::new(backend, config));
        store.initialize().await?;
        Self::new(store)
    }

    /// Returns the underlying store handle.
    #[must_use]
    pub fn store(&self) -> &Arc<StoreHandle> {
        &self.store
    }

    /// Returns every entity in the container.
    pub async fn get_all(&self) -> RepoResult<Vec<T>> {
        self.get_by_filter(Filter::All).await
    }

    /// Returns the entity with the given id.
    ///
    /// Searches all partitions. If several partitions hold a document with
    /// this id, the first one the backend returns wins.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no document has this id.
    pub async fn get_by_id(&self, id: &str) -> RepoResult<T> {
        self.get_by_filter(Filter::id(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::not_found(id))
    }

    /// Point-reads the entity at `(id, partition_key)`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no such document exists, and
    /// [`RepositoryError::Write`] if the backend answers with a status other
    /// than `200 OK`.
    pub async fn get_by_key(&self, id: &str, partition_key: &str) -> RepoResult<T> {
        let response = self
            .store
            .deadline(
                "read",
                self.store
                    .backend()
                    .read_item(self.store.container(), id, partition_key),
            )
            .await?
            .map_err(|e| RepositoryError::from_write("read", id, e, true))?;
        expect_status("read", id, StatusCode::OK, response.status)?;

        let document = response
            .document
            .ok_or_else(|| RepositoryError::not_found(id))?;
        Ok(serde_json::from_value(document)?)
    }

    /// Returns every entity matching `filter`, draining all pages.
    pub async fn get_by_filter(&self, filter: Filter) -> RepoResult<Vec<T>> {
        QueryExecutor::new(Arc::clone(&self.store))
            .execute(filter)
            .await
    }

    /// Returns every entity within one partition matching `filter`.
    pub async fn get_by_filter_in_partition(
        &self,
        filter: Filter,
        partition_key: &str,
    ) -> RepoResult<Vec<T>> {
        QueryExecutor::new(Arc::clone(&self.store))
            .execute_in_partition(filter, partition_key)
            .await
    }

    /// Returns every entity for which `predicate` holds.
    ///
    /// The predicate runs in-process, so this reads the entire container.
    /// Prefer [`get_by_filter`](Self::get_by_filter) when the condition can
    /// be expressed as a [`Filter`].
    pub async fn get_matching<F>(&self, predicate: F) -> RepoResult<Vec<T>>
    where
        F: Fn(&T) -> bool,
    {
        let mut all = self.get_all().await?;
        all.retain(|entity| predicate(entity));
        Ok(all)
    }

    /// Stores a new entity.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Write`] unless the backend reports
    /// `201 Created`.
    pub async fn create(&self, entity: &T) -> RepoResult<()> {
        let id = entity.id();
        let document = serde_json::to_value(entity)?;
        let response = self
            .store
            .deadline(
                "create",
                self.store.backend().create_item(
                    self.store.container(),
                    entity.partition_key(),
                    document,
                ),
            )
            .await?
            .map_err(|e| RepositoryError::from_write("create", id, e, false))?;

        debug!(id, status = %response.status, "create");
        expect_status("create", id, StatusCode::CREATED, response.status)
    }

    /// Stores many entities concurrently.
    ///
    /// Never fails as a whole: each input gets an [`ItemOutcome`] at the same
    /// index, and a failed item does not affect the others.
    pub async fn create_many(&self, entities: Vec<T>) -> Vec<ItemOutcome> {
        BulkWriter::new(Arc::clone(&self.store))
            .create_all(entities)
            .await
    }

    /// Replaces the stored entity at `(id, entity.partition_key())`.
    ///
    /// This is never a partition move: if `entity` carries a different
    /// partition key than the stored document, nothing is found.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no document exists at the
    /// target, or [`RepositoryError::Write`] unless the backend reports
    /// `200 OK`.
    pub async fn update(&self, id: &str, entity: &T) -> RepoResult<()> {
        let document = serde_json::to_value(entity)?;
        let response = self
            .store
            .deadline(
                "update",
                self.store.backend().replace_item(
                    self.store.container(),
                    id,
                    entity.partition_key(),
                    document,
                ),
            )
            .await?
            .map_err(|e| RepositoryError::from_write("update", id, e, true))?;

        debug!(id, status = %response.status, "update");
        expect_status("update", id, StatusCode::OK, response.status)
    }

    /// Deletes the entity with the given id.
    ///
    /// Looks the entity up first to learn its partition key, then deletes it.
    /// The two steps are not atomic: if another writer deletes the entity in
    /// between, this returns [`RepositoryError::NotFound`].
    pub async fn delete_by_id(&self, id: &str) -> RepoResult<()> {
        let entity = self.get_by_id(id).await?;
        self.delete_by_entity(&entity).await
    }

    /// Deletes the entity at `(entity.id(), entity.partition_key())`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no document exists at the
    /// target, or [`RepositoryError::Write`] unless the backend reports
    /// `204 No Content`.
    pub async fn delete_by_entity(&self, entity: &T) -> RepoResult<()> {
        let id = entity.id();
        let response = self
            .store
            .deadline(
                "delete",
                self.store.backend().delete_item(
                    self.store.container(),
                    id,
                    entity.partition_key(),
                ),
            )
            .await?
            .map_err(|e| RepositoryError::from_write("delete", id, e, true))?;

        debug!(id, status = %response.status, "delete");
        expect_status("delete", id, StatusCode::NO_CONTENT, response.status)
    }
}

fn expect_status(
    operation: &'static str,
    id: &str,
    expected: StatusCode,
    actual: StatusCode,
) -> RepoResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(RepositoryError::unexpected_status(operation, id, expected, actual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrepo_storage::{Fault, InMemoryBackend, Operation};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Person {
        id: String,
        partition_key: String,
        name: String,
        age: u32,
    }

    impl Entity for Person {
        const CONTAINER: &'static str = "people";

        fn id(&self) -> &str {
            &self.id
        }

        fn partition_key(&self) -> &str {
            &self.partition_key
        }
    }

    fn person(id: &str, pk: &str, age: u32) -> Person {
        Person {
            id: id.to_string(),
            partition_key: pk.to_string(),
            name: format!("person {}", id),
            age,
        }
    }

    async fn repo() -> (Arc<InMemoryBackend>, Repository<Person>) {
        let backend = Arc::new(InMemoryBackend::new());
        let repo = Repository::connect(
            Arc::clone(&backend) as Arc<dyn DocumentBackend>,
            RepositoryConfig::for_entity::<Person>("db").page_size(2),
        )
        .await
        .unwrap();
        (backend, repo)
    }

    #[tokio::test]
    async fn unready_store_is_rejected() {
        let store = Arc::new(StoreHandle::new(
            Arc::new(InMemoryBackend::new()),
            RepositoryConfig::for_entity::<Person>("db"),
        ));
        let err = Repository::<Person>::new(store).unwrap_err();
        assert!(matches!(err, RepositoryError::NotInitialized { .. }));
    }

    #[tokio::test]
    async fn create_then_get_by_id() {
        let (_backend, repo) = repo().await;
        let alice = person("a1", "true", 30);
        repo.create(&alice).await.unwrap();

        assert_eq!(repo.get_by_id("a1").await.unwrap(), alice);
        assert_eq!(repo.get_by_key("a1", "true").await.unwrap(), alice);
    }

    #[tokio::test]
    async fn get_by_id_missing_is_not_found() {
        let (_backend, repo) = repo().await;
        assert!(repo.get_by_id("nope").await.unwrap_err().is_not_found());
        assert!(repo.get_by_key("nope", "p").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn get_by_id_first_match_wins() {
        let (_backend, repo) = repo().await;
        repo.create(&person("dup", "p1", 1)).await.unwrap();
        repo.create(&person("dup", "p2", 2)).await.unwrap();
        assert_eq!(repo.get_by_id("dup").await.unwrap().partition_key, "p1");
    }

    #[tokio::test]
    async fn duplicate_create_is_a_write_error() {
        let (_backend, repo) = repo().await;
        repo.create(&person("a1", "p", 1)).await.unwrap();
        let err = repo.create(&person("a1", "p", 1)).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn create_with_unexpected_status_fails() {
        let (backend, repo) = repo().await;
        backend.inject_fault(Operation::Create, None, Fault::Respond(StatusCode::OK));
        let err = repo.create(&person("a1", "p", 1)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Write { operation: "create", .. }));
        assert_eq!(err.status(), Some(StatusCode::OK));
    }

    #[tokio::test]
    async fn point_read_with_unexpected_status_fails() {
        let (backend, repo) = repo().await;
        repo.create(&person("a1", "p", 1)).await.unwrap();
        backend.inject_fault(Operation::Read, Some("a1"), Fault::Respond(StatusCode::SERVICE_UNAVAILABLE));

        let err = repo.get_by_key("a1", "p").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Write { operation: "read", .. }));
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn filter_and_closure_queries() {
        let (_backend, repo) = repo().await;
        for (i, age) in [20, 35, 50, 65, 80].into_iter().enumerate() {
            repo.create(&person(&format!("p{}", i), "x", age)).await.unwrap();
        }

        let all = repo.get_all().await.unwrap();
        assert_eq!(all.len(), 5);

        let old = repo.get_by_filter(Filter::field("age").gt(50)).await.unwrap();
        assert_eq!(old.len(), 2);

        let even = repo.get_matching(|p| p.age % 2 == 0).await.unwrap();
        assert_eq!(even.len(), 3);

        let scoped = repo
            .get_by_filter_in_partition(Filter::All, "other")
            .await
            .unwrap();
        assert!(scoped.is_empty());
    }

    #[tokio::test]
    async fn update_replaces_document() {
        let (_backend, repo) = repo().await;
        let mut p = person("a1", "p", 1);
        repo.create(&p).await.unwrap();

        p.age = 2;
        repo.update("a1", &p).await.unwrap();
        assert_eq!(repo.get_by_id("a1").await.unwrap().age, 2);
    }

    #[tokio::test]
    async fn update_is_not_a_partition_move() {
        let (_backend, repo) = repo().await;
        repo.create(&person("a1", "p", 1)).await.unwrap();

        let moved = person("a1", "q", 1);
        assert!(repo.update("a1", &moved).await.unwrap_err().is_not_found());
        assert_eq!(repo.get_by_id("a1").await.unwrap().partition_key, "p");
    }

    #[tokio::test]
    async fn delete_by_id_and_by_entity() {
        let (backend, repo) = repo().await;
        let a = person("a", "p", 1);
        let b = person("b", "p", 2);
        repo.create(&a).await.unwrap();
        repo.create(&b).await.unwrap();

        repo.delete_by_id("a").await.unwrap();
        repo.delete_by_entity(&b).await.unwrap();
        assert_eq!(backend.item_count(repo.store().container()), 0);

        assert!(repo.delete_by_id("a").await.unwrap_err().is_not_found());
        assert!(repo.delete_by_entity(&b).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn delete_backend_rejection_is_a_write_error() {
        let (backend, repo) = repo().await;
        let a = person("a", "p", 1);
        repo.create(&a).await.unwrap();
        backend.inject_fault(
            Operation::Delete,
            Some("a"),
            Fault::Status(StatusCode::PRECONDITION_FAILED),
        );

        let err = repo.delete_by_entity(&a).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Write { operation: "delete", .. }));
        assert_eq!(err.status(), Some(StatusCode::PRECONDITION_FAILED));
    }

    #[tokio::test]
    async fn clones_share_the_store() {
        let (_backend, repo) = repo().await;
        let other = repo.clone();
        repo.create(&person("a", "p", 1)).await.unwrap();
        assert_eq!(other.get_all().await.unwrap().len(), 1);
        assert!(Arc::ptr_eq(repo.store(), other.store()));
    }
}
