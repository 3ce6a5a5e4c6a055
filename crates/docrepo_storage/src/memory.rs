//! In-memory document backend for testing.

use crate::backend::DocumentBackend;
use crate::error::{StorageError, StorageResult};
use crate::types::{
    ContainerPath, ContainerProperties, Document, FeedPage, ItemResponse, QueryRequest, StatusCode,
    MIN_THROUGHPUT,
};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const CONTINUATION_PREFIX: &str = "+seq:";

/// Characters a document id may not contain.
const FORBIDDEN_ID_CHARS: [char; 4] = ['/', '\\', '?', '#'];

/// Backend operations that can be targeted by an injected [`Fault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `create_database_if_not_exists`
    CreateDatabase,
    /// `create_container_if_not_exists`
    CreateContainer,
    /// `create_item`
    Create,
    /// `read_item`
    Read,
    /// `replace_item`
    Replace,
    /// `delete_item`
    Delete,
    /// `query_items`
    Query,
}

/// A failure injected into an [`InMemoryBackend`] operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Reject the request with a backend status error.
    Status(StatusCode),
    /// Fail without producing a backend response.
    Transport(String),
    /// Skip the operation but report success with this status.
    Respond(StatusCode),
}

#[derive(Debug, Clone)]
struct StoredItem {
    partition_key: String,
    document: Document,
}

#[derive(Debug)]
struct ContainerState {
    properties: ContainerProperties,
    throughput: Option<u32>,
    next_seq: u64,
    /// Items in insertion order, keyed by sequence number.
    items: BTreeMap<u64, StoredItem>,
    /// `(partition_key, id)` to sequence number.
    keys: HashMap<(String, String), u64>,
}

impl ContainerState {
    fn new(properties: ContainerProperties, throughput: Option<u32>) -> Self {
        Self {
            properties,
            throughput,
            next_seq: 1,
            items: BTreeMap::new(),
            keys: HashMap::new(),
        }
    }

    fn lookup(&self, id: &str, partition_key: &str) -> Option<u64> {
        self.keys
            .get(&(partition_key.to_string(), id.to_string()))
            .copied()
    }
}

#[derive(Debug, Default)]
struct DatabaseState {
    containers: HashMap<String, ContainerState>,
}

/// An in-memory partitioned document store.
///
/// This backend keeps every database in process memory and is suitable for:
/// - Unit and integration tests
/// - Benchmarks of the repository layer without network noise
///
/// It models the behaviour repositories depend on: per-partition id
/// uniqueness, partition key validation, insertion-ordered paging with
/// opaque continuation tokens, optional artificial latency and injectable
/// faults.
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across tasks behind an
/// `Arc`. No lock is held across an `.await`.
///
/// # Example
///
/// ```rust
/// use docrepo_storage::{ContainerPath, ContainerProperties, DocumentBackend, InMemoryBackend, StatusCode};
/// use serde_json::json;
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let backend = InMemoryBackend::new();
/// backend.create_database_if_not_exists("db").await.unwrap();
/// backend
///     .create_container_if_not_exists("db", &ContainerProperties::new("items", "/partitionKey"), None)
///     .await
///     .unwrap();
///
/// let path = ContainerPath::new("db", "items");
/// let doc = json!({ "id": "a1", "partitionKey": "p" });
/// let response = backend.create_item(&path, "p", doc).await.unwrap();
/// assert_eq!(response.status, StatusCode::CREATED);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    databases: RwLock<HashMap<String, DatabaseState>>,
    faults: Mutex<HashMap<(Operation, Option<String>), Fault>>,
    latency: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl InMemoryBackend {
    /// Creates a new empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every operation by `latency` before it is processed.
    ///
    /// Useful for exercising concurrency limits and deadlines.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(Some(latency));
        self
    }

    /// Changes the artificial latency of subsequent operations.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Injects a fault into `operation`.
    ///
    /// With `id` set, only requests for that document id are affected;
    /// otherwise every request of that kind is. Faults stay active until
    /// [`clear_faults`](Self::clear_faults) is called. An id-specific fault
    /// takes precedence over a wildcard one.
    pub fn inject_fault(&self, operation: Operation, id: Option<&str>, fault: Fault) {
        self.faults
            .lock()
            .insert((operation, id.map(str::to_string)), fault);
    }

    /// Removes all injected faults.
    pub fn clear_faults(&self) {
        self.faults.lock().clear();
    }

    /// Returns the highest number of operations that were in flight at once.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Resets the in-flight high-water mark.
    pub fn reset_peak_in_flight(&self) {
        self.peak_in_flight
            .store(self.in_flight.load(Ordering::SeqCst), Ordering::SeqCst);
    }

    /// Returns true if the database exists.
    #[must_use]
    pub fn has_database(&self, database: &str) -> bool {
        self.databases.read().contains_key(database)
    }

    /// Returns the declared properties of a container, if it exists.
    #[must_use]
    pub fn container_properties(&self, path: &ContainerPath) -> Option<ContainerProperties> {
        self.databases
            .read()
            .get(&path.database)
            .and_then(|db| db.containers.get(&path.container))
            .map(|c| c.properties.clone())
    }

    /// Returns the provisioned throughput of a container, if any.
    #[must_use]
    pub fn container_throughput(&self, path: &ContainerPath) -> Option<u32> {
        self.databases
            .read()
            .get(&path.database)
            .and_then(|db| db.containers.get(&path.container))
            .and_then(|c| c.throughput)
    }

    /// Returns the number of documents in a container (0 if it is missing).
    #[must_use]
    pub fn item_count(&self, path: &ContainerPath) -> usize {
        self.databases
            .read()
            .get(&path.database)
            .and_then(|db| db.containers.get(&path.container))
            .map_or(0, |c| c.items.len())
    }

    async fn enter(&self) -> InFlight<'_> {
        let guard = InFlight::new(&self.in_flight, &self.peak_in_flight);
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        guard
    }

    /// Resolves injected faults.
    ///
    /// Returns `Ok(Some(status))` for a [`Fault::Respond`] fault.
    fn fault(&self, operation: Operation, id: Option<&str>) -> StorageResult<Option<StatusCode>> {
        let faults = self.faults.lock();
        let fault = id
            .and_then(|id| faults.get(&(operation, Some(id.to_string()))))
            .or_else(|| faults.get(&(operation, None)));

        match fault {
            None => Ok(None),
            Some(Fault::Status(status)) => Err(StorageError::status(
                *status,
                format!("injected fault on {:?}", operation),
            )),
            Some(Fault::Transport(message)) => Err(StorageError::transport(message.clone())),
            Some(Fault::Respond(status)) => Ok(Some(*status)),
        }
    }

    fn with_container<R>(
        &self,
        path: &ContainerPath,
        f: impl FnOnce(&ContainerState) -> StorageResult<R>,
    ) -> StorageResult<R> {
        let databases = self.databases.read();
        let container = databases
            .get(&path.database)
            .ok_or_else(|| StorageError::not_found(format!("database {} not found", path.database)))?
            .containers
            .get(&path.container)
            .ok_or_else(|| StorageError::not_found(format!("container {} not found", path)))?;
        f(container)
    }

    fn with_container_mut<R>(
        &self,
        path: &ContainerPath,
        f: impl FnOnce(&mut ContainerState) -> StorageResult<R>,
    ) -> StorageResult<R> {
        let mut databases = self.databases.write();
        let container = databases
            .get_mut(&path.database)
            .ok_or_else(|| StorageError::not_found(format!("database {} not found", path.database)))?
            .containers
            .get_mut(&path.container)
            .ok_or_else(|| StorageError::not_found(format!("container {} not found", path)))?;
        f(container)
    }

    fn insert(
        &self,
        path: &ContainerPath,
        partition_key: &str,
        document: Document,
    ) -> StorageResult<ItemResponse> {
        let id = document_id(&document)?;
        self.with_container_mut(path, |container| {
            check_partition_key(&container.properties, &document, partition_key)?;

            let key = (partition_key.to_string(), id.clone());
            if container.keys.contains_key(&key) {
                return Err(StorageError::conflict(format!(
                    "entity with id {} already exists in partition {}",
                    id, partition_key
                )));
            }

            let seq = container.next_seq;
            container.next_seq += 1;
            container.keys.insert(key, seq);
            container.items.insert(
                seq,
                StoredItem {
                    partition_key: partition_key.to_string(),
                    document: document.clone(),
                },
            );
            Ok(ItemResponse::with_document(StatusCode::CREATED, document))
        })
    }

    fn replace(
        &self,
        path: &ContainerPath,
        id: &str,
        partition_key: &str,
        document: Document,
    ) -> StorageResult<ItemResponse> {
        let document_id = document_id(&document)?;
        if document_id != id {
            return Err(StorageError::bad_request(format!(
                "replacement document id {} does not match target id {}",
                document_id, id
            )));
        }

        self.with_container_mut(path, |container| {
            check_partition_key(&container.properties, &document, partition_key)?;

            let seq = container.lookup(id, partition_key).ok_or_else(|| {
                StorageError::not_found(format!("entity {} not found in partition {}", id, partition_key))
            })?;
            if let Some(item) = container.items.get_mut(&seq) {
                item.document = document.clone();
            }
            Ok(ItemResponse::with_document(StatusCode::OK, document))
        })
    }

    fn remove(&self, path: &ContainerPath, id: &str, partition_key: &str) -> StorageResult<ItemResponse> {
        self.with_container_mut(path, |container| {
            let seq = container
                .keys
                .remove(&(partition_key.to_string(), id.to_string()))
                .ok_or_else(|| {
                    StorageError::not_found(format!(
                        "entity {} not found in partition {}",
                        id, partition_key
                    ))
                })?;
            container.items.remove(&seq);
            Ok(ItemResponse::empty(StatusCode::NO_CONTENT))
        })
    }

    fn page(&self, path: &ContainerPath, request: &QueryRequest) -> StorageResult<FeedPage> {
        let after = match &request.continuation {
            Some(token) => Bound::Excluded(parse_continuation(token)?),
            None => Bound::Unbounded,
        };
        let limit = request.max_item_count.max(1);

        self.with_container(path, |container| {
            let mut matched: Vec<(u64, &StoredItem)> = container
                .items
                .range((after, Bound::Unbounded))
                .filter(|(_, item)| {
                    request
                        .partition_key
                        .as_deref()
                        .map_or(true, |pk| pk == item.partition_key)
                })
                .filter(|(_, item)| request.filter.matches(&item.document))
                .take(limit + 1)
                .map(|(seq, item)| (*seq, item))
                .collect();

            let continuation = if matched.len() > limit {
                matched.truncate(limit);
                matched.last().map(|(seq, _)| format!("{}{}", CONTINUATION_PREFIX, seq))
            } else {
                None
            };

            Ok(FeedPage {
                items: matched
                    .into_iter()
                    .map(|(_, item)| item.document.clone())
                    .collect(),
                continuation,
            })
        })
    }
}

#[async_trait]
impl DocumentBackend for InMemoryBackend {
    async fn create_database_if_not_exists(&self, database: &str) -> StorageResult<StatusCode> {
        let _in_flight = self.enter().await;
        if let Some(status) = self.fault(Operation::CreateDatabase, None)? {
            return Ok(status);
        }
        if database.is_empty() {
            return Err(StorageError::bad_request("database name must not be empty"));
        }

        let mut databases = self.databases.write();
        if databases.contains_key(database) {
            return Ok(StatusCode::OK);
        }
        databases.insert(database.to_string(), DatabaseState::default());
        Ok(StatusCode::CREATED)
    }

    async fn create_container_if_not_exists(
        &self,
        database: &str,
        properties: &ContainerProperties,
        throughput: Option<u32>,
    ) -> StorageResult<StatusCode> {
        let _in_flight = self.enter().await;
        if let Some(status) = self.fault(Operation::CreateContainer, None)? {
            return Ok(status);
        }
        validate_container(properties, throughput)?;

        let mut databases = self.databases.write();
        let db = databases
            .get_mut(database)
            .ok_or_else(|| StorageError::not_found(format!("database {} not found", database)))?;

        match db.containers.get(&properties.id) {
            Some(existing) if existing.properties.partition_key_path != properties.partition_key_path => {
                Err(StorageError::conflict(format!(
                    "container {} already exists with partition key path {}",
                    properties.id, existing.properties.partition_key_path
                )))
            }
            Some(_) => Ok(StatusCode::OK),
            None => {
                db.containers.insert(
                    properties.id.clone(),
                    ContainerState::new(properties.clone(), throughput),
                );
                Ok(StatusCode::CREATED)
            }
        }
    }

    async fn create_item(
        &self,
        container: &ContainerPath,
        partition_key: &str,
        document: Document,
    ) -> StorageResult<ItemResponse> {
        let _in_flight = self.enter().await;
        let id = document.get("id").and_then(|v| v.as_str());
        if let Some(status) = self.fault(Operation::Create, id)? {
            return Ok(ItemResponse::empty(status));
        }
        self.insert(container, partition_key, document)
    }

    async fn read_item(
        &self,
        container: &ContainerPath,
        id: &str,
        partition_key: &str,
    ) -> StorageResult<ItemResponse> {
        let _in_flight = self.enter().await;
        if let Some(status) = self.fault(Operation::Read, Some(id))? {
            return Ok(ItemResponse::empty(status));
        }
        self.with_container(container, |state| {
            state
                .lookup(id, partition_key)
                .and_then(|seq| state.items.get(&seq))
                .map(|item| ItemResponse::with_document(StatusCode::OK, item.document.clone()))
                .ok_or_else(|| {
                    StorageError::not_found(format!(
                        "entity {} not found in partition {}",
                        id, partition_key
                    ))
                })
        })
    }

    async fn replace_item(
        &self,
        container: &ContainerPath,
        id: &str,
        partition_key: &str,
        document: Document,
    ) -> StorageResult<ItemResponse> {
        let _in_flight = self.enter().await;
        if let Some(status) = self.fault(Operation::Replace, Some(id))? {
            return Ok(ItemResponse::empty(status));
        }
        self.replace(container, id, partition_key, document)
    }

    async fn delete_item(
        &self,
        container: &ContainerPath,
        id: &str,
        partition_key: &str,
    ) -> StorageResult<ItemResponse> {
        let _in_flight = self.enter().await;
        if let Some(status) = self.fault(Operation::Delete, Some(id))? {
            return Ok(ItemResponse::empty(status));
        }
        self.remove(container, id, partition_key)
    }

    async fn query_items(
        &self,
        container: &ContainerPath,
        request: &QueryRequest,
    ) -> StorageResult<FeedPage> {
        let _in_flight = self.enter().await;
        if self.fault(Operation::Query, None)?.is_some() {
            return Ok(FeedPage::default());
        }
        self.page(container, request)
    }
}

/// Tracks one in-flight operation.
struct InFlight<'a> {
    current: &'a AtomicUsize,
}

impl<'a> InFlight<'a> {
    fn new(current: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self { current }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

fn document_id(document: &Document) -> StorageResult<String> {
    let id = document
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| StorageError::bad_request("document must have a string id property"))?;

    if id.is_empty() {
        return Err(StorageError::bad_request("document id must not be empty"));
    }
    if id.contains(FORBIDDEN_ID_CHARS) {
        return Err(StorageError::bad_request(format!(
            "document id {} contains a forbidden character",
            id
        )));
    }
    Ok(id.to_string())
}

fn check_partition_key(
    properties: &ContainerProperties,
    document: &Document,
    partition_key: &str,
) -> StorageResult<()> {
    let embedded = document
        .pointer(&properties.partition_key_path)
        .and_then(|v| match v {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Bool(_) | serde_json::Value::Number(_) => Some(v.to_string()),
            _ => None,
        });

    match embedded {
        Some(value) if value == partition_key => Ok(()),
        Some(value) => Err(StorageError::bad_request(format!(
            "partition key {} in document does not match request partition key {}",
            value, partition_key
        ))),
        None => Err(StorageError::bad_request(format!(
            "document has no value at partition key path {}",
            properties.partition_key_path
        ))),
    }
}

fn validate_container(properties: &ContainerProperties, throughput: Option<u32>) -> StorageResult<()> {
    if properties.id.is_empty() {
        return Err(StorageError::bad_request("container name must not be empty"));
    }
    if !properties.partition_key_path.starts_with('/') || properties.partition_key_path.len() < 2 {
        return Err(StorageError::bad_request(format!(
            "invalid partition key path {}",
            properties.partition_key_path
        )));
    }
    if let Some(throughput) = throughput {
        if throughput < MIN_THROUGHPUT {
            return Err(StorageError::bad_request(format!(
                "throughput {} is below the minimum of {}",
                throughput, MIN_THROUGHPUT
            )));
        }
    }
    Ok(())
}

fn parse_continuation(token: &str) -> StorageResult<u64> {
    token
        .strip_prefix(CONTINUATION_PREFIX)
        .and_then(|seq| seq.parse().ok())
        .ok_or_else(|| StorageError::InvalidContinuation(token.to_string()))
}
