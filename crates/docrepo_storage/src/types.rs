//! Request and response types shared by all backends.

use crate::filter::Filter;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stored document.
pub type Document = serde_json::Value;

/// Partition key path used when none is configured.
pub const DEFAULT_PARTITION_KEY_PATH: &str = "/partitionKey";

/// Smallest provisioned throughput a container accepts, in request units.
pub const MIN_THROUGHPUT: u32 = 400;

/// Status code reported by a document backend.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StatusCode(u16);

impl StatusCode {
    /// `200 OK`
    pub const OK: Self = Self(200);
    /// `201 Created`
    pub const CREATED: Self = Self(201);
    /// `204 No Content`
    pub const NO_CONTENT: Self = Self(204);
    /// `400 Bad Request`
    pub const BAD_REQUEST: Self = Self(400);
    /// `404 Not Found`
    pub const NOT_FOUND: Self = Self(404);
    /// `408 Request Timeout`
    pub const REQUEST_TIMEOUT: Self = Self(408);
    /// `409 Conflict`
    pub const CONFLICT: Self = Self(409);
    /// `412 Precondition Failed`
    pub const PRECONDITION_FAILED: Self = Self(412);
    /// `413 Request Entity Too Large`
    pub const PAYLOAD_TOO_LARGE: Self = Self(413);
    /// `429 Too Many Requests`
    pub const TOO_MANY_REQUESTS: Self = Self(429);
    /// `500 Internal Server Error`
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);
    /// `503 Service Unavailable`
    pub const SERVICE_UNAVAILABLE: Self = Self(503);

    /// Creates a status code from its numeric value.
    #[inline]
    #[must_use]
    pub const fn from_u16(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric value.
    #[inline]
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns true for `2xx` codes.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns the canonical reason phrase, if known.
    #[must_use]
    pub fn reason(&self) -> Option<&'static str> {
        Some(match self.0 {
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            400 => "Bad Request",
            404 => "Not Found",
            408 => "Request Timeout",
            409 => "Conflict",
            412 => "Precondition Failed",
            413 => "Request Entity Too Large",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            503 => "Service Unavailable",
            _ => return None,
        })
    }
}

impl fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatusCode({})", self)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{} {}", self.0, reason),
            None => write!(f, "{}", self.0),
        }
    }
}

/// When secondary indexes are maintained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndexingMode {
    /// Indexes are updated synchronously with every write.
    #[default]
    Consistent,
    /// No secondary indexes are maintained.
    None,
}

/// Which document paths are eligible for secondary indexing.
///
/// The default policy excludes every path (`/*`). Writes then skip index
/// maintenance entirely; queries on non-key fields fall back to scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingPolicy {
    /// Index maintenance mode.
    pub indexing_mode: IndexingMode,
    /// Paths explicitly indexed.
    pub included_paths: Vec<String>,
    /// Paths excluded from indexing.
    pub excluded_paths: Vec<String>,
}

impl IndexingPolicy {
    /// Policy that excludes every path from indexing.
    #[must_use]
    pub fn exclude_all() -> Self {
        Self {
            indexing_mode: IndexingMode::Consistent,
            included_paths: Vec::new(),
            excluded_paths: vec!["/*".to_string()],
        }
    }

    /// Policy that indexes every path.
    #[must_use]
    pub fn include_all() -> Self {
        Self {
            indexing_mode: IndexingMode::Consistent,
            included_paths: vec!["/*".to_string()],
            excluded_paths: Vec::new(),
        }
    }

    /// Returns true if no path is indexed.
    #[must_use]
    pub fn excludes_everything(&self) -> bool {
        self.indexing_mode == IndexingMode::None
            || (self.included_paths.is_empty() && self.excluded_paths.iter().any(|p| p == "/*"))
    }
}

impl Default for IndexingPolicy {
    fn default() -> Self {
        Self::exclude_all()
    }
}

/// Declared settings of a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerProperties {
    /// Container name.
    pub id: String,
    /// JSON pointer of the partition key inside each document.
    pub partition_key_path: String,
    /// Indexing policy.
    pub indexing_policy: IndexingPolicy,
}

impl ContainerProperties {
    /// Creates container properties with the default indexing policy.
    pub fn new(id: impl Into<String>, partition_key_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            partition_key_path: partition_key_path.into(),
            indexing_policy: IndexingPolicy::default(),
        }
    }

    /// Sets the indexing policy.
    #[must_use]
    pub fn with_indexing_policy(mut self, policy: IndexingPolicy) -> Self {
        self.indexing_policy = policy;
        self
    }
}

/// Fully qualified address of a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerPath {
    /// Database name.
    pub database: String,
    /// Container name.
    pub container: String,
}

impl ContainerPath {
    /// Creates a container path.
    pub fn new(database: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            container: container.into(),
        }
    }
}

impl fmt::Display for ContainerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dbs/{}/colls/{}", self.database, self.container)
    }
}

/// Response to a point operation on a single item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemResponse {
    /// Status reported by the backend.
    pub status: StatusCode,
    /// The stored document, when the operation returns one.
    pub document: Option<Document>,
}

impl ItemResponse {
    /// Creates a response carrying a document.
    #[must_use]
    pub fn with_document(status: StatusCode, document: Document) -> Self {
        Self {
            status,
            document: Some(document),
        }
    }

    /// Creates a response without a body.
    #[must_use]
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            document: None,
        }
    }
}

/// Request for one page of query results.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    /// Filter evaluated by the backend.
    pub filter: Filter,
    /// Restricts the query to one partition when set.
    pub partition_key: Option<String>,
    /// Token returned by the previous page, `None` for the first page.
    pub continuation: Option<String>,
    /// Maximum number of documents in the page.
    pub max_item_count: usize,
}

impl QueryRequest {
    /// Creates a request for the first page.
    #[must_use]
    pub fn new(filter: Filter, max_item_count: usize) -> Self {
        Self {
            filter,
            partition_key: None,
            continuation: None,
            max_item_count,
        }
    }

    /// Restricts the query to a single partition.
    #[must_use]
    pub fn in_partition(mut self, partition_key: impl Into<String>) -> Self {
        self.partition_key = Some(partition_key.into());
        self
    }

    /// Sets the continuation token.
    #[must_use]
    pub fn with_continuation(mut self, continuation: Option<String>) -> Self {
        self.continuation = continuation;
        self
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedPage {
    /// Documents in backend order.
    pub items: Vec<Document>,
    /// Token for the next page; `None` once the feed is exhausted.
    pub continuation: Option<String>,
}

impl FeedPage {
    /// Returns true if more pages are available.
    #[must_use]
    pub fn has_more_results(&self) -> bool {
        self.continuation.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_includes_reason() {
        assert_eq!(StatusCode::CREATED.to_string(), "201 Created");
        assert_eq!(StatusCode::from_u16(499).to_string(), "499");
        assert!(StatusCode::NO_CONTENT.is_success());
        assert!(!StatusCode::CONFLICT.is_success());
    }

    #[test]
    fn default_policy_excludes_everything() {
        let policy = IndexingPolicy::default();
        assert_eq!(policy.indexing_mode, IndexingMode::Consistent);
        assert_eq!(policy.excluded_paths, vec!["/*".to_string()]);
        assert!(policy.excludes_everything());
        assert!(!IndexingPolicy::include_all().excludes_everything());
    }

    #[test]
    fn container_properties_serialize_camel_case() {
        let props = ContainerProperties::new("items", DEFAULT_PARTITION_KEY_PATH);
        let json = serde_json::to_value(&props).unwrap();
        assert_eq!(json["partitionKeyPath"], "/partitionKey");
        assert_eq!(json["indexingPolicy"]["indexingMode"], "consistent");
        assert_eq!(json["indexingPolicy"]["excludedPaths"][0], "/*");
    }

    #[test]
    fn container_path_display() {
        let path = ContainerPath::new("shop", "orders");
        assert_eq!(path.to_string(), "dbs/shop/colls/orders");
    }
}
