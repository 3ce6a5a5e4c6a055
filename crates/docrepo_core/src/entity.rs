//! Entity contract for typed repositories.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Trait for types that can be stored through a [`crate::Repository`].
///
/// Implementors must provide:
/// - `id()`: the identity, unique within a partition
/// - `partition_key()`: the routing key, stable for the entity's lifetime
/// - `CONTAINER`: the default container name for this type
///
/// The serialized form must be a JSON object whose `id` property equals
/// `id()` and whose value at the container's partition key path (by default
/// `/partitionKey`) equals `partition_key()`.
///
/// # Example
///
/// ```rust
/// use docrepo_core::Entity;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct Order {
///     id: String,
///     partition_key: String,
///     total: f64,
/// }
///
/// impl Entity for Order {
///     const CONTAINER: &'static str = "orders";
///
///     fn id(&self) -> &str {
///         &self.id
///     }
///
///     fn partition_key(&self) -> &str {
///         &self.partition_key
///     }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Default container name for this entity type.
    const CONTAINER: &'static str;

    /// Returns the entity's identity.
    ///
    /// Must be non-empty once the entity has been created.
    fn id(&self) -> &str;

    /// Returns the entity's partition key.
    ///
    /// Must be assigned before the first write and never change afterwards;
    /// point operations address the entity by id plus this key.
    fn partition_key(&self) -> &str;
}
