//! Test fixtures and repository helpers.
//!
//! Provides a sample entity exercising every common field type and
//! ready-made repositories over the in-memory backend.

use docrepo_core::{Entity, Repository, RepositoryConfig};
use docrepo_storage::{ContainerPath, DocumentBackend, InMemoryBackend};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Database name used by fixtures.
pub const TEST_DATABASE: &str = "docrepo-test";

/// A record with one field of each common scalar type.
///
/// The partition key mirrors the `is_active` flag as `"true"` or `"false"`,
/// so every sample lands in one of two partitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleEntity {
    /// Identity.
    pub id: String,
    /// Routing key, `"true"` or `"false"`.
    pub partition_key: String,
    /// Seven-digit lookup number.
    pub locator: i32,
    /// Short random name.
    pub name: String,
    /// Date of birth as seconds since the Unix epoch.
    pub date_of_birth: i64,
    /// Salary.
    pub salary: f64,
    /// Opaque binary payload.
    pub image: Vec<u8>,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Single upper-case letter.
    pub char_value: char,
    /// 16-bit value.
    pub short_value: i16,
    /// 64-bit value.
    pub long_value: i64,
    /// 32-bit float value.
    pub float_value: f32,
}

impl Entity for SampleEntity {
    const CONTAINER: &'static str = "SampleEntityCollection";

    fn id(&self) -> &str {
        &self.id
    }

    fn partition_key(&self) -> &str {
        &self.partition_key
    }
}

impl SampleEntity {
    /// Size of the random image payload.
    pub const IMAGE_LEN: usize = 100;

    /// Creates an entity with the given id and partition key and zeroed
    /// fields.
    pub fn new(id: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            partition_key: partition_key.into(),
            locator: 0,
            name: String::new(),
            date_of_birth: 0,
            salary: 0.0,
            image: Vec::new(),
            latitude: 0.0,
            longitude: 0.0,
            duration_secs: 0.0,
            char_value: 'A',
            short_value: 0,
            long_value: 0,
            float_value: 0.0,
        }
    }

    /// Returns the flag encoded in the partition key.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.partition_key == "true"
    }

    /// Sets the flag, moving the entity to the matching partition.
    pub fn set_active(&mut self, active: bool) {
        self.partition_key = active.to_string();
    }

    /// Creates an entity with random contents and a fresh UUID.
    pub fn random() -> Self {
        Self::random_with(&mut rand::thread_rng())
    }

    /// Creates an entity with random contents drawn from `rng`.
    pub fn random_with<R: Rng>(rng: &mut R) -> Self {
        const DAY_SECS: i64 = 86_400;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();

        let mut image = vec![0u8; Self::IMAGE_LEN];
        rng.fill(image.as_mut_slice());

        let mut entity = Self {
            id: Uuid::new_v4().to_string(),
            partition_key: String::new(),
            locator: rng.gen_range(1_000_000..10_000_000),
            name: random_name(rng),
            date_of_birth: now - rng.gen_range(0..365 * 100) * DAY_SECS,
            salary: rng.gen::<f64>() * 10_000.0,
            image,
            latitude: rng.gen::<f64>() * 180.0 - 90.0,
            longitude: rng.gen::<f64>() * 360.0 - 180.0,
            duration_secs: rng.gen::<f64>() * 3_600.0,
            char_value: char::from(rng.gen_range(b'A'..=b'Z')),
            short_value: rng.gen(),
            long_value: rng.gen(),
            float_value: rng.gen::<f32>() * 10_000.0,
        };
        entity.set_active(rng.gen_bool(0.5));
        entity
    }

    /// Creates `count` random entities.
    pub fn generate(count: usize) -> Vec<Self> {
        let mut rng = rand::thread_rng();
        (0..count).map(|_| Self::random_with(&mut rng)).collect()
    }
}

/// Eight random characters, a dot and a three character extension.
fn random_name<R: Rng>(rng: &mut R) -> String {
    let mut part = |len: usize| -> String {
        (0..len)
            .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_lowercase())
            .collect()
    };
    let stem = part(8);
    let ext = part(3);
    format!("{}.{}", stem, ext)
}

/// Configuration used by [`TestRepository`]: no deadline, small pages.
pub fn test_config() -> RepositoryConfig {
    RepositoryConfig::for_entity::<SampleEntity>(TEST_DATABASE)
        .page_size(25)
        .operation_timeout(None)
}

/// A ready repository over a private in-memory backend.
pub struct TestRepository {
    /// The backend, for fault injection and inspection.
    pub backend: Arc<InMemoryBackend>,
    repo: Repository<SampleEntity>,
}

impl TestRepository {
    /// Creates a repository with [`test_config`].
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Creates a repository with a custom configuration.
    pub async fn with_config(config: RepositoryConfig) -> Self {
        Self::with_backend(InMemoryBackend::new(), config).await
    }

    /// Creates a repository over a preconfigured backend.
    pub async fn with_backend(backend: InMemoryBackend, config: RepositoryConfig) -> Self {
        let backend = Arc::new(backend);
        let repo = Repository::connect(Arc::clone(&backend) as Arc<dyn DocumentBackend>, config)
            .await
            .expect("Failed to connect test repository");
        Self { backend, repo }
    }

    /// Returns the managed container.
    pub fn container(&self) -> &ContainerPath {
        self.repo.store().container()
    }

    /// Returns the number of stored documents.
    pub fn stored(&self) -> usize {
        self.backend.item_count(self.container())
    }

    /// Returns the repository.
    pub fn repository(&self) -> &Repository<SampleEntity> {
        &self.repo
    }
}

impl std::ops::Deref for TestRepository {
    type Target = Repository<SampleEntity>;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a repository holding `count` random entities.
    pub async fn populated_repository(count: usize) -> (TestRepository, Vec<SampleEntity>) {
        let repo = TestRepository::new().await;
        let entities = SampleEntity::generate(count);
        for entity in &entities {
            repo.create(entity)
                .await
                .expect("Failed to create entity");
        }
        (repo, entities)
    }

    /// Creates a repository whose backend delays every call by `latency`.
    pub async fn slow_repository(
        latency: std::time::Duration,
        config: RepositoryConfig,
    ) -> TestRepository {
        TestRepository::with_backend(InMemoryBackend::new().with_latency(latency), config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_entities_are_well_formed() {
        let entities = SampleEntity::generate(50);
        assert_eq!(entities.len(), 50);
        for e in &entities {
            assert!(!e.id.is_empty());
            assert!(e.partition_key == "true" || e.partition_key == "false");
            assert!((1_000_000..10_000_000).contains(&e.locator));
            assert!(e.char_value.is_ascii_uppercase());
            assert_eq!(e.image.len(), SampleEntity::IMAGE_LEN);
            assert_eq!(e.name.len(), 12);
        }
    }

    #[test]
    fn active_flag_is_the_partition_key() {
        let mut e = SampleEntity::new("a1", "false");
        assert!(!e.is_active());
        e.set_active(true);
        assert_eq!(e.partition_key, "true");
        assert!(e.is_active());
    }

    #[test]
    fn serialized_form_uses_camel_case() {
        let doc = serde_json::to_value(SampleEntity::new("a1", "true")).unwrap();
        assert_eq!(doc["id"], "a1");
        assert_eq!(doc["partitionKey"], "true");
        assert!(doc.get("dateOfBirth").is_some());
    }

    #[tokio::test]
    async fn test_repository_round_trip() {
        let repo = TestRepository::new().await;
        let entity = SampleEntity::random();
        repo.create(&entity).await.unwrap();
        assert_eq!(repo.stored(), 1);
        assert_eq!(repo.get_by_id(&entity.id).await.unwrap(), entity);
    }
}
