//! Store handle provisioning.

use docrepo_core::{
    IndexingPolicy, ProvisionStatus, Repository, RepositoryConfig, RepositoryError, StatusCode,
    StoreHandle,
};
use docrepo_storage::{DocumentBackend, Fault, InMemoryBackend, Operation};
use docrepo_testkit::prelude::*;
use std::sync::Arc;

fn shared_backend() -> Arc<InMemoryBackend> {
    Arc::new(InMemoryBackend::new())
}

#[tokio::test]
async fn provisions_with_configured_properties() {
    let backend = shared_backend();
    let config = test_config()
        .partition_key_path("/partitionKey")
        .throughput(Some(400));
    let store = StoreHandle::new(Arc::clone(&backend) as Arc<dyn DocumentBackend>, config);

    let provisioned = store.initialize().await.unwrap();
    assert_eq!(provisioned.database, ProvisionStatus::Created);
    assert_eq!(provisioned.container, ProvisionStatus::Created);

    assert!(backend.has_database(TEST_DATABASE));
    let props = backend.container_properties(store.container()).unwrap();
    assert_eq!(props.id, "SampleEntityCollection");
    assert_eq!(props.partition_key_path, "/partitionKey");
    assert_eq!(props.indexing_policy, IndexingPolicy::exclude_all());
    assert_eq!(backend.container_throughput(store.container()), Some(400));
}

#[tokio::test]
async fn second_handle_finds_existing_resources() {
    let backend = shared_backend();
    let first = StoreHandle::new(Arc::clone(&backend) as Arc<dyn DocumentBackend>, test_config());
    first.initialize().await.unwrap();

    let second = StoreHandle::new(Arc::clone(&backend) as Arc<dyn DocumentBackend>, test_config());
    let provisioned = second.initialize().await.unwrap();
    assert_eq!(provisioned.database, ProvisionStatus::Existing);
    assert_eq!(provisioned.container, ProvisionStatus::Existing);
}

#[tokio::test]
async fn repeated_initialize_keeps_data() {
    let backend = shared_backend();
    let repo: Repository<SampleEntity> =
        Repository::connect(Arc::clone(&backend) as Arc<dyn DocumentBackend>, test_config())
            .await
            .unwrap();
    repo.create(&SampleEntity::random()).await.unwrap();

    repo.store().initialize().await.unwrap();
    let again: Repository<SampleEntity> =
        Repository::connect(Arc::clone(&backend) as Arc<dyn DocumentBackend>, test_config())
            .await
            .unwrap();
    assert_eq!(again.get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn incompatible_partition_key_path_fails() {
    let backend = shared_backend();
    StoreHandle::new(Arc::clone(&backend) as Arc<dyn DocumentBackend>, test_config())
        .initialize()
        .await
        .unwrap();

    let err = Repository::<SampleEntity>::connect(
        Arc::clone(&backend) as Arc<dyn DocumentBackend>,
        test_config().partition_key_path("/locator"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RepositoryError::Provision { .. }));
    assert_eq!(err.status(), Some(StatusCode::CONFLICT));
}

#[tokio::test]
async fn invalid_settings_are_provision_errors() {
    let low_throughput = Repository::<SampleEntity>::connect(
        shared_backend(),
        test_config().throughput(Some(100)),
    )
    .await
    .unwrap_err();
    assert_eq!(low_throughput.status(), Some(StatusCode::BAD_REQUEST));

    let bad_path = Repository::<SampleEntity>::connect(
        shared_backend(),
        test_config().partition_key_path("partitionKey"),
    )
    .await
    .unwrap_err();
    assert!(matches!(bad_path, RepositoryError::Provision { .. }));
}

#[tokio::test]
async fn backend_outage_leaves_handle_unready() {
    let backend = shared_backend();
    backend.inject_fault(
        Operation::CreateContainer,
        None,
        Fault::Status(StatusCode::SERVICE_UNAVAILABLE),
    );
    let store = Arc::new(StoreHandle::new(
        Arc::clone(&backend) as Arc<dyn DocumentBackend>,
        RepositoryConfig::for_entity::<SampleEntity>("outage"),
    ));

    assert!(store.initialize().await.is_err());
    assert!(!store.is_ready());
    assert!(matches!(
        Repository::<SampleEntity>::new(Arc::clone(&store)),
        Err(RepositoryError::NotInitialized { .. })
    ));

    backend.clear_faults();
    store.initialize().await.unwrap();
    assert!(Repository::<SampleEntity>::new(store).is_ok());
}
