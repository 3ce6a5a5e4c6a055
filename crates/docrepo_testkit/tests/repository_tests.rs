//! End-to-end repository operations over the in-memory backend.

use docrepo_core::{Filter, RepositoryError, StatusCode};
use docrepo_storage::{Fault, Operation};
use docrepo_testkit::prelude::*;

#[tokio::test]
async fn create_then_read_round_trip() {
    let repo = TestRepository::new().await;
    let mut entity = SampleEntity::random();
    entity.id = "a1".to_string();
    entity.set_active(true);

    repo.create(&entity).await.unwrap();

    let found = repo.get_by_id("a1").await.unwrap();
    assert_eq!(found, entity);
    assert_eq!(found.partition_key, "true");
    assert_eq!(repo.get_by_key("a1", "true").await.unwrap(), entity);
}

#[tokio::test]
async fn create_one_and_get_all() {
    let (repo, entities) = scenarios::populated_repository(5).await;
    let all = repo.get_all().await.unwrap();
    assert_eq!(all, entities);
}

#[tokio::test]
async fn get_by_field() {
    let (repo, entities) = scenarios::populated_repository(10).await;
    let target = &entities[3];

    let by_locator = repo
        .get_by_filter(Filter::field("locator").eq(target.locator))
        .await
        .unwrap();
    assert!(by_locator.contains(target));

    let by_name = repo
        .get_by_filter(Filter::field("name").eq(target.name.clone()))
        .await
        .unwrap();
    assert!(by_name.contains(target));

    let by_closure = repo.get_matching(|e| e.name == target.name).await.unwrap();
    assert!(by_closure.contains(target));
}

#[tokio::test]
async fn get_by_id_unknown_is_not_found() {
    let (repo, _) = scenarios::populated_repository(3).await;
    let err = repo.get_by_id("does-not-exist").await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { ref id } if id == "does-not-exist"));
}

#[tokio::test]
async fn update_changes_stored_document() {
    let (repo, mut entities) = scenarios::populated_repository(2).await;
    let record = &mut entities[0];
    record.name = "Changed Name".to_string();

    repo.update(&record.id, record).await.unwrap();

    assert_eq!(repo.get_by_id(&record.id).await.unwrap().name, "Changed Name");
    assert_eq!(repo.get_by_id(&entities[1].id).await.unwrap(), entities[1]);
}

#[tokio::test]
async fn update_missing_entity_is_not_found() {
    let repo = TestRepository::new().await;
    let entity = SampleEntity::random();
    assert!(repo.update(&entity.id, &entity).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn update_with_changed_partition_key_is_not_found() {
    let repo = TestRepository::new().await;
    let mut entity = SampleEntity::new("a1", "true");
    repo.create(&entity).await.unwrap();

    entity.set_active(false);
    assert!(repo.update("a1", &entity).await.unwrap_err().is_not_found());
    assert!(repo.get_by_id("a1").await.unwrap().is_active());
}

#[tokio::test]
async fn update_with_unexpected_status_is_a_write_error() {
    let repo = TestRepository::new().await;
    let entity = SampleEntity::random();
    repo.create(&entity).await.unwrap();
    repo.backend
        .inject_fault(Operation::Replace, Some(entity.id.as_str()), Fault::Respond(StatusCode::CREATED));

    let err = repo.update(&entity.id, &entity).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Write { operation: "update", .. }));
    assert_eq!(err.status(), Some(StatusCode::CREATED));
}

#[tokio::test]
async fn delete_by_id_removes_entity() {
    let (repo, entities) = scenarios::populated_repository(3).await;
    repo.delete_by_id(&entities[1].id).await.unwrap();

    assert_eq!(repo.stored(), 2);
    assert!(repo.get_by_id(&entities[1].id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn delete_by_entity_removes_entity() {
    let (repo, entities) = scenarios::populated_repository(3).await;
    repo.delete_by_entity(&entities[0]).await.unwrap();
    assert_eq!(repo.stored(), 2);
}

#[tokio::test]
async fn delete_missing_is_not_found_not_write_error() {
    let repo = TestRepository::new().await;
    let ghost = SampleEntity::random();

    assert!(repo.delete_by_id(&ghost.id).await.unwrap_err().is_not_found());
    assert!(repo.delete_by_entity(&ghost).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn delete_by_id_losing_the_race_is_not_found() {
    let repo = TestRepository::new().await;
    let entity = SampleEntity::random();
    repo.create(&entity).await.unwrap();

    // Simulates a concurrent delete landing between the lookup and the delete.
    repo.backend.inject_fault(
        Operation::Delete,
        Some(entity.id.as_str()),
        Fault::Status(StatusCode::NOT_FOUND),
    );
    assert!(repo.delete_by_id(&entity.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn transport_failure_on_create_is_a_write_error() {
    let repo = TestRepository::new().await;
    repo.backend
        .inject_fault(Operation::Create, None, Fault::Transport("socket closed".into()));

    let err = repo.create(&SampleEntity::random()).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Write { status: None, .. }));
    assert_eq!(repo.stored(), 0);
}

#[tokio::test]
async fn full_lifecycle_of_a_single_entity() {
    let repo = TestRepository::new().await;
    let mut entity = SampleEntity::random();
    entity.id = "a1".to_string();
    entity.partition_key = "true".to_string();

    repo.create(&entity).await.unwrap();
    assert_eq!(repo.get_by_id("a1").await.unwrap(), entity);

    entity.name = "X".to_string();
    repo.update("a1", &entity).await.unwrap();
    assert_eq!(repo.get_by_id("a1").await.unwrap().name, "X");

    repo.delete_by_id("a1").await.unwrap();
    assert!(repo.get_by_id("a1").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn unique_locator_yields_exactly_one_entity() {
    let repo = TestRepository::new().await;
    let mut batch = SampleEntity::generate(10);
    for (i, entity) in batch.iter_mut().enumerate() {
        entity.locator = 2_000_000 + i as i32;
    }
    let target = batch[6].clone();
    assert!(repo.create_many(batch).await.iter().all(|o| o.success()));

    let found = repo
        .get_by_filter(Filter::field("locator").eq(target.locator))
        .await
        .unwrap();
    assert_eq!(found, vec![target.clone()]);

    let matched = repo.get_matching(|e| e.locator == target.locator).await.unwrap();
    assert_eq!(matched, vec![target]);
}
