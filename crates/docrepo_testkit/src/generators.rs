//! Property-based test generators using proptest.
//!
//! Provides strategies for generating entities and filters that keep the
//! invariants the repository relies on.

use crate::fixtures::SampleEntity;
use docrepo_core::Filter;
use proptest::prelude::*;

/// Strategy for generating valid entity ids.
pub fn entity_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9][a-z0-9-]{0,23}").expect("Invalid regex")
}

/// Strategy for generating partition keys.
pub fn partition_key_strategy() -> impl Strategy<Value = String> {
    any::<bool>().prop_map(|active| active.to_string())
}

/// Strategy for generating sample entities.
///
/// Floating point fields stay finite so every entity survives a JSON round
/// trip unchanged.
pub fn sample_entity_strategy() -> impl Strategy<Value = SampleEntity> {
    (
        (
            entity_id_strategy(),
            partition_key_strategy(),
            1_000_000..10_000_000i32,
            prop::string::string_regex("[a-z]{1,8}\\.[a-z]{3}").expect("Invalid regex"),
            any::<i64>(),
            0.0..10_000.0f64,
            prop::collection::vec(any::<u8>(), 0..64),
        ),
        (
            -90.0..90.0f64,
            -180.0..180.0f64,
            0.0..3_600.0f64,
            proptest::char::range('A', 'Z'),
            any::<i16>(),
            any::<i64>(),
            0.0..10_000.0f32,
        ),
    )
        .prop_map(
            |(
                (id, partition_key, locator, name, date_of_birth, salary, image),
                (latitude, longitude, duration_secs, char_value, short_value, long_value, float_value),
            )| SampleEntity {
                id,
                partition_key,
                locator,
                name,
                date_of_birth,
                salary,
                image,
                latitude,
                longitude,
                duration_secs,
                char_value,
                short_value,
                long_value,
                float_value,
            },
        )
}

/// Strategy for generating a batch of entities with distinct ids.
pub fn distinct_batch_strategy(max: usize) -> impl Strategy<Value = Vec<SampleEntity>> {
    prop::collection::vec(sample_entity_strategy(), 0..max).prop_map(|mut batch| {
        for (i, entity) in batch.iter_mut().enumerate() {
            entity.id = format!("{}-{}", entity.id, i);
        }
        batch
    })
}

/// Strategy for generating filters over [`SampleEntity`] fields.
pub fn filter_strategy() -> impl Strategy<Value = Filter> {
    let leaf = prop_oneof![
        Just(Filter::All),
        (1_000_000..10_000_000i32).prop_map(|n| Filter::field("locator").ge(n)),
        (1_000_000..10_000_000i32).prop_map(|n| Filter::field("locator").lt(n)),
        partition_key_strategy().prop_map(|pk| Filter::field("partitionKey").eq(pk)),
        proptest::char::range('A', 'Z').prop_map(|c| Filter::field("charValue").eq(c.to_string())),
        (0.0..10_000.0f64).prop_map(|s| Filter::field("salary").gt(s)),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.and(b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.or(b)),
            inner.prop_map(Filter::not),
        ]
    })
}

/// Proptest configuration for async repository properties.
///
/// Each case builds a fresh backend, so fewer cases than the default keep
/// the suite fast.
pub fn repository_proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: 32,
        ..ProptestConfig::default()
    }
}
