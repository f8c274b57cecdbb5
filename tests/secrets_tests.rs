// tests/secrets_tests.rs
//! Key-secret codec — naming scheme, annotations, tolerant bulk decode

use encryption_reconciler::consts::{MODE_ANNOTATION, MIGRATED_RESOURCES_ANNOTATION};
use encryption_reconciler::{
    config_from_secret, config_secret, config_secret_name, from_key_state, key_secret_name,
    key_states_from_secrets, to_key_state, Error,
};

mod support;
use support::{
    aescbc, cfg, configmaps, identity, init_tracing, key_secret, migrated_key_secret,
    migration_time, secrets_resource, COMPONENT,
};

const MATERIAL: &[u8] = b"61def964fb967f5d7c44a2af8dab6865";

#[test]
fn test_secret_names_follow_the_component_scheme() {
    assert_eq!("encryption-key-kms-3", key_secret_name("kms", 3));
    assert_eq!("encryption-config-kms", config_secret_name("kms"));
}

#[test]
fn test_plain_key_secret_decodes_backed_and_unmigrated() {
    init_tracing();
    let state = to_key_state(&key_secret(7, MATERIAL)).unwrap();
    assert_eq!("7", state.key.name);
    assert_eq!(MATERIAL, state.key.material.as_slice());
    assert!(state.backed);
    assert!(state.migration.is_none());
}

#[test]
fn test_migrated_key_secret_decodes_timestamp_and_resources() {
    init_tracing();
    let secret = migrated_key_secret(
        4,
        MATERIAL,
        &[configmaps(), secrets_resource()],
        migration_time(),
    );
    let state = to_key_state(&secret).unwrap();

    let migration = state.migration.as_ref().expect("migration record");
    assert_eq!(migration_time(), migration.finished);
    assert_eq!(vec![configmaps(), secrets_resource()], migration.resources);
    assert!(state.migrated_for(&[configmaps(), secrets_resource()]));
    assert!(state.migrated_for(&[configmaps()]));
}

#[test]
fn test_key_state_codec_is_lossless() {
    init_tracing();
    let original = to_key_state(&migrated_key_secret(
        4,
        MATERIAL,
        &[configmaps()],
        migration_time(),
    ))
    .unwrap();
    let reencoded = from_key_state(COMPONENT, &original).unwrap();
    assert_eq!(key_secret_name(COMPONENT, 4), reencoded.name);
    assert_eq!(original, to_key_state(&reencoded).unwrap());
}

#[test]
fn test_secret_without_material_is_invalid() {
    init_tracing();
    let mut secret = key_secret(1, MATERIAL);
    secret.data.clear();
    let err = to_key_state(&secret).unwrap_err();
    assert!(matches!(err, Error::InvalidKeySecret { .. }));
}

#[test]
fn test_secret_without_sequence_number_is_invalid() {
    init_tracing();
    let mut secret = key_secret(1, MATERIAL);
    secret.name = "encryption-key-kms-latest".to_string();
    assert!(to_key_state(&secret).is_err());
}

#[test]
fn test_secret_with_foreign_mode_is_invalid() {
    init_tracing();
    let mut secret = key_secret(1, MATERIAL);
    secret
        .annotations
        .insert(MODE_ANNOTATION.to_string(), "aesgcm".to_string());
    let err = to_key_state(&secret).unwrap_err();
    assert!(matches!(err, Error::InvalidKeySecret { .. }));
}

#[test]
fn test_half_finished_migration_annotations_are_invalid() {
    init_tracing();
    let mut secret = migrated_key_secret(2, MATERIAL, &[configmaps()], migration_time());
    secret.annotations.remove(MIGRATED_RESOURCES_ANNOTATION);
    assert!(to_key_state(&secret).is_err());
}

#[test]
fn test_bulk_decode_skips_broken_records() {
    init_tracing();
    let mut broken = key_secret(2, MATERIAL);
    broken.data.clear();
    let states = key_states_from_secrets(&[key_secret(1, MATERIAL), broken, key_secret(3, MATERIAL)]);
    let names: Vec<&str> = states.iter().map(|s| s.key.name.as_str()).collect();
    assert_eq!(vec!["1", "3"], names);
}

#[test]
fn test_config_secret_roundtrip() {
    init_tracing();
    let config = cfg(
        &[&secrets_resource()],
        &[aescbc("1", MATERIAL), identity()],
    );
    let secret = config_secret(COMPONENT, &config);
    assert_eq!(config_secret_name(COMPONENT), secret.name);
    assert_eq!(config, config_from_secret(&secret).unwrap());
}

#[test]
fn test_config_secret_without_payload_fails_to_decode() {
    init_tracing();
    let config = cfg(&[&secrets_resource()], &[identity()]);
    let mut secret = config_secret(COMPONENT, &config);
    secret.data.clear();
    let err = config_from_secret(&secret).unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[test]
fn test_config_secret_with_garbage_payload_fails_to_decode() {
    init_tracing();
    let config = cfg(&[&secrets_resource()], &[identity()]);
    let mut secret = config_secret(COMPONENT, &config);
    for value in secret.data.values_mut() {
        *value = b"{broken".to_vec();
    }
    assert!(config_from_secret(&secret).is_err());
}
