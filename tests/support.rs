// tests/support.rs
//! Test builders — raw key secrets and configuration documents
//!
//! Secrets are assembled by hand here, not through `from_key_state`, so the
//! decode path is tested against independently constructed records.
#![allow(dead_code)] // not every test file uses every builder

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};

use encryption_reconciler::consts::{
    COMPONENT_LABEL, KEY_DATA_FIELD, MIGRATED_RESOURCES_ANNOTATION, MIGRATED_TIMESTAMP_ANNOTATION,
    MODE_AESCBC, MODE_ANNOTATION,
};
use encryption_reconciler::wire::{
    AesCbcConfiguration, AesKey, IdentityConfiguration, ResourceConfiguration,
};
use encryption_reconciler::{
    key_secret_name, EncryptionConfiguration, Provider, ResourceId, SecretRecord,
};

pub const COMPONENT: &str = "kms";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn configmaps() -> ResourceId {
    ResourceId::core("configmaps")
}

pub fn secrets_resource() -> ResourceId {
    ResourceId::core("secrets")
}

/// A fixed whole-second timestamp; migration times round-trip at second
/// precision.
pub fn migration_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().unwrap()
}

/// A backed key secret without migration annotations
pub fn key_secret(sequence: u64, material: &[u8]) -> SecretRecord {
    let mut secret = SecretRecord {
        name: key_secret_name(COMPONENT, sequence),
        namespace: "config-managed".to_string(),
        ..Default::default()
    };
    secret
        .labels
        .insert(COMPONENT_LABEL.to_string(), COMPONENT.to_string());
    secret
        .annotations
        .insert(MODE_ANNOTATION.to_string(), MODE_AESCBC.to_string());
    secret
        .data
        .insert(KEY_DATA_FIELD.to_string(), material.to_vec());
    secret
}

/// A backed key secret whose migration finished for the given resources
pub fn migrated_key_secret(
    sequence: u64,
    material: &[u8],
    resources: &[ResourceId],
    finished: DateTime<Utc>,
) -> SecretRecord {
    let mut secret = key_secret(sequence, material);
    secret.annotations.insert(
        MIGRATED_TIMESTAMP_ANNOTATION.to_string(),
        finished.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    );
    let listed: Vec<String> = resources
        .iter()
        .map(|r| {
            format!(
                r#"{{"group":"{}","resource":"{}"}}"#,
                r.group, r.resource
            )
        })
        .collect();
    secret.annotations.insert(
        MIGRATED_RESOURCES_ANNOTATION.to_string(),
        format!(r#"{{"resources":[{}]}}"#, listed.join(",")),
    );
    secret
}

/// One aescbc provider holding a single key
pub fn aescbc(name: &str, material: &[u8]) -> Provider {
    Provider::AesCbc(AesCbcConfiguration {
        keys: vec![AesKey {
            name: name.to_string(),
            secret: STANDARD.encode(material),
        }],
    })
}

pub fn identity() -> Provider {
    Provider::Identity(IdentityConfiguration {})
}

/// A configuration applying the same provider chain to every listed resource
pub fn cfg(resources: &[&ResourceId], providers: &[Provider]) -> EncryptionConfiguration {
    EncryptionConfiguration {
        resources: resources
            .iter()
            .map(|id| ResourceConfiguration {
                resources: vec![id.to_string()],
                providers: providers.to_vec(),
            })
            .collect(),
    }
}

/// A configuration with its own provider chain per resource
pub fn cfg_per_resource(entries: &[(&ResourceId, &[Provider])]) -> EncryptionConfiguration {
    EncryptionConfiguration {
        resources: entries
            .iter()
            .map(|(id, providers)| ResourceConfiguration {
                resources: vec![id.to_string()],
                providers: providers.to_vec(),
            })
            .collect(),
    }
}

/// A configuration whose write path is identity — read keys only
pub fn cfg_no_write_key(
    resources: &[&ResourceId],
    name: &str,
    material: &[u8],
) -> EncryptionConfiguration {
    cfg(resources, &[identity(), aescbc(name, material)])
}
