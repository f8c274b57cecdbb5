// src/secrets.rs
//! Key secrets and the configuration secret
//!
//! The secret store holds one secret per minted key
//! (`encryption-key-<component>-<sequence>`) plus a single configuration
//! secret per component (`encryption-config-<component>`). This module owns
//! the codec between those records and the resolver's `KeyState` /
//! `EncryptionConfiguration` values.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::consts::{
    COMPONENT_LABEL, CONFIG_DATA_FIELD, CONFIG_SECRET_PREFIX, DELETION_PROTECTION_FINALIZER,
    KEY_DATA_FIELD, KEY_SECRET_PREFIX, MANAGED_NAMESPACE, MIGRATED_RESOURCES_ANNOTATION,
    MIGRATED_TIMESTAMP_ANNOTATION, MODE_AESCBC, MODE_ANNOTATION,
};
use crate::error::{Error, Result};
use crate::state::{Key, KeyState, Migration, ResourceId};
use crate::wire::{decode_config, encode_config, EncryptionConfiguration};

/// Neutral secret object — what the store lists and the operator writes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecretRecord {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub finalizers: Vec<String>,
    pub data: BTreeMap<String, Vec<u8>>,
}

/// `encryption-key-<component>-<sequence>`
pub fn key_secret_name(component: &str, sequence: u64) -> String {
    format!("{KEY_SECRET_PREFIX}-{component}-{sequence}")
}

/// `encryption-config-<component>`
pub fn config_secret_name(component: &str) -> String {
    format!("{CONFIG_SECRET_PREFIX}-{component}")
}

/// Payload of the migrated-resources annotation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MigratedResources {
    #[serde(default)]
    resources: Vec<ResourceId>,
}

/// Decode one key secret into a `KeyState`.
///
/// The record must carry a trailing sequence number in its name, raw material
/// under the key data field, and, once migration finished, the
/// timestamp/resources annotation pair. Anything else is an invalid record.
pub fn to_key_state(secret: &SecretRecord) -> Result<KeyState> {
    let invalid = |reason: String| Error::InvalidKeySecret {
        name: secret.name.clone(),
        reason,
    };

    if !secret.name.starts_with(KEY_SECRET_PREFIX) {
        return Err(invalid("name lacks the key-secret prefix".to_string()));
    }
    let sequence: u64 = secret
        .name
        .rsplit('-')
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| invalid("name carries no sequence number".to_string()))?;

    if let Some(mode) = secret.annotations.get(MODE_ANNOTATION) {
        if mode != MODE_AESCBC {
            return Err(invalid(format!("unsupported mode {mode}")));
        }
    }

    let material = secret
        .data
        .get(KEY_DATA_FIELD)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| invalid("no key material".to_string()))?;

    let migration = match (
        secret.annotations.get(MIGRATED_TIMESTAMP_ANNOTATION),
        secret.annotations.get(MIGRATED_RESOURCES_ANNOTATION),
    ) {
        (Some(ts), Some(raw)) => {
            let finished = DateTime::parse_from_rfc3339(ts)
                .map_err(|e| invalid(format!("bad migration timestamp: {e}")))?
                .with_timezone(&Utc);
            let listed: MigratedResources = serde_json::from_str(raw)
                .map_err(|e| invalid(format!("bad migrated-resources annotation: {e}")))?;
            Some(Migration {
                finished,
                resources: listed.resources,
            })
        }
        (None, None) => None,
        _ => return Err(invalid("migration annotations are incomplete".to_string())),
    };

    Ok(KeyState {
        key: Key::new(sequence.to_string(), material.clone()),
        backed: true,
        migration,
    })
}

/// Encode a `KeyState` back into the secret the store would hold.
///
/// Lossless against `to_key_state` for everything it reads; the migration
/// timestamp is stored at second precision.
pub fn from_key_state(component: &str, key_state: &KeyState) -> Result<SecretRecord> {
    let sequence = key_state.sequence().ok_or_else(|| Error::InvalidKeySecret {
        name: key_state.key.name.clone(),
        reason: "key name carries no sequence number".to_string(),
    })?;

    let mut secret = SecretRecord {
        name: key_secret_name(component, sequence),
        namespace: MANAGED_NAMESPACE.to_string(),
        ..Default::default()
    };
    secret
        .labels
        .insert(COMPONENT_LABEL.to_string(), component.to_string());
    secret
        .annotations
        .insert(MODE_ANNOTATION.to_string(), MODE_AESCBC.to_string());
    secret
        .finalizers
        .push(DELETION_PROTECTION_FINALIZER.to_string());

    if let Some(migration) = &key_state.migration {
        secret.annotations.insert(
            MIGRATED_TIMESTAMP_ANNOTATION.to_string(),
            migration
                .finished
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        let listed = MigratedResources {
            resources: migration.resources.clone(),
        };
        secret.annotations.insert(
            MIGRATED_RESOURCES_ANNOTATION.to_string(),
            serde_json::to_string(&listed).expect("annotation payload serializes"),
        );
    }

    secret
        .data
        .insert(KEY_DATA_FIELD.to_string(), key_state.key.material.clone());
    Ok(secret)
}

/// Decode every candidate secret, skipping records that do not parse.
///
/// The listing path is tolerant: one broken secret must not wedge rotation
/// for the whole component.
pub fn key_states_from_secrets(secrets: &[SecretRecord]) -> Vec<KeyState> {
    let mut keys = Vec::with_capacity(secrets.len());
    for secret in secrets {
        match to_key_state(secret) {
            Ok(key_state) => keys.push(key_state),
            Err(err) => warn!(secret = %secret.name, %err, "skipping unusable key secret"),
        }
    }
    keys
}

/// Wrap an encoded configuration into its managed secret.
pub fn config_secret(component: &str, config: &EncryptionConfiguration) -> SecretRecord {
    let mut secret = SecretRecord {
        name: config_secret_name(component),
        namespace: MANAGED_NAMESPACE.to_string(),
        ..Default::default()
    };
    secret
        .labels
        .insert(COMPONENT_LABEL.to_string(), component.to_string());
    secret
        .finalizers
        .push(DELETION_PROTECTION_FINALIZER.to_string());
    secret
        .data
        .insert(CONFIG_DATA_FIELD.to_string(), encode_config(config));
    secret
}

/// Unwrap the deployed configuration; malformed content is fatal for the tick.
pub fn config_from_secret(secret: &SecretRecord) -> Result<EncryptionConfiguration> {
    let bytes = secret
        .data
        .get(CONFIG_DATA_FIELD)
        .ok_or_else(|| Error::Decode {
            origin: secret.name.clone(),
            reason: format!("missing {CONFIG_DATA_FIELD} data field"),
        })?;
    decode_config(&secret.name, bytes)
}
