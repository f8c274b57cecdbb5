// src/wire.rs
//! External configuration document and the state adapters
//!
//! The wire format lists, per resource type, an ordered provider chain: the
//! write key first, the remaining read keys after it, and the identity
//! provider as the final fallback for data written before encryption was
//! enabled. The resolver never touches this format directly — it works on
//! `GroupResourceState` and the adapters here convert both ways, losslessly
//! for key name, material and order.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::state::{DesiredState, GroupResourceState, Key, KeyState, ResourceId};

/// Ordered provider chains per resource type — the artifact the surrounding
/// controller deploys.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EncryptionConfiguration {
    pub resources: Vec<ResourceConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfiguration {
    /// Resource type names in `ResourceId` display form
    pub resources: Vec<String>,
    pub providers: Vec<Provider>,
}

/// Either a real cipher holding key material, or the identity (no-op) marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    AesCbc(AesCbcConfiguration),
    Identity(IdentityConfiguration),
}

impl Provider {
    fn aescbc(key: &Key) -> Self {
        Provider::AesCbc(AesCbcConfiguration {
            keys: vec![AesKey::from_key(key)],
        })
    }

    fn identity() -> Self {
        Provider::Identity(IdentityConfiguration {})
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AesCbcConfiguration {
    pub keys: Vec<AesKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IdentityConfiguration {}

/// Key reference in the wire document; `secret` is standard base64 material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AesKey {
    pub name: String,
    pub secret: String,
}

impl AesKey {
    pub fn from_key(key: &Key) -> Self {
        Self {
            name: key.name.clone(),
            secret: STANDARD.encode(&key.material),
        }
    }

    pub fn to_key(&self) -> Result<Key> {
        let material = STANDARD.decode(&self.secret).map_err(|e| Error::Decode {
            origin: "deployed configuration".to_string(),
            reason: format!("key {}: invalid base64 material: {e}", self.name),
        })?;
        Ok(Key::new(self.name.clone(), material))
    }
}

/// Rebuild the per-resource state from a deployed configuration.
///
/// Every AESCBC key in provider order becomes a read key; a leading AESCBC
/// provider contributes the write key. Keys matching a backed key by name and
/// material adopt that key's backing and migration record; anything else
/// decodes as an unbacked reference carried over from an old configuration.
pub fn to_encryption_state(
    config: &EncryptionConfiguration,
    backed: &[KeyState],
) -> Result<DesiredState> {
    let mut state = DesiredState::new();
    for rc in &config.resources {
        for name in &rc.resources {
            let id = ResourceId::parse(name);
            let mut grs = GroupResourceState::default();
            for (position, provider) in rc.providers.iter().enumerate() {
                let Provider::AesCbc(aes) = provider else {
                    continue;
                };
                for wire_key in &aes.keys {
                    let decoded = adopt_backed(wire_key.to_key()?, backed);
                    if position == 0 && !grs.has_write_key() {
                        grs.write_key = Some(decoded.clone());
                    }
                    grs.add_read_key(&decoded);
                }
            }
            state.insert(id, grs);
        }
    }
    Ok(state)
}

/// Encode the desired state back into a deployable configuration.
///
/// Write key first when present, remaining read keys in order, identity always
/// last; identity leads for resources without a write key.
pub fn from_encryption_state(state: &DesiredState) -> EncryptionConfiguration {
    let mut resources = Vec::with_capacity(state.len());
    for (id, grs) in state {
        let mut providers = Vec::with_capacity(grs.read_keys.len() + 1);
        match &grs.write_key {
            Some(write_key) => {
                providers.push(Provider::aescbc(&write_key.key));
                for read_key in &grs.read_keys {
                    if read_key.same_key(write_key) {
                        continue;
                    }
                    providers.push(Provider::aescbc(&read_key.key));
                }
                providers.push(Provider::identity());
            }
            None => {
                providers.push(Provider::identity());
                for read_key in &grs.read_keys {
                    providers.push(Provider::aescbc(&read_key.key));
                }
            }
        }
        resources.push(ResourceConfiguration {
            resources: vec![id.to_string()],
            providers,
        });
    }
    EncryptionConfiguration { resources }
}

/// Serialize for storage in the configuration secret.
pub fn encode_config(config: &EncryptionConfiguration) -> Vec<u8> {
    // plain derived structs; serialization cannot fail
    serde_json::to_vec(config).expect("encryption configuration serializes")
}

/// Parse stored configuration bytes; failures are fatal for the tick.
pub fn decode_config(origin: &str, bytes: &[u8]) -> Result<EncryptionConfiguration> {
    serde_json::from_slice(bytes).map_err(|e| Error::Decode {
        origin: origin.to_string(),
        reason: e.to_string(),
    })
}

fn adopt_backed(key: Key, backed: &[KeyState]) -> KeyState {
    for candidate in backed {
        if candidate.key == key {
            return candidate.clone();
        }
    }
    KeyState::new(key)
}
