// src/lib.rs
//! encryption-reconciler — desired-state computation for at-rest encryption
//!
//! Features:
//! - five-step key-rotation reconciliation that never strands ciphertext
//! - lossless encryption-configuration wire codec
//! - key-secret schema shared with the key generator and the migrator
//! - collaborator seams for the deployer and the secret store

pub mod consts;
pub mod deployer;
pub mod error;
pub mod resolver;
pub mod secrets;
pub mod state;
pub mod wire;

// Re-export everything callers need at the crate root
pub use deployer::{Deployer, KeySecretLister};
pub use error::{Error, Result};
pub use resolver::resolve;
pub use secrets::{
    config_from_secret, config_secret, config_secret_name, from_key_state, key_secret_name,
    key_states_from_secrets, to_key_state, SecretRecord,
};
pub use state::{DesiredState, GroupResourceState, Key, KeyState, Migration, ResourceId};
pub use wire::{
    decode_config, encode_config, from_encryption_state, to_encryption_state,
    EncryptionConfiguration, Provider,
};
