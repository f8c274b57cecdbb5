// src/consts.rs
//! Shared constants — secret naming scheme, labels, annotations

/// Label selecting the key secrets that belong to one component
pub const COMPONENT_LABEL: &str = "encryption.operator.io/component";

/// Annotation carrying the RFC3339 time at which migration to a key finished
pub const MIGRATED_TIMESTAMP_ANNOTATION: &str = "encryption.operator.io/migrated-timestamp";

/// Annotation carrying the JSON list of resource types migrated to a key
pub const MIGRATED_RESOURCES_ANNOTATION: &str = "encryption.operator.io/migrated-resources";

/// Annotation naming the encryption mode a key was minted for
pub const MODE_ANNOTATION: &str = "encryption.operator.io/mode";

/// Finalizer that guards key secrets against premature deletion
pub const DELETION_PROTECTION_FINALIZER: &str = "encryption.operator.io/deletion-protection";

/// Data field holding the raw key material inside a key secret
pub const KEY_DATA_FIELD: &str = "encryption.operator.io-key";

/// Data field holding the encoded configuration inside the config secret
pub const CONFIG_DATA_FIELD: &str = "encryption-config";

/// Namespace where key and configuration secrets are managed
pub const MANAGED_NAMESPACE: &str = "config-managed";

/// Name prefix for key secrets: `encryption-key-<component>-<sequence>`
pub const KEY_SECRET_PREFIX: &str = "encryption-key";

/// Name prefix for the configuration secret: `encryption-config-<component>`
pub const CONFIG_SECRET_PREFIX: &str = "encryption-config";

/// The only encryption mode this resolver computes provider chains for
pub const MODE_AESCBC: &str = "aescbc";
