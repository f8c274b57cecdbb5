// src/state.rs
//! Per-resource encryption state — the value types the resolver works on
//!
//! A `GroupResourceState` describes how one class of persisted objects is
//! encrypted: the ordered read keys (most recent first) plus the single write
//! key, if any. These are pure values; the resolver copies and reorders them
//! but never touches a store.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies one class of persisted objects, e.g. `secrets` or `configmaps`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    #[serde(default)]
    pub group: String,
    pub resource: String,
}

impl ResourceId {
    pub fn new(group: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            resource: resource.into(),
        }
    }

    /// A resource in the core (empty) group
    pub fn core(resource: impl Into<String>) -> Self {
        Self::new("", resource)
    }

    /// Inverse of `Display`: `resource.group`, or a bare core resource
    pub fn parse(s: &str) -> Self {
        match s.split_once('.') {
            Some((resource, group)) => Self::new(group, resource),
            None => Self::core(s),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.resource)
        } else {
            write!(f, "{}.{}", self.resource, self.group)
        }
    }
}

/// An encryption key: externally assigned sequence name plus raw material.
///
/// Two keys are equal iff name and material both match.
#[derive(Clone, PartialEq, Eq)]
pub struct Key {
    pub name: String,
    pub material: Vec<u8>,
}

impl Key {
    pub fn new(name: impl Into<String>, material: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            material: material.into(),
        }
    }

    /// The decimal sequence number encoded in the name; higher means newer.
    pub fn sequence(&self) -> Option<u64> {
        self.name.parse().ok()
    }
}

impl fmt::Debug for Key {
    // key material stays out of logs and assertion dumps
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("name", &self.name)
            .field("material", &format_args!("<{} bytes>", self.material.len()))
            .finish()
    }
}

/// Recorded fact that all listed resource types were re-encrypted under a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub finished: DateTime<Utc>,
    pub resources: Vec<ResourceId>,
}

/// A key as known from the secret store snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyState {
    pub key: Key,
    /// Materially present as a secret, not merely referenced by an old config
    pub backed: bool,
    pub migration: Option<Migration>,
}

impl KeyState {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            backed: false,
            migration: None,
        }
    }

    pub fn sequence(&self) -> Option<u64> {
        self.key.sequence()
    }

    /// True iff migration to this key has finished for every given resource
    pub fn migrated_for(&self, resources: &[ResourceId]) -> bool {
        resources.iter().all(|r| {
            self.migration
                .as_ref()
                .is_some_and(|m| m.resources.contains(r))
        })
    }

    /// Same key (name + material), ignoring backing and migration bookkeeping
    pub fn same_key(&self, other: &KeyState) -> bool {
        self.key == other.key
    }
}

/// Encryption state of a single resource type.
///
/// `read_keys` is ordered most-recent-first and holds no duplicates;
/// `write_key`, when present, is also the first read key once the state has
/// converged. Both empty means identity-only (plaintext fallback).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupResourceState {
    pub write_key: Option<KeyState>,
    pub read_keys: Vec<KeyState>,
}

impl GroupResourceState {
    pub fn has_write_key(&self) -> bool {
        self.write_key.is_some()
    }

    /// Append the key as a read key unless an equal key is already present.
    /// Returns true when the key was added.
    pub fn add_read_key(&mut self, key: &KeyState) -> bool {
        if self.read_keys.iter().any(|k| k.same_key(key)) {
            return false;
        }
        self.read_keys.push(key.clone());
        true
    }
}

/// Desired encryption state for every resource type.
///
/// A `BTreeMap` keyed by `ResourceId` so that iteration order, and with it
/// every encoded artifact, is deterministic.
pub type DesiredState = BTreeMap<ResourceId, GroupResourceState>;

/// Sort most-recent-first by sequence number. The sort is stable, so keys
/// with equal sequence numbers keep their input order; unparseable names sort
/// oldest.
pub fn sort_recent_first(keys: &mut [KeyState]) {
    keys.sort_by_key(|k| std::cmp::Reverse(k.sequence().unwrap_or(0)));
}
