// src/resolver.rs
//! Desired-state computation for key rotation — the heart of the crate
//!
//! `resolve` is a pure function re-invoked on every reconcile tick. Each
//! invocation advances the deployed configuration by at most one class of
//! change, in step order. A key is only ever removed after migration off it
//! has been confirmed, no matter where a crash or missed tick lands.

use tracing::debug;

use crate::error::{Error, Result};
use crate::state::{sort_recent_first, DesiredState, KeyState, ResourceId};
use crate::wire::{to_encryption_state, EncryptionConfiguration};

/// Compute the next desired per-resource encryption state.
///
/// The rules, in order:
///
/// 1. without key secrets nothing moves; minting keys is the key
///    controller's job
/// 2. every target must hold all expected read keys, and the newest read key
///    must be backed by a secret, before anything else changes
/// 3. every target must write with the most recent backed key
/// 4. read keys are pruned only after migration to the write key finished
///
/// Steps 2–4 are mutually exclusive within one invocation. Resources present
/// in the old configuration but absent from `target_resources` are carried
/// through untouched.
pub fn resolve(
    old_config: Option<&EncryptionConfiguration>,
    key_states: &[KeyState],
    target_resources: &[ResourceId],
) -> Result<DesiredState> {
    let backed = backed_keys(key_states)?;

    // Step 0: seed from the deployed configuration, then add an identity-only
    // state for every resource that is new to encryption.
    let mut desired = match old_config {
        Some(config) => to_encryption_state(config, &backed)?,
        None => DesiredState::new(),
    };

    // With no deployed configuration assume the worst: any target may already
    // hold ciphertext under any known key.
    let currently_encrypted: Vec<ResourceId> = if old_config.is_some() {
        desired.keys().cloned().collect()
    } else {
        target_resources.to_vec()
    };

    for id in target_resources {
        desired.entry(id.clone()).or_default();
    }

    // Step 1: no keys yet, wait for the key controller.
    if backed.is_empty() {
        debug!("no backed encryption keys, leaving state untouched");
        return Ok(desired);
    }

    let write_candidate = &backed[0];
    let expected = expected_read_keys(&backed, &currently_encrypted);

    // Step 2: make every target hold all expected read keys.
    let mut read_keys_added = false;
    for id in target_resources {
        let grs = desired.entry(id.clone()).or_default();
        let mut changed = false;
        for key in &expected {
            changed |= grs.add_read_key(key);
        }
        if changed {
            sort_recent_first(&mut grs.read_keys);
            read_keys_added = true;
            debug!(resource = %id, "read keys added");
        }
    }
    if read_keys_added {
        debug!("read keys changed, deferring write key and pruning");
        return Ok(desired);
    }

    // A newest read key without a backing secret means a key vanished from
    // the store; hold position until it reappears or is superseded.
    for id in target_resources {
        let newest = desired[id]
            .read_keys
            .iter()
            .max_by_key(|k| k.sequence().unwrap_or(0));
        if newest.is_some_and(|k| !k.backed) {
            debug!(resource = %id, "newest read key is not backed, holding");
            return Ok(desired);
        }
    }

    // Step 3: point every target's write key at the most recent backed key.
    let write_key_stale = target_resources.iter().any(|id| {
        !desired[id]
            .write_key
            .as_ref()
            .is_some_and(|w| w.same_key(write_candidate))
    });
    if write_key_stale {
        for id in target_resources {
            desired.entry(id.clone()).or_default().write_key = Some(write_candidate.clone());
        }
        debug!(key = %write_candidate.key.name, "write key set, deferring pruning");
        return Ok(desired);
    }

    // Step 4: prune read keys once migration to the write key finished.
    if !write_candidate.migrated_for(&currently_encrypted) {
        debug!(key = %write_candidate.key.name, "write key not fully migrated, keeping read keys");
        return Ok(desired);
    }
    for id in target_resources {
        desired.entry(id.clone()).or_default().read_keys = expected.clone();
    }
    debug!("migration finished, read keys pruned to the expected window");

    Ok(desired)
}

/// Known keys sorted most-recent-first, deduplicated and conflict-checked.
///
/// Everything handed to the resolver comes from the secret snapshot, so the
/// keys are backed by construction.
fn backed_keys(key_states: &[KeyState]) -> Result<Vec<KeyState>> {
    let mut keys = key_states.to_vec();
    for key in &mut keys {
        key.backed = true;
    }
    sort_recent_first(&mut keys);

    let mut deduped: Vec<KeyState> = Vec::with_capacity(keys.len());
    for key in keys {
        match deduped.last() {
            Some(previous) if previous.sequence() == key.sequence() => {
                if !previous.same_key(&key) {
                    return Err(Error::InconsistentKey {
                        sequence: key.sequence().unwrap_or(0),
                    });
                }
                // the same secret listed twice; first occurrence wins
            }
            _ => deduped.push(key),
        }
    }
    Ok(deduped)
}

/// The ordered window of keys that must stay readable: every key down to and
/// including the newest one fully migrated for the currently encrypted
/// resources, plus one older backed key as recovery margin.
fn expected_read_keys(backed: &[KeyState], currently_encrypted: &[ResourceId]) -> Vec<KeyState> {
    let mut expected = Vec::new();
    for (position, key) in backed.iter().enumerate() {
        expected.push(key.clone());
        if key.migrated_for(currently_encrypted) {
            if let Some(older) = backed.get(position + 1) {
                expected.push(older.clone());
            }
            break;
        }
    }
    expected
}
