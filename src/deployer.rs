// src/deployer.rs
//! Collaborator seams — the deployed-config reporter and the secret lister
//!
//! The resolver itself performs no I/O; the surrounding controller gathers
//! snapshots through these traits and feeds them in as immutable values.

use crate::error::Result;
use crate::secrets::SecretRecord;

/// Reports the configuration the server instances currently agree on.
pub trait Deployer {
    /// The deployed configuration secret, if any, and whether every instance
    /// has acknowledged it. The resolver must only run against a converged
    /// deployment; a non-converged report is a normal "waiting" outcome for
    /// the caller, not an error.
    fn deployed_config(&self) -> Result<(Option<SecretRecord>, bool)>;
}

/// Lists the candidate key secrets for one component.
pub trait KeySecretLister {
    /// Every secret carrying the component label, undecoded; callers run the
    /// records through `key_states_from_secrets`.
    fn list_key_secrets(&self, component: &str) -> Result<Vec<SecretRecord>>;
}
