// src/error.rs
//! Public error type for the entire crate

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The deployed configuration does not parse. Fatal for the current
    /// reconcile tick; no partial desired state is produced.
    #[error("cannot decode encryption configuration from {origin}: {reason}")]
    Decode { origin: String, reason: String },

    /// Two key states share a sequence number but disagree on material.
    /// Picking either one risks data loss, so the resolver refuses to choose.
    #[error("conflicting key material for key sequence {sequence}")]
    InconsistentKey { sequence: u64 },

    /// A single secret record that does not describe a usable encryption key.
    #[error("key secret {name} is invalid: {reason}")]
    InvalidKeySecret { name: String, reason: String },
}
