//! Construction error types for the attesta protocol.
//!
//! Every fallible builder in the workspace returns `AttestaResult<T>`.  These
//! errors mean the input was malformed and never reached the hash/sign
//! pipeline.  Verification outcomes (bad signature, tampering, policy
//! rejection, replay) are NOT errors and are reported as booleans or
//! structured verdicts instead.

use thiserror::Error;

/// The unified construction error for the attesta crates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttestaError {
    /// A required field was absent or empty.
    #[error("missing required field: {field}")]
    MissingField { field: String },

    /// A value cannot be expressed in canonical form (non-finite number,
    /// non-string map key, raw bytes, out-of-range integer).
    #[error("unsupported value: {reason}")]
    UnsupportedValue { reason: String },

    /// Signing was requested with an algorithm other than ED25519.
    #[error("unsupported signature algorithm: {alg}")]
    UnsupportedAlgorithm { alg: String },

    /// A time window could not be parsed or has start after end.
    #[error("invalid window: {reason}")]
    InvalidWindow { reason: String },

    /// An aggregation level below zero.
    #[error("invalid aggregation level {level}: level must be >= 0")]
    InvalidLevel { level: i64 },

    /// A required collection (head hashes, federated entries) was empty.
    #[error("missing evidence: {reason}")]
    MissingEvidence { reason: String },

    /// Key material could not be decoded.
    #[error("invalid key material: {reason}")]
    InvalidKey { reason: String },

    /// A trust policy document is unreadable or malformed.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

impl AttestaError {
    /// Shorthand for `MissingField`.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField { field: field.into() }
    }
}

// Lets the canonical serializer report failures through `AttestaError`.
impl serde::ser::Error for AttestaError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Self::UnsupportedValue { reason: msg.to_string() }
    }
}

/// Convenience alias used throughout the attesta crates.
pub type AttestaResult<T> = Result<T, AttestaError>;

/// Fail with `MissingField` when `value` is empty.
pub fn require_non_empty(field: &str, value: &str) -> AttestaResult<()> {
    if value.is_empty() {
        return Err(AttestaError::missing(field));
    }
    Ok(())
}
