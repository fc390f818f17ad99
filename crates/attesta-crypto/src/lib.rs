//! # attesta-crypto
//!
//! The substrate every other attesta crate builds on: deterministic
//! canonical encoding, SHA-256 content hashing, and hash-then-sign Ed25519
//! envelopes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use attesta_crypto::{hash, sign, verify, KeyPair};
//!
//! let keys = KeyPair::generate()?;
//! let signed = sign(serde_json::json!({ "purpose": "pay" }), &keys)?;
//! assert!(verify(&signed));
//! let content_hash = hash(&signed.payload)?;
//! ```

pub mod canonical;
pub mod signing;

pub use canonical::{
    canonical_string, canonicalize, digest, hash, hash_value, to_canonical_value, CanonicalValue,
    Hashed,
};
pub use signing::{sign, sign_detached, verify, verify_detached, KeyPair, Signed, ED25519};

// ── Tests ─────────────────────────────────────────────────────────────────────
