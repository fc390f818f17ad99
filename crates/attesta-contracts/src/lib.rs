//! # attesta-contracts
//!
//! Shared error, timestamp, and verdict types for the attesta accountability
//! protocol.
//!
//! All crates in the workspace import from here. No protocol logic lives in
//! this crate, only data definitions and error types.

pub mod error;
pub mod timestamp;
pub mod verdict;

/// Version tag embedded in every hashed protocol structure.
pub const PROTOCOL_VERSION: &str = "0.1";
