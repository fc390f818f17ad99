//! Decision and verdict types shared by the policy evaluator and the
//! execution pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The outcome recorded in an acceptance receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Accept => "ACCEPT",
            Decision::Reject => "REJECT",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of evaluating a trust policy against a structure.
///
/// `reasons` lists every violated rule, not just the first one.  It is
/// empty exactly when `accepted` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyEvaluation {
    pub accepted: bool,
    pub reasons: Vec<String>,
}

impl PolicyEvaluation {
    /// Build an evaluation from the collected violations.
    pub fn from_reasons(reasons: Vec<String>) -> Self {
        Self {
            accepted: reasons.is_empty(),
            reasons,
        }
    }

    /// A rejection carrying a single reason.
    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reasons: vec![reason.into()],
        }
    }

    pub fn decision(&self) -> Decision {
        if self.accepted {
            Decision::Accept
        } else {
            Decision::Reject
        }
    }
}

/// Machine-checkable reason code attached to every contract denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    /// The contract id was already executed (or is executing right now).
    ReplayDetected,
    /// The embedded signed intent failed signature verification.
    InvalidSignedIntent,
    /// No supplied claim has the required type.
    MissingRequiredClaim,
    /// Claims of the required type exist but none passed the trust checks.
    ClaimNotTrusted,
    /// The action violates a numeric constraint declared by the intent.
    ConstraintViolation,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::ReplayDetected => "REPLAY_DETECTED",
            DenyReason::InvalidSignedIntent => "INVALID_SIGNED_INTENT",
            DenyReason::MissingRequiredClaim => "MISSING_REQUIRED_CLAIM",
            DenyReason::ClaimNotTrusted => "CLAIM_NOT_TRUSTED",
            DenyReason::ConstraintViolation => "CONSTRAINT_VIOLATION",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status recorded on an execution receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Executed,
}
