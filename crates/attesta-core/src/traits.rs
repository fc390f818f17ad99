//! Trait seams of the execution pipeline.
//!
//! - `IntentVerifier` decides whether a signed intent is authentic
//! - `ClaimVerifier`  decides whether one signed claim is acceptable
//! - `ReplayGuard`    remembers which contract ids were executed
//!
//! The contract verifier treats the first two as opaque boolean oracles.
//! Default implementations live in `intent` and `claims`.

use chrono::{DateTime, Utc};

use crate::{
    claims::{SignedClaim, SignedRevocation},
    intent::SignedIntent,
};

pub trait IntentVerifier: Send + Sync {
    fn verify_signed_intent(&self, signed_intent: &SignedIntent) -> bool;
}

pub trait ClaimVerifier: Send + Sync {
    /// Combined cryptographic, revocation, expiry and issuer-trust check
    /// of one claim, evaluated as of `at`.
    fn verify_claim(
        &self,
        signed_claim: &SignedClaim,
        signed_revocations: &[SignedRevocation],
        at: DateTime<Utc>,
    ) -> bool;
}

/// Tracks contract ids that have executed.
///
/// `try_reserve` is the check-and-mark step and must be atomic: of two
/// concurrent callers with the same id, at most one gets `true`.  A
/// reservation is either committed (the id is seen forever) or released
/// (the id may be retried).
pub trait ReplayGuard: Send + Sync {
    fn has_seen(&self, contract_id: &str) -> bool;

    /// Claim `contract_id` for execution.  `false` if it was already
    /// executed or is reserved by another caller.
    fn try_reserve(&self, contract_id: &str) -> bool;

    fn commit(&self, contract_id: &str);

    fn release(&self, contract_id: &str);
}
