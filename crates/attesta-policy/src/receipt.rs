//! Acceptance receipts: compact, signable attestations of a trust decision.
//!
//! A receipt binds a target and a policy by content hash only.  Anyone
//! holding the original objects can check the binding with
//! [`AcceptanceReceipt::binds`]; nobody can recover the objects from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use attesta_contracts::{
    error::{require_non_empty, AttestaError, AttestaResult},
    verdict::{Decision, PolicyEvaluation},
    PROTOCOL_VERSION,
};
use attesta_crypto::{hash, sign, to_canonical_value, verify, CanonicalValue, KeyPair, Signed};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptanceReceipt {
    pub version: String,
    pub receipt_id: String,
    pub target_kind: String,
    pub target_hash: String,
    pub policy_name: String,
    pub policy_hash: String,
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
    #[serde(with = "attesta_contracts::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// A receipt signed by an auditor.
pub type SignedAcceptanceReceipt = Signed<AcceptanceReceipt>;

fn hash_present<T: Serialize + ?Sized>(field: &str, object: &T) -> AttestaResult<String> {
    if to_canonical_value(object)? == CanonicalValue::Null {
        return Err(AttestaError::missing(field));
    }
    hash(object)
}

impl AcceptanceReceipt {
    /// Hash `target` and `policy` and record the decision.
    ///
    /// # Errors
    ///
    /// `MissingField` for an empty id, kind or policy name, or a null
    /// target or policy; `UnsupportedValue` if either object has no
    /// canonical form.
    #[allow(clippy::too_many_arguments)]
    pub fn create<T, P>(
        receipt_id: &str,
        target_kind: &str,
        target: &T,
        policy_name: &str,
        policy: &P,
        decision: Decision,
        reasons: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> AttestaResult<Self>
    where
        T: Serialize + ?Sized,
        P: Serialize + ?Sized,
    {
        require_non_empty("receiptId", receipt_id)?;
        require_non_empty("targetKind", target_kind)?;
        require_non_empty("policyName", policy_name)?;

        Ok(Self {
            version: PROTOCOL_VERSION.to_string(),
            receipt_id: receipt_id.to_string(),
            target_kind: target_kind.to_string(),
            target_hash: hash_present("targetObject", target)?,
            policy_name: policy_name.to_string(),
            policy_hash: hash_present("policyObject", policy)?,
            decision,
            reasons,
            created_at,
        })
    }

    /// Record the outcome of an evaluation; decision and reasons are taken
    /// from `evaluation`.
    pub fn from_evaluation<T, P>(
        receipt_id: &str,
        target_kind: &str,
        target: &T,
        policy_name: &str,
        policy: &P,
        evaluation: &PolicyEvaluation,
        created_at: DateTime<Utc>,
    ) -> AttestaResult<Self>
    where
        T: Serialize + ?Sized,
        P: Serialize + ?Sized,
    {
        Self::create(
            receipt_id,
            target_kind,
            target,
            policy_name,
            policy,
            evaluation.decision(),
            evaluation.reasons.clone(),
            created_at,
        )
    }

    /// True if this receipt was issued over exactly `target` and `policy`.
    pub fn binds<T, P>(&self, target: &T, policy: &P) -> bool
    where
        T: Serialize + ?Sized,
        P: Serialize + ?Sized,
    {
        let target_ok = hash(target).map(|h| h == self.target_hash).unwrap_or(false);
        let policy_ok = hash(policy).map(|h| h == self.policy_hash).unwrap_or(false);
        if !(target_ok && policy_ok) {
            debug!(receipt_id = %self.receipt_id, target_ok, policy_ok, "receipt binding mismatch");
        }
        target_ok && policy_ok
    }
}

pub fn sign_acceptance_receipt(
    receipt: AcceptanceReceipt,
    keypair: &KeyPair,
) -> AttestaResult<SignedAcceptanceReceipt> {
    sign(receipt, keypair)
}

pub fn verify_signed_acceptance_receipt(signed: &SignedAcceptanceReceipt) -> bool {
    verify(signed)
}
