//! Contract verification: Signature-Verified → Claims-Verified →
//! Constraint-Checked → Allowed | Denied(reason).
//!
//! The replay stage runs first, in `AuditedExecutor`, because it needs the
//! replay guard.  Every stage is single-attempt and fail-closed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use attesta_contracts::verdict::DenyReason;

use crate::{
    claims::{ClaimTrustOptions, DefaultClaimVerifier, SignedClaim, SignedRevocation},
    contract::ExecutionContract,
    intent::SignatureIntentVerifier,
    traits::{ClaimVerifier, IntentVerifier},
};

/// Structured context attached to some denials.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DenialDetails {
    Claim {
        #[serde(rename = "claimType")]
        claim_type: String,
    },
    Cost {
        #[serde(rename = "maxCost")]
        max_cost: f64,
        cost: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContractVerdict {
    Allowed,
    Denied {
        reason: DenyReason,
        details: Option<DenialDetails>,
    },
}

impl ContractVerdict {
    pub fn denied(reason: DenyReason) -> Self {
        ContractVerdict::Denied { reason, details: None }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, ContractVerdict::Allowed)
    }

    pub fn reason(&self) -> Option<DenyReason> {
        match self {
            ContractVerdict::Allowed => None,
            ContractVerdict::Denied { reason, .. } => Some(*reason),
        }
    }
}

/// Runs the stateless stages of contract verification against pluggable
/// intent and claim oracles.
pub struct ContractVerifier {
    intents: Box<dyn IntentVerifier>,
    claims: Box<dyn ClaimVerifier>,
}

impl ContractVerifier {
    pub fn new(intents: Box<dyn IntentVerifier>, claims: Box<dyn ClaimVerifier>) -> Self {
        Self { intents, claims }
    }

    /// Signature-checking intent oracle and the default claim oracle.
    pub fn with_default_oracles(options: ClaimTrustOptions) -> Self {
        Self::new(
            Box::new(SignatureIntentVerifier),
            Box::new(DefaultClaimVerifier::new(options)),
        )
    }

    /// Verify `contract` as of `at`.  Stops at the first failing stage.
    pub fn verify(
        &self,
        contract: &ExecutionContract,
        signed_claims: &[SignedClaim],
        signed_revocations: &[SignedRevocation],
        at: DateTime<Utc>,
    ) -> ContractVerdict {
        let contract_id = contract.contract_id.as_str();

        // ── Signature-Verified ───────────────────────────────────────────────
        if !self.intents.verify_signed_intent(&contract.signed_intent) {
            warn!(contract_id = %contract_id, "signed intent failed verification");
            return ContractVerdict::denied(DenyReason::InvalidSignedIntent);
        }

        // ── Claims-Verified ──────────────────────────────────────────────────
        for claim_type in &contract.required_claims {
            let mut matching = signed_claims
                .iter()
                .filter(|sc| sc.payload.claim_type == *claim_type)
                .peekable();

            if matching.peek().is_none() {
                warn!(
                    contract_id = %contract_id,
                    claim_type = %claim_type,
                    "required claim missing"
                );
                return ContractVerdict::Denied {
                    reason: DenyReason::MissingRequiredClaim,
                    details: Some(DenialDetails::Claim { claim_type: claim_type.clone() }),
                };
            }

            if !matching.any(|sc| self.claims.verify_claim(sc, signed_revocations, at)) {
                warn!(
                    contract_id = %contract_id,
                    claim_type = %claim_type,
                    "no trusted claim of required type"
                );
                return ContractVerdict::Denied {
                    reason: DenyReason::ClaimNotTrusted,
                    details: Some(DenialDetails::Claim { claim_type: claim_type.clone() }),
                };
            }
        }

        // ── Constraint-Checked ───────────────────────────────────────────────
        if let (Some(max_cost), Some(cost)) =
            (contract.signed_intent.payload.max_cost(), contract.action.cost())
        {
            if cost > max_cost {
                warn!(contract_id = %contract_id, max_cost, cost, "cost exceeds intent constraint");
                return ContractVerdict::Denied {
                    reason: DenyReason::ConstraintViolation,
                    details: Some(DenialDetails::Cost { max_cost, cost }),
                };
            }
        }

        debug!(contract_id = %contract_id, "contract verified");
        ContractVerdict::Allowed
    }
}
