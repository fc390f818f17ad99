//! # attesta-core
//!
//! Execution contracts bind an agent action to a signed intent and a set of
//! required claim types.  [`AuditedExecutor`] runs a contract through
//!
//!   Replay-Checked → Signature-Verified → Claims-Verified →
//!   Constraint-Checked → Allowed | Denied(reason)
//!
//! and, when allowed, produces an [`ExecutionReceipt`] and marks the
//! contract id as seen.  Denials are values, never errors, and always carry
//! a [`DenyReason`](attesta_contracts::verdict::DenyReason).

pub mod claims;
pub mod contract;
pub mod executor;
pub mod intent;
pub mod replay;
pub mod traits;
pub mod verify;

pub use claims::{
    sign_claim, sign_revocation, verify_signed_claim, verify_signed_revocation, Claim,
    ClaimTrustOptions, DefaultClaimVerifier, Revocation, SignedClaim, SignedRevocation,
};
pub use contract::{
    sign_execution_receipt, verify_signed_execution_receipt, Action, ExecutionContract,
    ExecutionReceipt, SignedExecutionReceipt,
};
pub use executor::{execute_contract_stub, AuditedExecutor, ExecutionOutcome, EXECUTED_AS};
pub use intent::{sign_intent, verify_signed_intent, Intent, SignatureIntentVerifier, SignedIntent};
pub use replay::InMemoryReplayGuard;
pub use traits::{ClaimVerifier, IntentVerifier, ReplayGuard};
pub use verify::{ContractVerdict, ContractVerifier, DenialDetails};

// ── Tests ─────────────────────────────────────────────────────────────────────
