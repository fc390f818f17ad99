//! Audited execution: Replay-Checked → verify → stub execute → receipt.
//!
//! The replay guard reservation is taken before verification and is only
//! committed after the receipt exists, so:
//!
//! - a second call with an executed id is denied with `REPLAY_DETECTED`
//! - a concurrent duplicate is denied the same way
//! - a denied contract stays retryable under the same id

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use attesta_contracts::{
    error::AttestaResult,
    verdict::{DenyReason, ExecutionStatus},
};
use attesta_crypto::hash;
use attesta_graph::{create_edge, make_node_ref, InMemoryChainLog};

use crate::{
    claims::{SignedClaim, SignedRevocation},
    contract::{ExecutionContract, ExecutionReceipt},
    replay::Reservation,
    traits::ReplayGuard,
    verify::{ContractVerdict, ContractVerifier, DenialDetails},
};

/// Edge type recorded in the audit log for every executed contract.
pub const EXECUTED_AS: &str = "EXECUTED_AS";

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Executed {
        receipt: ExecutionReceipt,
    },
    Denied {
        reason: DenyReason,
        details: Option<DenialDetails>,
    },
}

impl ExecutionOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ExecutionOutcome::Executed { .. })
    }

    pub fn reason(&self) -> Option<DenyReason> {
        match self {
            ExecutionOutcome::Executed { .. } => None,
            ExecutionOutcome::Denied { reason, .. } => Some(*reason),
        }
    }

    pub fn receipt(&self) -> Option<&ExecutionReceipt> {
        match self {
            ExecutionOutcome::Executed { receipt } => Some(receipt),
            ExecutionOutcome::Denied { .. } => None,
        }
    }
}

/// Deterministic stand-in for real execution: hashes the contract and
/// returns a fixed output.
pub fn execute_contract_stub(contract: &ExecutionContract) -> AttestaResult<(String, Value)> {
    Ok((hash(contract)?, json!({ "ok": true })))
}

/// Verifies contracts and runs them at most once per contract id.
///
/// Construct one per execution authority.  Executors that must share replay
/// protection share the same `ReplayGuard`.
pub struct AuditedExecutor {
    verifier: ContractVerifier,
    replay: Arc<dyn ReplayGuard>,
    audit_log: Option<InMemoryChainLog>,
}

impl AuditedExecutor {
    pub fn new(verifier: ContractVerifier, replay: Arc<dyn ReplayGuard>) -> Self {
        Self { verifier, replay, audit_log: None }
    }

    /// Record a `contract -EXECUTED_AS-> receipt` edge for every execution.
    pub fn with_audit_log(mut self, log: InMemoryChainLog) -> Self {
        self.audit_log = Some(log);
        self
    }

    /// Verify and execute `contract` as of `at`.
    ///
    /// # Errors
    ///
    /// Only construction failures: a contract or receipt with no canonical
    /// form, or an audit link that cannot be built.  Denials are `Ok`.  On
    /// error the contract id is not marked seen.
    pub fn execute(
        &self,
        contract: &ExecutionContract,
        signed_claims: &[SignedClaim],
        signed_revocations: &[SignedRevocation],
        at: DateTime<Utc>,
    ) -> AttestaResult<ExecutionOutcome> {
        let contract_id = contract.contract_id.as_str();

        // ── Replay-Checked ───────────────────────────────────────────────────
        let Some(reservation) = Reservation::acquire(self.replay.as_ref(), contract_id) else {
            warn!(contract_id = %contract_id, "replay detected");
            return Ok(ExecutionOutcome::Denied {
                reason: DenyReason::ReplayDetected,
                details: None,
            });
        };

        // Dropping the reservation on any early return releases the id.
        if let ContractVerdict::Denied { reason, details } =
            self.verifier.verify(contract, signed_claims, signed_revocations, at)
        {
            info!(contract_id = %contract_id, reason = %reason, "contract denied");
            return Ok(ExecutionOutcome::Denied { reason, details });
        }

        let (contract_hash, output) = execute_contract_stub(contract)?;
        let receipt_id = format!("rcpt_{}", Uuid::new_v4().simple());
        let receipt = ExecutionReceipt::new(
            &receipt_id,
            contract_id,
            &contract_hash,
            ExecutionStatus::Executed,
            output,
            at,
        )?;

        if let Some(log) = &self.audit_log {
            let from = make_node_ref("contract", contract_id, contract)?;
            let to = make_node_ref("receipt", &receipt_id, &receipt)?;
            let edge = create_edge(EXECUTED_AS, from, to, at)?;
            let link = log.append(&receipt_id, vec![edge], at)?;
            debug!(contract_id = %contract_id, link_hash = %link.hash, "execution audited");
        }

        reservation.commit();
        info!(
            contract_id = %contract_id,
            receipt_id = %receipt_id,
            contract_hash = %contract_hash,
            "contract executed"
        );
        Ok(ExecutionOutcome::Executed { receipt })
    }
}
