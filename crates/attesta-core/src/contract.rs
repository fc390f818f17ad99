//! Execution contracts and the receipts produced when they run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use attesta_contracts::{
    error::{require_non_empty, AttestaError, AttestaResult},
    verdict::ExecutionStatus,
    PROTOCOL_VERSION,
};
use attesta_crypto::{sign, verify, KeyPair, Signed};

use crate::intent::SignedIntent;

/// What the agent is asked to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Action {
    pub fn new(action_type: impl Into<String>) -> Self {
        Self { action_type: action_type.into(), params: Map::new() }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Numeric `cost` parameter, if present.
    pub fn cost(&self) -> Option<f64> {
        self.params.get("cost").and_then(Value::as_f64)
    }
}

/// Binds an agent action to the signed intent that authorizes it and the
/// claim types the agent must present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContract {
    pub version: String,
    pub contract_id: String,
    pub agent_id: String,
    pub action: Action,
    pub signed_intent: SignedIntent,
    #[serde(default)]
    pub required_claims: Vec<String>,
    #[serde(default)]
    pub policy: Map<String, Value>,
    #[serde(with = "attesta_contracts::timestamp")]
    pub created_at: DateTime<Utc>,
}

impl ExecutionContract {
    /// # Errors
    ///
    /// `MissingField` for an empty contract id, agent id or action type.
    pub fn new(
        contract_id: &str,
        agent_id: &str,
        action: Action,
        signed_intent: SignedIntent,
        required_claims: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> AttestaResult<Self> {
        require_non_empty("contractId", contract_id)?;
        require_non_empty("agentId", agent_id)?;
        require_non_empty("action.type", &action.action_type)?;
        if let Some(idx) = required_claims.iter().position(String::is_empty) {
            return Err(AttestaError::missing(format!("requiredClaims[{idx}]")));
        }
        Ok(Self {
            version: PROTOCOL_VERSION.to_string(),
            contract_id: contract_id.to_string(),
            agent_id: agent_id.to_string(),
            action,
            signed_intent,
            required_claims,
            policy: Map::new(),
            created_at,
        })
    }

    pub fn with_policy(mut self, policy: Map<String, Value>) -> Self {
        self.policy = policy;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReceipt {
    pub version: String,
    pub receipt_id: String,
    pub contract_id: String,
    /// Hash of the full contract that was executed.
    pub contract_hash: String,
    pub status: ExecutionStatus,
    pub output: Value,
    #[serde(with = "attesta_contracts::timestamp")]
    pub executed_at: DateTime<Utc>,
}

impl ExecutionReceipt {
    pub fn new(
        receipt_id: &str,
        contract_id: &str,
        contract_hash: &str,
        status: ExecutionStatus,
        output: Value,
        executed_at: DateTime<Utc>,
    ) -> AttestaResult<Self> {
        require_non_empty("receiptId", receipt_id)?;
        require_non_empty("contractId", contract_id)?;
        require_non_empty("contractHash", contract_hash)?;
        Ok(Self {
            version: PROTOCOL_VERSION.to_string(),
            receipt_id: receipt_id.to_string(),
            contract_id: contract_id.to_string(),
            contract_hash: contract_hash.to_string(),
            status,
            output,
            executed_at,
        })
    }
}

pub type SignedExecutionReceipt = Signed<ExecutionReceipt>;

pub fn sign_execution_receipt(
    receipt: ExecutionReceipt,
    keypair: &KeyPair,
) -> AttestaResult<SignedExecutionReceipt> {
    sign(receipt, keypair)
}

pub fn verify_signed_execution_receipt(signed: &SignedExecutionReceipt) -> bool {
    verify(signed)
}
