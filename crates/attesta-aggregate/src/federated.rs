//! Federated aggregates: a multi-issuer bundle of independently signed
//! aggregates.
//!
//! Each entry keeps exactly `{aggregate, signature, publicKey, alg}`.  The
//! envelope `createdAt` of the inputs is dropped on construction so two
//! federations over the same signatures hash identically regardless of
//! when each issuer signed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use attesta_contracts::{
    error::{require_non_empty, AttestaError, AttestaResult},
    PROTOCOL_VERSION,
};
use attesta_crypto::{verify_detached, Hashed};

use crate::aggregate::{Aggregate, SignedAggregate};

/// One issuer's signature over one aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederatedEntry {
    pub aggregate: Aggregate,
    pub signature: String,
    pub public_key: String,
    pub alg: String,
}

impl FederatedEntry {
    /// Check this entry's signature, recursing into nested federations.
    pub fn verify(&self) -> bool {
        if !verify_detached(&self.aggregate, &self.signature, &self.public_key, &self.alg) {
            debug!(aggregate_id = %self.aggregate.id(), "federated entry signature invalid");
            return false;
        }
        match &self.aggregate {
            Aggregate::Federated(inner) => inner.verify_entries(),
            _ => true,
        }
    }
}

impl From<SignedAggregate> for FederatedEntry {
    fn from(signed: SignedAggregate) -> Self {
        Self {
            aggregate: signed.payload,
            signature: signed.signature,
            public_key: signed.public_key,
            alg: signed.alg,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederatedAggregate {
    pub version: String,
    pub federated_id: String,
    pub aggregates: Vec<FederatedEntry>,
    #[serde(with = "attesta_contracts::timestamp")]
    pub created_at: DateTime<Utc>,
}

impl FederatedAggregate {
    /// `true` iff there is at least one entry and every entry verifies.
    ///
    /// A federation that was deserialized with an empty `aggregates` list
    /// (construction forbids it) is rejected here.
    pub fn verify_entries(&self) -> bool {
        if self.aggregates.is_empty() {
            debug!(federated_id = %self.federated_id, "federated aggregate has no entries");
            return false;
        }
        self.aggregates.iter().all(FederatedEntry::verify)
    }

    /// Distinct issuer public keys, in first-seen order.
    pub fn signers(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.aggregates {
            if !seen.contains(&entry.public_key.as_str()) {
                seen.push(&entry.public_key);
            }
        }
        seen
    }
}

/// Bundle already-signed aggregates into a federated aggregate.
///
/// Entries are normalized to `{aggregate, signature, publicKey, alg}`; no
/// signature is checked here.
///
/// # Errors
///
/// `MissingEvidence` for an empty input; `MissingField` when an entry has
/// an empty signature, public key or algorithm.
pub fn create_federated_aggregate(
    federated_id: &str,
    signed_aggregates: Vec<SignedAggregate>,
    created_at: DateTime<Utc>,
) -> AttestaResult<Hashed<Aggregate>> {
    require_non_empty("federatedId", federated_id)?;
    if signed_aggregates.is_empty() {
        return Err(AttestaError::MissingEvidence {
            reason: "federated aggregate needs at least one signed aggregate".to_string(),
        });
    }

    let mut aggregates = Vec::with_capacity(signed_aggregates.len());
    for (idx, signed) in signed_aggregates.into_iter().enumerate() {
        require_non_empty(&format!("aggregates[{idx}].signature"), &signed.signature)?;
        require_non_empty(&format!("aggregates[{idx}].publicKey"), &signed.public_key)?;
        require_non_empty(&format!("aggregates[{idx}].alg"), &signed.alg)?;
        aggregates.push(FederatedEntry::from(signed));
    }

    Hashed::new(Aggregate::Federated(FederatedAggregate {
        version: PROTOCOL_VERSION.to_string(),
        federated_id: federated_id.to_string(),
        aggregates,
        created_at,
    }))
}
