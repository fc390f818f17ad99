//! Simple chain aggregates: an ordered list of chain head hashes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use attesta_contracts::{
    error::{require_non_empty, AttestaError, AttestaResult},
    PROTOCOL_VERSION,
};
use attesta_crypto::Hashed;

use crate::aggregate::{check_hash_list, Aggregate};

/// Binds a set of chain heads, in order, into one hashable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainAggregate {
    pub version: String,
    pub aggregate_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_agg_hash: Option<String>,
    /// Order is significant and participates in the hash.
    pub head_hashes: Vec<String>,
    #[serde(with = "attesta_contracts::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Build and hash a simple aggregate.
///
/// # Errors
///
/// `MissingField` for an empty `aggregate_id`; `MissingEvidence` when
/// `head_hashes` is empty or contains an empty hash.
pub fn create_chain_aggregate(
    aggregate_id: &str,
    head_hashes: Vec<String>,
    prev_agg_hash: Option<String>,
    created_at: DateTime<Utc>,
) -> AttestaResult<Hashed<Aggregate>> {
    require_non_empty("aggregateId", aggregate_id)?;
    if head_hashes.is_empty() {
        return Err(AttestaError::MissingEvidence {
            reason: "headHashes must be a non-empty list".to_string(),
        });
    }
    check_hash_list("headHashes", &head_hashes)?;

    Hashed::new(Aggregate::Simple(ChainAggregate {
        version: PROTOCOL_VERSION.to_string(),
        aggregate_id: aggregate_id.to_string(),
        prev_agg_hash: prev_agg_hash.filter(|h| !h.is_empty()),
        head_hashes,
        created_at,
    }))
}
