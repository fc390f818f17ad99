//! Hierarchical aggregates: level-tagged summaries over chain heads and/or
//! lower-level aggregate hashes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use attesta_contracts::{
    error::{require_non_empty, AttestaError, AttestaResult},
    PROTOCOL_VERSION,
};
use attesta_crypto::Hashed;

use crate::aggregate::{check_hash_list, Aggregate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchicalAggregate {
    pub version: String,
    pub aggregate_id: String,
    /// 0 for leaf aggregates over chain heads.
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_agg_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub head_hashes: Vec<String>,
    /// Order is significant and participates in the hash.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_agg_hashes: Vec<String>,
    #[serde(with = "attesta_contracts::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Build and hash a hierarchical aggregate.
///
/// # Errors
///
/// `InvalidLevel` when `level` is negative or does not fit in `u32`;
/// `MissingEvidence` when both `head_hashes` and `child_agg_hashes` are
/// empty.
pub fn create_hierarchical_aggregate(
    aggregate_id: &str,
    level: i64,
    head_hashes: Vec<String>,
    child_agg_hashes: Vec<String>,
    prev_agg_hash: Option<String>,
    created_at: DateTime<Utc>,
) -> AttestaResult<Hashed<Aggregate>> {
    require_non_empty("aggregateId", aggregate_id)?;
    let level = u32::try_from(level).map_err(|_| AttestaError::InvalidLevel { level })?;
    if head_hashes.is_empty() && child_agg_hashes.is_empty() {
        return Err(AttestaError::MissingEvidence {
            reason: "hierarchical aggregate needs headHashes or childAggHashes".to_string(),
        });
    }
    check_hash_list("headHashes", &head_hashes)?;
    check_hash_list("childAggHashes", &child_agg_hashes)?;

    Hashed::new(Aggregate::Hierarchical(HierarchicalAggregate {
        version: PROTOCOL_VERSION.to_string(),
        aggregate_id: aggregate_id.to_string(),
        level,
        prev_agg_hash: prev_agg_hash.filter(|h| !h.is_empty()),
        head_hashes,
        child_agg_hashes,
        created_at,
    }))
}
