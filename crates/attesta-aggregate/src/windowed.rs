//! Windowed aggregates: chain heads observed within a time window.
//!
//! The window is validated when the aggregate is built.  An aggregate whose
//! start is after its end cannot be constructed, so verifiers never have to
//! re-check ordering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use attesta_contracts::{
    error::{require_non_empty, AttestaError, AttestaResult},
    timestamp, PROTOCOL_VERSION,
};
use attesta_crypto::Hashed;

use crate::aggregate::{check_hash_list, Aggregate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowedAggregate {
    pub version: String,
    pub aggregate_id: String,
    #[serde(with = "attesta_contracts::timestamp")]
    pub window_start: DateTime<Utc>,
    #[serde(with = "attesta_contracts::timestamp")]
    pub window_end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_agg_hash: Option<String>,
    pub head_hashes: Vec<String>,
    #[serde(with = "attesta_contracts::timestamp")]
    pub created_at: DateTime<Utc>,
}

fn parse_bound(field: &str, raw: &str) -> AttestaResult<DateTime<Utc>> {
    require_non_empty(field, raw)?;
    timestamp::parse(raw).ok_or_else(|| AttestaError::InvalidWindow {
        reason: format!("{field} '{raw}' is not a valid ISO-8601 instant"),
    })
}

/// Build and hash a windowed aggregate.
///
/// `window_start` and `window_end` are RFC 3339 instants; they are
/// normalized to UTC millisecond form in the canonical encoding.
///
/// # Errors
///
/// `InvalidWindow` if either bound fails to parse or start > end;
/// `MissingEvidence` for empty `head_hashes`.
pub fn create_windowed_chain_aggregate(
    aggregate_id: &str,
    window_start: &str,
    window_end: &str,
    head_hashes: Vec<String>,
    prev_agg_hash: Option<String>,
    created_at: DateTime<Utc>,
) -> AttestaResult<Hashed<Aggregate>> {
    require_non_empty("aggregateId", aggregate_id)?;
    let start = parse_bound("windowStart", window_start)?;
    let end = parse_bound("windowEnd", window_end)?;
    if start > end {
        return Err(AttestaError::InvalidWindow {
            reason: format!("windowStart {window_start} is after windowEnd {window_end}"),
        });
    }
    if head_hashes.is_empty() {
        return Err(AttestaError::MissingEvidence {
            reason: "headHashes must be a non-empty list".to_string(),
        });
    }
    check_hash_list("headHashes", &head_hashes)?;

    Hashed::new(Aggregate::Windowed(WindowedAggregate {
        version: PROTOCOL_VERSION.to_string(),
        aggregate_id: aggregate_id.to_string(),
        window_start: start,
        window_end: end,
        prev_agg_hash: prev_agg_hash.filter(|h| !h.is_empty()),
        head_hashes,
        created_at,
    }))
}
