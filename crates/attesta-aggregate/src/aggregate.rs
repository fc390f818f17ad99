//! The `Aggregate` tagged variant.
//!
//! Each variant is a plain struct; the enum adds an `aggregateType`
//! discriminant to the canonical form, so a windowed aggregate can never
//! hash (or verify) as a simple one with extra fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use attesta_contracts::error::AttestaResult;
use attesta_crypto::{hash, Signed};

use crate::{
    federated::FederatedAggregate, hierarchical::HierarchicalAggregate, simple::ChainAggregate,
    windowed::WindowedAggregate,
};

/// A hashable, signable summary over chain heads or child aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "aggregateType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Aggregate {
    Simple(ChainAggregate),
    Windowed(WindowedAggregate),
    Hierarchical(HierarchicalAggregate),
    Federated(FederatedAggregate),
}

/// An aggregate signed by a single issuer.
pub type SignedAggregate = Signed<Aggregate>;

impl Aggregate {
    /// `aggregateId`, or `federatedId` for the federated variant.
    pub fn id(&self) -> &str {
        match self {
            Aggregate::Simple(a) => &a.aggregate_id,
            Aggregate::Windowed(a) => &a.aggregate_id,
            Aggregate::Hierarchical(a) => &a.aggregate_id,
            Aggregate::Federated(a) => &a.federated_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Aggregate::Simple(_) => "SIMPLE",
            Aggregate::Windowed(_) => "WINDOWED",
            Aggregate::Hierarchical(_) => "HIERARCHICAL",
            Aggregate::Federated(_) => "FEDERATED",
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Aggregate::Simple(a) => a.created_at,
            Aggregate::Windowed(a) => a.created_at,
            Aggregate::Hierarchical(a) => a.created_at,
            Aggregate::Federated(a) => a.created_at,
        }
    }

    pub fn head_hashes(&self) -> &[String] {
        match self {
            Aggregate::Simple(a) => &a.head_hashes,
            Aggregate::Windowed(a) => &a.head_hashes,
            Aggregate::Hierarchical(a) => &a.head_hashes,
            Aggregate::Federated(_) => &[],
        }
    }

    pub fn child_agg_hashes(&self) -> &[String] {
        match self {
            Aggregate::Hierarchical(a) => &a.child_agg_hashes,
            _ => &[],
        }
    }

    pub fn prev_agg_hash(&self) -> Option<&str> {
        match self {
            Aggregate::Simple(a) => a.prev_agg_hash.as_deref(),
            Aggregate::Windowed(a) => a.prev_agg_hash.as_deref(),
            Aggregate::Hierarchical(a) => a.prev_agg_hash.as_deref(),
            Aggregate::Federated(_) => None,
        }
    }

    /// Aggregation level; only hierarchical aggregates have one.
    pub fn level(&self) -> Option<u32> {
        match self {
            Aggregate::Hierarchical(a) => Some(a.level),
            _ => None,
        }
    }

    /// `(windowStart, windowEnd)`; only windowed aggregates have one.
    pub fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match self {
            Aggregate::Windowed(a) => Some((a.window_start, a.window_end)),
            _ => None,
        }
    }

    /// Content hash of the canonical form, discriminant included.
    pub fn agg_hash(&self) -> AttestaResult<String> {
        hash(self)
    }
}

impl From<ChainAggregate> for Aggregate {
    fn from(a: ChainAggregate) -> Self {
        Aggregate::Simple(a)
    }
}

impl From<WindowedAggregate> for Aggregate {
    fn from(a: WindowedAggregate) -> Self {
        Aggregate::Windowed(a)
    }
}

impl From<HierarchicalAggregate> for Aggregate {
    fn from(a: HierarchicalAggregate) -> Self {
        Aggregate::Hierarchical(a)
    }
}

impl From<FederatedAggregate> for Aggregate {
    fn from(a: FederatedAggregate) -> Self {
        Aggregate::Federated(a)
    }
}

/// Fail with `MissingEvidence` if any hash in `hashes` is empty.
pub(crate) fn check_hash_list(field: &str, hashes: &[String]) -> AttestaResult<()> {
    if let Some(idx) = hashes.iter().position(String::is_empty) {
        return Err(attesta_contracts::error::AttestaError::MissingEvidence {
            reason: format!("{field}[{idx}] is empty"),
        });
    }
    Ok(())
}
