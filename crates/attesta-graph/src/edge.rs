//! Typed, directed edges between node references.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use attesta_contracts::error::{require_non_empty, AttestaResult};

use crate::node::{validate_node_ref, NodeRef};

/// A directed relation `from → to` of a given `type`
/// (e.g. `"AUTHORIZES"`, `"FULFILLS"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    #[serde(rename = "type")]
    pub edge_type: String,
    pub from: NodeRef,
    pub to: NodeRef,
    #[serde(with = "attesta_contracts::timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Edge {
    /// Both endpoints are structurally valid node references.
    pub fn is_well_formed(&self) -> bool {
        !self.edge_type.is_empty() && self.from.is_well_formed() && self.to.is_well_formed()
    }

    pub(crate) fn check(&self) -> AttestaResult<()> {
        require_non_empty("type", &self.edge_type)?;
        self.from.check("from")?;
        self.to.check("to")
    }
}

/// Build an edge after checking that both endpoints are well formed.
pub fn create_edge(
    edge_type: &str,
    from: NodeRef,
    to: NodeRef,
    created_at: DateTime<Utc>,
) -> AttestaResult<Edge> {
    let edge = Edge {
        edge_type: edge_type.to_string(),
        from,
        to,
        created_at,
    };
    edge.check()?;
    Ok(edge)
}

/// Check both endpoints of `edge` against the current objects.
///
/// `objects` is keyed by `"kind:id"`.  Returns `true` only if both objects
/// are present and both recomputed hashes match the stored references.
pub fn validate_edge<T: Serialize>(edge: &Edge, objects: &HashMap<String, T>) -> bool {
    let (Some(from_obj), Some(to_obj)) =
        (objects.get(&edge.from.key()), objects.get(&edge.to.key()))
    else {
        debug!(
            from = %edge.from.key(),
            to = %edge.to.key(),
            "edge endpoint object not found"
        );
        return false;
    };

    let from_ok = validate_node_ref(&edge.from, from_obj);
    let to_ok = validate_node_ref(&edge.to, to_obj);
    if !(from_ok && to_ok) {
        debug!(
            edge_type = %edge.edge_type,
            from_ok,
            to_ok,
            "edge endpoint hash mismatch"
        );
    }
    from_ok && to_ok
}
