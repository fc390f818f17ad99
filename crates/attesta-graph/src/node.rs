//! Content-addressed node references.
//!
//! A `NodeRef` points at an external object (an intent, a claim, a
//! contract...) by `kind`, `id`, and the SHA-256 of the object's canonical
//! form at the moment the reference was made.  If the object is later
//! changed, recomputing its hash no longer matches `NodeRef::hash`.

use serde::{Deserialize, Serialize};

use attesta_contracts::error::{require_non_empty, AttestaError, AttestaResult};
use attesta_crypto::{hash, hash_value, to_canonical_value, CanonicalValue};

/// Pointer to an external object, bound to that object's content hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub kind: String,
    pub id: String,
    /// Lowercase hex SHA-256 of the referenced object's canonical form.
    pub hash: String,
}

impl NodeRef {
    /// The lookup key used by [`validate_edge`](crate::edge::validate_edge):
    /// `"kind:id"`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.kind, self.id)
    }

    /// True when `kind`, `id` and `hash` are all non-empty.
    pub fn is_well_formed(&self) -> bool {
        !self.kind.is_empty() && !self.id.is_empty() && !self.hash.is_empty()
    }

    /// Fail with `MissingField` naming the first empty component, prefixed
    /// with `role` (e.g. `"from.kind"`).
    pub(crate) fn check(&self, role: &str) -> AttestaResult<()> {
        require_non_empty(&format!("{role}.kind"), &self.kind)?;
        require_non_empty(&format!("{role}.id"), &self.id)?;
        require_non_empty(&format!("{role}.hash"), &self.hash)
    }
}

/// Hash `object` and return a reference to it.
///
/// # Errors
///
/// `MissingField` if `kind` or `id` is empty or `object` serializes to
/// `null`; `UnsupportedValue` if `object` has no canonical form.
pub fn make_node_ref<T: Serialize + ?Sized>(
    kind: &str,
    id: &str,
    object: &T,
) -> AttestaResult<NodeRef> {
    require_non_empty("kind", kind)?;
    require_non_empty("id", id)?;

    let value = to_canonical_value(object)?;
    if value == CanonicalValue::Null {
        return Err(AttestaError::missing("object"));
    }

    Ok(NodeRef {
        kind: kind.to_string(),
        id: id.to_string(),
        hash: hash_value(&value)?,
    })
}

/// Recompute the hash of `object` and compare it with `node_ref.hash`.
///
/// Returns `false` (never an error) when the object cannot be hashed.
pub fn validate_node_ref<T: Serialize + ?Sized>(node_ref: &NodeRef, object: &T) -> bool {
    hash(object).map(|h| h == node_ref.hash).unwrap_or(false)
}
