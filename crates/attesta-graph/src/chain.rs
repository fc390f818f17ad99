//! Chain links: append-only bundles of edges, optionally linked to their
//! predecessor by hash.
//!
//! A link's hash is the SHA-256 of its canonical form:
//!
//! ```text
//! {"createdAt":…,"edges":[…],"linkId":…,"prevLinkHash":…,"version":"0.1"}
//! ```
//!
//! `prevLinkHash` is omitted for the first link of a chain.  Nothing stops a
//! caller from building a link whose `prevLinkHash` is wrong; integrity is
//! established after the fact by [`verify_chain`], which recomputes every
//! ancestor hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use attesta_contracts::{
    error::{require_non_empty, AttestaResult},
    PROTOCOL_VERSION,
};
use attesta_crypto::{hash, sign, verify, Hashed, KeyPair, Signed};

use crate::edge::Edge;

/// One append-only unit of the accountability graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainLink {
    pub version: String,
    pub link_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_link_hash: Option<String>,
    pub edges: Vec<Edge>,
    #[serde(with = "attesta_contracts::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// A chain link signed by its author.
pub type SignedChainLink = Signed<ChainLink>;

/// Assemble and hash a chain link.
///
/// `edges` may be empty; every edge present must be well formed.
pub fn create_chain_link(
    link_id: &str,
    prev_link_hash: Option<String>,
    edges: Vec<Edge>,
    created_at: DateTime<Utc>,
) -> AttestaResult<Hashed<ChainLink>> {
    require_non_empty("linkId", link_id)?;
    for edge in &edges {
        edge.check()?;
    }

    Hashed::new(ChainLink {
        version: PROTOCOL_VERSION.to_string(),
        link_id: link_id.to_string(),
        prev_link_hash: prev_link_hash.filter(|h| !h.is_empty()),
        edges,
        created_at,
    })
}

pub fn sign_chain_link(link: ChainLink, keypair: &KeyPair) -> AttestaResult<SignedChainLink> {
    sign(link, keypair)
}

pub fn verify_signed_chain_link(signed: &SignedChainLink) -> bool {
    verify(signed)
}

/// Verify that `links` form an unbroken hash chain.
///
/// The first link must have no `prevLinkHash`; every later link's
/// `prevLinkHash` must equal the recomputed hash of the link before it.
/// An empty chain is valid.
pub fn verify_chain(links: &[ChainLink]) -> bool {
    verify_chain_from(None, links)
}

/// Like [`verify_chain`], but the first link must point at `anchor`.
///
/// Use this to check a segment whose predecessor was verified earlier.
pub fn verify_chain_from(anchor: Option<&str>, links: &[ChainLink]) -> bool {
    let mut expected_prev = anchor.map(str::to_string);

    for link in links {
        if link.prev_link_hash != expected_prev {
            warn!(
                link_id = %link.link_id,
                expected = ?expected_prev,
                found = ?link.prev_link_hash,
                "chain link does not point at its predecessor"
            );
            return false;
        }

        match hash(link) {
            Ok(h) => expected_prev = Some(h),
            Err(_) => return false,
        }
    }

    true
}

/// Verify a chain whose links carry the hash recorded when each was built.
///
/// Checks both rules:
///
/// 1. **Hash correctness**: each stored hash matches the recomputed one.
/// 2. **Linkage**: each `prevLinkHash` equals the previous stored hash
///    (none for the first link).
pub fn verify_sealed_chain(links: &[Hashed<ChainLink>]) -> bool {
    let mut expected_prev: Option<&str> = None;

    for sealed in links {
        if !sealed.is_intact() {
            warn!(link_id = %sealed.value.link_id, "chain link content does not match its hash");
            return false;
        }
        if sealed.value.prev_link_hash.as_deref() != expected_prev {
            warn!(link_id = %sealed.value.link_id, "chain link does not point at its predecessor");
            return false;
        }
        expected_prev = Some(&sealed.hash);
    }

    true
}
