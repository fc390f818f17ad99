//! # attesta-graph
//!
//! The accountability graph: content-addressed node references, typed edges
//! between them, and chain links that bundle edges and point at their
//! predecessor by SHA-256 hash.
//!
//! ## Overview
//!
//! Every reference carries the hash of the object it points at, and every
//! link after the first carries the hash of the link before it.  Replacing
//! any object or any link with a different one is detected by recomputing
//! hashes with [`validate_edge`] and [`verify_chain`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use attesta_graph::{make_node_ref, create_edge, InMemoryChainLog};
//!
//! let intent = make_node_ref("intent", "i-1", &intent_obj)?;
//! let claim = make_node_ref("claim", "c-1", &claim_obj)?;
//! let edge = create_edge("SUPPORTED_BY", intent, claim, timestamp::now())?;
//!
//! let log = InMemoryChainLog::new();
//! log.append("link-1", vec![edge], timestamp::now())?;
//! assert!(log.verify_integrity());
//! ```

pub mod chain;
pub mod edge;
pub mod memory;
pub mod node;

pub use chain::{
    create_chain_link, sign_chain_link, verify_chain, verify_chain_from, verify_sealed_chain,
    verify_signed_chain_link, ChainLink, SignedChainLink,
};
pub use edge::{create_edge, validate_edge, Edge};
pub use memory::InMemoryChainLog;
pub use node::{make_node_ref, validate_node_ref, NodeRef};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::{json, Value};

    use attesta_contracts::error::AttestaError;
    use attesta_crypto::{hash, KeyPair};

    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, minute, 0).unwrap()
    }

    fn intent() -> Value {
        json!({ "issuer": "did:alice", "purpose": "book travel", "constraints": { "maxCost": 10 } })
    }

    fn claim() -> Value {
        json!({ "id": "c-1", "issuer": "did:bank", "type": "KYC", "subject": "did:alice" })
    }

    fn objects() -> HashMap<String, Value> {
        let mut objects = HashMap::new();
        objects.insert("intent:i-1".to_string(), intent());
        objects.insert("claim:c-1".to_string(), claim());
        objects
    }

    fn sample_edge(minute: u32) -> Edge {
        let from = make_node_ref("intent", "i-1", &intent()).unwrap();
        let to = make_node_ref("claim", "c-1", &claim()).unwrap();
        create_edge("SUPPORTED_BY", from, to, at(minute)).unwrap()
    }

    // ── Node references ──────────────────────────────────────────────────────

    #[test]
    fn node_ref_hash_is_content_hash() {
        let node = make_node_ref("intent", "i-1", &intent()).unwrap();
        assert_eq!(node.hash, hash(&intent()).unwrap());
        assert_eq!(node.key(), "intent:i-1");
        assert!(validate_node_ref(&node, &intent()));

        let mut changed = intent();
        changed["purpose"] = json!("book hotel");
        assert!(!validate_node_ref(&node, &changed));
    }

    #[test]
    fn node_ref_requires_kind_id_and_object() {
        assert_eq!(
            make_node_ref("", "i-1", &intent()),
            Err(AttestaError::MissingField { field: "kind".to_string() })
        );
        assert_eq!(
            make_node_ref("intent", "", &intent()),
            Err(AttestaError::MissingField { field: "id".to_string() })
        );
        assert_eq!(
            make_node_ref("intent", "i-1", &Value::Null),
            Err(AttestaError::MissingField { field: "object".to_string() })
        );
    }

    // ── Edges ────────────────────────────────────────────────────────────────

    #[test]
    fn create_edge_rejects_malformed_endpoints() {
        let good = make_node_ref("intent", "i-1", &intent()).unwrap();
        let mut bad = good.clone();
        bad.hash.clear();

        match create_edge("SUPPORTED_BY", good.clone(), bad, at(0)) {
            Err(AttestaError::MissingField { field }) => assert_eq!(field, "to.hash"),
            other => panic!("expected MissingField, got {other:?}"),
        }
        assert!(create_edge("", good.clone(), good, at(0)).is_err());
    }

    #[test]
    fn validate_edge_matches_current_objects() {
        assert!(validate_edge(&sample_edge(0), &objects()));
    }

    #[test]
    fn validate_edge_detects_replaced_object() {
        let mut objects = objects();
        objects.insert(
            "claim:c-1".to_string(),
            json!({ "id": "c-1", "issuer": "did:mallory", "type": "KYC", "subject": "did:alice" }),
        );
        assert!(!validate_edge(&sample_edge(0), &objects));
    }

    #[test]
    fn validate_edge_fails_when_object_missing() {
        let mut objects = objects();
        objects.remove("intent:i-1");
        assert!(!validate_edge(&sample_edge(0), &objects));
    }

    // ── Chain links ──────────────────────────────────────────────────────────

    #[test]
    fn chain_link_omits_absent_predecessor() {
        let link = create_chain_link("link-1", None, vec![], at(0)).unwrap();
        let rendered = attesta_crypto::canonical_string(&link.value).unwrap();
        assert!(!rendered.contains("prevLinkHash"));
        assert!(rendered.contains(r#""version":"0.1""#));
        assert_eq!(link.hash, hash(&link.value).unwrap());
    }

    #[test]
    fn chain_link_requires_link_id() {
        assert_eq!(
            create_chain_link("", None, vec![], at(0)),
            Err(AttestaError::MissingField { field: "linkId".to_string() })
        );
    }

    #[test]
    fn signed_chain_link_round_trip_and_tamper() {
        let keys = KeyPair::generate().unwrap();
        let link = create_chain_link("link-1", None, vec![sample_edge(0)], at(1)).unwrap();
        let signed = sign_chain_link(link.value, &keys).unwrap();
        assert!(verify_signed_chain_link(&signed));

        let mut tampered = signed.clone();
        tampered.payload.edges[0].edge_type = "CONTRADICTS".to_string();
        assert!(!verify_signed_chain_link(&tampered));
    }

    #[test]
    fn verify_chain_recomputes_ancestor_hashes() {
        let first = create_chain_link("link-1", None, vec![sample_edge(0)], at(1)).unwrap();
        let second =
            create_chain_link("link-2", Some(first.hash.clone()), vec![], at(2)).unwrap();
        let third =
            create_chain_link("link-3", Some(second.hash.clone()), vec![sample_edge(3)], at(3))
                .unwrap();

        let chain = vec![first.value.clone(), second.value.clone(), third.value.clone()];
        assert!(verify_chain(&chain));
        assert!(verify_chain(&[]));

        // Substitute a different first link: the second link's pointer is stale.
        let forged = create_chain_link("link-1", None, vec![], at(1)).unwrap();
        assert!(!verify_chain(&[forged.value, second.value.clone(), third.value.clone()]));

        // A segment verifies against an anchor verified earlier.
        assert!(verify_chain_from(Some(first.hash.as_str()), &[second.value, third.value.clone()]));
        assert!(!verify_chain_from(Some(first.hash.as_str()), &[third.value]));
    }

    // ── In-memory log ────────────────────────────────────────────────────────

    #[test]
    fn log_threads_predecessor_hashes() {
        let log = InMemoryChainLog::new();
        assert!(log.is_empty());
        assert!(log.head_hash().is_none());

        let a = log.append("link-a", vec![sample_edge(0)], at(1)).unwrap();
        let b = log.append("link-b", vec![], at(2)).unwrap();
        let c = log.append("link-c", vec![sample_edge(3)], at(3)).unwrap();

        assert_eq!(a.value.prev_link_hash, None);
        assert_eq!(b.value.prev_link_hash.as_deref(), Some(a.hash.as_str()));
        assert_eq!(c.value.prev_link_hash.as_deref(), Some(b.hash.as_str()));
        assert_eq!(log.head_hash(), Some(c.hash));
        assert_eq!(log.len(), 3);
        assert!(log.verify_integrity());

        let plain: Vec<ChainLink> = log.links().into_iter().map(|l| l.value).collect();
        assert!(verify_chain(&plain));
    }

    #[test]
    fn log_detects_replaced_link() {
        let log = InMemoryChainLog::new();
        log.append("link-a", vec![sample_edge(0)], at(1)).unwrap();
        log.append("link-b", vec![], at(2)).unwrap();

        {
            let mut state = log.state.lock().unwrap();
            state.links[0].value.edges.clear();
        }

        assert!(!log.verify_integrity(), "log must detect a replaced link");
    }

    #[test]
    fn empty_log_is_valid() {
        assert!(InMemoryChainLog::new().verify_integrity());
        assert!(verify_sealed_chain(&[]));
    }
}
