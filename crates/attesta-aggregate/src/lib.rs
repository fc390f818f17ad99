//! # attesta-aggregate
//!
//! Aggregates summarize many chain heads (or lower-level aggregates) into a
//! single hash that one issuer signs.  Four variants exist:
//!
//! | Variant        | Binds                                             |
//! |----------------|---------------------------------------------------|
//! | `Simple`       | ordered chain head hashes                         |
//! | `Windowed`     | head hashes plus a validated `[start, end]` window |
//! | `Hierarchical` | a level plus head and/or child aggregate hashes   |
//! | `Federated`    | several aggregates, each signed by its own issuer |
//!
//! Order of every hash list is significant: reordering changes the hash and
//! invalidates any signature over it.

pub mod aggregate;
pub mod federated;
pub mod hierarchical;
pub mod signed;
pub mod simple;
pub mod windowed;

pub use aggregate::{Aggregate, SignedAggregate};
pub use federated::{create_federated_aggregate, FederatedAggregate, FederatedEntry};
pub use hierarchical::{create_hierarchical_aggregate, HierarchicalAggregate};
pub use signed::{sign_aggregate, verify_signed_aggregate};
pub use simple::{create_chain_aggregate, ChainAggregate};
pub use windowed::{create_windowed_chain_aggregate, WindowedAggregate};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    use attesta_contracts::error::AttestaError;
    use attesta_crypto::{canonical_string, hash, KeyPair};

    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, minute, 0).unwrap()
    }

    fn heads(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| hash(&json!({ "head": n })).unwrap()).collect()
    }

    fn simple(id: &str) -> Aggregate {
        create_chain_aggregate(id, heads(&["a", "b"]), None, at(0)).unwrap().value
    }

    // ── Simple ───────────────────────────────────────────────────────────────

    #[test]
    fn simple_aggregate_hash_depends_on_head_order() {
        let ab = create_chain_aggregate("agg-1", heads(&["a", "b"]), None, at(0)).unwrap();
        let ba = create_chain_aggregate("agg-1", heads(&["b", "a"]), None, at(0)).unwrap();
        assert_ne!(ab.hash, ba.hash);
        assert_eq!(ab.hash, ab.value.agg_hash().unwrap());
    }

    #[test]
    fn reordered_heads_invalidate_signature() {
        let keys = KeyPair::generate().unwrap();
        let signed = sign_aggregate(simple("agg-1"), &keys).unwrap();
        assert!(verify_signed_aggregate(&signed));

        let mut forged = signed.clone();
        if let Aggregate::Simple(inner) = &mut forged.payload {
            inner.head_hashes.swap(0, 1);
        }
        assert!(!verify_signed_aggregate(&forged));
    }

    #[test]
    fn simple_aggregate_requires_heads() {
        assert!(matches!(
            create_chain_aggregate("agg-1", vec![], None, at(0)),
            Err(AttestaError::MissingEvidence { .. })
        ));
        assert!(matches!(
            create_chain_aggregate("agg-1", vec![String::new()], None, at(0)),
            Err(AttestaError::MissingEvidence { .. })
        ));
        assert_eq!(
            create_chain_aggregate("", heads(&["a"]), None, at(0)),
            Err(AttestaError::MissingField { field: "aggregateId".to_string() })
        );
    }

    #[test]
    fn canonical_form_carries_discriminant_and_omits_absent_prev() {
        let rendered = canonical_string(&simple("agg-1")).unwrap();
        assert!(rendered.contains(r#""aggregateType":"SIMPLE""#));
        assert!(!rendered.contains("prevAggHash"));

        let linked = create_chain_aggregate("agg-2", heads(&["c"]), Some("ff".repeat(32)), at(1))
            .unwrap();
        assert_eq!(linked.value.prev_agg_hash(), Some("ff".repeat(32).as_str()));
    }

    // ── Windowed ─────────────────────────────────────────────────────────────

    #[test]
    fn windowed_aggregate_normalizes_bounds() {
        let agg = create_windowed_chain_aggregate(
            "win-1",
            "2025-03-01T13:00:00+01:00",
            "2025-03-01T12:30:00.5Z",
            heads(&["a"]),
            None,
            at(40),
        )
        .unwrap();
        let (start, end) = agg.value.window().unwrap();
        assert_eq!(start, at(0));
        assert!(start < end);

        let rendered = canonical_string(&agg.value).unwrap();
        assert!(rendered.contains(r#""windowStart":"2025-03-01T12:00:00.000Z""#));
        assert!(rendered.contains(r#""windowEnd":"2025-03-01T12:30:00.500Z""#));
    }

    #[test]
    fn windowed_aggregate_rejects_inverted_window() {
        let result = create_windowed_chain_aggregate(
            "win-1",
            "2025-03-02T00:00:00Z",
            "2025-03-01T00:00:00Z",
            heads(&["a"]),
            None,
            at(0),
        );
        assert!(matches!(result, Err(AttestaError::InvalidWindow { .. })));
    }

    #[test]
    fn windowed_aggregate_rejects_unparseable_bounds() {
        let result = create_windowed_chain_aggregate(
            "win-1",
            "yesterday",
            "2025-03-01T00:00:00Z",
            heads(&["a"]),
            None,
            at(0),
        );
        assert!(matches!(result, Err(AttestaError::InvalidWindow { .. })));
    }

    #[test]
    fn windowed_and_simple_never_share_a_hash() {
        let plain = create_chain_aggregate("agg-1", heads(&["a"]), None, at(0)).unwrap();
        let windowed = create_windowed_chain_aggregate(
            "agg-1",
            "2025-03-01T00:00:00Z",
            "2025-03-01T00:00:00Z",
            heads(&["a"]),
            None,
            at(0),
        )
        .unwrap();
        assert_ne!(plain.hash, windowed.hash);
    }

    // ── Hierarchical ─────────────────────────────────────────────────────────

    #[test]
    fn hierarchical_rejects_negative_level() {
        assert_eq!(
            create_hierarchical_aggregate("h-1", -1, heads(&["a"]), vec![], None, at(0)),
            Err(AttestaError::InvalidLevel { level: -1 })
        );
    }

    #[test]
    fn hierarchical_requires_some_evidence() {
        assert!(matches!(
            create_hierarchical_aggregate("h-1", 1, vec![], vec![], None, at(0)),
            Err(AttestaError::MissingEvidence { .. })
        ));
    }

    #[test]
    fn hierarchical_child_order_matters() {
        let a = simple("leaf-a").agg_hash().unwrap();
        let b = simple("leaf-b").agg_hash().unwrap();

        let keys = KeyPair::generate().unwrap();
        let parent =
            create_hierarchical_aggregate("h-1", 1, vec![], vec![a.clone(), b.clone()], None, at(1))
                .unwrap();
        assert_eq!(parent.value.level(), Some(1));
        let signed = sign_aggregate(parent.value, &keys).unwrap();
        assert!(verify_signed_aggregate(&signed));

        let swapped =
            create_hierarchical_aggregate("h-1", 1, vec![], vec![b, a], None, at(1)).unwrap();
        let mut forged = signed.clone();
        forged.payload = swapped.value;
        assert!(!verify_signed_aggregate(&forged));
    }

    // ── Federated ────────────────────────────────────────────────────────────

    fn two_issuer_federation() -> (Aggregate, KeyPair, KeyPair) {
        let hospital = KeyPair::generate().unwrap();
        let lab = KeyPair::generate().unwrap();
        let entries = vec![
            sign_aggregate(simple("hospital-agg"), &hospital).unwrap(),
            sign_aggregate(simple("lab-agg"), &lab).unwrap(),
        ];
        let fed = create_federated_aggregate("fed-1", entries, at(5)).unwrap();
        (fed.value, hospital, lab)
    }

    #[test]
    fn federated_verifies_every_entry() {
        let (fed, hospital, lab) = two_issuer_federation();
        let coordinator = KeyPair::generate().unwrap();
        let signed = sign_aggregate(fed, &coordinator).unwrap();
        assert!(verify_signed_aggregate(&signed));

        let Aggregate::Federated(inner) = &signed.payload else {
            panic!("expected federated payload");
        };
        assert_eq!(inner.signers(), vec![hospital.public_key.as_str(), lab.public_key.as_str()]);
    }

    #[test]
    fn federated_detects_forged_entry_even_when_resigned() {
        let (fed, _, _) = two_issuer_federation();
        let Aggregate::Federated(mut inner) = fed else {
            panic!("expected federated payload");
        };
        // Swap in a different aggregate but keep the hospital's signature.
        inner.aggregates[0].aggregate = simple("forged-agg");

        let coordinator = KeyPair::generate().unwrap();
        let signed = sign_aggregate(Aggregate::Federated(inner), &coordinator).unwrap();
        assert!(!verify_signed_aggregate(&signed), "outer signature must not launder entries");
    }

    #[test]
    fn federated_recurses_into_nested_federations() {
        let (inner_fed, _, _) = two_issuer_federation();
        let regional = KeyPair::generate().unwrap();
        let inner_signed = sign_aggregate(inner_fed, &regional).unwrap();

        let outer = create_federated_aggregate("fed-outer", vec![inner_signed.clone()], at(9))
            .unwrap();
        let national = KeyPair::generate().unwrap();
        assert!(verify_signed_aggregate(&sign_aggregate(outer.value.clone(), &national).unwrap()));

        let Aggregate::Federated(mut tampered) = outer.value else {
            panic!("expected federated payload");
        };
        if let Aggregate::Federated(nested) = &mut tampered.aggregates[0].aggregate {
            nested.aggregates[1].signature = nested.aggregates[0].signature.clone();
        }
        assert!(!tampered.verify_entries());
    }

    #[test]
    fn federated_construction_rejects_bad_input() {
        assert!(matches!(
            create_federated_aggregate("fed-1", vec![], at(0)),
            Err(AttestaError::MissingEvidence { .. })
        ));

        let keys = KeyPair::generate().unwrap();
        let mut unsigned = sign_aggregate(simple("agg-1"), &keys).unwrap();
        unsigned.signature.clear();
        assert_eq!(
            create_federated_aggregate("fed-1", vec![unsigned], at(0)),
            Err(AttestaError::MissingField { field: "aggregates[0].signature".to_string() })
        );
    }

    #[test]
    fn federated_entries_drop_envelope_timestamps() {
        let keys = KeyPair::generate().unwrap();
        let signed = sign_aggregate(simple("agg-1"), &keys).unwrap();
        let mut later = signed.clone();
        later.created_at = at(59);

        let a = create_federated_aggregate("fed-1", vec![signed], at(5)).unwrap();
        let b = create_federated_aggregate("fed-1", vec![later], at(5)).unwrap();
        assert_eq!(a.hash, b.hash);

        let rendered = serde_json::to_value(&a.value).unwrap();
        let entry = rendered["aggregates"][0].as_object().unwrap();
        let mut keys: Vec<&str> = entry.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["aggregate", "alg", "publicKey", "signature"]);
    }

    #[test]
    fn deserialized_empty_federation_fails_verification() {
        let raw = json!({
            "aggregateType": "FEDERATED",
            "version": "0.1",
            "federatedId": "fed-empty",
            "aggregates": [],
            "createdAt": "2025-03-01T12:00:00.000Z",
        });
        let fed: Aggregate = serde_json::from_value(raw).unwrap();
        let keys = KeyPair::generate().unwrap();
        let signed = sign_aggregate(fed, &keys).unwrap();
        assert!(!verify_signed_aggregate(&signed));
    }

    #[test]
    fn aggregate_json_round_trips() {
        let (fed, _, _) = two_issuer_federation();
        let text = serde_json::to_string(&fed).unwrap();
        let back: Aggregate = serde_json::from_str(&text).unwrap();
        assert_eq!(back, fed);
        assert_eq!(back.kind(), "FEDERATED");
    }
}
