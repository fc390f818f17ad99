//! # attesta-policy
//!
//! Trust policies decide whether a (signed) aggregate is acceptable, and
//! acceptance receipts attest to that decision.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use attesta_policy::{verify_and_evaluate, AcceptanceReceipt, TrustPolicy};
//!
//! let policy = TrustPolicy::from_file(Path::new("policies/federation.toml"))?;
//! let evaluation = verify_and_evaluate(&signed_aggregate, &policy);
//! let receipt = AcceptanceReceipt::from_evaluation(
//!     "rcpt-1", "FEDERATED_AGGREGATE", &signed_aggregate,
//!     policy.display_name(), &policy, &evaluation, timestamp::now(),
//! )?;
//! ```

pub mod engine;
pub mod receipt;
pub mod rule;

pub use engine::{evaluate, evaluate_trust, verify_and_evaluate, SignatureEntry, TrustSubject};
pub use receipt::{
    sign_acceptance_receipt, verify_signed_acceptance_receipt, AcceptanceReceipt,
    SignedAcceptanceReceipt,
};
pub use rule::TrustPolicy;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    use attesta_aggregate::{
        create_chain_aggregate, create_federated_aggregate, create_hierarchical_aggregate,
        create_windowed_chain_aggregate, sign_aggregate, Aggregate, SignedAggregate,
    };
    use attesta_contracts::{
        error::AttestaError,
        verdict::{Decision, PolicyEvaluation},
    };
    use attesta_crypto::{hash, KeyPair};

    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap()
    }

    fn heads() -> Vec<String> {
        vec![hash(&json!({ "head": 1 })).unwrap()]
    }

    fn simple(id: &str) -> Aggregate {
        create_chain_aggregate(id, heads(), None, at(0)).unwrap().value
    }

    fn federation(signers: &[&KeyPair]) -> SignedAggregate {
        let entries = signers
            .iter()
            .enumerate()
            .map(|(i, k)| sign_aggregate(simple(&format!("agg-{i}")), k).unwrap())
            .collect();
        let fed = create_federated_aggregate("fed-1", entries, at(1)).unwrap();
        sign_aggregate(fed.value, &KeyPair::generate().unwrap()).unwrap()
    }

    fn windowed(start: &str, end: &str) -> Aggregate {
        create_windowed_chain_aggregate("win-1", start, end, heads(), None, at(0)).unwrap().value
    }

    // ── Configuration ────────────────────────────────────────────────────────

    #[test]
    fn policy_loads_from_toml() {
        let policy = TrustPolicy::from_toml_str(
            r#"
            name = "two-issuers"
            min_signatures = 2
            allow_algorithms = ["ED25519"]
            require_level = 1
            require_window_start_after = "2025-01-01T00:00:00Z"
            max_window_seconds = 3600
            "#,
        )
        .unwrap();
        assert_eq!(policy.display_name(), "two-issuers");
        assert_eq!(policy.min_signatures, Some(2));
        assert_eq!(policy.require_level, Some(1));
        assert!(policy.has_signature_rules());
        assert!(policy.has_window_rules());
    }

    #[test]
    fn empty_policy_document_is_valid() {
        let policy = TrustPolicy::from_toml_str("").unwrap();
        assert_eq!(policy, TrustPolicy::default());
        assert_eq!(policy.display_name(), "unnamed");
    }

    #[test]
    fn malformed_policy_is_config_error() {
        for bad in [
            "min_signatures = \"two\"",
            "unknown_rule = true",
            "require_window_end_before = \"next tuesday\"",
            "min_signatures = ",
        ] {
            assert!(
                matches!(TrustPolicy::from_toml_str(bad), Err(AttestaError::ConfigError { .. })),
                "expected ConfigError for {bad:?}"
            );
        }
    }

    #[test]
    fn missing_policy_file_is_config_error() {
        let result = TrustPolicy::from_file(std::path::Path::new("/nonexistent/policy.toml"));
        assert!(matches!(result, Err(AttestaError::ConfigError { .. })));
    }

    // ── Signature rules ──────────────────────────────────────────────────────

    #[test]
    fn federation_meets_min_signatures() {
        let a = KeyPair::generate().unwrap();
        let b = KeyPair::generate().unwrap();
        let policy = TrustPolicy { min_signatures: Some(2), ..Default::default() };

        assert!(evaluate(&federation(&[&a, &b]), &policy).accepted);

        let one = evaluate(&federation(&[&a]), &policy);
        assert!(!one.accepted);
        assert_eq!(one.reasons, vec!["insufficient signatures: have 1, need 2".to_string()]);
    }

    #[test]
    fn public_key_allowlist_applies_to_every_entry() {
        let a = KeyPair::generate().unwrap();
        let b = KeyPair::generate().unwrap();
        let policy = TrustPolicy {
            allow_public_keys: vec![a.public_key.clone()],
            ..Default::default()
        };
        assert!(evaluate(&federation(&[&a]), &policy).accepted);

        let mixed = evaluate(&federation(&[&a, &b]), &policy);
        assert_eq!(mixed.reasons, vec!["publicKey not in allowlist".to_string()]);
    }

    #[test]
    fn violations_accumulate() {
        let a = KeyPair::generate().unwrap();
        let policy = TrustPolicy {
            min_signatures: Some(3),
            allow_algorithms: vec!["ES256".to_string()],
            allow_public_keys: vec!["nobody".to_string()],
            require_level: Some(2),
            ..Default::default()
        };
        let result = evaluate(&federation(&[&a]), &policy);
        assert!(!result.accepted);
        assert_eq!(
            result.reasons,
            vec![
                "insufficient signatures: have 1, need 3".to_string(),
                "disallowed algorithm: ED25519".to_string(),
                "publicKey not in allowlist".to_string(),
                "level mismatch: expected 2, subject has none".to_string(),
            ]
        );
    }

    #[test]
    fn zero_entries_rejected_immediately() {
        let raw = json!({
            "aggregateType": "FEDERATED",
            "version": "0.1",
            "federatedId": "fed-empty",
            "aggregates": [],
            "createdAt": "2025-03-01T00:00:00.000Z",
        });
        let empty: Aggregate = serde_json::from_value(raw).unwrap();
        let policy = TrustPolicy { require_level: Some(4), ..Default::default() };
        assert_eq!(
            evaluate(&empty, &policy),
            PolicyEvaluation::reject("no signatures or aggregates present")
        );

        // An unsigned plain aggregate has no entries for a signature rule.
        let sig_policy = TrustPolicy { min_signatures: Some(1), ..Default::default() };
        assert!(!evaluate(&simple("agg-1"), &sig_policy).accepted);
    }

    #[test]
    fn signed_simple_aggregate_is_judged_by_envelope_signer() {
        let keys = KeyPair::generate().unwrap();
        let signed = sign_aggregate(simple("agg-1"), &keys).unwrap();
        let policy = TrustPolicy {
            allow_public_keys: vec![keys.public_key.clone()],
            ..Default::default()
        };
        assert!(evaluate(&signed, &policy).accepted);
    }

    // ── Level and window rules ───────────────────────────────────────────────

    #[test]
    fn required_level_matches_hierarchical() {
        let leaf = create_hierarchical_aggregate("h-1", 1, heads(), vec![], None, at(0)).unwrap();
        let policy = TrustPolicy { require_level: Some(1), ..Default::default() };
        assert!(evaluate(&leaf.value, &policy).accepted);

        let policy = TrustPolicy { require_level: Some(0), ..Default::default() };
        assert_eq!(
            evaluate(&leaf.value, &policy).reasons,
            vec!["level mismatch: expected 0, got 1".to_string()]
        );
    }

    #[test]
    fn window_bounds_enforced() {
        let policy = TrustPolicy {
            require_window_start_after: Some("2025-01-01T00:00:00Z".to_string()),
            require_window_end_before: Some("2025-02-01T00:00:00Z".to_string()),
            ..Default::default()
        };
        let inside = evaluate(&windowed("2025-01-05T00:00:00Z", "2025-01-06T00:00:00Z"), &policy);
        assert!(inside.accepted);

        let early = evaluate(&windowed("2024-12-31T00:00:00Z", "2025-01-06T00:00:00Z"), &policy);
        assert_eq!(early.reasons, vec!["windowStart is before policy minimum".to_string()]);

        let both = evaluate(&windowed("2024-12-31T00:00:00Z", "2025-03-01T00:00:00Z"), &policy);
        assert_eq!(both.reasons.len(), 2);

        assert_eq!(
            evaluate(&simple("agg-1"), &policy).reasons,
            vec!["window rules require a windowed subject".to_string()]
        );
    }

    #[test]
    fn max_window_duration_enforced() {
        let policy = TrustPolicy { max_window_seconds: Some(3600), ..Default::default() };
        let hour = evaluate(&windowed("2025-01-01T00:00:00Z", "2025-01-01T01:00:00Z"), &policy);
        assert!(hour.accepted);
        let over = evaluate(&windowed("2025-01-01T00:00:00Z", "2025-01-01T01:00:01Z"), &policy);
        assert!(!over.accepted);
    }

    #[test]
    fn max_window_duration_counts_milliseconds() {
        let policy = TrustPolicy { max_window_seconds: Some(10), ..Default::default() };

        let over =
            evaluate(&windowed("2025-01-01T00:00:00.000Z", "2025-01-01T00:00:10.900Z"), &policy);
        assert!(!over.accepted);
        assert_eq!(over.reasons, vec!["window spans 10.9s, policy maximum is 10s".to_string()]);

        let exact =
            evaluate(&windowed("2025-01-01T00:00:00.000Z", "2025-01-01T00:00:10.000Z"), &policy);
        assert!(exact.accepted);
    }

    // ── Trust combination ────────────────────────────────────────────────────

    #[test]
    fn crypto_failure_dominates() {
        let accepted = PolicyEvaluation::from_reasons(vec![]);
        let rejected = PolicyEvaluation::reject("publicKey not in allowlist");

        assert!(evaluate_trust(true, &accepted).accepted);
        assert_eq!(evaluate_trust(true, &rejected), rejected);
        assert_eq!(
            evaluate_trust(false, &accepted),
            PolicyEvaluation::reject("cryptographic verification failed")
        );
        assert_eq!(
            evaluate_trust(true, &PolicyEvaluation { accepted: false, reasons: vec![] }),
            PolicyEvaluation::reject("policy rejected")
        );
    }

    #[test]
    fn verify_and_evaluate_catches_forged_member() {
        let a = KeyPair::generate().unwrap();
        let b = KeyPair::generate().unwrap();
        let policy = TrustPolicy { min_signatures: Some(2), ..Default::default() };

        let good = federation(&[&a, &b]);
        assert!(verify_and_evaluate(&good, &policy).accepted);

        let mut forged = good.clone();
        if let Aggregate::Federated(fed) = &mut forged.payload {
            fed.aggregates[1].aggregate = simple("forged");
        }
        assert_eq!(
            verify_and_evaluate(&forged, &policy),
            PolicyEvaluation::reject("cryptographic verification failed")
        );
    }

    // ── Acceptance receipts ──────────────────────────────────────────────────

    #[test]
    fn receipt_binds_target_and_policy_by_hash() {
        let a = KeyPair::generate().unwrap();
        let target = federation(&[&a]);
        let policy = TrustPolicy { name: Some("one".to_string()), ..Default::default() };
        let evaluation = verify_and_evaluate(&target, &policy);

        let receipt = AcceptanceReceipt::from_evaluation(
            "rcpt-1",
            "FEDERATED_AGGREGATE",
            &target,
            policy.display_name(),
            &policy,
            &evaluation,
            at(2),
        )
        .unwrap();
        assert_eq!(receipt.decision, Decision::Accept);
        assert_eq!(receipt.target_hash, hash(&target).unwrap());
        assert_eq!(receipt.policy_hash, hash(&policy).unwrap());
        assert!(receipt.binds(&target, &policy));

        let stricter = TrustPolicy { min_signatures: Some(5), ..policy.clone() };
        assert!(!receipt.binds(&target, &stricter));

        let rendered = serde_json::to_value(&receipt).unwrap();
        assert!(rendered.get("reasons").is_none(), "empty reasons are omitted");
    }

    #[test]
    fn reject_receipt_carries_reasons() {
        let policy = TrustPolicy { require_level: Some(3), ..Default::default() };
        let target = simple("agg-1");
        let evaluation = evaluate(&target, &policy);
        let receipt = AcceptanceReceipt::from_evaluation(
            "rcpt-2", "AGGREGATE", &target, "levels", &policy, &evaluation, at(2),
        )
        .unwrap();
        assert_eq!(receipt.decision, Decision::Reject);
        assert_eq!(receipt.reasons, evaluation.reasons);
    }

    #[test]
    fn receipt_requires_fields() {
        let policy = TrustPolicy::default();
        let create = |receipt_id: &str, target: &serde_json::Value| {
            AcceptanceReceipt::create(
                receipt_id,
                "AGG",
                target,
                "p",
                &policy,
                Decision::Accept,
                vec![],
                at(0),
            )
        };
        assert_eq!(create("", &json!({})), Err(AttestaError::missing("receiptId")));
        assert_eq!(create("r", &json!(null)), Err(AttestaError::missing("targetObject")));
    }

    #[test]
    fn signed_receipt_verifies_and_detects_tamper() {
        let auditor = KeyPair::generate().unwrap();
        let receipt = AcceptanceReceipt::create(
            "rcpt-3",
            "AGGREGATE",
            &simple("agg-1"),
            "default",
            &TrustPolicy::default(),
            Decision::Reject,
            vec!["publicKey not in allowlist".to_string()],
            at(3),
        )
        .unwrap();
        let signed = sign_acceptance_receipt(receipt, &auditor).unwrap();
        assert!(verify_signed_acceptance_receipt(&signed));

        let mut flipped = signed.clone();
        flipped.payload.decision = Decision::Accept;
        assert!(!verify_signed_acceptance_receipt(&flipped));
    }
}
