//! Trust policy evaluation.
//!
//! `evaluate` is total: it never fails and never short-circuits after the
//! first violation.  Every applicable rule is checked and each violation
//! adds one reason, so a single call reports everything that is wrong.
//!
//! Evaluation order:
//!
//! 1. If signature rules apply and the subject has no signature entries,
//!    reject immediately with a single reason.
//! 2. Signature count, algorithm allowlist, public-key allowlist.
//! 3. Required aggregation level.
//! 4. Window bounds and maximum window duration.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use attesta_aggregate::{verify_signed_aggregate, Aggregate, SignedAggregate};
use attesta_contracts::verdict::PolicyEvaluation;

use crate::rule::TrustPolicy;

/// The signature data a policy looks at for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureEntry<'a> {
    pub alg: &'a str,
    pub public_key: &'a str,
}

/// Anything a trust policy can be evaluated against.
pub trait TrustSubject {
    /// Signature entries: federated members, or a single envelope signer.
    fn signature_entries(&self) -> Vec<SignatureEntry<'_>>;

    /// Whether this subject is expected to carry signatures at all.
    fn is_signature_bearing(&self) -> bool;

    fn level(&self) -> Option<u32>;

    fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)>;
}

impl TrustSubject for Aggregate {
    fn signature_entries(&self) -> Vec<SignatureEntry<'_>> {
        match self {
            Aggregate::Federated(fed) => fed
                .aggregates
                .iter()
                .map(|e| SignatureEntry { alg: &e.alg, public_key: &e.public_key })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn is_signature_bearing(&self) -> bool {
        matches!(self, Aggregate::Federated(_))
    }

    fn level(&self) -> Option<u32> {
        Aggregate::level(self)
    }

    fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Aggregate::window(self)
    }
}

/// A signed federation is judged by its member issuers; any other signed
/// aggregate by its envelope signer.
impl TrustSubject for SignedAggregate {
    fn signature_entries(&self) -> Vec<SignatureEntry<'_>> {
        match &self.payload {
            Aggregate::Federated(_) => self.payload.signature_entries(),
            _ => vec![SignatureEntry { alg: &self.alg, public_key: &self.public_key }],
        }
    }

    fn is_signature_bearing(&self) -> bool {
        true
    }

    fn level(&self) -> Option<u32> {
        self.payload.level()
    }

    fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.payload.window()
    }
}

/// Evaluate `subject` against `policy`, collecting every violation.
pub fn evaluate<S: TrustSubject + ?Sized>(subject: &S, policy: &TrustPolicy) -> PolicyEvaluation {
    let mut reasons = Vec::new();

    if subject.is_signature_bearing() || policy.has_signature_rules() {
        let entries = subject.signature_entries();
        if entries.is_empty() {
            warn!(policy = %policy.display_name(), "subject carries no signatures or aggregates");
            return PolicyEvaluation::reject("no signatures or aggregates present");
        }
        check_signatures(&entries, policy, &mut reasons);
    }

    if let Some(required) = policy.require_level {
        match subject.level() {
            Some(level) if level == required => {}
            Some(level) => {
                reasons.push(format!("level mismatch: expected {required}, got {level}"))
            }
            None => reasons.push(format!("level mismatch: expected {required}, subject has none")),
        }
    }

    if policy.has_window_rules() {
        match subject.window() {
            Some((start, end)) => check_window(start, end, policy, &mut reasons),
            None => reasons.push("window rules require a windowed subject".to_string()),
        }
    }

    let evaluation = PolicyEvaluation::from_reasons(reasons);
    debug!(
        policy = %policy.display_name(),
        accepted = evaluation.accepted,
        violations = evaluation.reasons.len(),
        "trust policy evaluated"
    );
    evaluation
}

fn check_signatures(
    entries: &[SignatureEntry<'_>],
    policy: &TrustPolicy,
    reasons: &mut Vec<String>,
) {
    let min = policy.min_signatures.unwrap_or(1);
    if entries.len() < min {
        reasons.push(format!("insufficient signatures: have {}, need {min}", entries.len()));
    }

    if !policy.allow_algorithms.is_empty() {
        let allowed = |alg: &str| policy.allow_algorithms.iter().any(|a| a == alg);
        if let Some(bad) = entries.iter().find(|e| !allowed(e.alg)) {
            reasons.push(format!("disallowed algorithm: {}", bad.alg));
        }
    }

    if !policy.allow_public_keys.is_empty() {
        let unlisted = entries
            .iter()
            .any(|e| !policy.allow_public_keys.iter().any(|k| k == e.public_key));
        if unlisted {
            reasons.push("publicKey not in allowlist".to_string());
        }
    }
}

fn check_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    policy: &TrustPolicy,
    reasons: &mut Vec<String>,
) {
    if start > end {
        reasons.push("windowStart MUST be <= windowEnd".to_string());
    }

    match policy.window_start_after() {
        Some(Some(min)) if start < min => {
            reasons.push("windowStart is before policy minimum".to_string())
        }
        Some(None) => reasons.push("policy require_window_start_after is invalid".to_string()),
        _ => {}
    }

    match policy.window_end_before() {
        Some(Some(max)) if end > max => {
            reasons.push("windowEnd is after policy maximum".to_string())
        }
        Some(None) => reasons.push("policy require_window_end_before is invalid".to_string()),
        _ => {}
    }

    if let Some(max_secs) = policy.max_window_seconds {
        // Compared in milliseconds, the precision of aggregate timestamps.
        let span_ms = (end - start).num_milliseconds();
        let max_ms = max_secs.checked_mul(1000).and_then(|ms| i64::try_from(ms).ok());
        if matches!(max_ms, Some(max_ms) if span_ms > max_ms) {
            let span_secs = span_ms as f64 / 1000.0;
            reasons.push(format!("window spans {span_secs}s, policy maximum is {max_secs}s"));
        }
    }
}

/// Combine a cryptographic check with a policy result.
///
/// A cryptographic failure dominates and replaces the policy reasons.
pub fn evaluate_trust(crypto_valid: bool, policy_result: &PolicyEvaluation) -> PolicyEvaluation {
    if !crypto_valid {
        return PolicyEvaluation::reject("cryptographic verification failed");
    }
    if !policy_result.accepted {
        if policy_result.reasons.is_empty() {
            return PolicyEvaluation::reject("policy rejected");
        }
        return policy_result.clone();
    }
    PolicyEvaluation::from_reasons(Vec::new())
}

/// Verify a signed aggregate (recursively for federations) and evaluate it.
pub fn verify_and_evaluate(signed: &SignedAggregate, policy: &TrustPolicy) -> PolicyEvaluation {
    let crypto_valid = verify_signed_aggregate(signed);
    if !crypto_valid {
        warn!(aggregate_id = %signed.payload.id(), "signed aggregate failed verification");
    }
    evaluate_trust(crypto_valid, &evaluate(signed, policy))
}
