//! Scenario 3: Replay-guarded contract execution
//!
//! Sub-case A: valid contract                  → executed, receipt signed
//! Sub-case B: same contract id again          → REPLAY_DETECTED
//! Sub-case C: cost above the intent's maxCost → CONSTRAINT_VIOLATION
//! Sub-case D: KYC claim revoked by its issuer → CLAIM_NOT_TRUSTED

use std::sync::Arc;

use attesta_contracts::{error::AttestaResult, timestamp};
use attesta_core::{
    sign_claim, sign_execution_receipt, sign_intent, sign_revocation,
    verify_signed_execution_receipt, Action, AuditedExecutor, Claim, ClaimTrustOptions,
    ContractVerifier, ExecutionContract, ExecutionOutcome, InMemoryReplayGuard, Intent,
    Revocation, SignedIntent,
};
use attesta_crypto::KeyPair;
use attesta_graph::InMemoryChainLog;

fn report(label: &str, outcome: &ExecutionOutcome) {
    match outcome {
        ExecutionOutcome::Executed { receipt } => {
            println!("  {label:<24}EXECUTED ({})", receipt.receipt_id);
        }
        ExecutionOutcome::Denied { reason, details } => match details {
            Some(details) => println!(
                "  {label:<24}DENIED {reason} {}",
                serde_json::to_string(details).unwrap_or_default()
            ),
            None => println!("  {label:<24}DENIED {reason}"),
        },
    }
}

fn contract(id: &str, cost: i64, signed_intent: &SignedIntent) -> AttestaResult<ExecutionContract> {
    ExecutionContract::new(
        id,
        "agent-travel",
        Action::new("BOOK_FLIGHT").with_param("cost", cost),
        signed_intent.clone(),
        vec!["KYC".to_string()],
        timestamp::now(),
    )
}

pub fn run_scenario() -> AttestaResult<()> {
    println!("=== Scenario 3: Audited Execution ===");
    println!();

    let alice = KeyPair::generate()?;
    let bank = KeyPair::generate()?;
    let operator = KeyPair::generate()?;

    let intent =
        Intent::new("did:alice", "book travel", timestamp::now())?.with_constraint("maxCost", 10);
    let signed_intent = sign_intent(intent, &alice)?;
    let kyc = sign_claim(
        Claim::new("claim-kyc-1", "did:bank", "did:alice", "KYC", timestamp::now())?,
        &bank,
    )?;
    let claims = vec![kyc];

    let log = InMemoryChainLog::new();
    let executor = AuditedExecutor::new(
        ContractVerifier::with_default_oracles(ClaimTrustOptions {
            trusted_issuers: vec!["did:bank".to_string()],
            allow_expired: false,
        }),
        Arc::new(InMemoryReplayGuard::new()),
    )
    .with_audit_log(log.clone());

    // ── Sub-case A ────────────────────────────────────────────────────────────
    let cheap = contract("contract-1", 5, &signed_intent)?;
    let first = executor.execute(&cheap, &claims, &[], timestamp::now())?;
    report("A: cost 5, maxCost 10", &first);
    if let Some(receipt) = first.receipt() {
        let signed = sign_execution_receipt(receipt.clone(), &operator)?;
        println!(
            "  {:<24}{}",
            "   receipt signature",
            if verify_signed_execution_receipt(&signed) { "VERIFIED" } else { "FAILED" }
        );
    }

    // ── Sub-case B ────────────────────────────────────────────────────────────
    let again = executor.execute(&cheap, &claims, &[], timestamp::now())?;
    report("B: replay contract-1", &again);

    // ── Sub-case C ────────────────────────────────────────────────────────────
    let expensive = contract("contract-2", 50, &signed_intent)?;
    let outcome = executor.execute(&expensive, &claims, &[], timestamp::now())?;
    report("C: cost 50, maxCost 10", &outcome);

    // ── Sub-case D ────────────────────────────────────────────────────────────
    let revocation = sign_revocation(
        Revocation::new("claim-kyc-1", "did:bank", Some("account closed"), timestamp::now())?,
        &bank,
    )?;
    let fresh = contract("contract-3", 5, &signed_intent)?;
    report(
        "D: revoked KYC claim",
        &executor.execute(&fresh, &claims, &[revocation], timestamp::now())?,
    );

    println!(
        "  Audit chain integrity:  {} ({} execution(s))",
        if log.verify_integrity() { "VERIFIED" } else { "FAILED" },
        log.len()
    );
    println!();
    Ok(())
}
