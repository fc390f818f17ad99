//! Scenario 2: Federated aggregation and trust policy
//!
//! Two hospitals each aggregate their chain heads and sign the result.  A
//! coordinator federates both signed aggregates, an auditor evaluates the
//! federation against a TOML trust policy and signs an acceptance receipt.
//! Finally a forged member aggregate shows that the outer signature cannot
//! launder a bad inner one.

use attesta_aggregate::{
    create_chain_aggregate, create_federated_aggregate, create_windowed_chain_aggregate,
    sign_aggregate, Aggregate,
};
use attesta_contracts::{error::AttestaResult, timestamp};
use attesta_crypto::{hash, KeyPair};
use attesta_policy::{
    sign_acceptance_receipt, verify_and_evaluate, verify_signed_acceptance_receipt,
    AcceptanceReceipt, TrustPolicy,
};

pub const FEDERATION_POLICY: &str = include_str!("../../policies/federation.toml");

pub fn run_scenario(policy: &TrustPolicy) -> AttestaResult<()> {
    println!("=== Scenario 2: Federated Aggregation ===");
    println!();

    let hospital_a = KeyPair::generate()?;
    let hospital_b = KeyPair::generate()?;
    let coordinator = KeyPair::generate()?;
    let auditor = KeyPair::generate()?;

    let heads_a = vec![hash(&"hospital-a/chain-1")?, hash(&"hospital-a/chain-2")?];
    let heads_b = vec![hash(&"hospital-b/chain-1")?];

    let agg_a = create_chain_aggregate("hospital-a-agg", heads_a, None, timestamp::now())?;
    let agg_b = create_windowed_chain_aggregate(
        "hospital-b-agg",
        "2025-03-01T00:00:00Z",
        "2025-03-01T23:59:59Z",
        heads_b,
        None,
        timestamp::now(),
    )?;
    println!("  Hospital A aggregate:   {}", agg_a.hash);
    println!("  Hospital B aggregate:   {} (windowed)", agg_b.hash);

    let members = vec![
        sign_aggregate(agg_a.value, &hospital_a)?,
        sign_aggregate(agg_b.value, &hospital_b)?,
    ];
    let federated = create_federated_aggregate("fed-2025-03-01", members, timestamp::now())?;
    let signed = sign_aggregate(federated.value, &coordinator)?;
    println!("  Federated aggregate:    {}", federated.hash);

    let evaluation = verify_and_evaluate(&signed, policy);
    println!("  Policy:                 {}", policy.display_name());
    println!("  Decision:               {}", evaluation.decision());
    for reason in &evaluation.reasons {
        println!("    - {reason}");
    }

    let receipt = AcceptanceReceipt::from_evaluation(
        "acc-1",
        "FEDERATED_AGGREGATE",
        &signed,
        policy.display_name(),
        policy,
        &evaluation,
        timestamp::now(),
    )?;
    let signed_receipt = sign_acceptance_receipt(receipt, &auditor)?;
    println!(
        "  Acceptance receipt:     {} (signature {})",
        signed_receipt.payload.receipt_id,
        if verify_signed_acceptance_receipt(&signed_receipt) { "VERIFIED" } else { "FAILED" }
    );

    // Swap hospital A's aggregate for a forged one, keep its signature, and
    // have the coordinator re-sign the whole federation.
    let mut forged = signed.payload.clone();
    if let Aggregate::Federated(fed) = &mut forged {
        let forged_heads = vec![hash(&"hospital-a/forged")?];
        fed.aggregates[0].aggregate =
            create_chain_aggregate("hospital-a-agg", forged_heads, None, timestamp::now())?.value;
    }
    let resigned = sign_aggregate(forged, &coordinator)?;
    let forged_eval = verify_and_evaluate(&resigned, policy);
    println!("  Forged member decision: {}", forged_eval.decision());
    for reason in &forged_eval.reasons {
        println!("    - {reason}");
    }
    println!("  RESULT: forged member rejected (expected)");
    println!();
    Ok(())
}
