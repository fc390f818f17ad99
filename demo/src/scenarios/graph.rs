//! Scenario 1: Accountability graph
//!
//! Links an intent to the claim that supports it, appends the edges to a
//! hash-chained log, then shows that replacing the claim is detected both
//! by edge validation and by chain verification.

use std::collections::HashMap;

use serde_json::{json, Value};

use attesta_contracts::{error::AttestaResult, timestamp};
use attesta_crypto::KeyPair;
use attesta_graph::{
    create_edge, make_node_ref, sign_chain_link, validate_edge, verify_chain,
    verify_signed_chain_link, ChainLink, InMemoryChainLog,
};

fn verdict(ok: bool) -> &'static str {
    if ok {
        "VERIFIED"
    } else {
        "FAILED"
    }
}

pub fn run_scenario() -> AttestaResult<()> {
    println!("=== Scenario 1: Accountability Graph ===");
    println!();

    let intent = json!({
        "issuer": "did:alice",
        "purpose": "book travel",
        "constraints": { "maxCost": 10 },
    });
    let claim = json!({
        "id": "claim-kyc-1",
        "issuer": "did:bank",
        "type": "KYC",
        "subject": "did:alice",
    });

    let intent_ref = make_node_ref("intent", "intent-1", &intent)?;
    let claim_ref = make_node_ref("claim", "claim-kyc-1", &claim)?;
    let edge = create_edge("SUPPORTED_BY", intent_ref, claim_ref, timestamp::now())?;

    let mut objects: HashMap<String, Value> = HashMap::new();
    objects.insert("intent:intent-1".to_string(), intent);
    objects.insert("claim:claim-kyc-1".to_string(), claim);

    println!("  Edge: intent:intent-1 -SUPPORTED_BY-> claim:claim-kyc-1");
    println!("  Edge validation:        {}", verdict(validate_edge(&edge, &objects)));

    let log = InMemoryChainLog::new();
    let first = log.append("link-1", vec![edge.clone()], timestamp::now())?;
    let second = log.append("link-2", vec![edge.clone()], timestamp::now())?;
    println!("  Chain head:             {}", second.hash);
    println!(
        "  Chain integrity:        {} ({} link(s))",
        verdict(log.verify_integrity()),
        log.len()
    );

    let auditor = KeyPair::generate()?;
    let signed = sign_chain_link(first.value.clone(), &auditor)?;
    println!("  Signed link-1:          {}", verdict(verify_signed_chain_link(&signed)));

    // Replace the claim object after the fact.
    objects.insert(
        "claim:claim-kyc-1".to_string(),
        json!({
            "id": "claim-kyc-1",
            "issuer": "did:mallory",
            "type": "KYC",
            "subject": "did:alice",
        }),
    );
    println!("  Edge after claim swap:  {}", verdict(validate_edge(&edge, &objects)));

    // Replace the first link with a different one.
    let mut forged = first.value;
    forged.edges.clear();
    let chain: Vec<ChainLink> = vec![forged, second.value];
    println!("  Chain after link swap:  {}", verdict(verify_chain(&chain)));
    println!("  RESULT: tampering detected (expected)");
    println!();
    Ok(())
}
