//! Signing and verification of aggregates of every variant.

use tracing::debug;

use attesta_contracts::error::AttestaResult;
use attesta_crypto::{sign, verify, KeyPair};

use crate::aggregate::{Aggregate, SignedAggregate};

/// Sign an aggregate's canonical form, discriminant included.
pub fn sign_aggregate(aggregate: Aggregate, keypair: &KeyPair) -> AttestaResult<SignedAggregate> {
    sign(aggregate, keypair)
}

/// Verify the outer signature and, for federated payloads, every inner
/// entry recursively.
pub fn verify_signed_aggregate(signed: &SignedAggregate) -> bool {
    if !verify(signed) {
        debug!(aggregate_id = %signed.payload.id(), "aggregate signature invalid");
        return false;
    }
    match &signed.payload {
        Aggregate::Federated(fed) => fed.verify_entries(),
        _ => true,
    }
}
