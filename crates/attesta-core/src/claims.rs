//! Claims, revocations, and the default claim trust oracle.
//!
//! A revocation only affects a claim when it names the claim's id, comes
//! from the claim's own issuer, and carries a valid signature.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use attesta_contracts::{
    error::{require_non_empty, AttestaResult},
    PROTOCOL_VERSION,
};
use attesta_crypto::{sign, verify, KeyPair, Signed};

use crate::traits::ClaimVerifier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: String,
    pub issuer: String,
    pub subject: String,
    #[serde(rename = "type")]
    pub claim_type: String,
    #[serde(with = "attesta_contracts::timestamp")]
    pub issued_at: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "attesta_contracts::timestamp::option"
    )]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub evidence: Vec<Value>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

pub type SignedClaim = Signed<Claim>;

impl Claim {
    /// # Errors
    ///
    /// `MissingField` for an empty id, issuer, subject or type.
    pub fn new(
        id: &str,
        issuer: &str,
        subject: &str,
        claim_type: &str,
        issued_at: DateTime<Utc>,
    ) -> AttestaResult<Self> {
        require_non_empty("id", id)?;
        require_non_empty("issuer", issuer)?;
        require_non_empty("subject", subject)?;
        require_non_empty("type", claim_type)?;
        Ok(Self {
            id: id.to_string(),
            issuer: issuer.to_string(),
            subject: subject.to_string(),
            claim_type: claim_type.to_string(),
            issued_at,
            expires_at: None,
            evidence: Vec::new(),
            data: Map::new(),
        })
    }

    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_evidence(mut self, evidence: impl Into<Value>) -> Self {
        self.evidence.push(evidence.into());
        self
    }

    /// Strictly after `expiresAt`; claims without one never expire.
    pub fn is_expired(&self, at: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| at > exp)
    }
}

pub fn sign_claim(claim: Claim, keypair: &KeyPair) -> AttestaResult<SignedClaim> {
    sign(claim, keypair)
}

/// Signature check plus, unless `allow_expired`, temporal validity.
pub fn verify_signed_claim(
    signed_claim: &SignedClaim,
    allow_expired: bool,
    at: DateTime<Utc>,
) -> bool {
    verify(signed_claim) && (allow_expired || !signed_claim.payload.is_expired(at))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revocation {
    pub version: String,
    pub target_claim_id: String,
    pub issuer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(with = "attesta_contracts::timestamp")]
    pub revoked_at: DateTime<Utc>,
}

pub type SignedRevocation = Signed<Revocation>;

impl Revocation {
    pub fn new(
        target_claim_id: &str,
        issuer: &str,
        reason: Option<&str>,
        revoked_at: DateTime<Utc>,
    ) -> AttestaResult<Self> {
        require_non_empty("targetClaimId", target_claim_id)?;
        require_non_empty("issuer", issuer)?;
        Ok(Self {
            version: PROTOCOL_VERSION.to_string(),
            target_claim_id: target_claim_id.to_string(),
            issuer: issuer.to_string(),
            reason: reason.filter(|r| !r.is_empty()).map(str::to_string),
            revoked_at,
        })
    }

    pub fn matches_claim(&self, claim: &Claim) -> bool {
        self.target_claim_id == claim.id && self.issuer == claim.issuer
    }
}

pub fn sign_revocation(
    revocation: Revocation,
    keypair: &KeyPair,
) -> AttestaResult<SignedRevocation> {
    sign(revocation, keypair)
}

/// True iff the revocation is authentic and targets `claim`.
pub fn verify_signed_revocation(signed_revocation: &SignedRevocation, claim: &Claim) -> bool {
    verify(signed_revocation) && signed_revocation.payload.matches_claim(claim)
}

/// Issuer-trust and expiry options for the default claim oracle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimTrustOptions {
    /// Empty means any issuer is trusted.
    pub trusted_issuers: Vec<String>,
    pub allow_expired: bool,
}

impl ClaimTrustOptions {
    /// The trust decision once signature, revocation and expiry status
    /// are known.
    pub fn admits(&self, claim: &Claim, revoked: bool, expired: bool) -> bool {
        if revoked {
            return false;
        }
        if expired && !self.allow_expired {
            return false;
        }
        self.trusted_issuers.is_empty() || self.trusted_issuers.iter().any(|i| *i == claim.issuer)
    }
}

/// Signature, revocation, expiry, then issuer trust.
#[derive(Debug, Clone, Default)]
pub struct DefaultClaimVerifier {
    pub options: ClaimTrustOptions,
}

impl DefaultClaimVerifier {
    pub fn new(options: ClaimTrustOptions) -> Self {
        Self { options }
    }
}

impl ClaimVerifier for DefaultClaimVerifier {
    fn verify_claim(
        &self,
        signed_claim: &SignedClaim,
        signed_revocations: &[SignedRevocation],
        at: DateTime<Utc>,
    ) -> bool {
        let claim = &signed_claim.payload;
        if !verify_signed_claim(signed_claim, true, at) {
            debug!(claim_id = %claim.id, "claim signature invalid");
            return false;
        }

        let revoked = signed_revocations
            .iter()
            .any(|sr| verify_signed_revocation(sr, claim));
        let expired = claim.is_expired(at);
        let admitted = self.options.admits(claim, revoked, expired);
        if !admitted {
            debug!(
                claim_id = %claim.id,
                issuer = %claim.issuer,
                revoked,
                expired,
                "claim not admitted"
            );
        }
        admitted
    }
}
