//! Hash-then-sign Ed25519 envelopes.
//!
//! `sign` canonicalizes the payload, takes its SHA-256 digest and signs the
//! 32 digest bytes (never the raw canonical bytes).  `verify` recomputes the
//! digest from the payload it is handed, so any change to the payload after
//! signing is detected.
//!
//! Key material travels as URL-safe base64 without padding: the public key
//! is the raw 32-byte Ed25519 point, the private key is a PKCS#8 DER
//! document.

use std::fmt;

use base64::{
    alphabet,
    engine::{general_purpose, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use chrono::{DateTime, Utc};
use ed25519_dalek::{
    pkcs8::{DecodePrivateKey, EncodePrivateKey},
    Signature, Signer, SigningKey, Verifier, VerifyingKey,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use attesta_contracts::{
    error::{AttestaError, AttestaResult},
    timestamp,
};

use crate::canonical::digest;

/// The only supported signature algorithm identifier.
pub const ED25519: &str = "ED25519";

/// Accepts base64url with or without trailing padding.
const B64URL_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

fn encode_b64url(bytes: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn decode_b64url(input: &str) -> Option<Vec<u8>> {
    B64URL_LENIENT.decode(input).ok()
}

/// An exportable signing identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    pub alg: String,
    /// base64url of the raw 32-byte public key.
    pub public_key: String,
    /// base64url of the PKCS#8 DER private key.
    pub private_key: String,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("alg", &self.alg)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl KeyPair {
    /// Generate a fresh Ed25519 key pair from the OS RNG.
    pub fn generate() -> AttestaResult<Self> {
        Self::from_signing_key(&SigningKey::generate(&mut OsRng))
    }

    /// Export an existing signing key.
    pub fn from_signing_key(key: &SigningKey) -> AttestaResult<Self> {
        let der = key.to_pkcs8_der().map_err(|e| AttestaError::InvalidKey {
            reason: format!("failed to encode PKCS#8 private key: {e}"),
        })?;
        Ok(Self {
            alg: ED25519.to_string(),
            public_key: encode_b64url(key.verifying_key().as_bytes()),
            private_key: encode_b64url(der.as_bytes()),
        })
    }

    fn signing_key(&self) -> AttestaResult<SigningKey> {
        let der = decode_b64url(&self.private_key).ok_or_else(|| AttestaError::InvalidKey {
            reason: "private key is not valid base64url".to_string(),
        })?;
        let key = SigningKey::from_pkcs8_der(&der).map_err(|e| AttestaError::InvalidKey {
            reason: format!("private key is not a PKCS#8 Ed25519 key: {e}"),
        })?;

        if encode_b64url(key.verifying_key().as_bytes()) != self.public_key.trim_end_matches('=') {
            return Err(AttestaError::InvalidKey {
                reason: "public key does not belong to the private key".to_string(),
            });
        }
        Ok(key)
    }
}

/// A payload together with a detached signature over its canonical digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signed<T> {
    pub payload: T,
    pub signature: String,
    pub public_key: String,
    pub alg: String,
    #[serde(with = "attesta_contracts::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Sign `payload` with `keypair`.
///
/// # Errors
///
/// - `UnsupportedAlgorithm` if `keypair.alg` is not `ED25519`
/// - `UnsupportedValue` if the payload has no canonical form
/// - `InvalidKey` if the key material cannot be decoded
pub fn sign<T: Serialize>(payload: T, keypair: &KeyPair) -> AttestaResult<Signed<T>> {
    let signature = sign_detached(&payload, keypair)?;
    Ok(Signed {
        payload,
        signature,
        public_key: keypair.public_key.clone(),
        alg: ED25519.to_string(),
        created_at: timestamp::now(),
    })
}

/// Produce only the base64url signature over the digest of `payload`.
pub fn sign_detached<T: Serialize + ?Sized>(
    payload: &T,
    keypair: &KeyPair,
) -> AttestaResult<String> {
    if keypair.alg != ED25519 {
        return Err(AttestaError::UnsupportedAlgorithm { alg: keypair.alg.clone() });
    }
    let digest = digest(payload)?;
    let key = keypair.signing_key()?;
    Ok(encode_b64url(&key.sign(&digest).to_bytes()))
}

/// Check the signature of a signed envelope against its own payload.
///
/// Never fails: any structural or cryptographic problem yields `false`.
pub fn verify<T: Serialize>(signed: &Signed<T>) -> bool {
    verify_detached(&signed.payload, &signed.signature, &signed.public_key, &signed.alg)
}

/// Check a detached signature over the digest of `payload`.
pub fn verify_detached<T: Serialize + ?Sized>(
    payload: &T,
    signature: &str,
    public_key: &str,
    alg: &str,
) -> bool {
    if alg != ED25519 {
        debug!(alg = %alg, "signature rejected: unsupported algorithm");
        return false;
    }
    if signature.is_empty() || public_key.is_empty() {
        debug!("signature rejected: empty signature or public key");
        return false;
    }

    let digest = match digest(payload) {
        Ok(d) => d,
        Err(e) => {
            debug!(error = %e, "signature rejected: payload has no canonical form");
            return false;
        }
    };

    let Some(key) = decode_b64url(public_key)
        .and_then(|bytes| <[u8; 32]>::try_from(bytes.as_slice()).ok())
        .and_then(|bytes| VerifyingKey::from_bytes(&bytes).ok())
    else {
        debug!("signature rejected: malformed public key");
        return false;
    };

    let Some(sig) = decode_b64url(signature).and_then(|bytes| Signature::from_slice(&bytes).ok())
    else {
        debug!("signature rejected: malformed signature");
        return false;
    };

    key.verify(&digest, &sig).is_ok()
}
