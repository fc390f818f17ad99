//! Intents: what an issuer wants done, and under which constraints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use attesta_contracts::error::{require_non_empty, AttestaResult};
use attesta_crypto::{sign, verify, KeyPair, Signed};

use crate::traits::IntentVerifier;

pub const DEFAULT_SCOPE: &str = "local";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub issuer: String,
    pub purpose: String,
    pub scope: String,
    #[serde(default)]
    pub constraints: Map<String, Value>,
    #[serde(with = "attesta_contracts::timestamp")]
    pub issued_at: DateTime<Utc>,
}

pub type SignedIntent = Signed<Intent>;

impl Intent {
    /// # Errors
    ///
    /// `MissingField` for an empty issuer or purpose.
    pub fn new(issuer: &str, purpose: &str, issued_at: DateTime<Utc>) -> AttestaResult<Self> {
        require_non_empty("issuer", issuer)?;
        require_non_empty("purpose", purpose)?;
        Ok(Self {
            issuer: issuer.to_string(),
            purpose: purpose.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            constraints: Map::new(),
            issued_at,
        })
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_constraint(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints.insert(key.into(), value.into());
        self
    }

    /// Numeric `maxCost` constraint, if declared.
    pub fn max_cost(&self) -> Option<f64> {
        self.constraints.get("maxCost").and_then(Value::as_f64)
    }
}

pub fn sign_intent(intent: Intent, keypair: &KeyPair) -> AttestaResult<SignedIntent> {
    sign(intent, keypair)
}

pub fn verify_signed_intent(signed_intent: &SignedIntent) -> bool {
    verify(signed_intent)
}

/// Accepts an intent iff its signature verifies.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignatureIntentVerifier;

impl IntentVerifier for SignatureIntentVerifier {
    fn verify_signed_intent(&self, signed_intent: &SignedIntent) -> bool {
        verify_signed_intent(signed_intent)
    }
}
