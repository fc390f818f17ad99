//! Trust policy configuration.
//!
//! A `TrustPolicy` is plain data: every check is optional and only applies
//! when its field is set.  Policies are usually loaded from TOML:
//!
//! ```toml
//! name = "two-hospitals"
//! min_signatures = 2
//! allow_algorithms = ["ED25519"]
//! allow_public_keys = ["3nq1...", "Qm9v..."]
//! require_window_start_after = "2025-01-01T00:00:00Z"
//! max_window_seconds = 86400
//! ```
//!
//! Policies also serialize, because acceptance receipts bind the policy
//! by its content hash.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use attesta_contracts::{
    error::{AttestaError, AttestaResult},
    timestamp,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrustPolicy {
    /// Human-readable label, recorded in acceptance receipts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Minimum number of signature entries.  Defaults to 1 whenever the
    /// subject carries signatures or any signature rule is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_signatures: Option<usize>,

    /// Every entry's `alg` must be listed.  Empty means unrestricted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_algorithms: Vec<String>,

    /// Every entry's public key must be listed.  Empty means unrestricted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_public_keys: Vec<String>,

    /// Exact aggregation level for hierarchical subjects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_level: Option<u32>,

    /// RFC 3339 instant the window must not start before.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_window_start_after: Option<String>,

    /// RFC 3339 instant the window must not end after.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_window_end_before: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_window_seconds: Option<u64>,
}

impl TrustPolicy {
    /// Parse and validate a policy document.
    ///
    /// Returns `AttestaError::ConfigError` if the TOML is malformed, has
    /// unknown keys, or carries an unparsable window bound.
    pub fn from_toml_str(s: &str) -> AttestaResult<Self> {
        let policy: TrustPolicy = toml::from_str(s).map_err(|e| AttestaError::ConfigError {
            reason: format!("failed to parse trust policy TOML: {e}"),
        })?;
        policy.validate()?;
        Ok(policy)
    }

    /// Read the file at `path` and parse it with [`TrustPolicy::from_toml_str`].
    pub fn from_file(path: &Path) -> AttestaResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| AttestaError::ConfigError {
            reason: format!("failed to read trust policy '{}': {e}", path.display()),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Check that configured window bounds parse as instants.
    pub fn validate(&self) -> AttestaResult<()> {
        for (field, raw) in [
            ("require_window_start_after", &self.require_window_start_after),
            ("require_window_end_before", &self.require_window_end_before),
        ] {
            if let Some(raw) = raw {
                if timestamp::parse(raw).is_none() {
                    return Err(AttestaError::ConfigError {
                        reason: format!("{field} '{raw}' is not a valid RFC 3339 instant"),
                    });
                }
            }
        }
        Ok(())
    }

    /// `name`, or `"unnamed"` when the policy has none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    /// True if any rule constrains signature entries.
    pub fn has_signature_rules(&self) -> bool {
        self.min_signatures.is_some()
            || !self.allow_algorithms.is_empty()
            || !self.allow_public_keys.is_empty()
    }

    pub fn has_window_rules(&self) -> bool {
        self.require_window_start_after.is_some()
            || self.require_window_end_before.is_some()
            || self.max_window_seconds.is_some()
    }

    pub(crate) fn window_start_after(&self) -> Option<Option<DateTime<Utc>>> {
        self.require_window_start_after.as_deref().map(timestamp::parse)
    }

    pub(crate) fn window_end_before(&self) -> Option<Option<DateTime<Utc>>> {
        self.require_window_end_before.as_deref().map(timestamp::parse)
    }
}
