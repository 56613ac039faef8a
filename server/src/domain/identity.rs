// Copyright (c) 2026 Shelterbyte Engineering
// SPDX-License-Identifier: AGPL-3.0

//! Verified caller identity and the per-request auth context.
//!
//! ## Invariants
//!
//! - An [`AuthContext`] is attached to every request, authenticated or not.
//! - Resolution is fail-open: a missing or invalid credential leaves
//!   `identity` as `None` and the request proceeds anonymously. No request
//!   is ever rejected by credential handling.

use serde::{Deserialize, Serialize};

/// Claims carried by a verified credential.
///
/// `sub`, `iat` and `exp` are the registered claims this service relies on;
/// any further claims a token carries are preserved untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Subject identifier (user id or service account)
    pub sub: String,

    /// Issued-at, seconds since the Unix epoch
    pub iat: i64,

    /// Expiry, seconds since the Unix epoch
    pub exp: i64,

    /// Remaining claims, carried as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Identity {
    /// Claims for a token minted now, expiring after `ttl_secs`
    pub fn new(sub: impl Into<String>, ttl_secs: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: sub.into(),
            iat: now,
            exp: now + ttl_secs,
            extra: serde_json::Map::new(),
        }
    }
}

/// Authentication context resolved once per request
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub identity: Option<Identity>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_preserves_extra_claims() {
        let json = serde_json::json!({
            "sub": "alice",
            "iat": 1_700_000_000,
            "exp": 1_700_003_600,
            "role": "keeper",
            "shelter": "north",
        });
        let identity: Identity = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(identity.sub, "alice");
        assert_eq!(identity.extra["role"], "keeper");

        let back = serde_json::to_value(&identity).unwrap();
        assert_eq!(back, json);
    }

    #[test]
    fn test_new_sets_expiry_after_issue() {
        let identity = Identity::new("bob", 3600);
        assert_eq!(identity.exp - identity.iat, 3600);
        assert!(identity.extra.is_empty());
    }

    #[test]
    fn test_anonymous_context_has_no_identity() {
        assert!(AuthContext::anonymous().identity.is_none());
        assert!(AuthContext::default().identity.is_none());
    }
}
