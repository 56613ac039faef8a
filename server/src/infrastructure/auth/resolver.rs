// Copyright (c) 2026 Shelterbyte Engineering
// SPDX-License-Identifier: AGPL-3.0
//! # Auth Context Resolution
//!
//! Resolves the per-request auth context from two credential carriers: the
//! `Authorization: Bearer` header and the auth cookie (name configurable,
//! `authToken` by default).
//!
//! ## Invariants
//!
//! - Resolution is fail-open: an invalid, expired, or absent credential
//!   resolves to the anonymous context, never a 401
//! - The header outranks the cookie by presence, not by validity: any
//!   `Authorization` header, even garbage, suppresses cookie resolution
//!   entirely
//! - Only a cookie credential that verified is refreshed, and the refresh
//!   re-issues the same token with a fresh `Max-Age`

use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue};
use tracing::debug;

use crate::domain::identity::AuthContext;
use crate::infrastructure::auth::token::AuthTokenVerifier;

const BEARER_SCHEME: &str = "Bearer";

/// Outcome of resolving one request's credentials
#[derive(Debug, Clone)]
pub struct ResolvedAuth {
    pub context: AuthContext,
    /// `Set-Cookie` value re-issuing a verified cookie credential
    pub refreshed_cookie: Option<HeaderValue>,
}

impl ResolvedAuth {
    fn anonymous() -> Self {
        Self {
            context: AuthContext::anonymous(),
            refreshed_cookie: None,
        }
    }
}

/// Per-request credential resolver shared across handlers
#[derive(Clone)]
pub struct AuthResolver {
    verifier: Arc<AuthTokenVerifier>,
    cookie_name: String,
    cookie_max_age_secs: u64,
}

impl AuthResolver {
    pub fn new(verifier: Arc<AuthTokenVerifier>, cookie_name: &str, cookie_max_age_secs: u64) -> Self {
        Self {
            verifier,
            cookie_name: cookie_name.to_string(),
            cookie_max_age_secs,
        }
    }

    /// Resolve the auth context for one request's headers
    pub fn resolve(&self, headers: &HeaderMap) -> ResolvedAuth {
        if let Some(raw) = headers.get(header::AUTHORIZATION) {
            // Header presence claims the request outright; a bad value does
            // not fall back to the cookie.
            let identity = raw
                .to_str()
                .ok()
                .and_then(parse_bearer)
                .and_then(|token| match self.verifier.verify(token) {
                    Ok(identity) => Some(identity),
                    Err(e) => {
                        debug!(error = %e, "Invalid bearer credential; proceeding unauthenticated");
                        None
                    }
                });
            return ResolvedAuth {
                context: AuthContext { identity },
                refreshed_cookie: None,
            };
        }

        if let Some(token) = parse_cookie(headers, &self.cookie_name) {
            return match self.verifier.verify(token) {
                Ok(identity) => ResolvedAuth {
                    refreshed_cookie: self.refresh_cookie(token),
                    context: AuthContext::authenticated(identity),
                },
                Err(e) => {
                    debug!(error = %e, "Invalid auth cookie; proceeding unauthenticated");
                    ResolvedAuth::anonymous()
                }
            };
        }

        ResolvedAuth::anonymous()
    }

    fn refresh_cookie(&self, token: &str) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!(
            "{}={}; HttpOnly; Max-Age={}",
            self.cookie_name, token, self.cookie_max_age_secs
        ))
        .ok()
    }
}

/// Extract the token from a `Bearer <token>` header value.
///
/// The scheme match is case-sensitive and everything after the first space
/// is the candidate token.
fn parse_bearer(raw: &str) -> Option<&str> {
    let (scheme, token) = raw.split_once(' ')?;
    if scheme == BEARER_SCHEME && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Find the named cookie across every `Cookie` header on the request
fn parse_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    for value in headers.get_all(header::COOKIE) {
        let raw = match value.to_str() {
            Ok(raw) => raw,
            Err(_) => continue,
        };
        for pair in raw.split(';') {
            if let Some((key, token)) = pair.trim().split_once('=') {
                if key == name && !token.is_empty() {
                    return Some(token);
                }
            }
        }
    }
    None
}
