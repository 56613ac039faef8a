// Copyright (c) 2026 Shelterbyte Engineering
// SPDX-License-Identifier: AGPL-3.0

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::domain::identity::Identity;

/// Credential verification failures.
///
/// Resolution is fail-open, so these never reach API clients; they are
/// logged at debug level and the request proceeds unauthenticated.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Credential expired")]
    Expired,

    #[error("Credential rejected: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

/// Verifier and signer for HS256 auth credentials.
///
/// The secret is symmetric, so the same component holds both key halves:
/// `verify` for request resolution and `sign` for minting tokens from the
/// CLI. Validation requires an `exp` claim, applies the default 60s
/// clock-skew leeway, and pins no audience.
pub struct AuthTokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthTokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // No audience is pinned; left at its default, the audience check
        // rejects any token whose extra claims carry `aud`.
        validation.validate_aud = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Decode and validate a credential, returning its claims
    pub fn verify(&self, token: &str) -> Result<Identity, CredentialError> {
        let token_data = decode::<Identity>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Sign claims into a compact credential
    pub fn sign(&self, identity: &Identity) -> Result<String, CredentialError> {
        let token = encode(&Header::new(Algorithm::HS256), identity, &self.encoding_key)?;
        Ok(token)
    }
}

impl From<jsonwebtoken::errors::Error> for CredentialError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => CredentialError::Expired,
            _ => CredentialError::Invalid(err),
        }
    }
}
