// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token issuance.
//!
//! Tokens are HS256 JWTs signed with the configured signing key. They are
//! self-contained: nothing is stored, and every call mints a new token
//! (fresh `jti`) even for identical inputs.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::error;
use uuid::Uuid;

use super::claims::{TokenClaims, TokenEnvelope, TOKEN_TYPE};
use super::{AuthError, AuthenticationKind, ScopeRequest};
use crate::config::TokenConfig;

/// Clock skew tolerance when decoding (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Signing keys, or the reason there are none.
#[derive(Clone)]
enum Signer {
    Ready {
        encoding: EncodingKey,
        decoding: DecodingKey,
    },
    Misconfigured(String),
}

/// Mints signed bearer tokens.
///
/// A missing signing key does not stop the service from starting: every
/// issuance then fails with the same `TokenError`.
#[derive(Clone)]
pub struct TokenIssuer {
    application: String,
    expires_secs: u64,
    signer: Signer,
}

impl TokenIssuer {
    pub fn new(config: &TokenConfig, application: impl Into<String>) -> Self {
        let signer = if config.signing_key.is_empty() {
            Signer::Misconfigured("token signing key is not configured".to_string())
        } else {
            let key = config.signing_key.as_bytes();
            Signer::Ready {
                encoding: EncodingKey::from_secret(key),
                decoding: DecodingKey::from_secret(key),
            }
        };
        Self {
            application: application.into(),
            expires_secs: config.expires_secs(),
            signer,
        }
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn expires_secs(&self) -> u64 {
        self.expires_secs
    }

    /// Whether tokens can be issued at all.
    pub fn check_signer(&self) -> Result<(), AuthError> {
        match &self.signer {
            Signer::Ready { .. } => Ok(()),
            Signer::Misconfigured(reason) => Err(AuthError::signer_misconfigured(reason.clone())),
        }
    }

    /// Issue a token for `subject` with `scope`.
    ///
    /// `kind` defaults to `client_credentials`.
    pub fn issue(
        &self,
        subject: &str,
        scope: &ScopeRequest,
        kind: Option<AuthenticationKind>,
    ) -> Result<TokenEnvelope, AuthError> {
        let encoding = match &self.signer {
            Signer::Ready { encoding, .. } => encoding,
            Signer::Misconfigured(reason) => {
                error!(alert = true, reason = %reason, "token signer misconfigured");
                return Err(AuthError::signer_misconfigured(reason.clone()));
            }
        };

        let now = Utc::now().timestamp();
        let lifetime = i64::try_from(self.expires_secs)
            .map_err(|_| AuthError::signer_misconfigured("token lifetime out of range"))?;
        let claims = TokenClaims {
            sub: subject.to_string(),
            scope: scope.to_string(),
            kind: kind.unwrap_or_default(),
            application: self.application.clone(),
            iat: now,
            exp: now.saturating_add(lifetime),
            jti: Uuid::new_v4().to_string(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, encoding)
            .map_err(|e| AuthError::token(e.to_string()))?;

        Ok(TokenEnvelope {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            scope: claims.scope,
            expires_at: self.expires_secs,
        })
    }

    /// Verify a token issued by this service and return its claims.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let decoding = match &self.signer {
            Signer::Ready { decoding, .. } => decoding,
            Signer::Misconfigured(reason) => {
                return Err(AuthError::signer_misconfigured(reason.clone()))
            }
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_aud = false;

        decode::<TokenClaims>(token, decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::token(e.to_string()))
    }
}
