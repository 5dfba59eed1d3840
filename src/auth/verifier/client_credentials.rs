// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client-credentials grant for already-trusted services.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{info, warn};
use utoipa::IntoParams;

use super::{CredentialVerifier, Verified};
use crate::auth::{AuthError, AuthenticationKind, ScopeRequest, Subject};

/// `GET /oauth/token` query.
#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClientCredentialsInput {
    /// Subject to issue the token for
    #[serde(default)]
    pub user: String,
    /// Requested scope, e.g. `read` or `read+write`
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
}

impl std::fmt::Debug for ClientCredentialsInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialsInput")
            .field("user", &self.user)
            .field("scope", &self.scope)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

type HmacSha256 = Hmac<Sha256>;

/// Compare a presented credential with the configured one without leaking
/// where they differ or how long the configured one is.
fn same_credential(configured: &str, presented: &str) -> bool {
    let tag = |value: &str| {
        HmacSha256::new_from_slice(b"client-credentials").map(|mut mac| {
            mac.update(value.as_bytes());
            mac
        })
    };
    match (tag(configured), tag(presented)) {
        (Ok(configured), Ok(presented)) => presented
            .verify_slice(&configured.finalize().into_bytes())
            .is_ok(),
        _ => false,
    }
}

/// Trusts the caller's claimed user on configuration alone.
///
/// The path is open only when a client pair is configured; a caller that
/// presents a pair must present the configured one.
#[derive(Clone)]
pub struct ClientCredentialsVerifier {
    client_id: String,
    client_secret: String,
}

impl ClientCredentialsVerifier {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    fn check_pair(&self, input: &ClientCredentialsInput) -> Result<(), AuthError> {
        if !self.is_configured() {
            return Err(AuthError::credentials(
                "client credentials are not accepted",
                "no client id/secret configured",
            ));
        }
        if let Some(id) = &input.client_id {
            if !same_credential(&self.client_id, id) {
                return Err(AuthError::credentials(
                    "wrong client credentials",
                    format!("unknown client id {id}"),
                ));
            }
        }
        if let Some(secret) = &input.client_secret {
            if !same_credential(&self.client_secret, secret) {
                return Err(AuthError::credentials(
                    "wrong client credentials",
                    "client secret mismatch",
                ));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialVerifier for ClientCredentialsVerifier {
    type Input = ClientCredentialsInput;

    async fn verify(&self, input: ClientCredentialsInput) -> Result<Verified, AuthError> {
        let scope = ScopeRequest::parse(input.scope.as_str());

        if input.user.is_empty() {
            warn!(scope = %scope, "client credentials without user");
            return Err(AuthError::credentials("user is empty", "missing user parameter"));
        }
        if let Err(e) = self.check_pair(&input) {
            warn!(user = %input.user, scope = %scope, error = %e, "client credentials rejected");
            return Err(e);
        }

        info!(user = %input.user, scope = %scope, "client credentials accepted");
        Ok(Verified {
            subject: Subject::new(input.user, AuthenticationKind::ClientCredentials),
            scope,
        })
    }
}
