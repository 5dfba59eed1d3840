// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password verification against the Kerberos realm.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{bounded, CredentialVerifier, Verified};
use crate::auth::realm::RealmClient;
use crate::auth::{AuthError, AuthenticationKind, ScopeRequest, Subject};

/// Username/password pair with the scope to grant.
pub struct PasswordInput {
    pub username: String,
    pub password: String,
    pub scope: ScopeRequest,
}

impl std::fmt::Debug for PasswordInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordInput")
            .field("username", &self.username)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Verifies a password by logging in to the realm.
///
/// Every realm failure (bad config, wrong password, network) is reported
/// as the same `CredentialsError`; the reason is only logged.
#[derive(Clone)]
pub struct PasswordVerifier {
    realm: Arc<dyn RealmClient>,
    timeout: Duration,
}

impl PasswordVerifier {
    pub fn new(realm: Arc<dyn RealmClient>, timeout: Duration) -> Self {
        Self { realm, timeout }
    }
}

#[async_trait]
impl CredentialVerifier for PasswordVerifier {
    type Input = PasswordInput;

    async fn verify(&self, input: PasswordInput) -> Result<Verified, AuthError> {
        if input.username.is_empty() || input.password.is_empty() {
            warn!(scope = %input.scope, "password login without user or password");
            return Err(AuthError::credentials(
                "user/password is empty",
                "missing username or password",
            ));
        }

        let login = bounded(
            self.timeout,
            "realm login",
            self.realm.login(&input.username, &input.password),
        )
        .await?;

        match login {
            Ok(principal) => {
                info!(
                    user = %input.username,
                    scope = %input.scope,
                    principal = %principal.principal,
                    "password login succeeded"
                );
                Ok(Verified {
                    subject: Subject::new(input.username, AuthenticationKind::Kerberos),
                    scope: input.scope,
                })
            }
            Err(e) => {
                warn!(user = %input.username, scope = %input.scope, error = %e, "password login failed");
                Err(AuthError::credentials("wrong user credentials", e.to_string()))
            }
        }
    }
}
