// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gateway orchestrator.
//!
//! Every entry point runs the same pipeline, terminal on the first failure:
//!
//! ```text
//! Received -> Verifying -> Authorizing -> Issuing -> Issued
//!                  \___________\______________\____-> Failed(kind)
//! ```
//!
//! The orchestrator never retries. Each failure is logged in full with the
//! stage it happened in; the caller only sees the sanitized message.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::auth::crypto::SecretBox;
use crate::auth::verifier::{
    ClientCredentialsInput, ClientCredentialsVerifier, PasswordInput, PasswordVerifier,
    TicketInput, TicketVerifier, TrustedClientInput, TrustedClientVerifier,
};
use crate::auth::{
    AuthError, CredentialVerifier, KinitRealm, RealmClient, ScopePolicy, ScopeRequest,
    SessionSigner, TokenClaims, TokenEnvelope, TokenIssuer, TrustedClientRegistry, Verified,
};
use crate::config::GatewayConfig;
use crate::directory::{GroupDirectoryCache, LdapDirectory};

/// Position of a request in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Verifying,
    Authorizing,
    Issuing,
    Issued,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Verifying => "verifying",
            Stage::Authorizing => "authorizing",
            Stage::Issuing => "issuing",
            Stage::Issued => "issued",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful `/kauth` login.
#[derive(Debug, Clone)]
pub struct PasswordLogin {
    pub envelope: TokenEnvelope,
    pub claims: TokenClaims,
    /// Signed `auth-session` value and its expiry, when a signing key exists
    pub session: Option<(String, DateTime<Utc>)>,
}

/// Entry points of the trust pipeline, one per route.
pub struct Gateway {
    client_credentials: ClientCredentialsVerifier,
    password: PasswordVerifier,
    ticket: TicketVerifier,
    trusted: TrustedClientVerifier,
    policy: ScopePolicy,
    issuer: TokenIssuer,
    sessions: SessionSigner,
}

impl Gateway {
    /// Assemble a gateway from explicit collaborators.
    pub fn new(
        realm: Arc<dyn RealmClient>,
        policy: ScopePolicy,
        trusted: TrustedClientVerifier,
        config: &GatewayConfig,
    ) -> Self {
        let timeout = config.kerberos.timeout();
        let sessions = SessionSigner::new(&config.token.signing_key);
        Self {
            client_credentials: ClientCredentialsVerifier::new(
                config.token.client_id.clone(),
                config.token.client_secret.clone(),
            ),
            password: PasswordVerifier::new(realm.clone(), timeout),
            ticket: TicketVerifier::new(realm, sessions.clone(), timeout),
            trusted,
            policy,
            issuer: TokenIssuer::new(&config.token, config.application.clone()),
            sessions,
        }
    }

    /// Build the production gateway: `kinit` realm, LDAP directory behind a
    /// TTL cache, shared-secret decryption.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let realm: Arc<dyn RealmClient> = Arc::new(KinitRealm::new(&config.kerberos));

        let policy = if config.ldap.enabled {
            let directory = Arc::new(LdapDirectory::new(&config.ldap));
            let cache = GroupDirectoryCache::new(
                directory,
                config.ldap.cache_capacity,
                config.ldap.cache_ttl(),
            );
            info!(url = %config.ldap.url, "LDAP scope enforcement enabled");
            ScopePolicy::enforced(Arc::new(cache), &config.ldap)
        } else {
            ScopePolicy::disabled()
        };

        let secret = match SecretBox::new(&config.encryption.secret) {
            Ok(secret) => Some(secret),
            Err(e) => {
                warn!(error = %e, "trusted client path disabled");
                None
            }
        };
        let trusted = TrustedClientVerifier::new(
            secret,
            TrustedClientRegistry::new(config.trusted_users.clone()),
        );

        let gateway = Self::new(realm, policy, trusted, config);
        if let Err(e) = gateway.issuer.check_signer() {
            error!(alert = true, error = %e, "token signer unusable, every issuance will fail");
        }
        gateway
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub fn sessions(&self) -> &SessionSigner {
        &self.sessions
    }

    /// `GET /oauth/token`
    pub async fn client_credentials(
        &self,
        input: ClientCredentialsInput,
    ) -> Result<TokenEnvelope, AuthError> {
        self.run("client_credentials", &self.client_credentials, input, true)
            .await
    }

    /// `POST /oauth/authorize`
    pub async fn kerberos(&self, input: TicketInput) -> Result<TokenEnvelope, AuthError> {
        self.run("kerberos", &self.ticket, input, true).await
    }

    /// `POST /oauth/trusted`
    pub async fn trusted(&self, input: TrustedClientInput) -> Result<TokenEnvelope, AuthError> {
        self.run("trusted_client", &self.trusted, input, false).await
    }

    /// `/kauth`: password login issuing a `read` token and a session cookie.
    pub async fn password_login(
        &self,
        username: String,
        password: String,
    ) -> Result<PasswordLogin, AuthError> {
        let input = PasswordInput {
            username,
            password,
            scope: ScopeRequest::parse(crate::auth::scope::READ),
        };
        let envelope = self.run("password", &self.password, input, false).await?;
        let claims = self.issuer.decode(&envelope.access_token)?;

        let session = match self.sessions.issue(&claims.sub) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(user = %claims.sub, error = %e, "session cookie not issued");
                None
            }
        };

        Ok(PasswordLogin {
            envelope,
            claims,
            session,
        })
    }

    async fn run<V: CredentialVerifier>(
        &self,
        path: &'static str,
        verifier: &V,
        input: V::Input,
        gated: bool,
    ) -> Result<TokenEnvelope, AuthError> {
        let mut stage = Stage::Received;
        debug!(path, %stage, "request received");

        let result = self.advance(&mut stage, verifier, input, gated).await;
        match &result {
            Ok(envelope) => {
                info!(path, %stage, scope = %envelope.scope, "token issued");
            }
            Err(e) if e.is_server_fault() => {
                error!(path, %stage, error_code = e.error_code(), error = %e, "request failed");
            }
            Err(e) => {
                warn!(path, %stage, error_code = e.error_code(), error = %e, "request failed");
            }
        }
        result
    }

    async fn advance<V: CredentialVerifier>(
        &self,
        stage: &mut Stage,
        verifier: &V,
        input: V::Input,
        gated: bool,
    ) -> Result<TokenEnvelope, AuthError> {
        *stage = Stage::Verifying;
        let Verified { subject, scope } = verifier.verify(input).await?;

        if gated && self.policy.is_enforced() {
            *stage = Stage::Authorizing;
            self.policy.authorize(&subject, &scope).await?;
        }

        *stage = Stage::Issuing;
        let envelope = self
            .issuer
            .issue(&subject.username, &scope, Some(subject.kind))?;

        *stage = Stage::Issued;
        Ok(envelope)
    }
}
