// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Kerberos ticket verification for CLI clients.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::{bounded, CredentialVerifier, Verified};
use crate::auth::realm::RealmClient;
use crate::auth::session::SessionSigner;
use crate::auth::{AuthError, AuthenticationKind, ScopeRequest, Subject};

/// `POST /oauth/authorize` body.
///
/// Keys are accepted capitalised (`User`, as CLI clients send them) or
/// lowercase.
#[derive(Deserialize, ToSchema)]
pub struct KerberosTicketRequest {
    #[serde(rename = "User", alias = "user")]
    pub user: String,
    #[serde(rename = "Scope", alias = "scope", default)]
    pub scope: String,
    /// Base64 credential cache
    #[serde(rename = "Ticket", alias = "ticket", default)]
    pub ticket: Option<String>,
}

impl std::fmt::Debug for KerberosTicketRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KerberosTicketRequest")
            .field("user", &self.user)
            .field("scope", &self.scope)
            .field("ticket", &self.ticket.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Claimed identity plus its proof.
pub struct TicketInput {
    pub request: KerberosTicketRequest,
    /// `auth-session` cookie value, if the caller sent one
    pub session: Option<String>,
}

/// Verifies a previously issued Kerberos credential cache, or a signed
/// session cookie when no ticket is supplied.
///
/// The proven principal must be the claimed user.
#[derive(Clone)]
pub struct TicketVerifier {
    realm: Arc<dyn RealmClient>,
    sessions: SessionSigner,
    timeout: Duration,
}

impl TicketVerifier {
    pub fn new(realm: Arc<dyn RealmClient>, sessions: SessionSigner, timeout: Duration) -> Self {
        Self {
            realm,
            sessions,
            timeout,
        }
    }

    async fn ticket_user(&self, encoded: &str) -> Result<String, AuthError> {
        let ticket = Base64::decode_vec(encoded.trim())
            .map_err(|e| AuthError::credentials("wrong user credentials", format!("ticket is not base64: {e}")))?;

        let principal = bounded(self.timeout, "ticket validation", self.realm.inspect_ticket(&ticket))
            .await?
            .map_err(|e| AuthError::credentials("wrong user credentials", e.to_string()))?;

        if principal.expired {
            return Err(AuthError::credentials(
                "expired kerberos ticket",
                format!("ticket for {} has expired", principal.principal),
            ));
        }
        Ok(principal.user_name().to_string())
    }

    fn session_user(&self, cookie: &str) -> Result<String, AuthError> {
        self.sessions
            .verify(cookie)
            .map_err(|e| AuthError::credentials("wrong user credentials", e.to_string()))
    }
}

#[async_trait]
impl CredentialVerifier for TicketVerifier {
    type Input = TicketInput;

    async fn verify(&self, input: TicketInput) -> Result<Verified, AuthError> {
        let TicketInput { request, session } = input;
        let scope = ScopeRequest::parse(request.scope);

        let proven = match (request.ticket.as_deref(), session.as_deref()) {
            (Some(ticket), _) => self.ticket_user(ticket).await,
            (None, Some(cookie)) => self.session_user(cookie),
            (None, None) => Err(AuthError::credentials(
                "missing kerberos credentials",
                "neither ticket nor session supplied",
            )),
        };

        let result = proven.and_then(|proven| {
            if proven == request.user {
                Ok(proven)
            } else {
                Err(AuthError::credentials(
                    "user credentials error",
                    format!("credentials belong to {proven}"),
                ))
            }
        });

        match result {
            Ok(user) => {
                info!(user = %user, scope = %scope, "kerberos credentials accepted");
                Ok(Verified {
                    subject: Subject::new(user, AuthenticationKind::Kerberos),
                    scope,
                })
            }
            Err(e) => {
                warn!(user = %request.user, scope = %scope, error = %e, "kerberos credentials rejected");
                Err(e)
            }
        }
    }
}
