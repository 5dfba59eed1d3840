// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential verifiers, one per trust path.
//!
//! | Verifier | Proof | Kind |
//! |----------|-------|------|
//! | [`PasswordVerifier`] | realm password login | `kerberos` |
//! | [`TicketVerifier`] | credential cache or signed session | `kerberos` |
//! | [`TrustedClientVerifier`] | encrypted host assertion | `trusted_client` |
//! | [`ClientCredentialsVerifier`] | configured client pair | `client_credentials` |
//!
//! Each turns untrusted input into a [`Verified`] subject and scope, or an
//! [`AuthError`]. Verifiers log every attempt with user and scope; they
//! never log passwords, tickets or payloads.

pub mod client_credentials;
pub mod password;
pub mod ticket;
pub mod trusted_client;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use super::{AuthError, ScopeRequest, Subject};

pub use client_credentials::{ClientCredentialsInput, ClientCredentialsVerifier};
pub use password::{PasswordInput, PasswordVerifier};
pub use ticket::{KerberosTicketRequest, TicketInput, TicketVerifier};
pub use trusted_client::{TrustedClientInput, TrustedClientVerifier};

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    pub subject: Subject,
    pub scope: ScopeRequest,
}

/// Turns raw request input into a verified subject.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Raw input this verifier consumes.
    type Input: Send;

    async fn verify(&self, input: Self::Input) -> Result<Verified, AuthError>;
}

/// Run an external call under a deadline.
pub(crate) async fn bounded<T>(
    deadline: Duration,
    operation: &'static str,
    call: impl Future<Output = T>,
) -> Result<T, AuthError> {
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| AuthError::Timeout { operation })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::auth::realm::{RealmClient, RealmError, RealmPrincipal};

    /// Realm with fixed passwords and tickets.
    #[derive(Default)]
    pub(crate) struct FakeRealm {
        pub passwords: HashMap<String, String>,
        /// ticket bytes -> (principal, expired)
        pub tickets: HashMap<Vec<u8>, (String, bool)>,
        pub delay: Option<Duration>,
    }

    impl FakeRealm {
        pub(crate) fn with_password(mut self, user: &str, password: &str) -> Self {
            self.passwords.insert(user.to_string(), password.to_string());
            self
        }

        pub(crate) fn with_ticket(mut self, ticket: &[u8], principal: &str, expired: bool) -> Self {
            self.tickets
                .insert(ticket.to_vec(), (principal.to_string(), expired));
            self
        }

        pub(crate) fn slow(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait]
    impl RealmClient for FakeRealm {
        async fn login(&self, user: &str, password: &str) -> Result<RealmPrincipal, RealmError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.passwords.get(user) {
                Some(expected) if expected == password => Ok(RealmPrincipal {
                    principal: format!("{user}@EXAMPLE.ORG"),
                    expired: false,
                }),
                _ => Err(RealmError::Rejected("Password incorrect".to_string())),
            }
        }

        async fn inspect_ticket(&self, ticket: &[u8]) -> Result<RealmPrincipal, RealmError> {
            self.tickets
                .get(ticket)
                .map(|(principal, expired)| RealmPrincipal {
                    principal: principal.clone(),
                    expired: *expired,
                })
                .ok_or_else(|| RealmError::InvalidTicket("unknown cache".to_string()))
        }
    }
}
