// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trusted-client verification.
//!
//! A registered host posts an encrypted assertion of who it is and which
//! addresses it owns. The assertion is trusted only when it decrypts with
//! the shared secret, names a registry entry on user, IP and MAC, and the
//! request came from the registered IP of a matching entry.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{CredentialVerifier, Verified};
use crate::auth::crypto::SecretBox;
use crate::auth::scope::TRUSTED_CLIENT_SCOPE;
use crate::auth::trusted::{
    is_loopback, same_ip, TrustedClientAssertion, TrustedClientRegistry,
};
use crate::auth::{AuthError, AuthenticationKind, ScopeRequest, Subject};

/// Raw request body and the caller's network address.
#[derive(Debug, Clone)]
pub struct TrustedClientInput {
    pub body: Vec<u8>,
    /// Source IP as seen by the HTTP layer
    pub client_ip: Option<String>,
}

#[derive(Clone)]
pub struct TrustedClientVerifier {
    secret: Option<SecretBox>,
    registry: TrustedClientRegistry,
}

impl TrustedClientVerifier {
    /// `secret` is `None` when no shared secret is configured; every
    /// assertion is then rejected.
    pub fn new(secret: Option<SecretBox>, registry: TrustedClientRegistry) -> Self {
        Self { secret, registry }
    }

    fn decrypt(&self, body: &[u8]) -> Result<TrustedClientAssertion, AuthError> {
        let secret = self.secret.as_ref().ok_or_else(|| {
            AuthError::credentials(
                "unable to decrypt trusted client payload",
                "no shared secret configured",
            )
        })?;
        let plaintext = secret.open(body).map_err(|e| {
            AuthError::credentials("unable to decrypt trusted client payload", e.to_string())
        })?;
        TrustedClientAssertion::from_json(&plaintext).map_err(|e| AuthError::Unmarshal(e.to_string()))
    }

    /// The request must come from the IP of a registry entry that matched
    /// the assertion. Other IPs listed in the assertion do not count.
    fn check_source(
        &self,
        assertion: &TrustedClientAssertion,
        client_ip: Option<&str>,
    ) -> Result<(), AuthError> {
        let Some(client_ip) = client_ip else {
            return Err(AuthError::credentials(
                "client IP does not match with HTTP one",
                "request carries no source address",
            ));
        };
        if is_loopback(client_ip) {
            debug!(user = %assertion.user, "loopback caller, skipping source check");
            return Ok(());
        }
        if self
            .registry
            .matching(assertion)
            .any(|entry| same_ip(&entry.ip, client_ip))
        {
            Ok(())
        } else {
            Err(AuthError::credentials(
                "client IP does not match with HTTP one",
                format!("request from {client_ip}"),
            ))
        }
    }
}

#[async_trait]
impl CredentialVerifier for TrustedClientVerifier {
    type Input = TrustedClientInput;

    async fn verify(&self, input: TrustedClientInput) -> Result<Verified, AuthError> {
        let assertion = match self.decrypt(&input.body) {
            Ok(assertion) => assertion,
            Err(e) => {
                warn!(client_ip = ?input.client_ip, error = %e, "trusted client payload rejected");
                return Err(e);
            }
        };

        if self.registry.matching(&assertion).next().is_none() {
            warn!(user = %assertion.user, client_ip = ?input.client_ip, "user not in trusted registry");
            return Err(AuthError::credentials(
                "user not found in trusted list",
                format!("no registry entry for {}", assertion.user),
            ));
        }

        if let Err(e) = self.check_source(&assertion, input.client_ip.as_deref()) {
            warn!(user = %assertion.user, error = %e, "trusted client source mismatch");
            return Err(e);
        }

        let scope = ScopeRequest::parse(TRUSTED_CLIENT_SCOPE);
        info!(user = %assertion.user, scope = %scope, "trusted client accepted");
        Ok(Verified {
            subject: Subject::new(assertion.user, AuthenticationKind::TrustedClient),
            scope,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::trusted::TrustedClientRegistryEntry;

    const SECRET: &str = "shared-secret";

    fn verifier() -> TrustedClientVerifier {
        TrustedClientVerifier::new(
            Some(SecretBox::new(SECRET).unwrap()),
            TrustedClientRegistry::new(vec![TrustedClientRegistryEntry {
                user: "carol".to_string(),
                ip: "10.0.0.5".to_string(),
                mac: "aa:bb:cc:dd:ee:ff".to_string(),
            }]),
        )
    }

    fn sealed(json: &str) -> Vec<u8> {
        SecretBox::new(SECRET)
            .unwrap()
            .seal(json.as_bytes())
            .unwrap()
            .into_bytes()
    }

    fn input(json: &str, ip: &str) -> TrustedClientInput {
        TrustedClientInput {
            body: sealed(json),
            client_ip: Some(ip.to_string()),
        }
    }

    const CAROL: &str = r#"{"User":"carol","IPs":["10.0.0.5"],"MACs":["AA-BB-CC-DD-EE-FF"]}"#;

    #[tokio::test]
    async fn registered_host_gets_elevated_scope() {
        let verified = verifier().verify(input(CAROL, "10.0.0.5")).await.unwrap();
        assert_eq!(
            verified.subject,
            Subject::new("carol", AuthenticationKind::TrustedClient)
        );
        assert_eq!(verified.scope.as_str(), "read+write");
    }

    #[tokio::test]
    async fn loopback_is_exempt_from_source_check() {
        assert!(verifier().verify(input(CAROL, "127.0.0.1")).await.is_ok());
        assert!(verifier().verify(input(CAROL, "::1")).await.is_ok());
    }

    #[tokio::test]
    async fn foreign_source_is_rejected() {
        let err = verifier().verify(input(CAROL, "10.0.0.9")).await.unwrap_err();
        assert_eq!(err.message(), "client IP does not match with HTTP one");
    }

    #[tokio::test]
    async fn extra_asserted_ip_is_not_a_valid_source() {
        let json = r#"{"User":"carol","IPs":["10.0.0.5","203.0.113.7"],"MACs":["aa:bb:cc:dd:ee:ff"]}"#;
        let err = verifier().verify(input(json, "203.0.113.7")).await.unwrap_err();
        assert_eq!(err.message(), "client IP does not match with HTTP one");
        assert!(verifier().verify(input(json, "10.0.0.5")).await.is_ok());
    }

    #[tokio::test]
    async fn unregistered_mac_is_rejected() {
        let json = r#"{"User":"carol","IPs":["10.0.0.5"],"MACs":["00:11:22:33:44:55"]}"#;
        let err = verifier().verify(input(json, "10.0.0.5")).await.unwrap_err();
        assert_eq!(err.message(), "user not found in trusted list");
    }

    #[tokio::test]
    async fn wrong_secret_never_yields_an_assertion() {
        let other = SecretBox::new("other-secret").unwrap();
        let body = other.seal(CAROL.as_bytes()).unwrap().into_bytes();
        let err = verifier()
            .verify(TrustedClientInput {
                body,
                client_ip: Some("10.0.0.5".to_string()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.message(), "unable to decrypt trusted client payload");
    }

    #[tokio::test]
    async fn decrypted_garbage_is_unmarshal_error() {
        let err = verifier().verify(input("not json", "10.0.0.5")).await.unwrap_err();
        assert_eq!(err.error_code(), "unmarshal_error");
    }

    #[tokio::test]
    async fn missing_secret_rejects_everything() {
        let v = TrustedClientVerifier::new(None, TrustedClientRegistry::default());
        assert!(v.verify(input(CAROL, "10.0.0.5")).await.is_err());
    }
}
