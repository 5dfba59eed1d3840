// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated subject representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// How a subject proved its identity.
///
/// The serialized form is the `kind` claim embedded in issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationKind {
    /// Username/password checked against the realm
    PasswordCredentials,
    /// Kerberos password or ticket
    Kerberos,
    /// Pre-registered host with an encrypted assertion
    TrustedClient,
    /// Machine-to-machine grant trusted by configuration
    ClientCredentials,
}

impl AuthenticationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthenticationKind::PasswordCredentials => "password_credentials",
            AuthenticationKind::Kerberos => "kerberos",
            AuthenticationKind::TrustedClient => "trusted_client",
            AuthenticationKind::ClientCredentials => "client_credentials",
        }
    }

    /// Parse the claim value (case-insensitive).
    pub fn from_str(s: &str) -> Option<AuthenticationKind> {
        match s.to_lowercase().as_str() {
            "password_credentials" => Some(AuthenticationKind::PasswordCredentials),
            "kerberos" => Some(AuthenticationKind::Kerberos),
            "trusted_client" => Some(AuthenticationKind::TrustedClient),
            "client_credentials" => Some(AuthenticationKind::ClientCredentials),
            _ => None,
        }
    }
}

impl Default for AuthenticationKind {
    /// Tokens minted without an explicit kind are client-credentials tokens.
    fn default() -> Self {
        AuthenticationKind::ClientCredentials
    }
}

impl std::fmt::Display for AuthenticationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity established by a credential verifier.
///
/// Lives for a single request and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub username: String,
    pub kind: AuthenticationKind,
}

impl Subject {
    pub fn new(username: impl Into<String>, kind: AuthenticationKind) -> Self {
        Self {
            username: username.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_claim_value() {
        for kind in [
            AuthenticationKind::PasswordCredentials,
            AuthenticationKind::Kerberos,
            AuthenticationKind::TrustedClient,
            AuthenticationKind::ClientCredentials,
        ] {
            assert_eq!(AuthenticationKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(AuthenticationKind::from_str("KERBEROS"), Some(AuthenticationKind::Kerberos));
        assert_eq!(AuthenticationKind::from_str("oauth"), None);
    }

    #[test]
    fn default_kind_is_client_credentials() {
        assert_eq!(AuthenticationKind::default(), AuthenticationKind::ClientCredentials);
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&AuthenticationKind::TrustedClient).unwrap();
        assert_eq!(json, r#""trusted_client""#);
    }
}
