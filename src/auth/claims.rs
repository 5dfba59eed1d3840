// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the wire-level token envelope.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::subject::AuthenticationKind;

/// Bearer token type echoed in every envelope.
pub const TOKEN_TYPE: &str = "Bearer";

/// Claims signed into every issued token.
///
/// Built once per issuance and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenClaims {
    /// Subject (username)
    pub sub: String,
    /// Granted scope, verbatim as requested
    pub scope: String,
    /// How the subject authenticated
    pub kind: AuthenticationKind,
    /// Issuing service
    pub application: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
    /// Unique token ID
    pub jti: String,
}

impl TokenClaims {
    /// Lifetime the claims were issued with.
    pub fn lifetime_secs(&self) -> i64 {
        self.exp - self.iat
    }
}

/// Token response returned by every successful entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenEnvelope {
    pub access_token: String,
    /// Always `Bearer`
    pub token_type: String,
    pub scope: String,
    /// Token lifetime in seconds
    pub expires_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> TokenClaims {
        TokenClaims {
            sub: "alice".to_string(),
            scope: "read".to_string(),
            kind: AuthenticationKind::Kerberos,
            application: "Authz".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_007_200,
            jti: "5d1c".to_string(),
        }
    }

    #[test]
    fn claims_serialize_kind_as_claim_value() {
        let json = serde_json::to_value(sample_claims()).unwrap();
        assert_eq!(json["kind"], "kerberos");
        assert_eq!(json["sub"], "alice");
    }

    #[test]
    fn lifetime_is_exp_minus_iat() {
        assert_eq!(sample_claims().lifetime_secs(), 7200);
    }

    #[test]
    fn envelope_wire_shape() {
        let envelope = TokenEnvelope {
            access_token: "abc".to_string(),
            token_type: TOKEN_TYPE.to_string(),
            scope: "read".to_string(),
            expires_at: 7200,
        };
        let json = serde_json::to_value(envelope).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "access_token": "abc",
                "token_type": "Bearer",
                "scope": "read",
                "expires_at": 7200
            })
        );
    }
}
