// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::http::StatusCode;

/// Authentication error type.
///
/// Every failure in the verify/authorize/issue pipeline ends up here.
/// `Display` carries the full detail for server-side logs; callers only ever
/// see [`AuthError::message`].
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Request body could not be read
    #[error("unable to read request body: {0}")]
    Reader(String),
    /// Request payload is not valid JSON/form data
    #[error("unable to decode request payload: {0}")]
    Unmarshal(String),
    /// Identity proof rejected
    #[error("{public}: {detail}")]
    Credentials {
        /// Fixed caller-facing message
        public: &'static str,
        /// Underlying reason, logged only
        detail: String,
    },
    /// Directory lookup failed (user not found or directory unreachable)
    #[error("no LDAP entry for user {user} with scope {scope}: {detail}")]
    LdapSearch {
        user: String,
        scope: String,
        detail: String,
    },
    /// User found but lacks the required group
    #[error("user {user} with scope {scope} is not allowed, missing group {group}")]
    LdapGroup {
        user: String,
        scope: String,
        group: String,
    },
    /// Token issuance failed
    #[error("token issuance failed: {detail}")]
    Token {
        detail: String,
        /// Signer is unusable; every following issuance fails the same way
        misconfigured: bool,
    },
    /// Realm login or directory search exceeded its deadline
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },
}

impl AuthError {
    /// Identity proof rejected with a fixed public message.
    pub fn credentials(public: &'static str, detail: impl Into<String>) -> Self {
        AuthError::Credentials {
            public,
            detail: detail.into(),
        }
    }

    pub fn token(detail: impl Into<String>) -> Self {
        AuthError::Token {
            detail: detail.into(),
            misconfigured: false,
        }
    }

    pub fn signer_misconfigured(detail: impl Into<String>) -> Self {
        AuthError::Token {
            detail: detail.into(),
            misconfigured: true,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Reader(_) => "reader_error",
            AuthError::Unmarshal(_) => "unmarshal_error",
            AuthError::Credentials { .. } => "credentials_error",
            AuthError::LdapSearch { .. } => "ldap_search_error",
            AuthError::LdapGroup { .. } => "ldap_group_error",
            AuthError::Token { .. } => "token_error",
            AuthError::Timeout { .. } => "auth_timeout",
        }
    }

    /// Get the HTTP status code for this error.
    ///
    /// Every rejection answers 400; only timeouts are reported as a server
    /// side failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Whether the failure is the service's fault rather than the caller's.
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            AuthError::Timeout { .. } | AuthError::Token { .. }
        )
    }

    /// Caller-facing message. Never includes the underlying detail of a
    /// credential, directory or signer failure.
    pub fn message(&self) -> String {
        match self {
            AuthError::Reader(_) => "unable to read request body".to_string(),
            AuthError::Unmarshal(_) => "unable to decode request payload".to_string(),
            AuthError::Credentials { public, .. } => (*public).to_string(),
            AuthError::LdapSearch { user, .. } => format!("no LDAP entry for user {user}"),
            AuthError::LdapGroup { user, scope, .. } => {
                format!("user {user} with scope {scope} is not allowed")
            }
            AuthError::Token { .. } => "unable to issue token".to_string(),
            AuthError::Timeout { operation } => format!("{operation} timed out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_hide_detail() {
        let err = AuthError::credentials("wrong user credentials", "kinit: Password incorrect");
        assert_eq!(err.error_code(), "credentials_error");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "wrong user credentials");
        assert!(err.to_string().contains("Password incorrect"));
    }

    #[test]
    fn group_error_names_user_and_scope() {
        let err = AuthError::LdapGroup {
            user: "bob".to_string(),
            scope: "write".to_string(),
            group: "foxdenrw".to_string(),
        };
        assert_eq!(err.error_code(), "ldap_group_error");
        assert_eq!(err.message(), "user bob with scope write is not allowed");
    }

    #[test]
    fn timeout_is_server_fault() {
        let err = AuthError::Timeout {
            operation: "realm login",
        };
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert!(err.is_server_fault());
        assert!(!AuthError::Reader("eof".to_string()).is_server_fault());
    }

    #[test]
    fn signer_errors_are_token_errors() {
        let err = AuthError::signer_misconfigured("empty signing key");
        assert_eq!(err.error_code(), "token_error");
        assert_eq!(err.message(), "unable to issue token");
        assert!(matches!(err, AuthError::Token { misconfigured: true, .. }));
    }
}
