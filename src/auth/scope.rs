// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Requested scope tokens.

use serde::{Deserialize, Serialize};

/// Scope token granting read access.
pub const READ: &str = "read";
/// Scope token granting write access (requires the write group).
pub const WRITE: &str = "write";
/// Scope token granting delete access (requires the admin group).
pub const DELETE: &str = "delete";

/// Scope granted implicitly to trusted clients.
pub const TRUSTED_CLIENT_SCOPE: &str = "read+write";

/// An ordered set of scope tokens requested by a caller.
///
/// Scopes travel on the wire as a single string such as `read+write`.
/// The raw string is kept verbatim so it can be echoed back in the
/// issued token; the parsed tokens are used for policy decisions.
///
/// ## Separators
///
/// Tokens are split on `+`, `,` and whitespace. Empty tokens are dropped and
/// duplicates keep their first position.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ScopeRequest {
    raw: String,
    tokens: Vec<String>,
}

impl ScopeRequest {
    /// Parse a scope string.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let mut tokens: Vec<String> = Vec::new();
        for token in raw.split(|c: char| c == '+' || c == ',' || c.is_whitespace()) {
            let token = token.trim();
            if token.is_empty() || tokens.iter().any(|t| t == token) {
                continue;
            }
            tokens.push(token.to_string());
        }
        Self { raw, tokens }
    }

    /// The scope exactly as the caller sent it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed tokens in request order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Check whether a token was requested.
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Check whether `needle` occurs anywhere in the raw string.
    ///
    /// Policy gating uses this rather than [`contains`](Self::contains) so
    /// that a scope cannot dodge a group check through an unexpected
    /// separator such as `read|write`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.raw.contains(needle)
    }

    /// Whether the scope needs directory group membership.
    pub fn is_elevated(&self) -> bool {
        self.mentions(WRITE) || self.mentions(DELETE)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl From<String> for ScopeRequest {
    fn from(raw: String) -> Self {
        Self::parse(raw)
    }
}

impl From<&str> for ScopeRequest {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<ScopeRequest> for String {
    fn from(scope: ScopeRequest) -> Self {
        scope.raw
    }
}

impl std::fmt::Display for ScopeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plus_separated_tokens() {
        let scope = ScopeRequest::parse("read+write");
        assert_eq!(scope.tokens(), ["read", "write"]);
        assert_eq!(scope.as_str(), "read+write");
    }

    #[test]
    fn parses_mixed_separators_and_drops_duplicates() {
        let scope = ScopeRequest::parse(" read, write delete+read ");
        assert_eq!(scope.tokens(), ["read", "write", "delete"]);
    }

    #[test]
    fn token_membership_differs_from_mentions() {
        let scope = ScopeRequest::parse("read|write");
        assert_eq!(scope.tokens(), ["read|write"]);
        assert!(!scope.contains(WRITE));
        assert!(scope.mentions(WRITE));
        assert!(scope.is_elevated());
    }

    #[test]
    fn elevated_scopes() {
        assert!(ScopeRequest::parse("write").is_elevated());
        assert!(ScopeRequest::parse("read+delete").is_elevated());
        assert!(!ScopeRequest::parse("read").is_elevated());
        assert!(ScopeRequest::parse("").is_empty());
    }

    #[test]
    fn serde_uses_raw_string() {
        let scope: ScopeRequest = serde_json::from_str(r#""read+write""#).unwrap();
        assert!(scope.contains(WRITE));
        assert_eq!(serde_json::to_string(&scope).unwrap(), r#""read+write""#);
    }
}
