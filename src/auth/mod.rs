// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Establishes who a caller is and what scope they may hold, then mints a
//! bearer token for downstream services.
//!
//! ## Trust paths
//!
//! 1. **Client credentials** (`GET /oauth/token`): configuration-level trust
//!    for machine-to-machine callers.
//! 2. **Kerberos** (`POST /oauth/authorize`, `/kauth`): a realm password, a
//!    credential cache, or a signed session cookie from a previous login.
//! 3. **Trusted client** (`POST /oauth/trusted`): an encrypted host
//!    assertion matched against the registry and the request's source IP.
//!
//! ## Scope elevation
//!
//! With LDAP enforcement on, a `write` scope requires the write group and a
//! `delete` scope the admin group. Group lookups go through a bounded LRU
//! cache with a TTL.
//!
//! ## Security
//!
//! - Credential failures return a fixed message; the detail is only logged
//! - Passwords, tickets and payloads are never logged
//! - Realm and directory calls run under a deadline
//! - Clock skew tolerance when decoding tokens is 60 seconds

pub mod claims;
pub mod crypto;
pub mod error;
pub mod issuer;
pub mod policy;
pub mod realm;
pub mod scope;
pub mod session;
pub mod subject;
pub mod trusted;
pub mod verifier;

pub use claims::{TokenClaims, TokenEnvelope};
pub use crypto::SecretBox;
pub use error::AuthError;
pub use issuer::TokenIssuer;
pub use policy::ScopePolicy;
pub use realm::{KinitRealm, RealmClient};
pub use scope::ScopeRequest;
pub use session::{SessionSigner, SESSION_COOKIE};
pub use subject::{AuthenticationKind, Subject};
pub use trusted::{TrustedClientRegistry, TrustedClientRegistryEntry};
pub use verifier::{CredentialVerifier, Verified};
