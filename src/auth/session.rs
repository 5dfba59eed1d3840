// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed `auth-session` cookie.
//!
//! Value format: `<user>.<expiry>.<signature>` where `signature` is the
//! unpadded URL-safe base64 of HMAC-SHA256 over `<user>.<expiry>`, keyed by
//! the token signing key. The cookie lets a browser that logged in through
//! `/kauth` request tokens without resubmitting a ticket.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Cookie name.
pub const SESSION_COOKIE: &str = "auth-session";

/// Session lifetime.
pub const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session signing key is not configured")]
    NoKey,
    #[error("malformed session cookie")]
    Malformed,
    #[error("session signature mismatch")]
    BadSignature,
    #[error("session expired")]
    Expired,
}

/// Signs and verifies session cookie values.
#[derive(Clone)]
pub struct SessionSigner {
    key: Vec<u8>,
}

impl SessionSigner {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.as_bytes().to_vec(),
        }
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256, SessionError> {
        if self.key.is_empty() {
            return Err(SessionError::NoKey);
        }
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|_| SessionError::NoKey)?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }

    /// Cookie value for `user`, valid until `expires`.
    pub fn sign(&self, user: &str, expires: DateTime<Utc>) -> Result<String, SessionError> {
        let payload = format!("{user}.{}", expires.timestamp());
        let tag = self.mac(&payload)?.finalize().into_bytes();
        Ok(format!("{payload}.{}", Base64UrlUnpadded::encode_string(&tag)))
    }

    /// Cookie value for `user` with the standard 24 hour lifetime.
    pub fn issue(&self, user: &str) -> Result<(String, DateTime<Utc>), SessionError> {
        let expires = Utc::now() + Duration::hours(SESSION_TTL_HOURS);
        Ok((self.sign(user, expires)?, expires))
    }

    /// Verify a cookie value and return the user it names.
    pub fn verify(&self, value: &str) -> Result<String, SessionError> {
        let (payload, signature) = value.rsplit_once('.').ok_or(SessionError::Malformed)?;
        let (user, expiry) = payload.rsplit_once('.').ok_or(SessionError::Malformed)?;
        if user.is_empty() {
            return Err(SessionError::Malformed);
        }
        let expiry: i64 = expiry.parse().map_err(|_| SessionError::Malformed)?;
        let tag = Base64UrlUnpadded::decode_vec(signature).map_err(|_| SessionError::Malformed)?;

        self.mac(payload)?
            .verify_slice(&tag)
            .map_err(|_| SessionError::BadSignature)?;

        if expiry <= Utc::now().timestamp() {
            return Err(SessionError::Expired);
        }
        Ok(user.to_string())
    }
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionSigner(..)")
    }
}
