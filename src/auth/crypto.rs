// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared-secret encryption for trusted-client payloads.
//!
//! Payload layout: `nonce (12 bytes) || ChaCha20-Poly1305 ciphertext`,
//! transported either as raw bytes or as standard base64 text. The key is
//! the SHA-256 digest of the configured shared secret.
//!
//! AEAD authentication means a wrong secret or a tampered payload fails as a
//! whole; there is no partially decrypted output.

use base64ct::{Base64, Encoding};
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    ChaCha20Poly1305, Key, Nonce,
};
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("shared secret is empty")]
    EmptySecret,
    #[error("payload too short")]
    Truncated,
    #[error("decryption failed")]
    Decrypt,
    #[error("encryption failed")]
    Encrypt,
}

/// Symmetric cipher keyed by the process-wide shared secret.
///
/// Read-only after startup.
#[derive(Clone)]
pub struct SecretBox {
    cipher: ChaCha20Poly1305,
}

impl SecretBox {
    pub fn new(secret: &str) -> Result<Self, CryptoError> {
        if secret.is_empty() {
            return Err(CryptoError::EmptySecret);
        }
        let digest = Sha256::digest(secret.as_bytes());
        Ok(Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(&digest)),
        })
    }

    /// Encrypt and base64-encode a payload.
    pub fn seal(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CryptoError::Encrypt)?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);
        Ok(Base64::encode_string(&payload))
    }

    /// Decrypt a payload submitted by a client.
    pub fn open(&self, body: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let payload = decode_body(body);
        if payload.len() <= NONCE_LEN {
            return Err(CryptoError::Truncated);
        }
        let (nonce, ciphertext) = payload.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Decrypt)
    }
}

impl std::fmt::Debug for SecretBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretBox(..)")
    }
}

/// Accept base64 text when the body is valid base64, otherwise raw bytes.
fn decode_body(body: &[u8]) -> Vec<u8> {
    std::str::from_utf8(body)
        .ok()
        .map(str::trim)
        .and_then(|text| Base64::decode_vec(text).ok())
        .unwrap_or_else(|| body.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_then_open() {
        let sbox = SecretBox::new("shared-secret").unwrap();
        let sealed = sbox.seal(b"{\"User\":\"carol\"}").unwrap();
        assert_eq!(sbox.open(sealed.as_bytes()).unwrap(), b"{\"User\":\"carol\"}");
    }

    #[test]
    fn raw_binary_payload_is_accepted() {
        let sbox = SecretBox::new("shared-secret").unwrap();
        let sealed = sbox.seal(b"payload").unwrap();
        let raw = Base64::decode_vec(&sealed).unwrap();
        assert_eq!(sbox.open(&raw).unwrap(), b"payload");
    }

    #[test]
    fn wrong_secret_fails_whole() {
        let sealed = SecretBox::new("right").unwrap().seal(b"payload").unwrap();
        let result = SecretBox::new("wrong").unwrap().open(sealed.as_bytes());
        assert!(matches!(result, Err(CryptoError::Decrypt)));
    }

    #[test]
    fn tampered_payload_fails() {
        let sbox = SecretBox::new("shared-secret").unwrap();
        let mut raw = Base64::decode_vec(&sbox.seal(b"payload").unwrap()).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        assert!(matches!(sbox.open(&raw), Err(CryptoError::Decrypt)));
    }

    #[test]
    fn short_and_empty_inputs() {
        let sbox = SecretBox::new("shared-secret").unwrap();
        assert!(matches!(sbox.open(b""), Err(CryptoError::Truncated)));
        assert!(matches!(sbox.open(b"abc"), Err(CryptoError::Truncated)));
        assert!(matches!(SecretBox::new(""), Err(CryptoError::EmptySecret)));
    }
}
