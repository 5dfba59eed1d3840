// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! The gateway reads a JSON configuration file at startup. Every section has
//! defaults, so a missing section simply disables the feature it configures.
//! A handful of environment variables override or extend the file.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTHZ_CONFIG` | Path to the JSON configuration file | `authz.json` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8380` |
//! | `TLS_CERT_PATH` | PEM certificate chain; enables HTTPS with `TLS_KEY_PATH` | unset |
//! | `TLS_KEY_PATH` | PEM private key | unset |
//! | `AUTHZ_SIGNING_KEY` | Token signing key (value or file path) | from file |
//! | `AUTHZ_ENCRYPTION_SECRET` | Trusted-client shared secret (value or file path) | from file |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::auth::trusted::TrustedClientRegistryEntry;

/// Environment variable name for the configuration file path.
pub const CONFIG_PATH_ENV: &str = "AUTHZ_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "authz.json";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8380;

pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";

pub const SIGNING_KEY_ENV: &str = "AUTHZ_SIGNING_KEY";
pub const ENCRYPTION_SECRET_ENV: &str = "AUTHZ_ENCRYPTION_SECRET";

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Token lifetime used when none (or zero) is configured.
pub const DEFAULT_TOKEN_EXPIRES_SECS: u64 = 7200;

/// Name the service stamps into tokens and error records.
pub const DEFAULT_APPLICATION: &str = "Authz";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Top-level gateway configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub application: String,
    pub kerberos: KerberosConfig,
    pub encryption: EncryptionConfig,
    pub trusted_users: Vec<TrustedClientRegistryEntry>,
    pub ldap: LdapConfig,
    pub token: TokenConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            application: DEFAULT_APPLICATION.to_string(),
            kerberos: KerberosConfig::default(),
            encryption: EncryptionConfig::default(),
            trusted_users: Vec::new(),
            ldap: LdapConfig::default(),
            token: TokenConfig::default(),
        }
    }
}

/// Kerberos realm settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KerberosConfig {
    pub realm: String,
    /// Path to `krb5.conf`
    pub krb5_conf: PathBuf,
    pub kinit: PathBuf,
    pub klist: PathBuf,
    pub timeout_secs: u64,
}

impl Default for KerberosConfig {
    fn default() -> Self {
        Self {
            realm: String::new(),
            krb5_conf: PathBuf::from("/etc/krb5.conf"),
            kinit: PathBuf::from("kinit"),
            klist: PathBuf::from("klist"),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl KerberosConfig {
    pub fn timeout(&self) -> Duration {
        non_zero_secs(self.timeout_secs)
    }
}

/// Shared secret for trusted-client payloads.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct EncryptionConfig {
    pub secret: String,
}

impl std::fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionConfig")
            .field("secret", &redacted(&self.secret))
            .finish()
    }
}

/// Directory (LDAP) enforcement settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LdapConfig {
    /// Gate elevated scopes on group membership
    pub enabled: bool,
    pub url: String,
    /// Service account bind DN
    pub login: String,
    pub password: String,
    pub base_dn: String,
    /// Search filter; `{user}` is replaced by the escaped username
    pub user_filter: String,
    pub group_attribute: String,
    pub write_group: String,
    pub admin_group: String,
    pub timeout_secs: u64,
    /// Zero keeps entries for the process lifetime
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
}

impl Default for LdapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "ldap://localhost:389".to_string(),
            login: String::new(),
            password: String::new(),
            base_dn: String::new(),
            user_filter: "(uid={user})".to_string(),
            group_attribute: "memberOf".to_string(),
            write_group: "foxdenrw".to_string(),
            admin_group: "foxdenadmin".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_ttl_secs: 0,
            cache_capacity: 4096,
        }
    }
}

impl LdapConfig {
    pub fn timeout(&self) -> Duration {
        non_zero_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }
}

impl std::fmt::Debug for LdapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConfig")
            .field("enabled", &self.enabled)
            .field("url", &self.url)
            .field("login", &self.login)
            .field("password", &redacted(&self.password))
            .field("base_dn", &self.base_dn)
            .field("write_group", &self.write_group)
            .field("admin_group", &self.admin_group)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .finish_non_exhaustive()
    }
}

/// Token issuance settings.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub signing_key: String,
    /// Lifetime in seconds; zero falls back to the default
    pub expires: u64,
    pub client_id: String,
    pub client_secret: String,
}

impl TokenConfig {
    pub fn expires_secs(&self) -> u64 {
        if self.expires == 0 {
            DEFAULT_TOKEN_EXPIRES_SECS
        } else {
            self.expires
        }
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("signing_key", &redacted(&self.signing_key))
            .field("expires", &self.expires)
            .field("client_id", &self.client_id)
            .field("client_secret", &redacted(&self.client_secret))
            .finish()
    }
}

impl GatewayConfig {
    /// Load from `AUTHZ_CONFIG` (or `authz.json`) and apply env overrides.
    ///
    /// A missing file at the default location yields defaults; a missing file
    /// named explicitly through `AUTHZ_CONFIG` is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var(CONFIG_PATH_ENV).ok();
        let path = explicit.clone().unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if explicit.is_some() || Path::new(&path).exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env();
        config.resolve_secrets();
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_slice(&data).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(SIGNING_KEY_ENV) {
            self.token.signing_key = key;
        }
        if let Ok(secret) = std::env::var(ENCRYPTION_SECRET_ENV) {
            self.encryption.secret = secret;
        }
    }

    /// Secrets may name files holding the actual value.
    pub fn resolve_secrets(&mut self) {
        self.token.signing_key = read_secret(&self.token.signing_key);
        self.encryption.secret = read_secret(&self.encryption.secret);
        self.ldap.password = read_secret(&self.ldap.password);
    }
}

/// Return the trimmed contents of `value` if it names a readable file,
/// otherwise `value` itself.
pub fn read_secret(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let path = Path::new(value);
    if path.is_file() {
        if let Ok(contents) = std::fs::read_to_string(path) {
            return contents.trim().to_string();
        }
    }
    value.to_string()
}

fn non_zero_secs(secs: u64) -> Duration {
    Duration::from_secs(if secs == 0 { DEFAULT_TIMEOUT_SECS } else { secs })
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}
