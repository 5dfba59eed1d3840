// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Kerberos realm client.
//!
//! ## Implementation
//!
//! [`KinitRealm`] drives the MIT Kerberos command line tools:
//!
//! - Password login runs `kinit -- <user>@<REALM>` with the password on stdin,
//!   `KRB5_CONFIG` pointing at the configured realm config and a private,
//!   throwaway credential cache.
//! - Ticket inspection writes a submitted credential cache to a temporary
//!   file and asks `klist` for its validity and default principal.
//!
//! Deadlines are applied by the verifiers, not here.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::KerberosConfig;

#[derive(Debug, thiserror::Error)]
pub enum RealmError {
    #[error("realm configuration unavailable: {0}")]
    Config(String),
    #[error("realm rejected credentials: {0}")]
    Rejected(String),
    #[error("credential cache is unreadable: {0}")]
    InvalidTicket(String),
    #[error("realm client failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Identity proven by a realm login or ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealmPrincipal {
    /// Full principal, e.g. `bob@EXAMPLE.ORG`
    pub principal: String,
    /// Whether the ticket's lifetime has already run out
    pub expired: bool,
}

impl RealmPrincipal {
    /// User part of the principal (before `@`, without instance).
    pub fn user_name(&self) -> &str {
        let primary = self.principal.split('@').next().unwrap_or_default();
        primary.split('/').next().unwrap_or_default()
    }
}

/// External Kerberos realm.
#[async_trait]
pub trait RealmClient: Send + Sync {
    /// Log in with a password.
    async fn login(&self, user: &str, password: &str) -> Result<RealmPrincipal, RealmError>;

    /// Inspect a previously obtained credential cache.
    async fn inspect_ticket(&self, ticket: &[u8]) -> Result<RealmPrincipal, RealmError>;
}

/// Realm client backed by `kinit` / `klist`.
#[derive(Debug, Clone)]
pub struct KinitRealm {
    realm: String,
    krb5_conf: PathBuf,
    kinit: PathBuf,
    klist: PathBuf,
}

impl KinitRealm {
    pub fn new(config: &KerberosConfig) -> Self {
        Self {
            realm: config.realm.clone(),
            krb5_conf: config.krb5_conf.clone(),
            kinit: config.kinit.clone(),
            klist: config.klist.clone(),
        }
    }

    /// Make sure the realm configuration can be loaded before talking to it.
    fn check_config(&self) -> Result<(), RealmError> {
        if self.realm.is_empty() {
            return Err(RealmError::Config("realm name is not set".to_string()));
        }
        std::fs::metadata(&self.krb5_conf).map_err(|e| {
            RealmError::Config(format!("{}: {e}", self.krb5_conf.display()))
        })?;
        Ok(())
    }

    /// Principal for a password login.
    ///
    /// The name must be a bare primary: no realm, no leading dash and no
    /// whitespace or control characters.
    fn login_principal(&self, user: &str) -> Result<String, RealmError> {
        let bad = user.is_empty()
            || user.starts_with('-')
            || user.contains('@')
            || user.chars().any(|c| c.is_whitespace() || c.is_control());
        if bad {
            return Err(RealmError::Rejected(format!("invalid user name {user:?}")));
        }
        Ok(format!("{user}@{}", self.realm))
    }

    fn command(&self, program: &Path, ccache: &Path) -> Command {
        let mut cmd = Command::new(program);
        cmd.env("KRB5_CONFIG", &self.krb5_conf)
            .env("KRB5CCNAME", format!("FILE:{}", ccache.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Read validity and default principal from a credential cache file.
    async fn read_cache(&self, ccache: &Path) -> Result<RealmPrincipal, RealmError> {
        let listing = self.command(&self.klist, ccache).output().await?;
        if !listing.status.success() {
            return Err(RealmError::InvalidTicket(stderr_line(&listing.stderr)));
        }
        let principal = parse_default_principal(&String::from_utf8_lossy(&listing.stdout))
            .ok_or_else(|| RealmError::InvalidTicket("no default principal".to_string()))?;

        // `klist -s` exits non-zero when the cache holds no valid tickets.
        let status = self
            .command(&self.klist, ccache)
            .arg("-s")
            .status()
            .await?;

        Ok(RealmPrincipal {
            principal,
            expired: !status.success(),
        })
    }
}

#[async_trait]
impl RealmClient for KinitRealm {
    async fn login(&self, user: &str, password: &str) -> Result<RealmPrincipal, RealmError> {
        self.check_config()?;
        let principal = self.login_principal(user)?;
        let ccache = tempfile::NamedTempFile::new()?;

        let mut child = self
            .command(&self.kinit, ccache.path())
            .arg("--")
            .arg(&principal)
            .stdin(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(password.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
        }
        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(RealmError::Rejected(stderr_line(&output.stderr)));
        }

        self.read_cache(ccache.path()).await
    }

    async fn inspect_ticket(&self, ticket: &[u8]) -> Result<RealmPrincipal, RealmError> {
        self.check_config()?;
        if ticket.is_empty() {
            return Err(RealmError::InvalidTicket("empty ticket".to_string()));
        }
        let ccache = tempfile::NamedTempFile::new()?;
        tokio::fs::write(ccache.path(), ticket).await?;
        self.read_cache(ccache.path()).await
    }
}

/// Extract `bob@REALM` from `klist` output.
fn parse_default_principal(listing: &str) -> Option<String> {
    listing.lines().find_map(|line| {
        line.trim()
            .strip_prefix("Default principal:")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
    })
}

fn stderr_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("no diagnostic output")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_klist_output() {
        let out = "Ticket cache: FILE:/tmp/krb5cc_1000\nDefault principal: bob@EXAMPLE.ORG\n\nValid starting     Expires            Service principal\n";
        assert_eq!(parse_default_principal(out), Some("bob@EXAMPLE.ORG".to_string()));
        assert_eq!(parse_default_principal("Ticket cache: FILE:/tmp/x\n"), None);
    }

    #[test]
    fn user_name_strips_realm_and_instance() {
        let p = RealmPrincipal {
            principal: "bob/admin@EXAMPLE.ORG".to_string(),
            expired: false,
        };
        assert_eq!(p.user_name(), "bob");
    }

    #[test]
    fn stderr_line_takes_first_message() {
        assert_eq!(
            stderr_line(b"\nkinit: Password incorrect while getting initial credentials\n"),
            "kinit: Password incorrect while getting initial credentials"
        );
        assert_eq!(stderr_line(b""), "no diagnostic output");
    }

    #[tokio::test]
    async fn missing_realm_config_is_a_config_error() {
        let realm = KinitRealm {
            realm: "EXAMPLE.ORG".to_string(),
            krb5_conf: PathBuf::from("/nonexistent/krb5.conf"),
            kinit: PathBuf::from("kinit"),
            klist: PathBuf::from("klist"),
        };
        let result = realm.login("bob", "secret").await;
        assert!(matches!(result, Err(RealmError::Config(_))));
    }

    #[test]
    fn login_principal_appends_realm() {
        let realm = KinitRealm {
            realm: "EXAMPLE.ORG".to_string(),
            krb5_conf: PathBuf::from("/etc/krb5.conf"),
            kinit: PathBuf::from("kinit"),
            klist: PathBuf::from("klist"),
        };
        assert_eq!(realm.login_principal("bob").unwrap(), "bob@EXAMPLE.ORG");
        for user in ["", "-V", "--help", "bob@OTHER.ORG", "bob smith", "bob\n"] {
            assert!(
                matches!(realm.login_principal(user), Err(RealmError::Rejected(_))),
                "{user:?} accepted"
            );
        }
    }

    #[tokio::test]
    async fn option_like_user_never_spawns_kinit() {
        let conf = tempfile::NamedTempFile::new().unwrap();
        let realm = KinitRealm {
            realm: "EXAMPLE.ORG".to_string(),
            krb5_conf: conf.path().to_path_buf(),
            // Spawning this would surface as RealmError::Io.
            kinit: PathBuf::from("/nonexistent/kinit"),
            klist: PathBuf::from("/nonexistent/klist"),
        };
        let result = realm.login("-V", "secret").await;
        assert!(matches!(result, Err(RealmError::Rejected(_))));
    }

    #[tokio::test]
    async fn empty_ticket_is_rejected() {
        let conf = tempfile::NamedTempFile::new().unwrap();
        let realm = KinitRealm {
            realm: "EXAMPLE.ORG".to_string(),
            krb5_conf: conf.path().to_path_buf(),
            kinit: PathBuf::from("kinit"),
            klist: PathBuf::from("klist"),
        };
        let result = realm.inspect_ticket(b"").await;
        assert!(matches!(result, Err(RealmError::InvalidTicket(_))));
    }
}
