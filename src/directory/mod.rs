// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Group Directory
//!
//! Group membership lookups used to gate elevated scopes.
//!
//! - [`DirectoryClient`] - remote directory (LDAP in production)
//! - [`GroupDirectoryCache`] - per-username cache in front of the client,
//!   with an injected [`Clock`] and optional TTL

pub mod cache;
pub mod ldap;

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use cache::{Clock, GroupDirectoryCache, SystemClock};
pub use ldap::LdapDirectory;

#[derive(Debug, Clone, thiserror::Error)]
pub enum DirectoryError {
    /// No directory entry for the user
    #[error("user {0} not found in directory")]
    NotFound(String),
    /// Bind, connection or search failure
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Cached result of one directory lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDirectoryEntry {
    pub username: String,
    pub groups: BTreeSet<String>,
    pub fetched_at: DateTime<Utc>,
}

impl GroupDirectoryEntry {
    /// Check whether the user belongs to `group`.
    ///
    /// Groups may be stored as full DNs (`cn=foxdenrw,ou=Groups,dc=...`);
    /// a bare group name matches the leading `cn=` component.
    pub fn belongs(&self, group: &str) -> bool {
        self.groups
            .iter()
            .any(|g| {
                g.eq_ignore_ascii_case(group)
                    || common_name(g).is_some_and(|cn| cn.eq_ignore_ascii_case(group))
            })
    }
}

/// Leading `cn=` value of a DN.
fn common_name(dn: &str) -> Option<&str> {
    let first = dn.split(',').next()?.trim();
    let (attr, value) = first.split_once('=')?;
    attr.trim().eq_ignore_ascii_case("cn").then(|| value.trim())
}

/// Remote group directory.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Fetch the groups of `username`.
    async fn groups(&self, username: &str) -> Result<BTreeSet<String>, DirectoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(groups: &[&str]) -> GroupDirectoryEntry {
        GroupDirectoryEntry {
            username: "bob".to_string(),
            groups: groups.iter().map(|g| g.to_string()).collect(),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn belongs_matches_plain_names() {
        assert!(entry(&["foxdenrw"]).belongs("foxdenrw"));
        assert!(!entry(&["foxdenrw"]).belongs("foxdenadmin"));
    }

    #[test]
    fn belongs_matches_dn_common_name() {
        let e = entry(&["cn=foxdenrw,ou=Groups,dc=example,dc=org"]);
        assert!(e.belongs("foxdenrw"));
        assert!(e.belongs("cn=foxdenrw,ou=Groups,dc=example,dc=org"));
        assert!(!e.belongs("Groups"));
    }

    #[test]
    fn common_name_requires_cn_attribute() {
        assert_eq!(common_name("cn=admins,dc=x"), Some("admins"));
        assert_eq!(common_name("ou=admins,dc=x"), None);
        assert_eq!(common_name("plain"), None);
    }
}
