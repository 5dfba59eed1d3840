// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LDAP-backed group directory.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use ldap3::{ldap_escape, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use tracing::{debug, warn};

use super::{DirectoryClient, DirectoryError};
use crate::config::LdapConfig;

/// Directory client that binds with service credentials and reads the
/// group attribute (`memberOf` by default) of the user's entry.
///
/// A fresh connection is opened per lookup; the cache in front of it keeps
/// the call rate low.
#[derive(Clone)]
pub struct LdapDirectory {
    url: String,
    bind_dn: String,
    bind_password: String,
    base_dn: String,
    user_filter: String,
    group_attribute: String,
    conn_timeout: Duration,
}

impl LdapDirectory {
    pub fn new(config: &LdapConfig) -> Self {
        Self {
            url: config.url.clone(),
            bind_dn: config.login.clone(),
            bind_password: config.password.clone(),
            base_dn: config.base_dn.clone(),
            user_filter: config.user_filter.clone(),
            group_attribute: config.group_attribute.clone(),
            conn_timeout: config.timeout(),
        }
    }

    /// Search filter for `username` with LDAP special characters escaped.
    fn filter_for(&self, username: &str) -> String {
        self.user_filter.replace("{user}", &ldap_escape(username))
    }
}

impl std::fmt::Debug for LdapDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapDirectory")
            .field("url", &self.url)
            .field("bind_dn", &self.bind_dn)
            .field("base_dn", &self.base_dn)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DirectoryClient for LdapDirectory {
    async fn groups(&self, username: &str) -> Result<BTreeSet<String>, DirectoryError> {
        let unavailable = |e: ldap3::LdapError| DirectoryError::Unavailable(e.to_string());

        let settings = LdapConnSettings::new().set_conn_timeout(self.conn_timeout);
        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &self.url)
            .await
            .map_err(unavailable)?;
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection error");
            }
        });

        ldap.simple_bind(&self.bind_dn, &self.bind_password)
            .await
            .and_then(|r| r.success())
            .map_err(unavailable)?;

        let filter = self.filter_for(username);
        let (entries, _) = ldap
            .search(
                &self.base_dn,
                Scope::Subtree,
                &filter,
                vec![self.group_attribute.as_str()],
            )
            .await
            .and_then(|r| r.success())
            .map_err(unavailable)?;
        if let Err(e) = ldap.unbind().await {
            debug!(error = %e, "LDAP unbind failed");
        }

        let entry = entries
            .into_iter()
            .next()
            .map(SearchEntry::construct)
            .ok_or_else(|| DirectoryError::NotFound(username.to_string()))?;

        Ok(entry
            .attrs
            .into_iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case(&self.group_attribute))
            .flat_map(|(_, values)| values)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_escapes_special_characters() {
        let dir = LdapDirectory::new(&LdapConfig::default());
        assert_eq!(dir.filter_for("bob"), "(uid=bob)");
        assert_eq!(dir.filter_for("b*)(uid=*"), "(uid=b\\2a\\29\\28uid=\\2a)");
    }

    #[test]
    fn debug_hides_bind_password() {
        let config = LdapConfig {
            password: "hunter2".to_string(),
            ..LdapConfig::default()
        };
        let rendered = format!("{:?}", LdapDirectory::new(&config));
        assert!(!rendered.contains("hunter2"));
    }

    #[tokio::test]
    async fn unreachable_directory_is_unavailable() {
        let config = LdapConfig {
            url: "ldap://127.0.0.1:1".to_string(),
            timeout_secs: 1,
            ..LdapConfig::default()
        };
        let result = LdapDirectory::new(&config).groups("bob").await;
        assert!(matches!(result, Err(DirectoryError::Unavailable(_))));
    }
}
