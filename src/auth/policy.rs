// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scope policy gate.
//!
//! Elevated scopes require directory group membership:
//!
//! | Requested scope contains | Required group |
//! |--------------------------|----------------|
//! | `write` | write group (`foxdenrw`) |
//! | `delete` | admin group (`foxdenadmin`) |
//! | anything else | none |
//!
//! Matching is by substring on the raw scope, so `read|write` and
//! `readwrite` both need the write group. `write` is checked first; a
//! `write+delete` request needs only the write group. With enforcement disabled every scope is granted without a
//! directory call.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::{scope, AuthError, ScopeRequest, Subject};
use crate::config::LdapConfig;
use crate::directory::{DirectoryError, GroupDirectoryCache};

/// Decides whether a verified subject may hold the requested scope.
#[derive(Clone)]
pub struct ScopePolicy {
    enforcement: Option<Enforcement>,
}

#[derive(Clone)]
struct Enforcement {
    directory: Arc<GroupDirectoryCache>,
    write_group: String,
    admin_group: String,
    timeout: Duration,
}

impl ScopePolicy {
    /// Policy that grants every scope.
    pub fn disabled() -> Self {
        Self { enforcement: None }
    }

    /// Policy backed by the group directory.
    pub fn enforced(directory: Arc<GroupDirectoryCache>, config: &LdapConfig) -> Self {
        Self {
            enforcement: Some(Enforcement {
                directory,
                write_group: config.write_group.clone(),
                admin_group: config.admin_group.clone(),
                timeout: config.timeout(),
            }),
        }
    }

    pub fn is_enforced(&self) -> bool {
        self.enforcement.is_some()
    }

    /// Group needed for `scope`, if any.
    fn required_group<'a>(enforcement: &'a Enforcement, scope: &ScopeRequest) -> Option<&'a str> {
        if scope.mentions(scope::WRITE) {
            Some(enforcement.write_group.as_str())
        } else if scope.mentions(scope::DELETE) {
            Some(enforcement.admin_group.as_str())
        } else {
            None
        }
    }

    /// Authorize `subject` for `scope`.
    ///
    /// # Errors
    ///
    /// - `LdapSearch` when the directory has no entry or cannot be reached
    /// - `LdapGroup` when the entry lacks the required group
    /// - `Timeout` when the lookup exceeds the directory deadline
    pub async fn authorize(&self, subject: &Subject, scope: &ScopeRequest) -> Result<(), AuthError> {
        let Some(enforcement) = &self.enforcement else {
            return Ok(());
        };

        // Looked up even for plain reads: users absent from the directory
        // are rejected whatever they ask for.
        let entry = tokio::time::timeout(
            enforcement.timeout,
            enforcement.directory.lookup(&subject.username),
        )
        .await
        .map_err(|_| AuthError::Timeout {
            operation: "directory search",
        })?
        .map_err(|e| {
            warn!(user = %subject.username, scope = %scope, error = %e, "directory lookup failed");
            AuthError::LdapSearch {
                user: subject.username.clone(),
                scope: scope.to_string(),
                detail: match e {
                    DirectoryError::NotFound(_) => "no entry".to_string(),
                    DirectoryError::Unavailable(reason) => reason,
                },
            }
        })?;

        if let Some(group) = Self::required_group(enforcement, scope) {
            if !entry.belongs(group) {
                warn!(user = %subject.username, scope = %scope, group, "missing required group");
                return Err(AuthError::LdapGroup {
                    user: subject.username.clone(),
                    scope: scope.to_string(),
                    group: group.to_string(),
                });
            }
        }

        info!(user = %subject.username, scope = %scope, "scope authorized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticationKind;
    use crate::directory::cache::tests::FakeDirectory;

    fn subject(name: &str) -> Subject {
        Subject::new(name, AuthenticationKind::Kerberos)
    }

    fn enforced(dir: Arc<FakeDirectory>) -> ScopePolicy {
        let cache = Arc::new(GroupDirectoryCache::new(dir, 16, None));
        ScopePolicy::enforced(cache, &LdapConfig::default())
    }

    #[tokio::test]
    async fn write_requires_write_group() {
        let dir = Arc::new(
            FakeDirectory::default()
                .with_user("alice", &["cn=foxdenrw,ou=Groups,dc=example,dc=org"])
                .with_user("bob", &["users"]),
        );
        let policy = enforced(dir);

        assert!(policy.authorize(&subject("alice"), &"write".into()).await.is_ok());
        let err = policy
            .authorize(&subject("bob"), &"write".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::LdapGroup { ref user, ref scope, .. } if user == "bob" && scope == "write"));
    }

    #[tokio::test]
    async fn delete_requires_admin_group() {
        let dir = Arc::new(
            FakeDirectory::default()
                .with_user("alice", &["foxdenrw"])
                .with_user("root", &["foxdenadmin"]),
        );
        let policy = enforced(dir);

        assert!(matches!(
            policy.authorize(&subject("alice"), &"delete".into()).await,
            Err(AuthError::LdapGroup { .. })
        ));
        assert!(policy.authorize(&subject("root"), &"read+delete".into()).await.is_ok());
    }

    #[tokio::test]
    async fn read_only_needs_no_group() {
        let dir = Arc::new(FakeDirectory::default().with_user("bob", &[]));
        let policy = enforced(dir);
        assert!(policy.authorize(&subject("bob"), &"read".into()).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_user_is_search_error() {
        let policy = enforced(Arc::new(FakeDirectory::default()));
        let err = policy
            .authorize(&subject("ghost"), &"write".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::LdapSearch { ref user, .. } if user == "ghost"));
    }

    #[tokio::test]
    async fn write_mentioned_under_any_separator_needs_write_group() {
        let dir = Arc::new(FakeDirectory::default().with_user("bob", &["users"]));
        let policy = enforced(dir);

        for scope in ["read|write", "read:write", "readwrite", "write;delete"] {
            let err = policy
                .authorize(&subject("bob"), &scope.into())
                .await
                .unwrap_err();
            assert!(
                matches!(err, AuthError::LdapGroup { ref group, .. } if group == "foxdenrw"),
                "{scope} was not gated"
            );
        }
    }

    #[tokio::test]
    async fn delete_mentioned_without_separator_needs_admin_group() {
        let dir = Arc::new(FakeDirectory::default().with_user("bob", &["users"]));
        let policy = enforced(dir);
        let err = policy
            .authorize(&subject("bob"), &"read|delete".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::LdapGroup { ref group, .. } if group == "foxdenadmin"));
    }

    #[tokio::test]
    async fn slow_directory_times_out() {
        let dir = Arc::new(
            FakeDirectory::default()
                .with_user("alice", &["foxdenrw"])
                .slow(Duration::from_secs(5)),
        );
        let cache = Arc::new(GroupDirectoryCache::new(dir.clone(), 16, None));
        let config = LdapConfig {
            timeout_secs: 1,
            ..LdapConfig::default()
        };
        let policy = ScopePolicy::enforced(cache, &config);

        let err = policy
            .authorize(&subject("alice"), &"write".into())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::Timeout {
                operation: "directory search"
            }
        ));
        assert_eq!(err.error_code(), "auth_timeout");
        assert_eq!(dir.calls(), 1);
    }

    #[tokio::test]
    async fn disabled_policy_makes_no_directory_call() {
        let policy = ScopePolicy::disabled();
        assert!(!policy.is_enforced());
        assert!(policy.authorize(&subject("bob"), &"read".into()).await.is_ok());
        assert!(policy.authorize(&subject("bob"), &"write".into()).await.is_ok());
        assert!(policy.authorize(&subject("bob"), &"delete".into()).await.is_ok());
    }
}
