// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache for directory group lookups.
//!
//! Caches the group membership of each username to avoid a directory round
//! trip per request. Entries live until evicted by capacity, expired by the
//! optional TTL, or dropped through [`GroupDirectoryCache::invalidate`].
//!
//! Concurrent misses for the same username may both reach the directory;
//! the last one to finish populates the cache.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use lru::LruCache;
use tracing::debug;

use super::{DirectoryClient, DirectoryError, GroupDirectoryEntry};

const MIN_CAPACITY: NonZeroUsize = NonZeroUsize::MIN;

/// Time source for cache expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Shared per-username cache in front of a [`DirectoryClient`].
pub struct GroupDirectoryCache {
    client: Arc<dyn DirectoryClient>,
    clock: Arc<dyn Clock>,
    entries: Mutex<LruCache<String, GroupDirectoryEntry>>,
    ttl: Option<Duration>,
}

impl GroupDirectoryCache {
    /// Create a new cache.
    ///
    /// - `capacity`: Max number of usernames kept.
    /// - `ttl`: Entry lifetime; `None` keeps entries until evicted.
    pub fn new(client: Arc<dyn DirectoryClient>, capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            client,
            clock: Arc::new(SystemClock),
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(MIN_CAPACITY),
            )),
            ttl,
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Groups of `username`, from cache when fresh, else from the directory.
    ///
    /// The lock is never held across the remote call.
    pub async fn lookup(&self, username: &str) -> Result<GroupDirectoryEntry, DirectoryError> {
        if let Some(entry) = self.cached(username) {
            debug!(user = %username, "directory cache hit");
            return Ok(entry);
        }

        debug!(user = %username, "directory cache miss");
        let groups = self.client.groups(username).await?;
        let entry = GroupDirectoryEntry {
            username: username.to_string(),
            groups,
            fetched_at: self.clock.now(),
        };
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(username.to_string(), entry.clone());
        }
        Ok(entry)
    }

    /// Get a fresh cached entry without contacting the directory.
    pub fn cached(&self, username: &str) -> Option<GroupDirectoryEntry> {
        let mut entries = self.entries.lock().ok()?;
        let entry = entries.get(username)?.clone();
        if self.is_expired(&entry) {
            // Expired, remove it
            entries.pop(username);
            return None;
        }
        Some(entry)
    }

    /// Drop the entry for one username.
    pub fn invalidate(&self, username: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.pop(username);
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, entry: &GroupDirectoryEntry) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };
        let age = self.clock.now().signed_duration_since(entry.fetched_at);
        age.to_std().map(|age| age >= ttl).unwrap_or(false)
    }
}
