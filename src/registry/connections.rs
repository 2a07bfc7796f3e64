//! Per-(user, target) session bookkeeping with sticky routing.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::health::{HostState, HostTracker};
use crate::observability::metrics;
use crate::routing::{Router, RoutingError};

/// Error type for registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("no active session for {0}")]
    UnknownSession(SessionKey),
}

/// Identity of a session entry: who connected to which target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    pub user: String,
    pub target: String,
}

impl SessionKey {
    pub fn new(user: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.target)
    }
}

/// Assigned backend and number of live sessions for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    pub backend: String,
    pub count: usize,
    pub last_activity: DateTime<Utc>,
}

/// One row of `info connections`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub key: SessionKey,
    pub backend: String,
    pub count: usize,
    pub last_activity: DateTime<Utc>,
}

/// Owns every [`SessionEntry`]. An entry with a zero count never exists.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: HashMap<SessionKey, SessionEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend for a new session on `key`.
    ///
    /// Reuses the assigned backend while the tracker reports it healthy.
    /// Otherwise marks it down (unless disabled) and routes afresh, replacing
    /// the stale entry with a count of one.
    pub async fn resolve(
        &mut self,
        key: &SessionKey,
        tracker: &mut HostTracker,
        router: &Router,
    ) -> Result<String, RoutingError> {
        if let Some(backend) = self.reuse(key, tracker).await {
            return Ok(backend);
        }

        let backend = router.route(&key.user, &key.target, tracker).await?;
        tracing::info!(session = %key, backend = %backend, "Assigned backend");
        self.entries.insert(
            key.clone(),
            SessionEntry {
                backend: backend.clone(),
                count: 1,
                last_activity: Utc::now(),
            },
        );
        metrics::set_active_sessions(self.entries.len());
        Ok(backend)
    }

    async fn reuse(&mut self, key: &SessionKey, tracker: &mut HostTracker) -> Option<String> {
        let entry = self.entries.get_mut(key)?;
        if tracker.check(&entry.backend).await {
            entry.count += 1;
            entry.last_activity = Utc::now();
            tracing::debug!(session = %key, backend = %entry.backend, count = entry.count, "Reusing sticky backend");
            return Some(entry.backend.clone());
        }

        tracing::warn!(session = %key, backend = %entry.backend, "Sticky backend unhealthy, rerouting");
        if !tracker.is_disabled(&entry.backend) {
            tracker.update(&entry.backend, HostState::Down, Utc::now());
        }
        None
    }

    /// End one session on `key`, returning the remaining count.
    pub fn release(&mut self, key: &SessionKey) -> Result<usize, RegistryError> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| RegistryError::UnknownSession(key.clone()))?;

        entry.count -= 1;
        let remaining = entry.count;
        if remaining == 0 {
            self.entries.remove(key);
            metrics::set_active_sessions(self.entries.len());
        } else {
            entry.last_activity = Utc::now();
        }
        Ok(remaining)
    }

    pub fn get(&self, key: &SessionKey) -> Option<&SessionEntry> {
        self.entries.get(key)
    }

    /// All entries, sorted by key.
    pub fn snapshot(&self) -> Vec<SessionSnapshot> {
        let mut rows: Vec<SessionSnapshot> = self
            .entries
            .iter()
            .map(|(key, entry)| SessionSnapshot {
                key: key.clone(),
                backend: entry.backend.clone(),
                count: entry.count,
                last_activity: entry.last_activity,
            })
            .collect();
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        rows
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
