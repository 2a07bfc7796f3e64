//! Cached per-backend health verdicts.
//!
//! # Responsibilities
//! - Answer "is this backend reachable?" from cache when fresh
//! - Re-probe when a verdict is missing or older than the check interval
//! - Record administrative disable/enable and observed routing failures

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::health::probe::Probe;
use crate::health::state::{HostRecord, HostState};
use crate::observability::metrics;
use crate::routing::select::HealthCheck;

/// One row of `info checks`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSnapshot {
    pub addr: String,
    pub state: HostState,
    pub checked_at: DateTime<Utc>,
}

/// Owns every [`HostRecord`]. Only the request serializer holds one.
pub struct HostTracker {
    hosts: HashMap<String, HostRecord>,
    interval: Duration,
    probe: Arc<dyn Probe>,
}

impl HostTracker {
    pub fn new(interval: Duration, probe: Arc<dyn Probe>) -> Self {
        Self {
            hosts: HashMap::new(),
            interval,
            probe,
        }
    }

    /// Whether `addr` is currently considered reachable, probing if needed.
    pub async fn check(&mut self, addr: &str) -> bool {
        self.check_at(addr, Utc::now()).await
    }

    async fn check_at(&mut self, addr: &str, now: DateTime<Utc>) -> bool {
        let cached = self.hosts.get(addr).copied();
        match cached {
            Some(record) if record.state == HostState::Disabled => false,
            Some(record) if !self.is_stale(&record, now) => record.state == HostState::Up,
            _ => self.probe(addr).await,
        }
    }

    /// Probe `addr` now and record the verdict, ignoring cache age.
    ///
    /// Callers are responsible for not probing a disabled host.
    pub async fn probe(&mut self, addr: &str) -> bool {
        let reachable = self.probe.can_connect(addr).await;
        metrics::record_probe(reachable);
        tracing::debug!(addr = %addr, reachable, "Probed backend");
        self.update(addr, HostState::from_reachable(reachable), Utc::now());
        reachable
    }

    /// Overwrite (or create) the record for `addr`.
    pub fn update(&mut self, addr: &str, state: HostState, at: DateTime<Utc>) {
        let previous = self
            .hosts
            .insert(addr.to_string(), HostRecord { state, checked_at: at })
            .map(|r| r.state);
        if previous != Some(state) {
            tracing::info!(addr = %addr, from = ?previous, to = %state, "Host state changed");
        }
        metrics::set_tracked_hosts(self.hosts.len());
    }

    pub fn is_disabled(&self, addr: &str) -> bool {
        self.hosts
            .get(addr)
            .is_some_and(|r| r.state == HostState::Disabled)
    }

    pub fn get(&self, addr: &str) -> Option<&HostRecord> {
        self.hosts.get(addr)
    }

    /// All records, sorted by address.
    pub fn snapshot(&self) -> Vec<HostSnapshot> {
        let mut rows: Vec<HostSnapshot> = self
            .hosts
            .iter()
            .map(|(addr, record)| HostSnapshot {
                addr: addr.clone(),
                state: record.state,
                checked_at: record.checked_at,
            })
            .collect();
        rows.sort_by(|a, b| a.addr.cmp(&b.addr));
        rows
    }

    fn is_stale(&self, record: &HostRecord, now: DateTime<Utc>) -> bool {
        // A clock that moved backwards counts as stale.
        (now - record.checked_at)
            .to_std()
            .map_or(true, |age| age > self.interval)
    }
}

#[async_trait]
impl HealthCheck for HostTracker {
    async fn is_reachable(&mut self, addr: &str) -> bool {
        self.check(addr).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::probe::testing::ScriptedProbe;

    const INTERVAL: Duration = Duration::from_secs(60);

    fn tracker() -> (HostTracker, Arc<ScriptedProbe>) {
        let probe = Arc::new(ScriptedProbe::default());
        (HostTracker::new(INTERVAL, probe.clone()), probe)
    }

    #[tokio::test]
    async fn first_check_probes_once_then_caches() {
        let (mut tracker, probe) = tracker();
        assert!(tracker.check("h1:22").await);
        assert_eq!(probe.calls(), 1);

        // Verdict is cached even though the backend went away.
        probe.set_down("h1:22", true);
        assert!(tracker.check("h1:22").await);
        assert!(tracker.check("h1:22").await);
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test]
    async fn stale_verdict_is_reprobed() {
        let (mut tracker, probe) = tracker();
        assert!(tracker.check("h1:22").await);
        probe.set_down("h1:22", true);

        let later = Utc::now() + chrono::Duration::seconds(61);
        assert!(!tracker.check_at("h1:22", later).await);
        assert_eq!(probe.calls(), 2);
        assert_eq!(tracker.get("h1:22").unwrap().state, HostState::Down);
    }

    #[tokio::test]
    async fn disabled_is_never_probed() {
        let (mut tracker, probe) = tracker();
        assert!(tracker.check("h1:22").await);
        tracker.update("h1:22", HostState::Disabled, Utc::now());

        assert!(!tracker.check("h1:22").await);
        let much_later = Utc::now() + chrono::Duration::days(1);
        assert!(!tracker.check_at("h1:22", much_later).await);
        assert_eq!(probe.calls(), 1);
        assert!(tracker.is_disabled("h1:22"));
    }

    #[tokio::test]
    async fn update_creates_record() {
        let (mut tracker, probe) = tracker();
        assert!(!tracker.is_disabled("h2:22"));
        tracker.update("h2:22", HostState::Down, Utc::now());
        assert!(!tracker.check("h2:22").await);
        assert_eq!(probe.calls(), 0);
        assert_eq!(tracker.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn snapshot_is_sorted() {
        let (mut tracker, _probe) = tracker();
        tracker.check("b:22").await;
        tracker.check("a:22").await;
        let rows = tracker.snapshot();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].addr, "a:22");
        assert_eq!(rows[1].state, HostState::Up);
    }
}
