//! Command handlers.
//!
//! # Responsibilities
//! - Execute one parsed [`Command`] against the tracker, registry and router
//! - Separate the client-visible reply from operational diagnostics
//!
//! # Design Decisions
//! - `&mut self` everywhere: only the serializer task ever holds an engine
//! - Diagnostics never change the reply; they are logged by the caller

use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};

use crate::config::ManagerConfig;
use crate::health::{HostState, HostTracker, Probe};
use crate::protocol::{Command, CommandError, InfoCategory, Reply};
use crate::registry::{ConnectionRegistry, RegistryError, SessionKey};
use crate::routing::{AddressError, GroupSource, PolicyResolver, RouteSelector, Router};

/// Operational note attached to a successful command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// `disconnect` for a key with no live sessions.
    UnknownSession(SessionKey),
    /// `enable` for a host that was not disabled.
    NotDisabled(String),
    /// `failure` reported, but a fresh probe found the host up.
    FailureDisputed(String),
    /// `failure` reported for a disabled host; nothing was probed.
    AlreadyDisabled(String),
}

impl Diagnostic {
    /// Emit the diagnostic to the server log.
    pub fn log(&self) {
        match self {
            Diagnostic::UnknownSession(key) => {
                tracing::warn!(session = %key, "Disconnect for unknown session");
            }
            Diagnostic::NotDisabled(host) => {
                tracing::warn!(host = %host, "Enable requested for host that is not disabled");
            }
            Diagnostic::FailureDisputed(host) => {
                tracing::info!(host = %host, "Reported failure not confirmed: host answers probes");
            }
            Diagnostic::AlreadyDisabled(host) => {
                tracing::info!(host = %host, "Reported failure for disabled host");
            }
        }
    }
}

/// Result of a successful command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub reply: Reply,
    pub diagnostic: Option<Diagnostic>,
}

impl Outcome {
    fn reply(reply: Reply) -> Self {
        Self {
            reply,
            diagnostic: None,
        }
    }

    fn ok_with(diagnostic: Option<Diagnostic>) -> Self {
        Self {
            reply: Reply::ok(),
            diagnostic,
        }
    }
}

/// All mutable daemon state plus the routing policy.
pub struct Engine {
    tracker: HostTracker,
    registry: ConnectionRegistry,
    router: Router,
}

impl Engine {
    pub fn new(tracker: HostTracker, router: Router) -> Self {
        Self {
            tracker,
            registry: ConnectionRegistry::new(),
            router,
        }
    }

    /// Build an engine from validated configuration and the given collaborators.
    pub fn from_config(
        config: &ManagerConfig,
        probe: Arc<dyn Probe>,
        groups: Arc<dyn GroupSource>,
        selector: Arc<dyn RouteSelector>,
    ) -> Result<Self, AddressError> {
        let policy = PolicyResolver::from_config(config)?;
        let tracker = HostTracker::new(Duration::from_secs(config.health_check.interval_secs), probe);
        Ok(Self::new(tracker, Router::new(policy, groups, selector)))
    }

    pub async fn execute(&mut self, command: Command) -> Result<Outcome, CommandError> {
        match command {
            Command::Connect { user, target } => self.connect(SessionKey::new(user, target)).await,
            Command::Disconnect { user, target } => Ok(self.disconnect(SessionKey::new(user, target))),
            Command::Disable { host } => Ok(self.disable(&host)),
            Command::Enable { host } => Ok(self.enable(&host).await),
            Command::Failure { host } => Ok(self.failure(&host).await),
            Command::Info(category) => Ok(self.info(category)),
        }
    }

    async fn connect(&mut self, key: SessionKey) -> Result<Outcome, CommandError> {
        let backend = self
            .registry
            .resolve(&key, &mut self.tracker, &self.router)
            .await?;
        Ok(Outcome::reply(Reply::Simple(backend)))
    }

    fn disconnect(&mut self, key: SessionKey) -> Outcome {
        match self.registry.release(&key) {
            Ok(remaining) => {
                tracing::debug!(session = %key, remaining, "Session released");
                Outcome::ok_with(None)
            }
            Err(RegistryError::UnknownSession(key)) => {
                Outcome::ok_with(Some(Diagnostic::UnknownSession(key)))
            }
        }
    }

    fn disable(&mut self, host: &str) -> Outcome {
        self.tracker.update(host, HostState::Disabled, Utc::now());
        Outcome::ok_with(None)
    }

    async fn enable(&mut self, host: &str) -> Outcome {
        if !self.tracker.is_disabled(host) {
            return Outcome::ok_with(Some(Diagnostic::NotDisabled(host.to_string())));
        }
        self.tracker.probe(host).await;
        Outcome::ok_with(None)
    }

    async fn failure(&mut self, host: &str) -> Outcome {
        if self.tracker.is_disabled(host) {
            return Outcome::ok_with(Some(Diagnostic::AlreadyDisabled(host.to_string())));
        }
        if self.tracker.probe(host).await {
            return Outcome::ok_with(Some(Diagnostic::FailureDisputed(host.to_string())));
        }
        Outcome::ok_with(None)
    }

    fn info(&self, category: InfoCategory) -> Outcome {
        let lines: Vec<String> = match category {
            InfoCategory::Connections => self
                .registry
                .snapshot()
                .into_iter()
                .map(|row| {
                    format!(
                        "id={} dest={} n={} ts={}",
                        row.key,
                        row.backend,
                        row.count,
                        row.last_activity.to_rfc3339_opts(SecondsFormat::Secs, true)
                    )
                })
                .collect(),
            InfoCategory::Checks => self
                .tracker
                .snapshot()
                .into_iter()
                .map(|row| {
                    format!(
                        "host={} state={} ts={}",
                        row.addr,
                        row.state,
                        row.checked_at.to_rfc3339_opts(SecondsFormat::Secs, true)
                    )
                })
                .collect(),
        };
        Outcome::reply(Reply::Bulk(lines.join("\n")))
    }

    pub fn tracker(&self) -> &HostTracker {
        &self.tracker
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }
}
