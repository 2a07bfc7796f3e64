//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the control listener for an already-built engine
//! - Start the request serializer, then the acceptor
//! - On shutdown, stop accepting, drain the serializer and open connections
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last: configuration and engine exist before traffic

use std::net::SocketAddr;
use std::time::Duration;

use tokio::task::JoinError;

use crate::config::ManagerConfig;
use crate::dispatch::{Engine, Serializer};
use crate::lifecycle::shutdown::Shutdown;
use crate::net::connection::ConnectionTracker;
use crate::net::listener::{Listener, ListenerError};

/// A bound but not yet serving daemon.
pub struct Daemon {
    listener: Listener,
    engine: Engine,
    read_timeout: Duration,
}

impl Daemon {
    pub async fn bind(config: &ManagerConfig, engine: Engine) -> Result<Self, ListenerError> {
        let listener = Listener::bind(&config.listener).await?;
        Ok(Self {
            listener,
            engine,
            read_timeout: Duration::from_secs(config.timeouts.read_secs),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown` triggers; returns the engine once everything drained.
    pub async fn run(self, shutdown: &Shutdown) -> Result<Engine, JoinError> {
        let (serializer, requests) = Serializer::new(self.engine);
        let serializer = tokio::spawn(serializer.run(shutdown.subscribe()));

        let connections = ConnectionTracker::new();
        self.listener
            .serve(
                requests,
                connections.clone(),
                self.read_timeout,
                shutdown.subscribe(),
            )
            .await;

        if !connections.wait_idle(self.read_timeout).await {
            tracing::warn!(
                open = connections.active_count(),
                "Connections still open after drain deadline"
            );
        }

        let engine = serializer.await?;
        tracing::info!(
            sessions = engine.registry().len(),
            hosts = engine.tracker().snapshot().len(),
            "Daemon stopped; in-memory state discarded"
        );
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::health::probe::testing::ScriptedProbe;
    use crate::routing::{BuiltinSelector, StaticGroups};

    #[tokio::test]
    async fn signal_during_startup_stops_daemon() {
        let mut config =
            crate::config::parse_config("[policy.routes]\ndefault = [\"h1\"]\n").unwrap();
        config.listener.bind_address = "127.0.0.1:0".into();
        let engine = Engine::from_config(
            &config,
            Arc::new(ScriptedProbe::default()),
            Arc::new(StaticGroups::new()),
            Arc::new(BuiltinSelector::new()),
        )
        .unwrap();

        let shutdown = Shutdown::new();
        let daemon = Daemon::bind(&config, engine).await.unwrap();
        shutdown.trigger();

        let engine = tokio::time::timeout(Duration::from_secs(2), daemon.run(&shutdown))
            .await
            .expect("daemon ignored a shutdown triggered before run")
            .unwrap();
        assert!(engine.registry().is_empty());
    }
}
