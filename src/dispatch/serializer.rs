//! Single-consumer request loop.
//!
//! # Responsibilities
//! - Accept raw command lines from any number of connection workers
//! - Run them one at a time against the [`Engine`]
//! - Send each result back on the request's own oneshot channel
//!
//! # Design Decisions
//! - The engine is moved into the loop: no other task can reach it
//! - Handoff queue holds a single request, so submitters wait their turn
//! - On shutdown the queue is closed and already accepted requests drain

use tokio::sync::{mpsc, oneshot};

use crate::dispatch::engine::Engine;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::protocol::{Command, CommandError, Reply};

/// One command line awaiting execution.
#[derive(Debug)]
pub struct Request {
    pub line: String,
    pub respond_to: oneshot::Sender<Result<Reply, CommandError>>,
}

/// Cloneable submission side of the serializer.
#[derive(Debug, Clone)]
pub struct RequestHandle {
    tx: mpsc::Sender<Request>,
}

impl RequestHandle {
    /// Submit a line and wait for its result.
    pub async fn submit(&self, line: impl Into<String>) -> Result<Reply, CommandError> {
        let (respond_to, response) = oneshot::channel();
        let request = Request {
            line: line.into(),
            respond_to,
        };

        self.tx
            .send(request)
            .await
            .map_err(|_| CommandError::Unavailable)?;

        response.await.map_err(|_| CommandError::Unavailable)?
    }
}

/// Owner of the engine and the receiving end of the handoff.
pub struct Serializer {
    engine: Engine,
    requests: mpsc::Receiver<Request>,
}

impl Serializer {
    pub fn new(engine: Engine) -> (Self, RequestHandle) {
        let (tx, requests) = mpsc::channel(1);
        (Self { engine, requests }, RequestHandle { tx })
    }

    /// Process requests until shutdown (or every handle is dropped), then
    /// return the engine.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) -> Engine {
        tracing::info!("Request serializer started");
        let mut draining = false;

        loop {
            tokio::select! {
                request = self.requests.recv() => match request {
                    Some(request) => self.process(request).await,
                    None => break,
                },
                _ = shutdown.recv(), if !draining => {
                    tracing::info!("Serializer received shutdown signal, draining accepted requests");
                    draining = true;
                    self.requests.close();
                }
            }
        }

        tracing::info!("Request serializer stopped");
        self.engine
    }

    async fn process(&mut self, request: Request) {
        let Request { line, respond_to } = request;

        let result = match Command::parse(&line) {
            Ok(command) => {
                let name = command.name();
                tracing::debug!(command = %command, "Executing command");
                let result = self.engine.execute(command).await;
                metrics::record_command(name, result.is_ok());
                result
            }
            Err(e) => {
                metrics::record_command("invalid", false);
                Err(e)
            }
        };

        let result = match result {
            Ok(outcome) => {
                if let Some(diagnostic) = &outcome.diagnostic {
                    diagnostic.log();
                }
                Ok(outcome.reply)
            }
            Err(e) => {
                tracing::warn!(line = %line.trim(), error = %e, "Command failed");
                Err(e)
            }
        };

        if respond_to.send(result).is_err() {
            tracing::debug!(line = %line.trim(), "Client gone before reply, discarding result");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::health::probe::testing::ScriptedProbe;
    use crate::lifecycle::Shutdown;
    use crate::registry::SessionKey;
    use crate::routing::{BuiltinSelector, StaticGroups};

    fn engine() -> Engine {
        let config = crate::config::parse_config("[policy.routes]\ndefault = [\"h1\"]\n").unwrap();
        Engine::from_config(
            &config,
            Arc::new(ScriptedProbe::default()),
            Arc::new(StaticGroups::new().with_user("alice", ["users"])),
            Arc::new(BuiltinSelector::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn concurrent_submissions_are_serialized() {
        let shutdown = Shutdown::new();
        let (serializer, handle) = Serializer::new(engine());
        let task = tokio::spawn(serializer.run(shutdown.subscribe()));

        let mut joins = Vec::new();
        for _ in 0..50 {
            let handle = handle.clone();
            joins.push(tokio::spawn(async move { handle.submit("connect alice svc").await }));
        }
        for join in joins {
            assert_eq!(join.await.unwrap(), Ok(Reply::Simple("h1:22".into())));
        }

        drop(handle);
        let engine = task.await.unwrap();
        let key = SessionKey::new("alice", "svc:22");
        assert_eq!(engine.registry().get(&key).unwrap().count, 50);
    }

    #[tokio::test]
    async fn errors_come_back_on_the_request_channel() {
        let shutdown = Shutdown::new();
        let (serializer, handle) = Serializer::new(engine());
        tokio::spawn(serializer.run(shutdown.subscribe()));

        assert_eq!(
            handle.submit("bogus").await,
            Err(CommandError::UnknownCommand("bogus".into()))
        );
        assert_eq!(handle.submit("disconnect alice svc").await, Ok(Reply::ok()));
    }

    #[tokio::test]
    async fn shutdown_refuses_new_requests() {
        let shutdown = Shutdown::new();
        let (serializer, handle) = Serializer::new(engine());
        let task = tokio::spawn(serializer.run(shutdown.subscribe()));

        assert!(handle.submit("info checks").await.is_ok());
        shutdown.trigger();
        task.await.unwrap();

        assert_eq!(handle.submit("info checks").await, Err(CommandError::Unavailable));
    }

    #[tokio::test]
    async fn shutdown_before_start_still_stops() {
        let shutdown = Shutdown::new();
        shutdown.trigger();

        let (serializer, handle) = Serializer::new(engine());
        let stopped = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            serializer.run(shutdown.subscribe()),
        )
        .await;
        assert!(stopped.is_ok(), "serializer ignored an earlier shutdown");
        assert_eq!(handle.submit("info checks").await, Err(CommandError::Unavailable));
    }
}
