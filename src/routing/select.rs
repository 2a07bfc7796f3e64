//! Route selection strategies.
//!
//! A selector picks one backend out of an ordered candidate list. It only sees
//! the [`HealthCheck`] capability, never the tracker itself, so asking about a
//! candidate may trigger a probe but cannot change anything else.

use std::fmt;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Reachability query handed to selectors.
#[async_trait]
pub trait HealthCheck: Send {
    async fn is_reachable(&mut self, addr: &str) -> bool;
}

/// Error type for route selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("no candidate available")]
    NoCandidate,
}

/// Named selection algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// First reachable candidate in configured order.
    #[default]
    Ordered,
    /// First reachable candidate after shuffling.
    Random,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Ordered => f.write_str("ordered"),
            Algorithm::Random => f.write_str("random"),
        }
    }
}

/// Picks a backend for a new session.
#[async_trait]
pub trait RouteSelector: Send + Sync {
    async fn select(
        &self,
        algorithm: Algorithm,
        candidates: &[String],
        health: &mut dyn HealthCheck,
    ) -> Result<String, RouteError>;
}

/// Selector implementing every [`Algorithm`].
#[derive(Debug, Default)]
pub struct BuiltinSelector;

impl BuiltinSelector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RouteSelector for BuiltinSelector {
    async fn select(
        &self,
        algorithm: Algorithm,
        candidates: &[String],
        health: &mut dyn HealthCheck,
    ) -> Result<String, RouteError> {
        let mut order: Vec<&String> = candidates.iter().collect();
        if algorithm == Algorithm::Random {
            order.shuffle(&mut rand::thread_rng());
        }

        for candidate in order {
            if health.is_reachable(candidate).await {
                return Ok(candidate.clone());
            }
            tracing::debug!(candidate = %candidate, %algorithm, "Skipping unreachable candidate");
        }
        Err(RouteError::NoCandidate)
    }
}
