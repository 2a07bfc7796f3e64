//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the manager daemon.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::routing::select::Algorithm;

/// Root configuration for the manager daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ManagerConfig {
    /// Control listener configuration.
    pub listener: ListenerConfig,

    /// Host health cache settings.
    pub health_check: HealthCheckConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Global routing policy (the base layer).
    pub policy: PolicyConfig,

    /// Group-level policy overrides, keyed by OS group name.
    pub groups: BTreeMap<String, LayerConfig>,

    /// User-level policy overrides, keyed by user name.
    pub users: BTreeMap<String, LayerConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:55555").
    pub bind_address: String,

    /// Maximum concurrently open control connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:55555".to_string(),
            max_connections: 1024,
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// How long a cached up/down verdict stays valid, in seconds.
    pub interval_secs: u64,

    /// Connect timeout for a single probe, in seconds.
    pub probe_timeout_secs: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval_secs: 600,
            probe_timeout_secs: 1,
        }
    }
}

/// Timeout configuration for control connections.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long to wait for a client's command line, in seconds.
    pub read_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { read_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9191".to_string(),
        }
    }
}

/// The global policy layer. Unlike group and user layers it always has an algorithm.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PolicyConfig {
    /// Route selection algorithm.
    pub route_select: Algorithm,

    /// Target address (or `default`) to ordered destination list.
    pub routes: BTreeMap<String, Vec<String>>,
}

/// A group or user override layer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LayerConfig {
    /// Overrides the algorithm when set.
    pub route_select: Option<Algorithm>,

    /// Overrides the destination list for matching targets.
    pub routes: BTreeMap<String, Vec<String>>,
}
