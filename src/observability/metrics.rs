//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sshproxy_commands_total` (counter): commands by name and result
//! - `sshproxy_probes_total` (counter): connectivity probes by result
//! - `sshproxy_active_sessions` (gauge): registry entries
//! - `sshproxy_tracked_hosts` (gauge): tracker records
//! - `sshproxy_open_connections` (gauge): open control connections
//!
//! Without an installed recorder every call here is a no-op, so tests and
//! `--check` runs pay nothing.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_command(command: &'static str, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    counter!("sshproxy_commands_total", "command" => command, "result" => result).increment(1);
}

pub fn record_probe(reachable: bool) {
    let result = if reachable { "up" } else { "down" };
    counter!("sshproxy_probes_total", "result" => result).increment(1);
}

pub fn set_active_sessions(count: usize) {
    gauge!("sshproxy_active_sessions").set(count as f64);
}

pub fn set_tracked_hosts(count: usize) {
    gauge!("sshproxy_tracked_hosts").set(count as f64);
}

pub fn set_open_connections(count: u64) {
    gauge!("sshproxy_open_connections").set(count as f64);
}
