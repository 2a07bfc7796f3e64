//! Routing-decision and host-health daemon for a fleet of SSH session proxies.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod health;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod protocol;
pub mod registry;
pub mod routing;

pub use config::ManagerConfig;
pub use dispatch::Engine;
pub use lifecycle::{Daemon, Shutdown};
