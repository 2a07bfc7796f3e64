//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build engine → Start serializer → Accept
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain serializer → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then engine, then listener
//! - Ordered shutdown: stop accept, drain, close
//! - Connection drain is bounded by the read timeout
//! - Nothing is persisted: a restart starts with empty health and session state

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::Daemon;
