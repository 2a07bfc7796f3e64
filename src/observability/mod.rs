//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stderr, captured by the service manager
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```
//!
//! # Design Decisions
//! - Diagnostics from handlers (unknown session, disputed failure) are
//!   log events, never client-visible errors
//! - Metrics are off by default; the control port is the primary interface

pub mod logging;
pub mod metrics;
