//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Lazy checks (tracker.rs):
//!     Routing asks "is X reachable?"
//!     → cached verdict if younger than the check interval
//!     → otherwise probe.rs, record verdict in state.rs
//!
//! Administrative and reported changes (tracker.rs):
//!     disable / enable / failure report / dead sticky backend
//!     → overwrite the record directly
//! ```
//!
//! # Design Decisions
//! - No background prober: verdicts refresh only when someone asks
//! - Health state is per backend address, shared across all users
//! - The tracker is owned by the request serializer, so it has no locks

pub mod probe;
pub mod state;
pub mod tracker;

pub use probe::{Probe, TcpProbe};
pub use state::{HostRecord, HostState};
pub use tracker::{HostSnapshot, HostTracker};
