//! Command dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! connection workers (many)
//!     → RequestHandle::submit(line)     bounded handoff, waits for a slot
//!     → serializer.rs (single task)     parse, execute, log diagnostics
//!     → engine.rs                       tracker / registry / router
//!     → oneshot reply back to the worker
//! ```
//!
//! # Design Decisions
//! - Exactly one task mutates daemon state: compound check-then-update
//!   handlers are atomic without locks
//! - A slow probe stalls every client; probes carry their own timeout
//! - No cancellation once a request is accepted

pub mod engine;
pub mod serializer;

pub use engine::{Diagnostic, Engine, Outcome};
pub use serializer::{Request, RequestHandle, Serializer};
