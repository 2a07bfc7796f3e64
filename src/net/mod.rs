//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (one worker per connection)
//!         read one line → RequestHandle::submit → write one frame → close
//! ```
//!
//! # Design Decisions
//! - Bounded accept via semaphore prevents resource exhaustion
//! - Workers never touch daemon state; they only submit and wait
//! - Each connection tracked for graceful shutdown
//! - No authentication: bind to a trusted management address

pub mod connection;
pub mod listener;
