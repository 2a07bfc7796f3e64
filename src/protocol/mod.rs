//! Control protocol.
//!
//! # Data Flow
//! ```text
//! "connect alice db1\n"
//!     → command.rs (split, arity, address normalization)
//!     → Command handed to the dispatcher
//!     → Result<Reply, CommandError>
//!     → reply.rs (+text / $len bulk / -ERR message, CRLF terminated)
//! ```
//!
//! # Design Decisions
//! - One command per connection, one frame back
//! - Framing borrowed from the Redis serialization protocol
//! - Malformed input is rejected before any state is touched

pub mod command;
pub mod error;
pub mod reply;

pub use command::{Command, InfoCategory};
pub use error::CommandError;
pub use reply::{encode_error, Reply};
