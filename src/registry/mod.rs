//! Connection registry subsystem.
//!
//! # Data Flow
//! ```text
//! connect(user, target):
//!     entry exists and backend healthy → count += 1, same backend
//!     entry missing or backend unhealthy → Router picks anew, count = 1
//!
//! disconnect(user, target):
//!     count -= 1, entry removed the moment it reaches zero
//! ```
//!
//! # Design Decisions
//! - Keyed by (user, target), not by backend
//! - Entries bounded by live sessions; nothing to expire
//! - Owned by the request serializer, so no locking

pub mod connections;

pub use connections::{ConnectionRegistry, RegistryError, SessionEntry, SessionKey, SessionSnapshot};
