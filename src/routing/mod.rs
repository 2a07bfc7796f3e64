//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! connect(user, target)
//!     → address.rs (normalize target to host:port)
//!     → groups.rs (user → group set)
//!     → policy.rs (global → groups → user fold)
//!     → select.rs (algorithm + candidates + health → backend)
//!     → router.rs ties the above together
//! ```
//!
//! # Design Decisions
//! - Policy tables compiled at startup, immutable at runtime
//! - Deterministic: groups fold in name order
//! - Selection only sees reachability, never raw tracker state

pub mod address;
pub mod groups;
pub mod policy;
pub mod router;
pub mod select;

pub use address::{normalize_address, AddressError};
pub use groups::{GroupError, GroupSource, StaticGroups, SystemGroups};
pub use policy::{EffectivePolicy, PolicyLayer, PolicyResolver};
pub use router::{Router, RoutingError};
pub use select::{Algorithm, BuiltinSelector, HealthCheck, RouteError, RouteSelector};
