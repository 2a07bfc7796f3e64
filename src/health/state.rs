//! Backend health state machine.
//!
//! # States
//! - Up: last probe connected
//! - Down: last probe failed, or a routing failure was observed
//! - Disabled: administratively excluded
//!
//! # State Transitions
//! ```text
//! (absent) → Up | Down      first probe
//! Up ⇄ Down                 re-probe after the check interval expires
//! (any) → Disabled          explicit disable
//! Disabled → Up | Down      only via explicit enable (forces a probe)
//! ```
//!
//! # Design Decisions
//! - Disabled is sticky: probes never overwrite it
//! - Records are never evicted

use std::fmt;

use chrono::{DateTime, Utc};

/// Health verdict for one backend address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Up,
    Down,
    Disabled,
}

impl HostState {
    /// Map a probe outcome to a state.
    pub fn from_reachable(reachable: bool) -> Self {
        if reachable {
            HostState::Up
        } else {
            HostState::Down
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HostState::Up => "up",
            HostState::Down => "down",
            HostState::Disabled => "disabled",
        }
    }
}

impl fmt::Display for HostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached verdict for one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostRecord {
    pub state: HostState,
    pub checked_at: DateTime<Utc>,
}
