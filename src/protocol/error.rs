//! Errors surfaced to control clients as `-ERR` lines.

use crate::routing::{AddressError, RoutingError};

/// Anything that aborts a command. Sent to the client, then the connection closes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    EmptyCommand,

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("not enough parameters for '{command}' (expected {expected})")]
    NotEnoughArguments { command: &'static str, expected: usize },

    #[error("too many parameters for '{command}' (expected {expected})")]
    TooManyArguments { command: &'static str, expected: usize },

    #[error("invalid host: {0}")]
    InvalidHost(#[from] AddressError),

    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("service shutting down")]
    Unavailable,
}
