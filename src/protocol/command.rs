//! Command line parsing.
//!
//! # Grammar
//! ```text
//! connect    <user> <host[:port]>
//! disconnect <user> <host[:port]>
//! disable    <host[:port]>
//! enable     <host[:port]>
//! failure    <host[:port]>
//! info       connections|checks
//! ```
//!
//! Arguments are whitespace separated. Command names are case-insensitive;
//! addresses are normalized here, so handlers only ever see `host:port`.

use std::fmt;

use crate::protocol::error::CommandError;
use crate::routing::normalize_address;

/// What `info` reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoCategory {
    Connections,
    Checks,
}

/// A parsed, validated control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect { user: String, target: String },
    Disconnect { user: String, target: String },
    Disable { host: String },
    Enable { host: String },
    Failure { host: String },
    Info(InfoCategory),
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(CommandError::EmptyCommand)?;
        let args: Vec<&str> = words.collect();

        match name.to_ascii_lowercase().as_str() {
            "connect" => {
                let [user, target] = arity::<2>("connect", &args)?;
                Ok(Command::Connect {
                    user: user.to_string(),
                    target: normalize_address(target)?,
                })
            }
            "disconnect" => {
                let [user, target] = arity::<2>("disconnect", &args)?;
                Ok(Command::Disconnect {
                    user: user.to_string(),
                    target: normalize_address(target)?,
                })
            }
            "disable" => {
                let [host] = arity::<1>("disable", &args)?;
                Ok(Command::Disable {
                    host: normalize_address(host)?,
                })
            }
            "enable" => {
                let [host] = arity::<1>("enable", &args)?;
                Ok(Command::Enable {
                    host: normalize_address(host)?,
                })
            }
            "failure" => {
                let [host] = arity::<1>("failure", &args)?;
                Ok(Command::Failure {
                    host: normalize_address(host)?,
                })
            }
            "info" => {
                let [category] = arity::<1>("info", &args)?;
                match category {
                    "connections" => Ok(Command::Info(InfoCategory::Connections)),
                    "checks" => Ok(Command::Info(InfoCategory::Checks)),
                    other => Err(CommandError::UnknownParameter(other.to_string())),
                }
            }
            _ => Err(CommandError::UnknownCommand(name.to_string())),
        }
    }

    /// Command name, used as a metrics label.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Connect { .. } => "connect",
            Command::Disconnect { .. } => "disconnect",
            Command::Disable { .. } => "disable",
            Command::Enable { .. } => "enable",
            Command::Failure { .. } => "failure",
            Command::Info(_) => "info",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Connect { user, target } => write!(f, "connect {} {}", user, target),
            Command::Disconnect { user, target } => write!(f, "disconnect {} {}", user, target),
            Command::Disable { host } => write!(f, "disable {}", host),
            Command::Enable { host } => write!(f, "enable {}", host),
            Command::Failure { host } => write!(f, "failure {}", host),
            Command::Info(InfoCategory::Connections) => f.write_str("info connections"),
            Command::Info(InfoCategory::Checks) => f.write_str("info checks"),
        }
    }
}

fn arity<'a, const N: usize>(command: &'static str, args: &[&'a str]) -> Result<[&'a str; N], CommandError> {
    if args.len() < N {
        return Err(CommandError::NotEnoughArguments { command, expected: N });
    }
    <[&str; N]>::try_from(args).map_err(|_| CommandError::TooManyArguments { command, expected: N })
}
