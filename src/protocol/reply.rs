//! Wire framing for responses.
//!
//! ```text
//! +<text>\r\n                 simple success
//! -ERR <message>\r\n          failure
//! $<len>\r\n<payload>\r\n     bulk payload (may span lines)
//! ```
//!
//! Every frame gets exactly one trailing `\r\n` from [`frame`].

/// Successful command result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Simple(String),
    Bulk(String),
}

impl Reply {
    /// The acknowledgement used by commands with nothing to return.
    pub fn ok() -> Self {
        Reply::Simple("OK".to_string())
    }

    /// Encode as a complete frame.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Reply::Simple(text) => frame(format!("+{}", single_line(text))),
            Reply::Bulk(payload) => frame(format!("${}\r\n{}", payload.len(), payload)),
        }
    }
}

/// Encode an error message as a complete frame.
pub fn encode_error(message: &str) -> Vec<u8> {
    frame(format!("-ERR {}", single_line(message)))
}

fn frame(body: String) -> Vec<u8> {
    let mut bytes = body.into_bytes();
    bytes.extend_from_slice(b"\r\n");
    bytes
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_frame() {
        assert_eq!(Reply::Simple("db-primary:5432".into()).encode(), b"+db-primary:5432\r\n");
        assert_eq!(Reply::ok().encode(), b"+OK\r\n");
    }

    #[test]
    fn bulk_frame() {
        assert_eq!(Reply::Bulk("a\nb".into()).encode(), b"$3\r\na\nb\r\n");
        assert_eq!(Reply::Bulk(String::new()).encode(), b"$0\r\n\r\n");
    }

    #[test]
    fn error_frame_stays_on_one_line() {
        assert_eq!(encode_error("unknown command 'x'"), b"-ERR unknown command 'x'\r\n");
        assert_eq!(encode_error("a\r\nb"), b"-ERR a  b\r\n");
    }
}
