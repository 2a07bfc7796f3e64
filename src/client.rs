//! Client for the control protocol.
//!
//! Used by `sshproxyctl` and by the integration tests. Each call opens a
//! fresh connection, since the daemon answers one command per connection.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time;

/// Error type for client calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out waiting for the daemon")]
    Timeout,

    /// The daemon answered `-ERR`.
    #[error("{0}")]
    Server(String),

    #[error("malformed response: {0}")]
    Protocol(String),
}

pub struct ManagerClient {
    addr: String,
    timeout: Duration,
}

impl ManagerClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the backend for a new session.
    pub async fn connect(&self, user: &str, host: &str) -> Result<String, ClientError> {
        self.send(&format!("connect {} {}", user, host)).await
    }

    pub async fn disconnect(&self, user: &str, host: &str) -> Result<String, ClientError> {
        self.send(&format!("disconnect {} {}", user, host)).await
    }

    pub async fn disable(&self, host: &str) -> Result<String, ClientError> {
        self.send(&format!("disable {}", host)).await
    }

    pub async fn enable(&self, host: &str) -> Result<String, ClientError> {
        self.send(&format!("enable {}", host)).await
    }

    pub async fn failure(&self, host: &str) -> Result<String, ClientError> {
        self.send(&format!("failure {}", host)).await
    }

    /// `info connections` or `info checks`.
    pub async fn info(&self, category: &str) -> Result<String, ClientError> {
        self.send(&format!("info {}", category)).await
    }

    /// Send one raw command line and return the decoded payload.
    pub async fn send(&self, line: &str) -> Result<String, ClientError> {
        let raw = time::timeout(self.timeout, self.exchange(line))
            .await
            .map_err(|_| ClientError::Timeout)??;
        decode_response(&raw)
    }

    async fn exchange(&self, line: &str) -> Result<Vec<u8>, std::io::Error> {
        let mut stream = TcpStream::connect(&self.addr).await?;
        stream.write_all(line.as_bytes()).await?;
        stream.write_all(b"\n").await?;

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).await?;
        Ok(raw)
    }
}

/// Decode one response frame into its payload.
pub fn decode_response(raw: &[u8]) -> Result<String, ClientError> {
    let text = std::str::from_utf8(raw).map_err(|e| ClientError::Protocol(e.to_string()))?;
    let body = text
        .strip_suffix("\r\n")
        .ok_or_else(|| ClientError::Protocol("missing CRLF terminator".to_string()))?;

    match body.as_bytes().first() {
        Some(b'+') => Ok(body[1..].to_string()),
        Some(b'-') => {
            let message = body[1..].strip_prefix("ERR ").unwrap_or(&body[1..]);
            Err(ClientError::Server(message.to_string()))
        }
        Some(b'$') => {
            let (len, payload) = body[1..]
                .split_once("\r\n")
                .ok_or_else(|| ClientError::Protocol("bulk frame without length line".to_string()))?;
            let len: usize = len
                .parse()
                .map_err(|_| ClientError::Protocol(format!("bad bulk length '{}'", len)))?;
            if payload.len() != len {
                return Err(ClientError::Protocol(format!(
                    "bulk length {} but {} bytes received",
                    len,
                    payload.len()
                )));
            }
            Ok(payload.to_string())
        }
        _ => Err(ClientError::Protocol(format!("unexpected frame '{}'", body))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_all_frame_kinds() {
        assert_eq!(decode_response(b"+OK\r\n").unwrap(), "OK");
        assert_eq!(decode_response(b"$0\r\n\r\n").unwrap(), "");
        assert_eq!(decode_response(b"$5\r\na\r\nbc\r\n").unwrap(), "a\r\nbc");
        assert!(matches!(
            decode_response(b"-ERR unknown command 'x'\r\n"),
            Err(ClientError::Server(m)) if m == "unknown command 'x'"
        ));
    }

    #[test]
    fn rejects_malformed_frames() {
        assert!(matches!(decode_response(b"+OK"), Err(ClientError::Protocol(_))));
        assert!(matches!(decode_response(b"$9\r\nabc\r\n"), Err(ClientError::Protocol(_))));
        assert!(matches!(decode_response(b"?\r\n"), Err(ClientError::Protocol(_))));
        assert!(matches!(decode_response(b""), Err(ClientError::Protocol(_))));
    }
}
