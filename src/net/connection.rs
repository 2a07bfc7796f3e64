//! Per-connection worker and lifecycle tracking.
//!
//! # Responsibilities
//! - Read exactly one command line, submit it, write exactly one frame
//! - Generate unique connection IDs for tracing
//! - Count open connections so shutdown can wait for them

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::{self, Instant};

use crate::dispatch::RequestHandle;
use crate::observability::metrics;
use crate::protocol::encode_error;

/// Longest accepted command line, terminator included.
pub const MAX_LINE_BYTES: usize = 4096;

/// Global atomic counter for connection IDs.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Tracks open control connections for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new open connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        let count = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_open_connections(count);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::new(),
        }
    }

    /// Get current open connection count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until every connection has closed, or `deadline` passes.
    ///
    /// Returns whether all connections closed in time.
    pub async fn wait_idle(&self, deadline: Duration) -> bool {
        let give_up = Instant::now() + deadline;
        while self.active_count() > 0 {
            if Instant::now() >= give_up {
                return false;
            }
            time::sleep(Duration::from_millis(50)).await;
        }
        true
    }
}

/// Guard that tracks a connection's lifetime.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let remaining = self.active_count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_open_connections(remaining);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}

/// Serve one control connection: one line in, one frame out, then close.
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    requests: RequestHandle,
    read_timeout: Duration,
    guard: ConnectionGuard,
) {
    let id = guard.id();
    let (reader, mut writer) = stream.into_split();

    let line = match time::timeout(read_timeout, read_command_line(reader)).await {
        Ok(Ok(Some(line))) => line,
        Ok(Ok(None)) => {
            tracing::debug!(connection_id = %id, peer = %peer, "Connection closed without a command");
            return;
        }
        Ok(Err(e)) => {
            tracing::warn!(connection_id = %id, peer = %peer, error = %e, "Failed to read command");
            return;
        }
        Err(_) => {
            tracing::warn!(connection_id = %id, peer = %peer, "Timed out waiting for command");
            return;
        }
    };

    tracing::debug!(connection_id = %id, peer = %peer, line = %line, "Command received");

    let frame = match requests.submit(line).await {
        Ok(reply) => reply.encode(),
        Err(e) => encode_error(&e.to_string()),
    };

    if let Err(e) = writer.write_all(&frame).await {
        tracing::debug!(connection_id = %id, peer = %peer, error = %e, "Client gone before reply");
        return;
    }
    let _ = writer.shutdown().await;
}

/// Read up to the first `\n`. `None` means the peer closed without sending anything.
async fn read_command_line<R>(reader: R) -> std::io::Result<Option<String>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut limited = BufReader::new(reader).take(MAX_LINE_BYTES as u64);
    let mut buf = Vec::with_capacity(128);
    let read = limited.read_until(b'\n', &mut buf).await?;
    if read == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') && buf.len() >= MAX_LINE_BYTES {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "command line too long",
        ));
    }

    let line = String::from_utf8(buf)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id1.to_string().starts_with("conn-"));
    }

    #[test]
    fn connection_tracker_counts() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.track();
        let guard2 = tracker.track();
        assert_eq!(tracker.active_count(), 2);

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);
        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn wait_idle_times_out_with_open_connection() {
        let tracker = ConnectionTracker::new();
        let guard = tracker.track();
        assert!(!tracker.wait_idle(Duration::from_millis(100)).await);
        drop(guard);
        assert!(tracker.wait_idle(Duration::from_millis(100)).await);
    }

    #[tokio::test]
    async fn reads_one_line() {
        let input: &[u8] = b"connect alice db1\r\ninfo checks\n";
        assert_eq!(
            read_command_line(input).await.unwrap(),
            Some("connect alice db1".to_string())
        );
        let empty: &[u8] = b"";
        assert_eq!(read_command_line(empty).await.unwrap(), None);
        let unterminated: &[u8] = b"info checks";
        assert_eq!(
            read_command_line(unterminated).await.unwrap(),
            Some("info checks".to_string())
        );
    }

    #[tokio::test]
    async fn rejects_overlong_line() {
        let input = vec![b'a'; MAX_LINE_BYTES + 10];
        let err = read_command_line(input.as_slice()).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn rejects_invalid_utf8() {
        let input: &[u8] = b"connect \xff\xfe db1\n";
        let err = read_command_line(input).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
