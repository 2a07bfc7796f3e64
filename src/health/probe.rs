//! Connectivity probing.
//!
//! # Responsibilities
//! - Decide whether a backend currently accepts TCP connections
//! - Bound every attempt with a timeout
//!
//! The tracker is the only caller; a probe never touches cached state itself.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time;

/// Capability to test whether a backend address is reachable.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn can_connect(&self, addr: &str) -> bool;
}

/// Probes by opening (and immediately dropping) a TCP connection.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn can_connect(&self, addr: &str) -> bool {
        match time::timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                tracing::debug!(addr = %addr, error = %e, "Probe failed: connection error");
                false
            }
            Err(_) => {
                tracing::debug!(addr = %addr, "Probe failed: timeout");
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Probe whose answers are set by the test; counts every call.
    #[derive(Debug, Default)]
    pub struct ScriptedProbe {
        down: Mutex<HashSet<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedProbe {
        pub fn set_down(&self, addr: &str, down: bool) {
            let mut set = self.down.lock().unwrap();
            if down {
                set.insert(addr.to_string());
            } else {
                set.remove(addr);
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Probe for ScriptedProbe {
        async fn can_connect(&self, addr: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            !self.down.lock().unwrap().contains(addr)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn tcp_probe_detects_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let probe = TcpProbe::new(Duration::from_secs(1));
        assert!(probe.can_connect(&addr).await);

        drop(listener);
        assert!(!probe.can_connect(&addr).await);
    }
}
