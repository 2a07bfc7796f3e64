//! Shared utilities for integration tests.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::{JoinError, JoinHandle};

use sshproxy_manager::client::ManagerClient;
use sshproxy_manager::config::parse_config;
use sshproxy_manager::health::Probe;
use sshproxy_manager::routing::{BuiltinSelector, StaticGroups};
use sshproxy_manager::{Daemon, Engine, Shutdown};

/// Probe that reports every address up unless told otherwise.
#[derive(Debug, Default)]
pub struct TestProbe {
    down: Mutex<HashSet<String>>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl TestProbe {
    pub fn set_down(&self, addr: &str) {
        self.down.lock().unwrap().insert(addr.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for TestProbe {
    async fn can_connect(&self, addr: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        !self.down.lock().unwrap().contains(addr)
    }
}

/// A daemon running on an ephemeral port.
pub struct TestDaemon {
    pub addr: SocketAddr,
    pub probe: Arc<TestProbe>,
    shutdown: Shutdown,
    task: JoinHandle<Result<Engine, JoinError>>,
}

#[allow(dead_code)]
impl TestDaemon {
    pub fn client(&self) -> ManagerClient {
        ManagerClient::new(self.addr.to_string())
    }

    /// Send raw bytes and return everything the daemon wrote before closing.
    pub async fn raw(&self, request: &[u8]) -> Vec<u8> {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        stream.write_all(request).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        response
    }

    /// Trigger shutdown and wait for the daemon to drain.
    pub async fn stop(self) -> Engine {
        self.shutdown.trigger();
        self.task.await.unwrap().unwrap()
    }
}

/// Boot a daemon from TOML text with the given group table.
pub async fn start_daemon(config: &str, groups: StaticGroups) -> TestDaemon {
    let mut config = parse_config(config).unwrap();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.timeouts.read_secs = 2;

    let probe = Arc::new(TestProbe::default());
    let engine = Engine::from_config(
        &config,
        probe.clone(),
        Arc::new(groups),
        Arc::new(BuiltinSelector::new()),
    )
    .unwrap();

    let daemon = Daemon::bind(&config, engine).await.unwrap();
    let addr = daemon.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let run_shutdown = shutdown.clone();
    let task = tokio::spawn(async move { daemon.run(&run_shutdown).await });

    TestDaemon {
        addr,
        probe,
        shutdown,
        task,
    }
}
