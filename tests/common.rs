//! Common test harness utilities for integration tests.
//!
//! Provides ephemeral port allocation and a fake Graphite collector
//! that records every plain-text protocol line it receives.

// Not all test files use all helpers; silence dead_code warnings for unused exports.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Allocate an ephemeral loopback port. Nothing listens on it after
/// this returns.
pub fn ephemeral_port() -> SocketAddr {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind ephemeral port")
        .local_addr()
        .expect("ephemeral addr")
}

/// Minimal Graphite endpoint: accepts connections and records each
/// received line.
pub struct FakeGraphite {
    addr: SocketAddr,
    lines: Arc<Mutex<Vec<String>>>,
    accept: JoinHandle<()>,
    conns: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl FakeGraphite {
    /// Bind on an ephemeral port and start collecting.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake graphite");
        Self::from_listener(listener)
    }

    /// Bind on a specific address; used to bring the backend back on
    /// the same host and port after a `stop`.
    pub async fn start_on(addr: SocketAddr) -> Self {
        let listener = TcpListener::bind(addr).await.expect("rebind fake graphite");
        Self::from_listener(listener)
    }

    fn from_listener(listener: TcpListener) -> Self {
        let addr = listener.local_addr().expect("fake graphite addr");
        let lines = Arc::new(Mutex::new(Vec::new()));
        let conns: Arc<Mutex<Vec<JoinHandle<()>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        let readers = conns.clone();
        let accept = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => {
                        let sink = sink.clone();
                        let reader = tokio::spawn(collect_lines(socket, sink));
                        readers.lock().unwrap().push(reader);
                    }
                    Err(_) => break,
                }
            }
        });
        Self {
            addr,
            lines,
            accept,
            conns,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Snapshot of every line received so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Wait until at least `n` lines arrived or the timeout elapses.
    pub async fn wait_for_lines(&self, n: usize, timeout: Duration) -> Vec<String> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let lines = self.lines();
            if lines.len() >= n || tokio::time::Instant::now() >= deadline {
                return lines;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Stop listening and drop every open connection. Returns the
    /// address for a later `start_on`.
    pub fn stop(self) -> SocketAddr {
        self.accept.abort();
        for reader in self.conns.lock().unwrap().drain(..) {
            reader.abort();
        }
        self.addr
    }
}

async fn collect_lines(socket: TcpStream, sink: Arc<Mutex<Vec<String>>>) {
    let mut reader = BufReader::new(socket).lines();
    while let Ok(Some(line)) = reader.next_line().await {
        sink.lock().unwrap().push(line);
    }
}
