//! Graphite forwarder.
//!
//! Holds the single TCP connection to the metrics backend, exposes the
//! fan-in `send` operation, and repairs the connection from the
//! periodic liveness probe. Samples are written in the plain-text line
//! protocol (`path value epoch-seconds`), stamped at send time.

use crate::core::time::Clock;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Path of the sentinel sample sent by the liveness probe. Graphite's
/// line protocol has no no-op, so on a healthy backend the sentinel is
/// recorded as a real series.
pub const PING_METRIC: &str = "ping metric";

/// Link state of the backend connection, as observed by the last send
/// or probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connected,
    Broken,
}

struct Conn {
    stream: TcpStream,
    state: LinkState,
}

/// The single connection to the Graphite plain-text endpoint.
///
/// `send` and `probe` serialize on one async mutex, so a reconnect
/// replaces the stream atomically with respect to in-flight sends.
pub struct Forwarder {
    host: String,
    port: u16,
    conn: Mutex<Conn>,
}

impl Forwarder {
    /// Establish the backend connection. Failure here is fatal at
    /// startup; there is no lazy reconnect on first send.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = open(host, port).await?;
        Ok(Self {
            host: host.to_string(),
            port,
            conn: Mutex::new(Conn {
                stream,
                state: LinkState::Connected,
            }),
        })
    }

    /// Write one sample. A transport failure is logged at debug and the
    /// sample dropped; repair is left to the probe loop.
    pub async fn send(&self, path: &str, value: &str) {
        if let Err(err) = self.write_sample(path, value).await {
            debug!("error sending metric {path}: {err}");
        }
    }

    /// Send the sentinel sample; on failure attempt one reconnect with
    /// the original host and port.
    pub async fn probe(&self) {
        if self.write_sample(PING_METRIC, "").await.is_ok() {
            return;
        }
        warn!("ping metric failed, trying to reconnect");
        let mut conn = self.conn.lock().await;
        match open(&self.host, self.port).await {
            Ok(stream) => {
                conn.stream = stream;
                conn.state = LinkState::Connected;
                info!("reconnected to graphite");
            }
            Err(err) => {
                conn.state = LinkState::Broken;
                error!("reconnecting to graphite failed: {err}");
            }
        }
    }

    /// Current link state.
    pub async fn state(&self) -> LinkState {
        self.conn.lock().await.state
    }

    async fn write_sample(&self, path: &str, value: &str) -> std::io::Result<()> {
        let line = format!("{path} {value} {}\n", epoch_secs());
        let mut conn = self.conn.lock().await;
        if let Err(err) = conn.stream.write_all(line.as_bytes()).await {
            conn.state = LinkState::Broken;
            return Err(err);
        }
        Ok(())
    }
}

/// Spawn the periodic liveness probe. The interval between consecutive
/// probes is the configured cadence regardless of backend state.
pub fn spawn_probe_loop<C: Clock>(
    forwarder: Arc<Forwarder>,
    interval: Duration,
    clock: C,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            clock.sleep(interval).await;
            forwarder.probe().await;
        }
    })
}

async fn open(host: &str, port: u16) -> Result<TcpStream> {
    TcpStream::connect((host, port))
        .await
        .with_context(|| format!("connect to graphite {host}:{port}"))
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
