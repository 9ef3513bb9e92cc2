//! Broker subscriber pool.
//!
//! One session per configured endpoint. Each session drives its own
//! rumqttc event loop on a worker task and hands every received message
//! to the shared dispatch callback together with its session handle.

pub mod tls;

use crate::core::config::{BrokerEndpoint, Scheme};
use anyhow::{Context, Result};
use bytes::Bytes;
use parking_lot::RwLock;
use rumqttc::{
    AsyncClient, Event, EventLoop, Incoming, MqttOptions, QoS, TlsConfiguration, Transport,
};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Fixed client identifier. Multiple endpoints reusing it against the
/// same broker is a user error; the pool does not rename.
pub const CLIENT_ID: &str = "mqtt-stats";

/// Wildcard filter covering the broker's administrative topic tree.
pub const SYS_TOPIC_FILTER: &str = "$SYS/broker/#";

const KEEP_ALIVE: Duration = Duration::from_secs(30);
const EVENT_CAPACITY: usize = 64;

/// Handle identifying one live broker session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub usize);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Boxed future returned by the dispatch callback.
pub type DispatchFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Per-message callback: originating session, topic, raw payload.
pub type DispatchFn = Arc<dyn Fn(SessionId, String, Bytes) -> DispatchFuture + Send + Sync>;

/// Session handle to host tag mapping.
///
/// Populated during startup and read-only afterward. A session's worker
/// may begin delivering before its entry lands; the dispatch layer
/// drops such messages with a warning, so lookups must not panic on a
/// miss.
#[derive(Default)]
pub struct SessionRegistry {
    inner: RwLock<HashMap<SessionId, String>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: SessionId, host_tag: String) {
        self.inner.write().insert(id, host_tag);
    }

    pub fn host_tag(&self, id: SessionId) -> Option<String> {
        self.inner.read().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// One live broker session: the rumqttc client plus the worker task
/// driving its event loop.
pub struct Session {
    pub id: SessionId,
    client: AsyncClient,
    worker: JoinHandle<()>,
}

/// Owns every broker session for the lifetime of the process.
pub struct SubscriberPool {
    registry: Arc<SessionRegistry>,
    sessions: Vec<Session>,
    next_id: usize,
}

impl SubscriberPool {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            registry,
            sessions: Vec::new(),
            next_id: 0,
        }
    }

    /// Open one session to `endpoint`: connect, subscribe to
    /// `$SYS/broker/#` at QoS 0, install `dispatch` as the per-message
    /// callback and register the session's host tag.
    pub fn subscribe(&mut self, endpoint: &BrokerEndpoint, dispatch: DispatchFn) -> Result<SessionId> {
        let id = SessionId(self.next_id);
        self.next_id += 1;

        let mut options = MqttOptions::new(CLIENT_ID, &endpoint.host, endpoint.port);
        options.set_keep_alive(KEEP_ALIVE);
        if endpoint.scheme == Scheme::Tls {
            let tls_config = tls::client_config(endpoint.ca_file.as_deref(), endpoint.insecure)
                .with_context(|| format!("TLS config for {}", endpoint.url))?;
            options.set_transport(Transport::tls_with_config(TlsConfiguration::Rustls(
                Arc::new(tls_config),
            )));
        }

        let (client, eventloop) = AsyncClient::new(options, EVENT_CAPACITY);
        let worker = tokio::spawn(run_session(
            id,
            endpoint.url.clone(),
            client.clone(),
            eventloop,
            dispatch,
        ));

        // The worker may deliver before this entry lands; the dispatch
        // contract absorbs that window.
        self.registry.insert(id, endpoint.host_tag());
        self.sessions.push(Session { id, client, worker });
        Ok(id)
    }

    /// Tear down one session with zero linger. Unknown handles are
    /// ignored.
    pub async fn close(&mut self, id: SessionId) {
        if let Some(pos) = self.sessions.iter().position(|session| session.id == id) {
            teardown(self.sessions.remove(pos)).await;
        }
    }

    /// Tear down every session with zero linger.
    pub async fn close_all(&mut self) {
        for session in self.sessions.drain(..) {
            teardown(session).await;
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

async fn teardown(session: Session) {
    debug!("{} disconnecting", session.id);
    let _ = session.client.disconnect().await;
    session.worker.abort();
}

/// Drive one session's event loop: (re-)issue the administrative
/// subscription on every ConnAck, hand publishes to `dispatch`, and
/// back off on transport errors. rumqttc reconnects on the next poll.
async fn run_session(
    id: SessionId,
    url: String,
    client: AsyncClient,
    mut eventloop: EventLoop,
    dispatch: DispatchFn,
) {
    let mut backoff = Backoff::new();
    let mut connected = false;
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                if connected {
                    info!("{id} reconnected to {url}");
                } else {
                    info!("{id} connected to {url}");
                    connected = true;
                }
                backoff.reset();
                // The broker forgets subscriptions across reconnects.
                if let Err(err) = client.subscribe(SYS_TOPIC_FILTER, QoS::AtMostOnce).await {
                    warn!("{id} subscribe to {SYS_TOPIC_FILTER} failed: {err}");
                }
            }
            Ok(Event::Incoming(Incoming::Publish(publish))) => {
                dispatch(id, publish.topic, publish.payload).await;
            }
            Ok(_) => {}
            Err(err) => {
                connected = false;
                let delay = backoff.next_delay();
                debug!(
                    "{id} connection error on {url}: {err}; retrying in {}ms",
                    delay.as_millis()
                );
                sleep(delay).await;
            }
        }
    }
}

/// Reconnect backoff for a session's event loop.
struct Backoff {
    current_ms: u64,
    max_ms: u64,
}

impl Backoff {
    fn new() -> Self {
        Self {
            current_ms: 100,
            max_ms: 30_000,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.current_ms;
        // Exponential backoff with cap
        self.current_ms = (self.current_ms * 2).min(self.max_ms);
        // Add jitter (±25%)
        let jitter = delay / 4;
        let actual = delay + (rand_u64() % (jitter * 2)).saturating_sub(jitter);
        Duration::from_millis(actual)
    }

    fn reset(&mut self) {
        self.current_ms = 100;
    }
}

/// Simple pseudo-random number using time-based seed.
fn rand_u64() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1)
}
