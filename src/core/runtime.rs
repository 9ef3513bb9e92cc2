//! Runtime wiring: forwarder, sessions, dispatch, probe, shutdown.

use crate::core::config::Config;
use crate::core::time::SystemClock;
use crate::graphite::{spawn_probe_loop, Forwarder};
use crate::mapping::{coerce, metric_path, Coerced};
use crate::mqtt::{DispatchFn, SessionId, SessionRegistry, SubscriberPool, SYS_TOPIC_FILTER};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info, warn};

/// Maps one received message to a sample and hands it to the forwarder.
///
/// The registry and the forwarder are explicit dependencies; nothing in
/// the dispatch path is process-wide state.
pub struct Dispatcher {
    registry: Arc<SessionRegistry>,
    forwarder: Arc<Forwarder>,
}

impl Dispatcher {
    pub fn new(registry: Arc<SessionRegistry>, forwarder: Arc<Forwarder>) -> Self {
        Self {
            registry,
            forwarder,
        }
    }

    /// Per-message callback: registry lookup, name mapping, payload
    /// coercion, forward.
    pub async fn dispatch(&self, session: SessionId, topic: &str, payload: &[u8]) {
        let Some(host_tag) = self.registry.host_tag(session) else {
            warn!("not all the mqtt sessions are ready, dropping message from {session}");
            return;
        };

        let metric = metric_path(topic);
        let value = match coerce(&metric, payload) {
            Coerced::Drop(reason) => {
                debug!("skipping {reason} metric {metric}");
                return;
            }
            Coerced::Value(value) => value,
        };

        let path = format!("{host_tag}.{metric}");
        debug!("sending metric {path} {value}");
        self.forwarder.send(&path, &value).await;
    }

    /// Adapt this dispatcher into the pool's callback shape.
    pub fn into_dispatch_fn(self: Arc<Self>) -> DispatchFn {
        Arc::new(move |session, topic, payload| {
            let dispatcher = self.clone();
            Box::pin(async move {
                dispatcher.dispatch(session, &topic, &payload).await;
            })
        })
    }
}

/// Owns every long-lived component for the life of the process.
pub struct Runtime {
    forwarder: Arc<Forwarder>,
    pool: SubscriberPool,
    probe_interval: Duration,
}

impl Runtime {
    /// Connect the forwarder, then open one session per endpoint wired
    /// to the shared dispatch function. Fails when Graphite is
    /// unreachable or an endpoint's TLS material cannot be loaded.
    pub async fn new(config: &Config) -> Result<Self> {
        let forwarder = Arc::new(
            Forwarder::connect(&config.graphite_host, config.graphite_port).await?,
        );
        info!(
            "connected to graphite {}:{}",
            config.graphite_host, config.graphite_port
        );

        let registry = Arc::new(SessionRegistry::new());
        let dispatch =
            Arc::new(Dispatcher::new(registry.clone(), forwarder.clone())).into_dispatch_fn();

        let mut pool = SubscriberPool::new(registry);
        for endpoint in &config.endpoints {
            let id = pool.subscribe(endpoint, dispatch.clone())?;
            info!("{id} subscribing to {SYS_TOPIC_FILTER} on {}", endpoint.url);
        }

        Ok(Self {
            forwarder,
            pool,
            probe_interval: config.graphite_ping,
        })
    }

    /// Run until SIGINT or SIGTERM, then tear down every session and
    /// stop the probe.
    pub async fn run(mut self) -> Result<()> {
        let probe = spawn_probe_loop(self.forwarder.clone(), self.probe_interval, SystemClock);

        let sig = shutdown_signal().await;
        info!("received {sig}, shutting down");

        probe.abort();
        self.pool.close_all().await;
        Ok(())
    }
}

/// Wait for shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() -> &'static str {
    let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM handler");

    tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    }
}
