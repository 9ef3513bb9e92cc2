//! Configuration assembled from the command-line surface.
//!
//! Broker endpoints are parsed eagerly and every optional filesystem
//! path is validated before any session opens, so a bad flag or a
//! missing CA file fails the process at startup instead of surfacing
//! mid-stream.

use crate::cli::Cli;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Reasons a broker URL cannot become an endpoint.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("unsupported scheme {0:?}")]
    UnsupportedScheme(String),
    #[error("missing host")]
    MissingHost,
    #[error("invalid port {0:?}")]
    InvalidPort(String),
    #[error("TLS endpoint needs a CA certificate or --insecure")]
    MissingTrustRoot,
}

/// Transport class of a broker endpoint URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Plain,
    Tls,
}

/// One configured broker endpoint. Immutable after construction; each
/// endpoint yields exactly one session.
#[derive(Debug, Clone)]
pub struct BrokerEndpoint {
    pub url: String,
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub ca_file: Option<PathBuf>,
    pub insecure: bool,
}

impl BrokerEndpoint {
    /// Parse one broker URL of the form `scheme://host[:port]`. A bare
    /// `host[:port]` is treated as plain TCP.
    pub fn parse(url: &str, ca_file: Option<&Path>, insecure: bool) -> Result<Self, EndpointError> {
        let (scheme, rest) = match url.split_once("://") {
            Some((scheme, rest)) => (scheme_class(scheme)?, rest),
            None => (Scheme::Plain, url),
        };
        let rest = rest.trim_end_matches('/');
        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => (
                host,
                port.parse::<u16>()
                    .map_err(|_| EndpointError::InvalidPort(port.to_string()))?,
            ),
            None => (rest, default_port(scheme)),
        };
        if host.is_empty() {
            return Err(EndpointError::MissingHost);
        }
        if scheme == Scheme::Tls && ca_file.is_none() && !insecure {
            return Err(EndpointError::MissingTrustRoot);
        }
        Ok(Self {
            url: url.to_string(),
            scheme,
            host: host.to_string(),
            port,
            ca_file: ca_file.map(Path::to_path_buf),
            insecure,
        })
    }

    /// Graphite prefix for this endpoint: the host component with dots
    /// replaced by underscores, so samples from different brokers never
    /// collide.
    pub fn host_tag(&self) -> String {
        self.host.replace('.', "_")
    }
}

fn scheme_class(scheme: &str) -> Result<Scheme, EndpointError> {
    match scheme {
        "tcp" | "mqtt" => Ok(Scheme::Plain),
        "ssl" | "tls" | "mqtts" => Ok(Scheme::Tls),
        other => Err(EndpointError::UnsupportedScheme(other.to_string())),
    }
}

fn default_port(scheme: Scheme) -> u16 {
    match scheme {
        Scheme::Plain => 1883,
        Scheme::Tls => 8883,
    }
}

/// Top-level configuration for the bridge.
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoints: Vec<BrokerEndpoint>,
    pub graphite_host: String,
    pub graphite_port: u16,
    pub graphite_ping: Duration,
    pub debug: bool,
}

impl Config {
    /// Build the runtime configuration from parsed flags.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let urls = parse_broker_urls(&cli.broker_urls);
        if urls.is_empty() {
            bail!("--broker-urls contains no broker URL");
        }
        let endpoints = urls
            .iter()
            .map(|url| {
                BrokerEndpoint::parse(url, cli.cafile.as_deref(), cli.insecure)
                    .with_context(|| format!("broker url {url}"))
            })
            .collect::<Result<Vec<_>>>()?;
        let config = Self {
            endpoints,
            graphite_host: cli.graphite_host.clone(),
            graphite_port: cli.graphite_port,
            graphite_ping: Duration::from_secs(cli.graphite_ping),
            debug: cli.debug,
        };
        config.validate_paths()?;
        Ok(config)
    }

    /// Ensure optional filesystem paths exist before any session opens.
    pub fn validate_paths(&self) -> Result<()> {
        for endpoint in &self.endpoints {
            if let Some(ca) = &endpoint.ca_file {
                if !ca.exists() {
                    bail!("error reading CA certificate {}", ca.display());
                }
            }
        }
        Ok(())
    }
}

/// Split a comma separated URL list, trimming whitespace around commas.
/// Empty items are discarded.
pub fn parse_broker_urls(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}
