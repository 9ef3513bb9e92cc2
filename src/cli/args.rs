//! CLI argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

/// mqtt-stats - forward MQTT broker statistics to Graphite.
#[derive(Parser, Debug)]
#[command(name = "mqtt-stats")]
#[command(version)]
#[command(about = "Subscribe to $SYS/broker/# and forward samples to Graphite")]
pub struct Cli {
    /// Comma separated MQTT broker URLs
    #[arg(long = "broker-urls", env = "MQTT_URLS", value_name = "URLS")]
    pub broker_urls: String,

    /// CA certificate when using TLS (optional)
    #[arg(long, value_name = "PATH")]
    pub cafile: Option<PathBuf>,

    /// Graphite host
    #[arg(long = "graphiteHost", default_value = "localhost")]
    pub graphite_host: String,

    /// Graphite port
    #[arg(long = "graphitePort", default_value_t = 2003)]
    pub graphite_port: u16,

    /// Try to reconnect to Graphite every X seconds
    #[arg(long = "graphitePing", default_value_t = 15, value_name = "SECONDS")]
    pub graphite_ping: u64,

    /// Don't verify the broker's certificate chain and host name
    #[arg(long)]
    pub insecure: bool,

    /// Print debugging messages
    #[arg(long)]
    pub debug: bool,
}
