//! mqtt-stats - CLI entrypoint.
//!
//! Usage:
//!   mqtt-stats --broker-urls tcp://broker.example.com:1883
//!   mqtt-stats --broker-urls ssl://a:8883,ssl://b:8883 --cafile ca.pem --graphiteHost graphite

use anyhow::Result;
use clap::Parser;
use mqtt_stats::cli::Cli;
use mqtt_stats::config::Config;
use mqtt_stats::runtime::Runtime;
use mqtt_stats::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.debug)?;

    let config = Config::from_cli(&cli)?;
    let runtime = Runtime::new(&config).await?;
    runtime.run().await
}
