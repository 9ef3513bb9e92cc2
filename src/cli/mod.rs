//! Command-line surface.
//!
//! A single flat flag set; there are no subcommands. `--broker-urls` may
//! also be supplied through the `MQTT_URLS` environment variable.

mod args;

pub use args::Cli;
