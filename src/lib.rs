#![deny(unused, dead_code)]
#![deny(clippy::all, clippy::pedantic)]
// Module naming: common pattern in domain-driven code
#![allow(clippy::module_name_repetitions)]
// Documentation style: many terms don't need backticks
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
// API ergonomics: prefer simplicity over must_use annotations
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
// Format strings: allow non-inlined for readability
#![allow(clippy::uninlined_format_args)]
// Import style
#![allow(clippy::wildcard_imports)]
// Variable naming: domain terms often similar
#![allow(clippy::similar_names)]
// Numeric casts: intentional in the jitter helper
#![allow(clippy::cast_possible_truncation)]
// Option/Result patterns
#![allow(clippy::map_unwrap_or)]
// Closure style
#![allow(clippy::redundant_closure_for_method_calls)]

//! mqtt-stats - bridge MQTT broker statistics into Graphite.
//!
//! Subscribes to the `$SYS/broker/#` administrative topic tree of one or
//! more brokers and forwards every value as a time-series sample over a
//! single TCP connection to a Graphite backend.
//!
//! # Module Organization
//!
//! ## Core
//! - `core::config` - Broker endpoint parsing and startup validation
//! - `core::runtime` - Runtime wiring, dispatch, shutdown
//! - `core::time` - Deterministic time utilities
//!
//! ## Mapping
//! - `mapping::name` - Topic string to dotted metric path rewriting
//! - `mapping::coerce` - Payload scalar extraction and drop rules
//!
//! ## Networking
//! - `mqtt` - Broker subscriber pool and session registry
//! - `mqtt::tls` - TLS trust configuration for broker sessions
//! - `graphite` - Forwarder with liveness probe and reconnect
//!
//! ## Operations
//! - `ops::telemetry` - Tracing setup
//!
//! ## CLI
//! - `cli` - Command-line surface

// Core infrastructure
pub mod core;

// Topic-to-metric mapping
pub mod mapping;

// Networking
pub mod graphite;
pub mod mqtt;

// Operations
pub mod ops;

// CLI
pub mod cli;

// Re-exports for convenience
pub use self::core::{config, runtime, time};
pub use ops::telemetry;
