//! Operational concerns.

pub mod telemetry;
