//! Topic-to-metric mapping.
//!
//! - `name` - rewrite broker topic strings into dotted Graphite paths
//! - `coerce` - extract the scalar text to forward from a raw payload

pub mod coerce;
pub mod name;

pub use coerce::{coerce, Coerced};
pub use name::metric_path;
