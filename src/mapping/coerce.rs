//! Payload coercion rules.
//!
//! Decides, per mapped metric name, whether a received payload is
//! forwarded and in what textual form.

/// Outcome of coercing one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coerced {
    /// Forward this scalar text.
    Value(String),
    /// Drop the sample; the reason feeds the debug log.
    Drop(&'static str),
}

/// Extract the scalar text to forward from `payload`, given the already
/// mapped metric name.
///
/// Metrics whose name contains `version` or `timestamp` carry
/// non-numeric payloads and are dropped. The broker reports uptime as
/// `"N seconds"`; only the integer is wanted. Everything else passes
/// through as text (lossy UTF-8).
pub fn coerce(metric: &str, payload: &[u8]) -> Coerced {
    if metric.contains("version") {
        return Coerced::Drop("version");
    }
    if metric.contains("timestamp") {
        return Coerced::Drop("timestamp");
    }

    let text = String::from_utf8_lossy(payload);
    if metric == "mqtt.uptime" {
        let first = text.split_whitespace().next().unwrap_or_default();
        return Coerced::Value(first.to_string());
    }
    Coerced::Value(text.into_owned())
}
