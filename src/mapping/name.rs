//! Broker topic to metric path rewriting.

/// Literal prefix of the broker's administrative topic tree.
const SYS_PREFIX: &str = "$SYS/broker/";

/// Rewrite a broker topic string into a dotted metric path.
///
/// Rules, applied in order over the entire string: every occurrence of
/// `$SYS/broker/` becomes `mqtt.`, every remaining `/` becomes `.`, and
/// every space becomes `_`. The rewrite is total; it does not validate
/// that the result is acceptable to the backend, and topics outside the
/// administrative tree still get the slash and space rewrites.
pub fn metric_path(topic: &str) -> String {
    topic
        .replace(SYS_PREFIX, "mqtt.")
        .replace('/', ".")
        .replace(' ', "_")
}
