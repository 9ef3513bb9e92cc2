use std::time::Duration;

/// Clock abstraction so periodic paths (the liveness probe) can be
/// driven deterministically in tests.
pub trait Clock: Clone + Send + Sync + 'static {
    fn sleep(&self, duration: Duration) -> tokio::time::Sleep;
}

/// System-backed clock used by the running process.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) -> tokio::time::Sleep {
        tokio::time::sleep(duration)
    }
}
