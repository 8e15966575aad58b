//! Minimum spacing between outbound requests.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Enforces a minimum interval between consecutive gate releases.
///
/// The lock is held while waiting, so concurrent callers are released one
/// at a time, each at least `interval` after the previous one.
#[derive(Debug)]
pub struct ThrottleGate {
    interval: Duration,
    last_release: Mutex<Option<Instant>>,
}

impl ThrottleGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_release: Mutex::new(None),
        }
    }

    /// A gate that never waits.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    /// Wait until the interval has passed since the previous release, then
    /// record this release. The first call returns immediately.
    pub async fn wait(&self) {
        if !self.is_enabled() {
            return;
        }

        let mut last_release = self.last_release.lock().await;
        if let Some(previous) = *last_release {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                let remaining = self.interval - elapsed;
                debug!(wait_ms = remaining.as_millis() as u64, "throttling request");
                // `sleep` clamps deadlines past the timer's range
                sleep(remaining).await;
            }
        }
        *last_release = Some(Instant::now());
    }
}

impl Default for ThrottleGate {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_wait_is_immediate() {
        let gate = ThrottleGate::new(Duration::from_secs(5));
        let start = Instant::now();
        gate.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_consecutive_waits_are_spaced() {
        let gate = ThrottleGate::new(Duration::from_millis(200));
        let start = Instant::now();
        gate.wait().await;
        gate.wait().await;
        gate.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_unbounded_interval_blocks_second_caller() {
        let gate = ThrottleGate::new(Duration::MAX);
        gate.wait().await;

        let second = tokio::time::timeout(Duration::from_millis(50), gate.wait()).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_disabled_gate_never_waits() {
        let gate = ThrottleGate::disabled();
        assert!(!gate.is_enabled());
        let start = Instant::now();
        for _ in 0..10 {
            gate.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_concurrent_callers_are_serialized() {
        let gate = Arc::new(ThrottleGate::new(Duration::from_millis(100)));
        let start = Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move {
                    gate.wait().await;
                    Instant::now()
                })
            })
            .collect();

        let mut released = Vec::new();
        for handle in handles {
            released.push(handle.await.unwrap());
        }
        released.sort();

        assert!(released[1] - released[0] >= Duration::from_millis(100));
        assert!(released[2] - released[1] >= Duration::from_millis(100));
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
