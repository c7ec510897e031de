// src/pacing.rs
// Leaky-bucket pacing for the extraction oracle. Sized to the endpoint's
// request-rate ceiling instead of a hard-coded sleep between items, so pacing
// stays correct when the per-run item count changes.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_ORACLE_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    next_allowed: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_allowed: Mutex::new(None),
        }
    }

    /// A pacer that never waits, for tests and dry runs.
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Wait until the next request slot. The first acquisition passes
    /// immediately; subsequent ones are spaced at least `min_interval` apart.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_allowed.lock().expect("pacer mutex poisoned");
            let now = Instant::now();
            let slot = match *next {
                Some(t) if t > now => t,
                _ => now,
            };
            *next = Some(slot + self.min_interval);
            slot
        };
        // Lock released before awaiting.
        tokio::time::sleep_until(slot).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_acquire_is_immediate() {
        let p = Pacer::new(Duration::from_secs(3));
        let t0 = Instant::now();
        p.acquire().await;
        assert_eq!(Instant::now(), t0);
    }

    #[tokio::test(start_paused = true)]
    async fn subsequent_acquires_are_spaced() {
        let p = Pacer::new(Duration::from_secs(3));
        let t0 = Instant::now();
        p.acquire().await;
        p.acquire().await;
        p.acquire().await;
        assert!(Instant::now() - t0 >= Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn unthrottled_never_waits() {
        let p = Pacer::unthrottled();
        let t0 = Instant::now();
        for _ in 0..10 {
            p.acquire().await;
        }
        assert_eq!(Instant::now(), t0);
    }
}
