//! Idle-timeout watchdog.
//!
//! Total-duration timeouts are wrong for this workload: a 200 MB scan on a
//! slow link can legitimately take longer than the timeout to upload, while a
//! server that stops reading after the first chunk should be abandoned
//! quickly. [`IdleTimer`] expires only after `idle` passes with no call to
//! [`IdleTimer::touch`].

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Shared last-activity clock. Clones observe the same clock.
#[derive(Debug, Clone)]
pub struct IdleTimer {
    last_activity: Arc<Mutex<Instant>>,
    idle: Duration,
}

impl IdleTimer {
    pub fn new(idle: Duration) -> Self {
        Self {
            last_activity: Arc::new(Mutex::new(Instant::now())),
            idle,
        }
    }

    /// Record activity, pushing the deadline forward.
    pub fn touch(&self) {
        *self.lock() = Instant::now();
    }

    /// Resolve once `idle` has elapsed since the most recent `touch`.
    pub async fn expired(&self) {
        loop {
            let last = *self.lock();
            let Some(deadline) = last.checked_add(self.idle) else {
                // Deadline beyond the clock's range never arrives.
                return std::future::pending().await;
            };
            if Instant::now() >= deadline {
                return;
            }
            sleep_until(deadline).await;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Instant> {
        self.last_activity
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn expires_after_idle_period() {
        let timer = IdleTimer::new(Duration::from_secs(5));
        let start = Instant::now();
        timer.expired().await;
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn touch_postpones_expiry() {
        let timer = IdleTimer::new(Duration::from_secs(5));
        let start = Instant::now();

        let toucher = timer.clone();
        tokio::spawn(async move {
            for _ in 0..3 {
                tokio::time::sleep(Duration::from_secs(3)).await;
                toucher.touch();
            }
        });

        timer.expired().await;
        // Last touch at 9s, so expiry no earlier than 14s.
        assert!(start.elapsed() >= Duration::from_secs(14), "{:?}", start.elapsed());
    }

    #[tokio::test(start_paused = true)]
    async fn huge_idle_never_expires() {
        let timer = IdleTimer::new(Duration::from_secs(u64::MAX));
        let res = tokio::time::timeout(Duration::from_secs(3600), timer.expired()).await;
        assert!(res.is_err());
    }
}
