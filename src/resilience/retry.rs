//! Bounded retry with configurable backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Backoff schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same wait after every failure.
    Fixed(Duration),
    /// Wait grows with the attempt number: `attempt * unit`.
    Linear(Duration),
}

impl Backoff {
    /// Wait to apply after the given (1-based) failed attempt.
    pub fn wait_for(self, attempt: u32) -> Duration {
        match self {
            Backoff::Fixed(unit) => unit,
            Backoff::Linear(unit) => unit * attempt,
        }
    }
}

/// A bounded retry policy for fallible async operations.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Linearly increasing waits: `attempt * unit` after each failure.
    pub fn linear(max_attempts: u32, unit: Duration) -> Self {
        Self::new(max_attempts, Backoff::Linear(unit))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `op` until it succeeds or `max_attempts` is exhausted.
    ///
    /// Sleeps after every failure, including the last one, so the total
    /// time spent by a run that fails N times is the sum of the first N
    /// backoff waits. Returns the final error when exhausted.
    pub async fn run<F, Fut, T, E>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            let wait = self.backoff.wait_for(attempt);
            tracing::warn!(
                attempt,
                max_attempts = self.max_attempts,
                wait_ms = wait.as_millis() as u64,
                error = %err,
                "attempt failed, backing off"
            );
            tokio::time::sleep(wait).await;

            if attempt >= self.max_attempts {
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_linear_backoff_is_monotone() {
        let backoff = Backoff::Linear(Duration::from_secs(1));
        let mut previous = Duration::ZERO;
        for attempt in 1..=10 {
            let wait = backoff.wait_for(attempt);
            assert!(wait >= previous);
            previous = wait;
        }
        assert_eq!(backoff.wait_for(3), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let policy = RetryPolicy::linear(10, Duration::from_secs(1));
        let calls = Arc::new(AtomicU32::new(0));

        let start = tokio::time::Instant::now();
        let result = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                        Err("probe failed")
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // Three failures slept 1s + 2s + 3s.
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_ceiling() {
        let policy = RetryPolicy::linear(3, Duration::from_secs(1));
        let calls = Arc::new(AtomicU32::new(0));

        let start = tokio::time::Instant::now();
        let result: Result<(), _> = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("probe failed")
                }
            })
            .await;

        assert_eq!(result.unwrap_err(), "probe failed");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Sleeps after every failure, the last included: 1s + 2s + 3s.
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_backoff_waits_are_constant() {
        let policy = RetryPolicy::new(2, Backoff::Fixed(Duration::from_millis(500)));

        let start = tokio::time::Instant::now();
        let result: Result<(), _> = policy.run(|| async { Err::<(), _>("nope") }).await;

        assert!(result.is_err());
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }
}
