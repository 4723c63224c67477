//! Fixed-count, fixed-delay retry.

use std::future::Future;

use crate::config::RetryPolicy;

/// Outcome of a retry loop that never succeeded.
#[derive(Debug)]
pub struct Exhausted<E> {
    /// Attempts made.
    pub attempts: u32,
    /// Error from the final attempt.
    pub last_error: E,
}

/// Runs `op` until it succeeds or `policy.max_attempts` attempts have failed.
///
/// `op` receives the 1-based attempt number. The loop sleeps `policy.interval()`
/// between failures and never after the last one, so a success on attempt `k`
/// costs exactly `k - 1` sleeps. No backoff growth, no jitter.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, Exhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_attempts => {
                return Err(Exhausted {
                    attempts: attempt,
                    last_error: e,
                });
            }
            Err(e) => {
                tracing::debug!(attempt, max_attempts, error = %e, "attempt failed, retrying");
                tokio::time::sleep(policy.interval()).await;
                attempt += 1;
            }
        }
    }
}
