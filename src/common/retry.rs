// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Attempt budget and backoff shape for one class of remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// JSON-RPC reads and gas estimation.
    pub const RPC: RetryPolicy = RetryPolicy {
        attempts: 3,
        initial_delay: Duration::from_millis(500),
        max_delay: Duration::from_secs(8),
    };

    /// Exchange REST calls; the withdrawal endpoint rate-limits aggressively.
    pub const EXCHANGE: RetryPolicy = RetryPolicy {
        attempts: 5,
        initial_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(30),
    };

    pub const PRICE: RetryPolicy = RetryPolicy {
        attempts: 3,
        initial_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(10),
    };

    pub fn immediate(attempts: usize) -> Self {
        Self {
            attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }
}

/// Retry an async operation with exponential backoff. The closure receives
/// the 1-based attempt number.
pub async fn retry_async<F, Fut, T, E>(label: &str, policy: RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = policy.attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < attempts => {
                tracing::warn!(
                    target: "retry",
                    op = label,
                    attempt,
                    attempts,
                    error = %e,
                    "Attempt failed; backing off"
                );
                sleep(delay).await;
                delay = delay.saturating_mul(2).min(policy.max_delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
