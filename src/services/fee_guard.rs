// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::delay::{Span, sleep_range};
use crate::infrastructure::network::gas::FeeSource;
use std::sync::Arc;

/// Blocks fee-sensitive actions while the reference chain is above the
/// configured gas price. Never fails: read errors are logged and retried.
#[derive(Clone)]
pub struct FeeGuard {
    source: Arc<dyn FeeSource>,
    threshold_gwei: f64,
    delay: Span<u64>,
}

impl FeeGuard {
    pub fn new(source: Arc<dyn FeeSource>, threshold_gwei: f64, delay: Span<u64>) -> Self {
        Self {
            source,
            threshold_gwei,
            delay,
        }
    }

    pub fn threshold_gwei(&self) -> f64 {
        self.threshold_gwei
    }

    /// Returns once the current fee is at or below the threshold.
    pub async fn wait(&self) {
        loop {
            match self.source.current_fee_gwei().await {
                Ok(gwei) if gwei <= self.threshold_gwei => return,
                Ok(gwei) => {
                    tracing::info!(
                        target: "fee_guard",
                        current_gwei = gwei,
                        threshold_gwei = self.threshold_gwei,
                        "Gas above threshold; waiting"
                    );
                }
                Err(e) => {
                    tracing::warn!(target: "fee_guard", error = %e, "Gas price read failed");
                }
            }
            sleep_range(self.delay).await;
        }
    }
}
