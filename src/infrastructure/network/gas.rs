// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::retry::{RetryPolicy, retry_async};
use crate::domain::chain::Network;
use crate::network::provider::HttpProvider;
use alloy::providers::Provider;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Anything that can report the current network fee in gwei.
#[async_trait]
pub trait FeeSource: Send + Sync {
    async fn current_fee_gwei(&self) -> Result<f64, AppError>;
}

/// Gas price reader for the fee-guard chain. Readings are reused for a
/// short window so back-to-back guarded actions share one RPC call.
pub struct GasOracle {
    provider: HttpProvider,
    network: Network,
    max_age: Duration,
    last_good: Mutex<Option<(f64, Instant)>>,
}

impl GasOracle {
    pub fn new(provider: HttpProvider, network: Network) -> Self {
        Self {
            provider,
            network,
            max_age: Duration::from_secs(3),
            last_good: Mutex::new(None),
        }
    }

    fn cached(&self) -> Option<f64> {
        let guard = self.last_good.lock().ok()?;
        let (gwei, at) = (*guard)?;
        (at.elapsed() < self.max_age).then_some(gwei)
    }
}

#[async_trait]
impl FeeSource for GasOracle {
    async fn current_fee_gwei(&self) -> Result<f64, AppError> {
        if let Some(gwei) = self.cached() {
            return Ok(gwei);
        }
        let wei = retry_async("fee_guard_gas_price", RetryPolicy::RPC, |_| async {
            self.provider.get_gas_price().await
        })
        .await
        .map_err(|e| AppError::Connection(format!("{} gas price failed: {}", self.network, e)))?;

        let gwei = wei_to_gwei(wei);
        if let Ok(mut guard) = self.last_good.lock() {
            *guard = Some((gwei, Instant::now()));
        }
        Ok(gwei)
    }
}

pub fn wei_to_gwei(wei: u128) -> f64 {
    wei as f64 / 1e9
}
