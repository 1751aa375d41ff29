// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! Per-account workflow state machines. Each step reads the persisted
//! state, performs at most one phase of on-chain work, and writes the new
//! state through the registry before returning.

pub mod bridge;
pub mod collector;
pub mod volume;
pub mod warmup;

use crate::app::config::GlobalSettings;
use crate::common::delay::{Span, sleep_range};
use crate::common::error::AppError;
use crate::domain::account::Account;
use crate::domain::constants::FULL_BALANCE_USAGE_BPS;
use crate::domain::token::{Token, apply_bps, wei_to_eth};
use crate::infrastructure::data::registry::AccountRegistry;
use crate::infrastructure::network::connector::{ChainConnector, ConnectorFactory};
use crate::infrastructure::network::exchange::ExchangeWithdrawal;
use crate::infrastructure::network::price_feed::PriceOracle;
use crate::services::catalog::ActionCatalog;
use crate::services::fee_guard::FeeGuard;
use alloy::primitives::U256;
use async_trait::async_trait;
use futures::future::try_join_all;
use rand::seq::SliceRandom;
use std::sync::Arc;

pub use bridge::DirectBridge;
pub use collector::Collector;
pub use volume::VolumeCycle;
pub use warmup::Warmup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A phase completed and was persisted.
    Advanced,
    /// Preconditions unmet; nothing beyond completed phases was written.
    Stalled,
    /// The account reached the workflow's terminal state.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Random,
    First,
}

/// Collaborators shared by every workflow step.
#[derive(Clone)]
pub struct WorkflowContext {
    pub settings: Arc<GlobalSettings>,
    pub connectors: Arc<dyn ConnectorFactory>,
    pub catalog: Arc<dyn ActionCatalog>,
    pub prices: Arc<dyn PriceOracle>,
    pub exchange: Option<Arc<dyn ExchangeWithdrawal>>,
    pub fee_guard: FeeGuard,
}

impl WorkflowContext {
    pub fn exchange(&self) -> Result<&dyn ExchangeWithdrawal, AppError> {
        self.exchange
            .as_deref()
            .ok_or_else(|| AppError::Config("OKX credentials are required for this module".into()))
    }
}

#[async_trait]
pub trait Workflow: Send + Sync {
    fn name(&self) -> &'static str;

    fn eligible(&self, account: &Account) -> bool;

    fn selection(&self) -> Selection {
        Selection::Random
    }

    /// Keep stepping the same account after each advanced phase instead of
    /// returning it to the selection pool.
    fn drives_to_completion(&self) -> bool {
        false
    }

    /// Checks run once before the first selection. Errors abort the run.
    fn preflight(&self, _ctx: &WorkflowContext, _registry: &AccountRegistry) -> Result<(), AppError> {
        Ok(())
    }

    async fn step(
        &self,
        ctx: &WorkflowContext,
        registry: &mut AccountRegistry,
        index: usize,
    ) -> Result<StepOutcome, AppError>;
}

/// `pct` percent of `value`, rounded down.
pub fn percent_of(value: U256, pct: u32) -> U256 {
    value.saturating_mul(U256::from(pct)) / U256::from(100u64)
}

/// The share of a balance used when a token is swept in full.
pub fn sweep_amount(balance: U256) -> U256 {
    apply_bps(balance, FULL_BALANCE_USAGE_BPS)
}

/// Full balance minus a reserve. `None` when the reserve is zero, which
/// adapters read as "full balance minus gas".
pub fn balance_minus_reserve(balance: U256, reserve_eth: f64) -> Result<Option<U256>, AppError> {
    if reserve_eth <= 0.0 {
        return Ok(None);
    }
    let reserve = Token::Eth.to_units(reserve_eth);
    if balance <= reserve {
        return Err(AppError::InsufficientFunds {
            required: reserve.to_string(),
            available: balance.to_string(),
        });
    }
    Ok(Some(balance - reserve))
}

pub(crate) fn sample_f64(span: Span<f64>, decimals: i32) -> f64 {
    let mut rng = rand::thread_rng();
    span.sample_rounded(&mut rng, decimals)
}

pub(crate) fn sample_u32(span: Span<u32>) -> u32 {
    let mut rng = rand::thread_rng();
    span.sample(&mut rng)
}

pub(crate) fn pick<T: Copy>(items: &[T]) -> Option<T> {
    let mut rng = rand::thread_rng();
    items.choose(&mut rng).copied()
}

/// Polls the native balance until it exceeds `before`. Bounded by
/// `attempts`; returns whether the funds showed up.
pub async fn wait_for_arrival(
    conn: &dyn ChainConnector,
    before: U256,
    attempts: u32,
    delay: Span<u64>,
) -> Result<bool, AppError> {
    for attempt in 1..=attempts.max(1) {
        let now = conn.balance(Token::Eth.asset()).await?;
        if now > before {
            tracing::info!(
                target: "bridge",
                account = %conn.address(),
                network = %conn.network(),
                received = wei_to_eth(now - before),
                "Funds arrived"
            );
            return Ok(true);
        }
        tracing::debug!(
            target: "bridge",
            account = %conn.address(),
            network = %conn.network(),
            attempt,
            "Waiting for funds"
        );
        if attempt < attempts {
            sleep_range(delay).await;
        }
    }
    Ok(false)
}

/// One token balance with its reference value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Holding {
    pub token: Token,
    pub balance: U256,
    pub usd: f64,
}

pub async fn holdings(
    ctx: &WorkflowContext,
    conn: &dyn ChainConnector,
    tokens: &[Token],
) -> Result<Vec<Holding>, AppError> {
    let prices = ctx.prices.prices(tokens).await?;
    let balances = try_join_all(tokens.iter().map(|t| conn.balance(t.asset()))).await?;
    Ok(tokens
        .iter()
        .zip(prices)
        .zip(balances)
        .map(|((token, price), balance)| Holding {
            token: *token,
            balance,
            usd: token.from_units(balance) * price,
        })
        .collect())
}

/// A swap picked from current holdings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapPlan {
    pub token_in: Token,
    pub token_out: Token,
    pub amount: U256,
    /// Reference value of `amount`.
    pub usd: f64,
    /// Converts a non-native holding back to native.
    pub backswap: bool,
}

/// Swaps out of the largest holding. A non-native holding goes back to
/// native when `backswap` is set; otherwise `pct` percent of it goes to a
/// random other token.
pub fn plan_swap(held: &[Holding], backswap: bool, pct: u32) -> Result<SwapPlan, AppError> {
    let largest = held
        .iter()
        .filter(|h| !h.balance.is_zero())
        .max_by(|a, b| a.usd.total_cmp(&b.usd))
        .copied()
        .ok_or_else(|| AppError::InsufficientFunds {
            required: "any swappable balance".into(),
            available: "0".into(),
        })?;
    let unit_usd = largest.usd / largest.token.from_units(largest.balance).max(f64::MIN_POSITIVE);

    if backswap && !largest.token.is_native() {
        let amount = sweep_amount(largest.balance);
        return Ok(SwapPlan {
            token_in: largest.token,
            token_out: Token::Eth,
            amount,
            usd: largest.token.from_units(amount) * unit_usd,
            backswap: true,
        });
    }

    let others: Vec<Token> = Token::SWAPPABLE
        .iter()
        .copied()
        .filter(|t| *t != largest.token)
        .collect();
    let token_out = pick(&others).unwrap_or(Token::Eth);
    let amount = percent_of(largest.balance, pct);
    Ok(SwapPlan {
        token_in: largest.token,
        token_out,
        amount,
        usd: largest.token.from_units(amount) * unit_usd,
        backswap: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding(token: Token, amount: f64, price: f64) -> Holding {
        Holding {
            token,
            balance: token.to_units(amount),
            usd: amount * price,
        }
    }

    #[test]
    fn percent_and_sweep_amounts() {
        assert_eq!(percent_of(U256::from(1_000u64), 25), U256::from(250u64));
        assert_eq!(sweep_amount(U256::from(10_000u64)), U256::from(9_990u64));
    }

    #[test]
    fn reserve_of_zero_means_full_balance() {
        let balance = Token::Eth.to_units(1.0);
        assert_eq!(balance_minus_reserve(balance, 0.0).unwrap(), None);
        assert_eq!(
            balance_minus_reserve(balance, 0.25).unwrap(),
            Some(Token::Eth.to_units(0.75))
        );
        assert!(matches!(
            balance_minus_reserve(balance, 2.0),
            Err(AppError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn stable_holding_is_swapped_back_when_backswap_enabled() {
        let held = [
            holding(Token::Eth, 0.001, 3000.0),
            holding(Token::Usdc, 25.0, 1.0),
            holding(Token::Usdt, 0.0, 1.0),
        ];
        let plan = plan_swap(&held, true, 50).unwrap();
        assert_eq!(plan.token_in, Token::Usdc);
        assert_eq!(plan.token_out, Token::Eth);
        assert!(plan.backswap);
        assert_eq!(plan.amount, U256::from(24_975_000u64));
    }

    #[test]
    fn native_holding_swaps_a_share_to_another_token() {
        let held = [
            holding(Token::Eth, 1.0, 3000.0),
            holding(Token::Usdc, 10.0, 1.0),
        ];
        let plan = plan_swap(&held, true, 50).unwrap();
        assert_eq!(plan.token_in, Token::Eth);
        assert_ne!(plan.token_out, Token::Eth);
        assert!(!plan.backswap);
        assert_eq!(plan.amount, Token::Eth.to_units(0.5));
        assert!((plan.usd - 1500.0).abs() < 1e-6);
    }

    #[test]
    fn empty_wallet_has_nothing_to_swap() {
        let held = [holding(Token::Eth, 0.0, 3000.0)];
        assert!(plan_swap(&held, false, 50).is_err());
    }
}
