// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::delay::sleep_range;
use crate::common::error::AppError;
use crate::domain::account::{Account, BridgePhase};
use crate::domain::chain::Network;
use crate::domain::token::{Token, eth_to_wei};
use crate::infrastructure::data::registry::AccountRegistry;
use crate::services::workflow::{
    StepOutcome, Workflow, WorkflowContext, balance_minus_reserve, sample_f64, wait_for_arrival,
};
use alloy::primitives::U256;
use async_trait::async_trait;

/// Exchange withdrawal (optional), bridge, then arrival check between the
/// configured source and destination networks.
pub struct DirectBridge;

impl DirectBridge {
    fn exchange_required(ctx: &WorkflowContext, src: Network) -> bool {
        ctx.settings.use_okx_withdraw && src != Network::Scroll
    }
}

#[async_trait]
impl Workflow for DirectBridge {
    fn name(&self) -> &'static str {
        "bridge"
    }

    fn eligible(&self, account: &Account) -> bool {
        !account.bridge.finished
    }

    fn drives_to_completion(&self) -> bool {
        true
    }

    fn preflight(&self, ctx: &WorkflowContext, _registry: &AccountRegistry) -> Result<(), AppError> {
        let src = ctx.settings.bridge_src_network()?;
        let dst = ctx.settings.bridge_dst_network()?;
        if src == dst {
            return Err(AppError::Config(format!(
                "bridge_src_chain and bridge_dst_chain are both {src}"
            )));
        }
        if Self::exchange_required(ctx, src) {
            ctx.exchange()?;
        }
        Ok(())
    }

    async fn step(
        &self,
        ctx: &WorkflowContext,
        registry: &mut AccountRegistry,
        index: usize,
    ) -> Result<StepOutcome, AppError> {
        let settings = &ctx.settings;
        let account = registry.get(index)?.clone();
        let src = settings.bridge_src_network()?;
        let dst = settings.bridge_dst_network()?;
        let state = &account.bridge;

        match state.phase(Self::exchange_required(ctx, src)) {
            BridgePhase::ExchangeWithdrawal => {
                let exchange = ctx.exchange()?;
                let src_conn = ctx.connectors.connect(&account, src)?;
                let amount = sample_f64(settings.okx_withdraw_amount_range, 6);
                let before = src_conn.balance(Token::Eth.asset()).await?;
                exchange
                    .withdraw(amount, Token::Eth, src, account.address)
                    .await?;
                registry.mutate(index, |a| a.bridge.exchange_withdrawn = Some(amount))?;
                tracing::info!(
                    target: "bridge",
                    index,
                    account = %account.address,
                    amount,
                    network = %src,
                    "Exchange withdrawal complete"
                );
                if !wait_for_arrival(
                    src_conn.as_ref(),
                    before,
                    settings.arrival_attempts,
                    settings.arrival_delay_range,
                )
                .await?
                {
                    tracing::warn!(
                        target: "bridge",
                        account = %account.address,
                        network = %src,
                        "Withdrawal not visible on chain yet"
                    );
                }
                Ok(StepOutcome::Advanced)
            }
            BridgePhase::Bridge => {
                let venue = settings.bridge_venue()?;
                let src_conn = ctx.connectors.connect(&account, src)?;
                let Some(bridge) = ctx.catalog.bridge(venue, src_conn.clone()) else {
                    tracing::warn!(target: "bridge", venue = %venue, "No adapter for bridge venue");
                    return Ok(StepOutcome::Stalled);
                };
                let dst_conn = ctx.connectors.connect(&account, dst)?;

                let amount: Option<U256> = if settings.bridge_use_keep_amount {
                    let balance = src_conn.balance(Token::Eth.asset()).await?;
                    balance_minus_reserve(balance, sample_f64(settings.bridge_keep_amount_range, 6))?
                } else if let Some(withdrawn) = state.exchange_withdrawn
                    && src != Network::Scroll
                {
                    Some(eth_to_wei(withdrawn))
                } else if settings.bridge_full_balance {
                    None
                } else {
                    Some(eth_to_wei(sample_f64(settings.bridge_amount_range, 6)))
                };

                let before = dst_conn.balance(Token::Eth.asset()).await?;
                ctx.fee_guard.wait().await;
                bridge.bridge(amount, dst).await?;
                registry.mutate(index, |a| a.bridge.dst_balance_before_bridge = Some(before))?;
                tracing::info!(
                    target: "bridge",
                    index,
                    account = %account.address,
                    venue = %venue,
                    from = %src,
                    to = %dst,
                    "Bridge sent"
                );
                sleep_range(settings.post_bridge_delay_range).await;
                Ok(StepOutcome::Advanced)
            }
            BridgePhase::InFlight => {
                let before = state.dst_balance_before_bridge.unwrap_or_default();
                let dst_conn = ctx.connectors.connect(&account, dst)?;
                let arrived = wait_for_arrival(
                    dst_conn.as_ref(),
                    before,
                    settings.arrival_attempts,
                    settings.arrival_delay_range,
                )
                .await?;
                if !arrived {
                    tracing::warn!(
                        target: "bridge",
                        index,
                        account = %account.address,
                        network = %dst,
                        "Bridged funds not arrived yet; will retry"
                    );
                    return Ok(StepOutcome::Stalled);
                }
                registry.mutate(index, |a| a.bridge.finished = true)?;
                tracing::info!(target: "bridge", index, account = %account.address, "Bridge complete");
                Ok(StepOutcome::Finished)
            }
            BridgePhase::Done => Ok(StepOutcome::Finished),
        }
    }
}
