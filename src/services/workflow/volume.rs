// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! Volume cycle: exchange withdrawal, bridge into Scroll, accumulate volume
//! through lending (and, in the mixed variant, swaps), drain, bridge out and
//! consolidate to the deposit address.

use crate::common::delay::sleep_range;
use crate::common::error::AppError;
use crate::domain::account::{Account, LendingAction, VolumeCycleState, VolumePhase, VolumeVariant};
use crate::domain::chain::Network;
use crate::domain::token::{Token, eth_to_wei, wei_to_eth};
use crate::domain::venue::{ActionFamily, LendingVenue, SwapVenue};
use crate::infrastructure::data::registry::AccountRegistry;
use crate::infrastructure::network::connector::{ChainConnector, transfer_native};
use crate::services::catalog::{Dex, Lending};
use crate::services::workflow::collector::{convert_to_native, partition_dust};
use crate::services::workflow::{
    Selection, StepOutcome, Workflow, WorkflowContext, balance_minus_reserve, holdings,
    percent_of, pick, plan_swap, sample_f64, sample_u32, wait_for_arrival,
};
use alloy::primitives::U256;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::sync::Arc;

pub struct VolumeCycle {
    variant: VolumeVariant,
}

impl VolumeCycle {
    pub fn new(variant: VolumeVariant) -> Self {
        Self { variant }
    }

    pub fn variant(&self) -> VolumeVariant {
        self.variant
    }

    fn prepare_wrap(&self) -> bool {
        self.variant == VolumeVariant::LendingCycle
    }
}

/// Whether an accumulate iteration on this state must close a position
/// instead of opening new volume.
pub fn forced_close(state: &VolumeCycleState) -> Option<LendingVenue> {
    state.open_lending
}

#[async_trait]
impl Workflow for VolumeCycle {
    fn name(&self) -> &'static str {
        self.variant.name()
    }

    fn eligible(&self, account: &Account) -> bool {
        !account.volume_state(self.variant).consolidated
    }

    /// Accounts are worked in stored order, one at a time.
    fn selection(&self) -> Selection {
        Selection::First
    }

    fn drives_to_completion(&self) -> bool {
        true
    }

    fn preflight(&self, ctx: &WorkflowContext, registry: &AccountRegistry) -> Result<(), AppError> {
        let missing = registry
            .accounts()
            .iter()
            .filter(|a| a.deposit_address.is_none())
            .count();
        if missing > 0 {
            return Err(AppError::Config(format!(
                "{missing} accounts have no deposit address; {} needs one per account",
                self.name()
            )));
        }
        ctx.settings.volume_network()?;
        ctx.exchange()?;
        match self.variant {
            VolumeVariant::LendingCycle => {
                if ctx.settings.cog_pool_address.is_none() {
                    return Err(AppError::Config(
                        "cog-volume requires cog_pool_address".to_string(),
                    ));
                }
            }
            VolumeVariant::Mixed => {
                let actions = ctx.settings.volume_actions()?;
                if actions.families().is_empty() {
                    return Err(AppError::Config("volume_dapps lists no venues".to_string()));
                }
                if let Some(account) = registry.accounts().first() {
                    let conn = ctx.connectors.connect(account, Network::Scroll)?;
                    let swap_ok = actions.swaps.is_empty()
                        || actions
                            .swaps
                            .iter()
                            .any(|v| ctx.catalog.dex(*v, conn.clone()).is_some());
                    let lending_ok = actions.lendings.is_empty()
                        || actions
                            .lendings
                            .iter()
                            .any(|v| ctx.catalog.lending(*v, conn.clone()).is_some());
                    for (ok, family) in [(swap_ok, "swap"), (lending_ok, "lending")] {
                        if !ok {
                            return Err(AppError::Config(format!(
                                "volume_dapps.{family} lists no venue with an adapter"
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn step(
        &self,
        ctx: &WorkflowContext,
        registry: &mut AccountRegistry,
        index: usize,
    ) -> Result<StepOutcome, AppError> {
        let account = registry.get(index)?.clone();
        let state = account.volume_state(self.variant).clone();
        let phase = state.phase(self.prepare_wrap());
        tracing::debug!(
            target: "volume",
            index,
            account = %account.address,
            variant = self.name(),
            phase = ?phase,
            reached = state.volume_reached,
            goal = state.volume_goal,
            "Volume step"
        );
        let step = Step {
            ctx,
            variant: self.variant,
            index,
            account: &account,
            state: &state,
        };
        match phase {
            VolumePhase::WithdrawExchange => step.withdraw_exchange(registry).await,
            VolumePhase::BridgeIn => step.bridge_in(registry).await,
            VolumePhase::AwaitArrivalIn => step.await_arrival(registry, Network::Scroll).await,
            VolumePhase::Prepare => step.prepare(registry).await,
            VolumePhase::Accumulate => match self.variant {
                VolumeVariant::LendingCycle => step.accumulate_lending_cycle(registry).await,
                VolumeVariant::Mixed => step.accumulate_mixed(registry).await,
            },
            VolumePhase::DrainPositions => step.drain(registry).await,
            VolumePhase::BridgeOut => step.bridge_out(registry).await,
            VolumePhase::AwaitArrivalOut => {
                let target = ctx.settings.volume_network()?.consolidation_target();
                step.await_arrival(registry, target).await
            }
            VolumePhase::Consolidate => step.consolidate(registry).await,
            VolumePhase::Done => Ok(StepOutcome::Finished),
        }
    }
}

struct Step<'a> {
    ctx: &'a WorkflowContext,
    variant: VolumeVariant,
    index: usize,
    account: &'a Account,
    state: &'a VolumeCycleState,
}

impl Step<'_> {
    fn mutate<F>(&self, registry: &mut AccountRegistry, update: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut VolumeCycleState),
    {
        let variant = self.variant;
        registry.mutate(self.index, |a| update(a.volume_state_mut(variant)))
    }

    fn connect(&self, network: Network) -> Result<Arc<dyn ChainConnector>, AppError> {
        self.ctx.connectors.connect(self.account, network)
    }

    fn log_progress(&self, action: &str, added: f64, reached: f64) {
        tracing::info!(
            target: "volume",
            index = self.index,
            account = %self.account.address,
            variant = self.variant.name(),
            action,
            added,
            reached,
            goal = self.state.volume_goal,
            "Volume iteration done"
        );
    }

    async fn withdraw_exchange(&self, registry: &mut AccountRegistry) -> Result<StepOutcome, AppError> {
        let settings = &self.ctx.settings;
        let network = settings.volume_network()?;
        let exchange = self.ctx.exchange()?;
        let conn = self.connect(network)?;
        let amount = sample_f64(settings.okx_withdraw_amount_range, 6);
        let before = conn.balance(Token::Eth.asset()).await?;
        exchange
            .withdraw(amount, Token::Eth, network, self.account.address)
            .await?;
        self.mutate(registry, |s| s.exchange_withdrawn = Some(amount))?;
        tracing::info!(
            target: "volume",
            index = self.index,
            account = %self.account.address,
            amount,
            network = %network,
            "Exchange withdrawal complete"
        );
        if !wait_for_arrival(
            conn.as_ref(),
            before,
            settings.arrival_attempts,
            settings.arrival_delay_range,
        )
        .await?
        {
            tracing::warn!(
                target: "volume",
                account = %self.account.address,
                network = %network,
                "Withdrawal not visible on chain yet"
            );
        }
        Ok(StepOutcome::Advanced)
    }

    async fn bridge_in(&self, registry: &mut AccountRegistry) -> Result<StepOutcome, AppError> {
        let settings = &self.ctx.settings;
        let network = settings.volume_network()?;
        let venue = settings.volume_bridge_in_venue()?;
        let src = self.connect(network)?;
        let Some(bridge) = self.ctx.catalog.bridge(venue, src.clone()) else {
            tracing::warn!(target: "volume", venue = %venue, "No adapter for bridge venue");
            return Ok(StepOutcome::Stalled);
        };
        let amount = if settings.volume_use_keep_amount {
            let balance = src.balance(Token::Eth.asset()).await?;
            balance_minus_reserve(
                balance,
                sample_f64(settings.amount_to_leave_on_src_chain_range, 6),
            )?
        } else {
            self.state.exchange_withdrawn.map(eth_to_wei)
        };

        let scroll = self.connect(Network::Scroll)?;
        let before = scroll.balance(Token::Eth.asset()).await?;
        self.ctx.fee_guard.wait().await;
        bridge.bridge(amount, Network::Scroll).await?;
        self.mutate(registry, |s| s.dst_balance_before_bridge = Some(before))?;
        tracing::info!(
            target: "volume",
            index = self.index,
            account = %self.account.address,
            venue = %venue,
            from = %network,
            "Bridged into Scroll"
        );
        sleep_range(settings.post_bridge_delay_range).await;
        Ok(StepOutcome::Advanced)
    }

    async fn await_arrival(
        &self,
        registry: &mut AccountRegistry,
        network: Network,
    ) -> Result<StepOutcome, AppError> {
        let settings = &self.ctx.settings;
        let conn = self.connect(network)?;
        let before = self.state.dst_balance_before_bridge.unwrap_or_default();
        if !wait_for_arrival(
            conn.as_ref(),
            before,
            settings.arrival_attempts,
            settings.arrival_delay_range,
        )
        .await?
        {
            tracing::warn!(
                target: "volume",
                index = self.index,
                account = %self.account.address,
                network = %network,
                "Bridged funds not arrived yet; will retry"
            );
            return Ok(StepOutcome::Stalled);
        }
        let inbound = network == Network::Scroll;
        self.mutate(registry, |s| {
            s.dst_balance_before_bridge = None;
            if inbound {
                s.bridged_in = true;
            } else {
                s.bridged_out = true;
            }
        })?;
        Ok(StepOutcome::Advanced)
    }

    async fn prepare(&self, registry: &mut AccountRegistry) -> Result<StepOutcome, AppError> {
        let conn = self.connect(Network::Scroll)?;
        let balance = conn.balance(Token::Eth.asset()).await?;
        let amount = percent_of(balance, sample_u32(self.ctx.settings.wrap_percentage_range));
        if amount.is_zero() {
            return Err(insufficient("ETH to wrap", balance));
        }
        self.ctx.fee_guard.wait().await;
        self.ctx.catalog.wrap_gateway(conn).wrap(amount).await?;
        self.mutate(registry, |s| s.native_wrapped = true)?;
        Ok(StepOutcome::Advanced)
    }

    async fn accumulate_lending_cycle(
        &self,
        registry: &mut AccountRegistry,
    ) -> Result<StepOutcome, AppError> {
        let conn = self.connect(Network::Scroll)?;
        let Some(market) = self.ctx.catalog.lending(LendingVenue::Cog, conn.clone()) else {
            tracing::warn!(target: "volume", "No adapter for Cog; set cog_pool_address");
            return Ok(StepOutcome::Stalled);
        };

        if forced_close(self.state).is_some() {
            return self.close_position(registry, market.as_ref()).await;
        }

        let wrapped = conn.balance(Token::Weth.asset()).await?;
        let amount = percent_of(
            wrapped,
            sample_u32(self.ctx.settings.wrapped_usage_percentage_range),
        );
        if amount.is_zero() {
            return Err(insufficient("WETH to supply", wrapped));
        }
        self.ctx.fee_guard.wait().await;
        market.supply(amount).await?;
        let added = wei_to_eth(amount);
        let reached = self.state.volume_reached + added;
        self.mutate(registry, |s| {
            s.volume_reached = reached;
            s.open_lending = Some(LendingVenue::Cog);
            s.last_action = Some(LendingAction::Supply);
        })?;
        self.log_progress("supply", added, reached);
        Ok(StepOutcome::Advanced)
    }

    async fn accumulate_mixed(&self, registry: &mut AccountRegistry) -> Result<StepOutcome, AppError> {
        let conn = self.connect(Network::Scroll)?;

        if let Some(venue) = forced_close(self.state) {
            let market = self
                .ctx
                .catalog
                .lending(venue, conn.clone())
                .ok_or_else(|| no_adapter(venue.as_str()))?;
            return self.close_position(registry, market.as_ref()).await;
        }

        if self.state.native_wrapped {
            self.unwrap_all(conn).await?;
            self.mutate(registry, |s| s.native_wrapped = false)?;
            self.log_progress("unwrap", 0.0, self.state.volume_reached);
            return Ok(StepOutcome::Advanced);
        }

        let actions = self.ctx.settings.volume_actions()?;
        let family = pick(&actions.families()).ok_or_else(|| no_adapter("volume_dapps"))?;
        match family {
            ActionFamily::Swap => self.mixed_swap(registry, conn, &actions.swaps).await,
            ActionFamily::Lending => self.mixed_lending(registry, conn, &actions.lendings).await,
        }
    }

    /// Withdraws the recorded open position. A position already closed on
    /// chain (a withdrawal that landed before the state was written) is
    /// settled without sending another transaction.
    async fn close_position(
        &self,
        registry: &mut AccountRegistry,
        market: &dyn Lending,
    ) -> Result<StepOutcome, AppError> {
        let wrapped = market.collateral() == Token::Weth;
        if market.supplied().await?.is_zero() {
            tracing::warn!(
                target: "volume",
                index = self.index,
                account = %self.account.address,
                venue = %market.venue(),
                "Open position already withdrawn on chain; settling state"
            );
        } else {
            self.ctx.fee_guard.wait().await;
            market.withdraw().await?;
        }
        let mixed = self.variant == VolumeVariant::Mixed;
        self.mutate(registry, |s| {
            s.open_lending = None;
            s.last_action = Some(LendingAction::Withdraw);
            if mixed && wrapped {
                s.native_wrapped = true;
            }
        })?;
        self.log_progress("withdraw", 0.0, self.state.volume_reached);
        Ok(StepOutcome::Advanced)
    }

    async fn mixed_swap(
        &self,
        registry: &mut AccountRegistry,
        conn: Arc<dyn ChainConnector>,
        venues: &[SwapVenue],
    ) -> Result<StepOutcome, AppError> {
        let mut dexes: Vec<Box<dyn Dex>> = venues
            .iter()
            .filter_map(|v| self.ctx.catalog.dex(*v, conn.clone()))
            .collect();
        let dex = {
            let mut rng = rand::thread_rng();
            dexes.shuffle(&mut rng);
            dexes.pop()
        }
        .ok_or_else(|| no_adapter("any configured swap venue"))?;

        let held = holdings(self.ctx, conn.as_ref(), &Token::SWAPPABLE).await?;
        let pct = sample_u32(self.ctx.settings.swap_percentage_range);
        let plan = plan_swap(&held, true, pct)?;
        self.ctx.fee_guard.wait().await;
        dex.swap(plan.token_in, plan.token_out, plan.amount).await?;
        let reached = self.state.volume_reached + plan.usd;
        self.mutate(registry, |s| s.volume_reached = reached)?;
        self.log_progress("swap", plan.usd, reached);
        Ok(StepOutcome::Advanced)
    }

    async fn mixed_lending(
        &self,
        registry: &mut AccountRegistry,
        conn: Arc<dyn ChainConnector>,
        venues: &[LendingVenue],
    ) -> Result<StepOutcome, AppError> {
        let mut markets: Vec<Box<dyn Lending>> = venues
            .iter()
            .filter_map(|v| self.ctx.catalog.lending(*v, conn.clone()))
            .collect();
        let market = {
            let mut rng = rand::thread_rng();
            markets.shuffle(&mut rng);
            markets.pop()
        }
        .ok_or_else(|| no_adapter("any configured lending venue"))?;
        let venue = market.venue();

        if !market.supplied().await?.is_zero() {
            self.ctx.fee_guard.wait().await;
            market.withdraw().await?;
            let wrapped = market.collateral() == Token::Weth;
            self.mutate(registry, |s| {
                s.last_action = Some(LendingAction::Withdraw);
                if wrapped {
                    s.native_wrapped = true;
                }
            })?;
            self.log_progress("withdraw", 0.0, self.state.volume_reached);
            return Ok(StepOutcome::Advanced);
        }

        let balance = conn.balance(Token::Eth.asset()).await?;
        let amount = percent_of(balance, sample_u32(self.ctx.settings.lending_percentage_range));
        if amount.is_zero() {
            return Err(insufficient("ETH to supply", balance));
        }
        let eth_price = self.ctx.prices.price(Token::Eth).await?;
        self.ctx.fee_guard.wait().await;
        if market.collateral() == Token::Weth {
            self.ctx.catalog.wrap_gateway(conn.clone()).wrap(amount).await?;
            self.mutate(registry, |s| s.native_wrapped = true)?;
        }
        market.supply(amount).await?;
        let added = wei_to_eth(amount) * eth_price;
        let reached = self.state.volume_reached + added;
        self.mutate(registry, |s| {
            s.volume_reached = reached;
            s.open_lending = Some(venue);
            s.last_action = Some(LendingAction::Supply);
        })?;
        self.log_progress("supply", added, reached);
        Ok(StepOutcome::Advanced)
    }

    async fn unwrap_all(&self, conn: Arc<dyn ChainConnector>) -> Result<(), AppError> {
        let wrapped = conn.balance(Token::Weth.asset()).await?;
        if wrapped.is_zero() {
            return Ok(());
        }
        self.ctx.fee_guard.wait().await;
        self.ctx.catalog.wrap_gateway(conn).unwrap(wrapped).await
    }

    async fn drain(&self, registry: &mut AccountRegistry) -> Result<StepOutcome, AppError> {
        let conn = self.connect(Network::Scroll)?;
        match self.variant {
            VolumeVariant::LendingCycle => {
                self.unwrap_all(conn).await?;
                self.mutate(registry, |s| {
                    s.native_unwrapped = true;
                    s.positions_drained = true;
                })?;
            }
            VolumeVariant::Mixed => {
                if self.state.native_wrapped {
                    self.unwrap_all(conn).await?;
                    self.mutate(registry, |s| s.native_wrapped = false)?;
                    return Ok(StepOutcome::Advanced);
                }
                let tokens = self.ctx.settings.tokens_to_collect()?;
                let held = holdings(self.ctx, conn.as_ref(), &tokens).await?;
                let (worth, _) = partition_dust(held, self.ctx.settings.min_collect_usd);
                let chosen = pick(&worth);
                match chosen {
                    Some(holding) => convert_to_native(self.ctx, conn, holding).await?,
                    None => self.mutate(registry, |s| s.positions_drained = true)?,
                }
            }
        }
        Ok(StepOutcome::Advanced)
    }

    async fn bridge_out(&self, registry: &mut AccountRegistry) -> Result<StepOutcome, AppError> {
        let settings = &self.ctx.settings;
        let target = settings.volume_network()?.consolidation_target();
        let venue = settings.volume_bridge_out_venue()?;
        let scroll = self.connect(Network::Scroll)?;
        let Some(bridge) = self.ctx.catalog.bridge(venue, scroll.clone()) else {
            tracing::warn!(target: "volume", venue = %venue, "No adapter for bridge venue");
            return Ok(StepOutcome::Stalled);
        };
        let balance = scroll.balance(Token::Eth.asset()).await?;
        let amount =
            balance_minus_reserve(balance, sample_f64(settings.amount_to_leave_on_scroll_range, 6))?;

        let dst = self.connect(target)?;
        let before = dst.balance(Token::Eth.asset()).await?;
        self.ctx.fee_guard.wait().await;
        bridge.bridge(amount, target).await?;
        self.mutate(registry, |s| s.dst_balance_before_bridge = Some(before))?;
        tracing::info!(
            target: "volume",
            index = self.index,
            account = %self.account.address,
            venue = %venue,
            to = %target,
            "Bridged out of Scroll"
        );
        sleep_range(settings.post_bridge_delay_range).await;
        Ok(StepOutcome::Advanced)
    }

    async fn consolidate(&self, registry: &mut AccountRegistry) -> Result<StepOutcome, AppError> {
        let settings = &self.ctx.settings;
        let deposit = self.account.deposit_address.ok_or_else(|| {
            AppError::Config(format!("account {} has no deposit address", self.account.address))
        })?;
        let target = settings.volume_network()?.consolidation_target();
        let conn = self.connect(target)?;
        let balance = conn.balance(Token::Eth.asset()).await?;
        let amount = balance_minus_reserve(
            balance,
            sample_f64(settings.amount_to_leave_before_transfer, 6),
        )?;
        self.ctx.fee_guard.wait().await;
        transfer_native(conn.as_ref(), deposit, amount).await?;
        self.mutate(registry, |s| s.consolidated = true)?;
        tracing::info!(
            target: "volume",
            notify = true,
            index = self.index,
            account = %self.account.address,
            variant = self.variant.name(),
            reached = self.state.volume_reached,
            deposit = %deposit,
            "Volume cycle consolidated"
        );
        Ok(StepOutcome::Finished)
    }
}

fn insufficient(what: &str, available: U256) -> AppError {
    AppError::InsufficientFunds {
        required: format!("non-zero {what}"),
        available: available.to_string(),
    }
}

fn no_adapter(what: &str) -> AppError {
    AppError::Validation {
        field: "volume_dapps".into(),
        message: format!("no adapter for {what}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_position_forces_close_regardless_of_goal() {
        let mut state = VolumeCycleState::new(1.0);
        state.volume_reached = 1.5;
        assert_eq!(forced_close(&state), None);
        state.open_lending = Some(LendingVenue::Layerbank);
        assert_eq!(forced_close(&state), Some(LendingVenue::Layerbank));
        assert!(state.accumulation_pending());
    }

    #[test]
    fn variant_names_route_to_separate_state() {
        assert_eq!(VolumeCycle::new(VolumeVariant::LendingCycle).name(), "cog-volume");
        assert!(VolumeCycle::new(VolumeVariant::LendingCycle).prepare_wrap());
        assert!(!VolumeCycle::new(VolumeVariant::Mixed).prepare_wrap());
    }
}
