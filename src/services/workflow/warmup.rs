// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::domain::account::{Account, QuotaKey, WarmupAction};
use crate::domain::chain::Network;
use crate::domain::token::{Token, eth_to_wei};
use crate::domain::venue::{LendingVenue, SwapVenue};
use crate::infrastructure::data::registry::AccountRegistry;
use crate::infrastructure::network::connector::ChainConnector;
use crate::services::workflow::{
    StepOutcome, Workflow, WorkflowContext, holdings, percent_of, plan_swap, sample_u32,
};
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use std::sync::Arc;

/// What a completed warmup action does to the stored account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    Consume(QuotaKey),
    /// Zero a quota that can no longer run (no adapter, ownership cap).
    Clear(QuotaKey),
    ClearLending(LendingVenue),
    DomainRegistered,
    /// Executed, but counts against no quota.
    Nothing,
}

/// Randomized warmup: one random eligible action per step until every
/// quota is spent.
pub struct Warmup;

#[async_trait]
impl Workflow for Warmup {
    fn name(&self) -> &'static str {
        "warmup"
    }

    fn eligible(&self, account: &Account) -> bool {
        !account.warmup_finished
    }

    async fn step(
        &self,
        ctx: &WorkflowContext,
        registry: &mut AccountRegistry,
        index: usize,
    ) -> Result<StepOutcome, AppError> {
        let account = registry.get(index)?.clone();
        let register_domains = ctx.settings.register_domains;
        let action = {
            let mut rng = rand::thread_rng();
            account.next_warmup_action(register_domains, &mut rng)
        };
        let Some(action) = action else {
            registry.mutate(index, |a| a.warmup_finished = true)?;
            tracing::info!(target: "warmup", index, account = %account.address, "Warmup complete");
            return Ok(StepOutcome::Finished);
        };

        let conn = ctx.connectors.connect(&account, Network::Scroll)?;
        tracing::info!(
            target: "warmup",
            index,
            account = %account.address,
            action = ?action,
            remaining = account.quotas.total(),
            "Running warmup action"
        );
        let effect = match action {
            WarmupAction::Swap(venue) => swap(ctx, conn, venue).await?,
            WarmupAction::Lending(venue) => lending(ctx, conn, &account, venue).await?,
            WarmupAction::Mail => match ctx.catalog.mailer(conn) {
                Some(mailer) => {
                    ctx.fee_guard.wait().await;
                    mailer.send_mail().await?;
                    Effect::Consume(QuotaKey::Mail)
                }
                None => Effect::Clear(QuotaKey::Mail),
            },
            WarmupAction::Vote => match ctx.catalog.voter(conn) {
                Some(voter) => {
                    ctx.fee_guard.wait().await;
                    voter.vote().await?;
                    Effect::Consume(QuotaKey::Vote)
                }
                None => Effect::Clear(QuotaKey::Vote),
            },
            WarmupAction::Mint(collection) => mint(ctx, conn, collection).await?,
            WarmupAction::RegisterDomain => match ctx.catalog.domain_registrar(conn) {
                Some(registrar) => {
                    ctx.fee_guard.wait().await;
                    registrar.register().await?;
                    Effect::DomainRegistered
                }
                None => {
                    tracing::warn!(
                        target: "warmup",
                        account = %account.address,
                        "No domain registrar available; marking registration done"
                    );
                    Effect::DomainRegistered
                }
            },
        };

        let mut finished = false;
        registry.mutate(index, |a| {
            apply(a, effect);
            if !a.has_warmup_actions(register_domains) {
                a.warmup_finished = true;
                finished = true;
            }
        })?;
        if finished {
            tracing::info!(target: "warmup", index, account = %account.address, "Warmup complete");
            Ok(StepOutcome::Finished)
        } else {
            Ok(StepOutcome::Advanced)
        }
    }
}

fn apply(account: &mut Account, effect: Effect) {
    match effect {
        Effect::Consume(key) => {
            account.quotas.consume(key);
        }
        Effect::Clear(key) => account.quotas.clear(key),
        Effect::ClearLending(venue) => {
            account.quotas.clear(QuotaKey::LendingSupply(venue));
            account.quotas.clear(QuotaKey::LendingWithdraw(venue));
        }
        Effect::DomainRegistered => account.domain_registered = true,
        Effect::Nothing => {}
    }
}

async fn swap(
    ctx: &WorkflowContext,
    conn: Arc<dyn ChainConnector>,
    venue: SwapVenue,
) -> Result<Effect, AppError> {
    let Some(dex) = ctx.catalog.dex(venue, conn.clone()) else {
        tracing::warn!(target: "warmup", venue = %venue, "No adapter for swap venue; dropping its quota");
        return Ok(Effect::Clear(QuotaKey::Swap(venue)));
    };
    let held = holdings(ctx, conn.as_ref(), &Token::SWAPPABLE).await?;
    let pct = sample_u32(ctx.settings.swap_percentage_range);
    let plan = plan_swap(&held, ctx.settings.use_eth_backswap, pct)?;

    ctx.fee_guard.wait().await;
    dex.swap(plan.token_in, plan.token_out, plan.amount).await?;
    if plan.backswap {
        tracing::info!(
            target: "warmup",
            account = %conn.address(),
            token = %plan.token_in,
            "Swapped back to ETH; quota unchanged"
        );
        Ok(Effect::Nothing)
    } else {
        Ok(Effect::Consume(QuotaKey::Swap(venue)))
    }
}

async fn lending(
    ctx: &WorkflowContext,
    conn: Arc<dyn ChainConnector>,
    account: &Account,
    venue: LendingVenue,
) -> Result<Effect, AppError> {
    let Some(market) = ctx.catalog.lending(venue, conn.clone()) else {
        tracing::warn!(target: "warmup", venue = %venue, "No adapter for lending venue; dropping its quotas");
        return Ok(Effect::ClearLending(venue));
    };

    let supplied = market.supplied().await?;
    if !supplied.is_zero() {
        ctx.fee_guard.wait().await;
        market.withdraw().await?;
        return Ok(Effect::Consume(QuotaKey::LendingWithdraw(venue)));
    }
    if account.quotas.remaining(QuotaKey::LendingSupply(venue)) == 0 {
        tracing::warn!(
            target: "warmup",
            account = %account.address,
            venue = %venue,
            "Withdrawal pending but nothing supplied on chain; settling quota"
        );
        return Ok(Effect::Consume(QuotaKey::LendingWithdraw(venue)));
    }

    let balance = conn.balance(Token::Eth.asset()).await?;
    let amount = percent_of(balance, sample_u32(ctx.settings.lending_percentage_range));
    if amount.is_zero() {
        return Err(AppError::InsufficientFunds {
            required: "non-zero ETH".into(),
            available: balance.to_string(),
        });
    }
    ctx.fee_guard.wait().await;
    if market.collateral() == Token::Weth {
        ctx.catalog.wrap_gateway(conn.clone()).wrap(amount).await?;
    }
    market.supply(amount).await?;
    Ok(Effect::Consume(QuotaKey::LendingSupply(venue)))
}

async fn mint(
    ctx: &WorkflowContext,
    conn: Arc<dyn ChainConnector>,
    collection: Address,
) -> Result<Effect, AppError> {
    let key = QuotaKey::NftMint(collection);
    let Some(minter) = ctx.catalog.nft_minter(conn) else {
        return Ok(Effect::Clear(key));
    };
    let owned = minter.owned(collection).await?;
    if owned >= ctx.settings.max_nft_owned {
        tracing::info!(
            target: "warmup",
            collection = %collection,
            owned,
            "Already holding the maximum; dropping mint quota"
        );
        return Ok(Effect::Clear(key));
    }
    let fee = ctx
        .settings
        .nft_collections
        .iter()
        .find(|c| c.address == collection)
        .map(|c| eth_to_wei(c.mint_fee))
        .unwrap_or(U256::ZERO);
    ctx.fee_guard.wait().await;
    minter.mint(collection, fee).await?;
    Ok(Effect::Consume(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{Credential, Quotas};

    const KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    fn account() -> Account {
        let mut quotas = Quotas::default();
        quotas.swaps.insert(SwapVenue::Spacefi, 1);
        quotas.lending_supplies.insert(LendingVenue::Cog, 2);
        quotas.lending_withdrawals.insert(LendingVenue::Cog, 2);
        Account::new(Credential::new(KEY), None, None, quotas).unwrap()
    }

    #[test]
    fn effects_touch_only_their_quota() {
        let mut a = account();
        apply(&mut a, Effect::Nothing);
        assert_eq!(a.quotas.total(), 5);
        apply(&mut a, Effect::Consume(QuotaKey::Swap(SwapVenue::Spacefi)));
        assert_eq!(a.quotas.remaining(QuotaKey::Swap(SwapVenue::Spacefi)), 0);
        apply(&mut a, Effect::ClearLending(LendingVenue::Cog));
        assert!(a.quotas.is_exhausted());
        apply(&mut a, Effect::DomainRegistered);
        assert!(a.domain_registered);
    }

    #[test]
    fn consuming_an_empty_quota_leaves_it_at_zero() {
        let mut a = account();
        apply(&mut a, Effect::Consume(QuotaKey::Mail));
        assert_eq!(a.quotas.mails, 0);
        assert_eq!(a.quotas.total(), 5);
    }
}
