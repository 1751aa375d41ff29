// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::domain::account::Account;
use crate::domain::chain::Network;
use crate::domain::token::Token;
use crate::domain::venue::{LendingVenue, SwapVenue};
use crate::infrastructure::data::registry::AccountRegistry;
use crate::infrastructure::network::connector::ChainConnector;
use crate::services::catalog::Dex;
use crate::services::workflow::{
    Holding, StepOutcome, Workflow, WorkflowContext, holdings, sweep_amount,
};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::sync::Arc;

/// Sweeps leftover tokens on Scroll back to ETH.
pub struct Collector {
    tokens: Vec<Token>,
}

impl Collector {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }
}

/// Splits holdings into (worth sweeping, dust) around `min_usd`.
pub fn partition_dust(held: Vec<Holding>, min_usd: f64) -> (Vec<Holding>, Vec<Token>) {
    let mut worth = Vec::new();
    let mut dust = Vec::new();
    for h in held {
        if h.balance.is_zero() || h.usd < min_usd {
            dust.push(h.token);
        } else {
            worth.push(h);
        }
    }
    (worth, dust)
}

/// Converts one holding to ETH: lending receipts are redeemed, WETH is
/// unwrapped, stables are swapped on a random DEX with an adapter.
pub async fn convert_to_native(
    ctx: &WorkflowContext,
    conn: Arc<dyn ChainConnector>,
    holding: Holding,
) -> Result<(), AppError> {
    tracing::info!(
        target: "collector",
        account = %conn.address(),
        token = %holding.token,
        usd = holding.usd,
        "Collecting token"
    );
    match holding.token {
        Token::Eth => Ok(()),
        Token::LEth => {
            let market = ctx
                .catalog
                .lending(LendingVenue::Layerbank, conn)
                .ok_or_else(|| no_adapter("lETH"))?;
            ctx.fee_guard.wait().await;
            market.withdraw().await
        }
        Token::Weth => {
            ctx.fee_guard.wait().await;
            ctx.catalog
                .wrap_gateway(conn)
                .unwrap(sweep_amount(holding.balance))
                .await
        }
        Token::Usdc | Token::Usdt => {
            let mut dexes: Vec<Box<dyn Dex>> = SwapVenue::ALL
                .iter()
                .filter_map(|v| ctx.catalog.dex(*v, conn.clone()))
                .collect();
            let dex = {
                let mut rng = rand::thread_rng();
                dexes.shuffle(&mut rng);
                dexes.pop()
            }
            .ok_or_else(|| no_adapter(holding.token.symbol()))?;
            ctx.fee_guard.wait().await;
            dex.swap(holding.token, Token::Eth, sweep_amount(holding.balance))
                .await
        }
    }
}

fn no_adapter(what: &str) -> AppError {
    AppError::Validation {
        field: "collector".into(),
        message: format!("no adapter can convert {what}"),
    }
}

#[async_trait]
impl Workflow for Collector {
    fn name(&self) -> &'static str {
        "collect"
    }

    fn eligible(&self, account: &Account) -> bool {
        !account.collection_pending(&self.tokens).is_empty()
    }

    async fn step(
        &self,
        ctx: &WorkflowContext,
        registry: &mut AccountRegistry,
        index: usize,
    ) -> Result<StepOutcome, AppError> {
        let account = registry.get(index)?.clone();
        let pending = account.collection_pending(&self.tokens);
        let conn = ctx.connectors.connect(&account, Network::Scroll)?;
        let held = holdings(ctx, conn.as_ref(), &pending).await?;
        let (worth, dust) = partition_dust(held, ctx.settings.min_collect_usd);

        if !dust.is_empty() {
            tracing::info!(
                target: "collector",
                index,
                account = %account.address,
                tokens = ?dust,
                "Below minimum value; marking collected"
            );
            registry.mutate(index, |a| a.tokens_collected.extend(dust.iter().copied()))?;
        }

        let chosen = {
            let mut rng = rand::thread_rng();
            worth.choose(&mut rng).copied()
        };
        if let Some(holding) = chosen {
            convert_to_native(ctx, conn, holding).await?;
            registry.mutate(index, |a| {
                a.tokens_collected.insert(holding.token);
            })?;
        }

        if self.eligible(registry.get(index)?) {
            Ok(StepOutcome::Advanced)
        } else {
            tracing::info!(target: "collector", index, account = %account.address, "All tokens collected");
            Ok(StepOutcome::Finished)
        }
    }
}
