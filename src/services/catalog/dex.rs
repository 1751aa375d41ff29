// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::domain::constants::{SPACEFI_ROUTER, SWAP_DEADLINE_SECS, ZEBRA_ROUTER};
use crate::domain::token::Token;
use crate::domain::venue::SwapVenue;
use crate::infrastructure::network::connector::{ChainConnector, TxCall};
use crate::infrastructure::network::erc20;
use crate::services::catalog::Dex;
use crate::services::catalog::contracts::UniV2Router;
use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::sync::Arc;

/// Router address for venues that speak the Uniswap V2 router ABI.
pub fn router_for(venue: SwapVenue) -> Option<Address> {
    match venue {
        SwapVenue::Spacefi => Some(SPACEFI_ROUTER),
        SwapVenue::Zebra => Some(ZEBRA_ROUTER),
        SwapVenue::Izumi | SwapVenue::Skydrome | SwapVenue::Syncswap => None,
    }
}

pub fn min_out(quoted: U256, slippage_bps: u64) -> U256 {
    let keep = 10_000u64.saturating_sub(slippage_bps);
    quoted.saturating_mul(U256::from(keep)) / U256::from(10_000u64)
}

fn deadline() -> U256 {
    U256::from(chrono::Utc::now().timestamp().max(0) as u64 + SWAP_DEADLINE_SECS)
}

pub struct UniV2Dex {
    venue: SwapVenue,
    router: Address,
    conn: Arc<dyn ChainConnector>,
    slippage_bps: u64,
}

impl UniV2Dex {
    pub fn new(
        venue: SwapVenue,
        router: Address,
        conn: Arc<dyn ChainConnector>,
        slippage_bps: u64,
    ) -> Self {
        Self {
            venue,
            router,
            conn,
            slippage_bps,
        }
    }

    async fn quote(&self, amount: U256, path: &[Address]) -> Result<U256, AppError> {
        let data = UniV2Router::getAmountsOutCall {
            amountIn: amount,
            path: path.to_vec(),
        }
        .abi_encode();
        let out = self.conn.call(&TxCall::new(self.router, data.into())).await?;
        let amounts = UniV2Router::getAmountsOutCall::abi_decode_returns(&out)
            .map_err(|e| AppError::Connection(format!("getAmountsOut decode failed: {e}")))?;
        amounts.last().copied().ok_or_else(|| AppError::Validation {
            field: "path".into(),
            message: "router returned no amounts".into(),
        })
    }
}

#[async_trait]
impl Dex for UniV2Dex {
    fn venue(&self) -> SwapVenue {
        self.venue
    }

    async fn swap(&self, token_in: Token, token_out: Token, amount: U256) -> Result<(), AppError> {
        if token_in == token_out {
            return Err(AppError::Validation {
                field: "token_out".into(),
                message: format!("cannot swap {token_in} to itself"),
            });
        }
        let path = vec![token_in.address(), token_out.address()];
        let amount_out_min = min_out(self.quote(amount, &path).await?, self.slippage_bps);
        if amount_out_min.is_zero() {
            return Err(AppError::Validation {
                field: "amount".into(),
                message: format!("{} quoted zero output", self.venue),
            });
        }
        let to = self.conn.address();
        tracing::info!(
            target: "dex",
            venue = %self.venue,
            account = %to,
            amount = token_in.from_units(amount),
            token_in = %token_in,
            token_out = %token_out,
            "Swapping"
        );

        let tx = if token_in.is_native() {
            let data = UniV2Router::swapExactETHForTokensCall {
                amountOutMin: amount_out_min,
                path,
                to,
                deadline: deadline(),
            }
            .abi_encode();
            TxCall::new(self.router, data.into()).with_value(amount)
        } else {
            erc20::ensure_allowance(self.conn.as_ref(), token_in.address(), self.router, amount)
                .await?;
            let data = if token_out.is_native() {
                UniV2Router::swapExactTokensForETHCall {
                    amountIn: amount,
                    amountOutMin: amount_out_min,
                    path,
                    to,
                    deadline: deadline(),
                }
                .abi_encode()
            } else {
                UniV2Router::swapExactTokensForTokensCall {
                    amountIn: amount,
                    amountOutMin: amount_out_min,
                    path,
                    to,
                    deadline: deadline(),
                }
                .abi_encode()
            };
            TxCall::new(self.router, data.into())
        };
        self.conn.submit(tx).await.map(|_| ())
    }
}
