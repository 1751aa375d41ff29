// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::domain::constants::{LAYERBANK_CORE, LETH_SCROLL, WETH_SCROLL};
use crate::domain::token::{Asset, Token};
use crate::domain::venue::LendingVenue;
use crate::infrastructure::network::connector::{ChainConnector, TxCall};
use crate::infrastructure::network::erc20;
use crate::services::catalog::Lending;
use crate::services::catalog::contracts::{CogPair, LayerBankCore};
use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::sync::Arc;

fn nothing_supplied(venue: LendingVenue) -> AppError {
    AppError::Validation {
        field: "withdraw".into(),
        message: format!("nothing supplied on {venue}"),
    }
}

/// LayerBank ETH market. Supplies native ETH and receives lETH.
pub struct LayerBank {
    conn: Arc<dyn ChainConnector>,
}

impl LayerBank {
    pub fn new(conn: Arc<dyn ChainConnector>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Lending for LayerBank {
    fn venue(&self) -> LendingVenue {
        LendingVenue::Layerbank
    }

    fn collateral(&self) -> Token {
        Token::Eth
    }

    async fn supplied(&self) -> Result<U256, AppError> {
        self.conn.balance(Asset::Erc20(LETH_SCROLL)).await
    }

    async fn supply(&self, amount: U256) -> Result<(), AppError> {
        tracing::info!(
            target: "lending",
            venue = "layerbank",
            account = %self.conn.address(),
            amount = Token::Eth.from_units(amount),
            "Supplying ETH"
        );
        let data = LayerBankCore::supplyCall {
            lToken: LETH_SCROLL,
            uAmount: amount,
        }
        .abi_encode();
        self.conn
            .submit(TxCall::new(LAYERBANK_CORE, data.into()).with_value(amount))
            .await
            .map(|_| ())
    }

    async fn withdraw(&self) -> Result<(), AppError> {
        let shares = self.supplied().await?;
        if shares.is_zero() {
            return Err(nothing_supplied(self.venue()));
        }
        tracing::info!(
            target: "lending",
            venue = "layerbank",
            account = %self.conn.address(),
            shares = Token::LEth.from_units(shares),
            "Withdrawing lETH"
        );
        let data = LayerBankCore::redeemTokenCall {
            lToken: LETH_SCROLL,
            lAmount: shares,
        }
        .abi_encode();
        self.conn
            .submit(TxCall::new(LAYERBANK_CORE, data.into()))
            .await
            .map(|_| ())
    }
}

/// Cog Finance isolated pair taking WETH collateral.
pub struct CogPool {
    pool: Address,
    conn: Arc<dyn ChainConnector>,
}

impl CogPool {
    pub fn new(pool: Address, conn: Arc<dyn ChainConnector>) -> Self {
        Self { pool, conn }
    }
}

#[async_trait]
impl Lending for CogPool {
    fn venue(&self) -> LendingVenue {
        LendingVenue::Cog
    }

    fn collateral(&self) -> Token {
        Token::Weth
    }

    async fn supplied(&self) -> Result<U256, AppError> {
        let data = CogPair::user_collateral_shareCall {
            user: self.conn.address(),
        }
        .abi_encode();
        let out = self.conn.call(&TxCall::new(self.pool, data.into())).await?;
        CogPair::user_collateral_shareCall::abi_decode_returns(&out)
            .map_err(|e| AppError::Connection(format!("user_collateral_share decode failed: {e}")))
    }

    async fn supply(&self, amount: U256) -> Result<(), AppError> {
        erc20::ensure_allowance(self.conn.as_ref(), WETH_SCROLL, self.pool, amount).await?;
        tracing::info!(
            target: "lending",
            venue = "cog",
            account = %self.conn.address(),
            amount = Token::Weth.from_units(amount),
            "Supplying WETH"
        );
        let data = CogPair::add_collateralCall {
            to: self.conn.address(),
            amount,
        }
        .abi_encode();
        self.conn
            .submit(TxCall::new(self.pool, data.into()))
            .await
            .map(|_| ())
    }

    async fn withdraw(&self) -> Result<(), AppError> {
        let share = self.supplied().await?;
        if share.is_zero() {
            return Err(nothing_supplied(self.venue()));
        }
        tracing::info!(
            target: "lending",
            venue = "cog",
            account = %self.conn.address(),
            "Withdrawing WETH collateral"
        );
        let data = CogPair::remove_collateralCall {
            to: self.conn.address(),
            amount: share,
        }
        .abi_encode();
        self.conn
            .submit(TxCall::new(self.pool, data.into()))
            .await
            .map(|_| ())
    }
}
