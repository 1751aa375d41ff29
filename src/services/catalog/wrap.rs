// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::domain::constants::WETH_SCROLL;
use crate::domain::token::wei_to_eth;
use crate::infrastructure::network::connector::{ChainConnector, TxCall};
use crate::services::catalog::WrapGateway;
use crate::services::catalog::contracts::Weth9;
use alloy::primitives::U256;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::sync::Arc;

pub struct WethGateway {
    conn: Arc<dyn ChainConnector>,
}

impl WethGateway {
    pub fn new(conn: Arc<dyn ChainConnector>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl WrapGateway for WethGateway {
    async fn wrap(&self, amount: U256) -> Result<(), AppError> {
        tracing::info!(
            target: "wrap",
            account = %self.conn.address(),
            amount = wei_to_eth(amount),
            "Wrapping ETH"
        );
        let data = Weth9::depositCall {}.abi_encode();
        self.conn
            .submit(TxCall::new(WETH_SCROLL, data.into()).with_value(amount))
            .await
            .map(|_| ())
    }

    async fn unwrap(&self, amount: U256) -> Result<(), AppError> {
        tracing::info!(
            target: "wrap",
            account = %self.conn.address(),
            amount = wei_to_eth(amount),
            "Unwrapping WETH"
        );
        let data = Weth9::withdrawCall { wad: amount }.abi_encode();
        self.conn
            .submit(TxCall::new(WETH_SCROLL, data.into()))
            .await
            .map(|_| ())
    }
}
