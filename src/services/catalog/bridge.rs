// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::domain::chain::Network;
use crate::domain::constants::{
    ORBITER_CHAIN_CODE_BASE, ORBITER_CODE_DIGITS, ORBITER_MAKER, ORBITER_MAX_AMOUNT_WEI,
    ORBITER_MIN_AMOUNT_WEI, ORBITER_SIMULATION_VALUE_WEI, ORBITER_TRADING_FEE_WEI,
};
use crate::domain::token::wei_to_eth;
use crate::domain::venue::BridgeVenue;
use crate::infrastructure::network::connector::{ChainConnector, TxCall, spendable_native};
use crate::services::catalog::Bridge;
use alloy::primitives::{Bytes, U256};
use async_trait::async_trait;
use std::sync::Arc;

/// Orbiter maker transfer. The destination is encoded in the last
/// `ORBITER_CODE_DIGITS` digits of the sent value.
pub struct Orbiter {
    src: Arc<dyn ChainConnector>,
}

impl Orbiter {
    pub fn new(src: Arc<dyn ChainConnector>) -> Self {
        Self { src }
    }
}

/// `amount + fee`, truncated to the code granularity, with the routing code
/// for `dst` in the freed digits.
pub fn encode_value(amount: U256, dst: Network) -> U256 {
    let unit = U256::from(10u64.pow(ORBITER_CODE_DIGITS));
    let gross = amount.saturating_add(U256::from(ORBITER_TRADING_FEE_WEI));
    let code = U256::from(ORBITER_CHAIN_CODE_BASE + dst.orbiter_id() as u64);
    gross / unit * unit + code
}

#[async_trait]
impl Bridge for Orbiter {
    fn venue(&self) -> BridgeVenue {
        BridgeVenue::Orbiter
    }

    async fn bridge(&self, amount: Option<U256>, dst: Network) -> Result<(), AppError> {
        let src_network = self.src.network();
        if src_network == dst {
            return Err(AppError::Validation {
                field: "dst".into(),
                message: format!("source and destination are both {dst}"),
            });
        }
        let (amount, gas_limit) = match amount {
            Some(a) => (a, None),
            None => {
                let estimate_tx = TxCall::new(ORBITER_MAKER, Bytes::new())
                    .with_value(U256::from(ORBITER_SIMULATION_VALUE_WEI));
                let (spendable, gas_limit) =
                    spendable_native(self.src.as_ref(), &estimate_tx).await?;
                let fee = U256::from(ORBITER_TRADING_FEE_WEI);
                if spendable <= fee {
                    return Err(AppError::InsufficientFunds {
                        required: fee.to_string(),
                        available: spendable.to_string(),
                    });
                }
                (spendable - fee, Some(gas_limit))
            }
        };

        if amount < U256::from(ORBITER_MIN_AMOUNT_WEI) || amount > U256::from(ORBITER_MAX_AMOUNT_WEI)
        {
            return Err(AppError::Validation {
                field: "amount".into(),
                message: format!(
                    "{} ETH outside Orbiter limits [{}, {}]",
                    wei_to_eth(amount),
                    wei_to_eth(U256::from(ORBITER_MIN_AMOUNT_WEI)),
                    wei_to_eth(U256::from(ORBITER_MAX_AMOUNT_WEI))
                ),
            });
        }

        let value = encode_value(amount, dst);
        tracing::info!(
            target: "bridge",
            venue = "orbiter",
            account = %self.src.address(),
            amount = wei_to_eth(value),
            from = %src_network,
            to = %dst,
            "Bridging ETH"
        );
        let mut tx = TxCall::new(ORBITER_MAKER, Bytes::new()).with_value(value);
        if let Some(limit) = gas_limit {
            tx = tx.with_gas_limit(limit);
        }
        self.src.submit(tx).await.map(|_| ())
    }
}
