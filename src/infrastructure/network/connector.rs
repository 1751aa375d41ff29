// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::app::config::GlobalSettings;
use crate::common::error::AppError;
use crate::common::retry::{RetryPolicy, retry_async};
use crate::domain::account::Account;
use crate::domain::chain::Network;
use crate::domain::constants::{
    DEFAULT_PRIORITY_FEE_WEI, FULL_BALANCE_GAS_HEADROOM_BPS, GAS_LIMIT_MULTIPLIER_BPS,
    RECEIPT_POLL_INTERVAL, SCROLL_GAS_PRICE_MULTIPLIER_BPS, VERIFY_TX_TIMEOUT,
};
use crate::domain::token::{Asset, apply_bps};
use crate::infrastructure::network::erc20;
use crate::infrastructure::network::provider::{ConnectionFactory, HttpProvider};
use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, B256, Bytes, TxKind, U256};
use alloy::providers::Provider;
use alloy::rpc::types::eth::{TransactionInput, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A call or transaction before fees and nonce are attached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxCall {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    /// Exact gas limit; estimated (with headroom) when absent.
    pub gas_limit: Option<u64>,
}

impl TxCall {
    pub fn new(to: Address, data: Bytes) -> Self {
        Self {
            to,
            data,
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

/// One account's signing view of one network.
#[async_trait]
pub trait ChainConnector: Send + Sync {
    fn network(&self) -> Network;
    fn address(&self) -> Address;

    async fn balance(&self, asset: Asset) -> Result<U256, AppError>;
    /// Current gas price in wei.
    async fn gas_price(&self) -> Result<u128, AppError>;
    async fn estimate_gas(&self, tx: &TxCall) -> Result<u64, AppError>;
    /// Read-only `eth_call` from this account.
    async fn call(&self, tx: &TxCall) -> Result<Bytes, AppError>;
    async fn send(&self, tx: TxCall) -> Result<B256, AppError>;
    /// `Ok(true)` for a successful receipt, `Ok(false)` for a revert or no
    /// receipt within `timeout`.
    async fn confirm(&self, hash: B256, timeout: Duration) -> Result<bool, AppError>;

    /// Send and wait for a successful receipt.
    async fn submit(&self, tx: TxCall) -> Result<B256, AppError> {
        let hash = self.send(tx).await?;
        if self.confirm(hash, VERIFY_TX_TIMEOUT).await? {
            tracing::info!(
                target: "rpc",
                account = %self.address(),
                url = %self.network().tx_url(&format!("{hash:#x}")),
                "Transaction confirmed"
            );
            Ok(hash)
        } else {
            Err(AppError::Transaction {
                hash: format!("{hash:#x}"),
                reason: "reverted or not mined in time".into(),
            })
        }
    }
}

/// Native amount that can be sent with `template` while leaving room for gas.
/// Returns the amount and the gas limit to send it with.
pub async fn spendable_native(
    conn: &dyn ChainConnector,
    template: &TxCall,
) -> Result<(U256, u64), AppError> {
    let balance = conn.balance(Asset::Native).await?;
    let estimate = conn.estimate_gas(template).await?;
    let gas_limit = apply_bps_u64(estimate, GAS_LIMIT_MULTIPLIER_BPS);
    let gas_price = conn.gas_price().await?;
    let cost = apply_bps(
        U256::from(estimate) * U256::from(gas_price),
        FULL_BALANCE_GAS_HEADROOM_BPS,
    );
    if balance <= cost {
        return Err(AppError::InsufficientFunds {
            required: cost.to_string(),
            available: balance.to_string(),
        });
    }
    Ok((balance - cost, gas_limit))
}

/// Send native currency. `None` sends the whole balance minus gas.
pub async fn transfer_native(
    conn: &dyn ChainConnector,
    to: Address,
    amount: Option<U256>,
) -> Result<B256, AppError> {
    let tx = match amount {
        Some(value) => TxCall::new(to, Bytes::new()).with_value(value),
        None => {
            let estimate_tx = TxCall::new(to, Bytes::new()).with_value(U256::from(
                crate::domain::constants::TRANSFER_SIMULATION_VALUE_WEI,
            ));
            let (value, gas_limit) = spendable_native(conn, &estimate_tx).await?;
            TxCall::new(to, Bytes::new())
                .with_value(value)
                .with_gas_limit(gas_limit)
        }
    };
    conn.submit(tx).await
}

pub fn apply_bps_u64(value: u64, bps: u64) -> u64 {
    ((value as u128 * bps as u128) / 10_000) as u64
}

pub struct EvmConnector {
    network: Network,
    signer: PrivateKeySigner,
    provider: HttpProvider,
}

impl EvmConnector {
    pub fn new(network: Network, signer: PrivateKeySigner, provider: HttpProvider) -> Self {
        Self {
            network,
            signer,
            provider,
        }
    }

    fn request(&self, tx: &TxCall) -> TransactionRequest {
        TransactionRequest {
            from: Some(self.signer.address()),
            to: Some(TxKind::Call(tx.to)),
            value: Some(tx.value),
            input: TransactionInput::new(tx.data.clone()),
            chain_id: Some(self.network.chain_id()),
            ..Default::default()
        }
    }

    async fn fees(&self) -> Result<(u128, u128), AppError> {
        let gas_price = self.gas_price().await?;
        let max_fee = if self.network == Network::Scroll {
            gas_price.saturating_mul(SCROLL_GAS_PRICE_MULTIPLIER_BPS as u128) / 10_000
        } else {
            gas_price
        };
        let priority = self
            .provider
            .get_max_priority_fee_per_gas()
            .await
            .unwrap_or(DEFAULT_PRIORITY_FEE_WEI);
        Ok((max_fee, priority.min(max_fee)))
    }
}

#[async_trait]
impl ChainConnector for EvmConnector {
    fn network(&self) -> Network {
        self.network
    }

    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn balance(&self, asset: Asset) -> Result<U256, AppError> {
        match asset {
            Asset::Native => {
                let owner = self.address();
                retry_async("get_balance", RetryPolicy::RPC, |_| async move {
                    self.provider.get_balance(owner).await
                })
                .await
                .map_err(|e| AppError::Connection(format!("{} balance failed: {e}", self.network)))
            }
            Asset::Erc20(token) => erc20::balance_of(self, token, self.address()).await,
        }
    }

    async fn gas_price(&self) -> Result<u128, AppError> {
        retry_async("gas_price", RetryPolicy::RPC, |_| async {
            self.provider.get_gas_price().await
        })
        .await
        .map_err(|e| AppError::Connection(format!("{} gas price failed: {e}", self.network)))
    }

    async fn estimate_gas(&self, tx: &TxCall) -> Result<u64, AppError> {
        let request = self.request(tx);
        self.provider
            .estimate_gas(request)
            .await
            .map_err(|e| AppError::Transaction {
                hash: String::new(),
                reason: format!("gas estimation failed: {e}"),
            })
    }

    async fn call(&self, tx: &TxCall) -> Result<Bytes, AppError> {
        let request = self.request(tx);
        retry_async("eth_call", RetryPolicy::RPC, |_| {
            let request = request.clone();
            async move { self.provider.call(request).await }
        })
        .await
        .map_err(|e| AppError::Connection(format!("{} eth_call failed: {e}", self.network)))
    }

    async fn send(&self, tx: TxCall) -> Result<B256, AppError> {
        let gas_limit = match tx.gas_limit {
            Some(limit) => limit,
            None => apply_bps_u64(self.estimate_gas(&tx).await?, GAS_LIMIT_MULTIPLIER_BPS),
        };
        let (max_fee_per_gas, max_priority_fee_per_gas) = self.fees().await?;
        let owner = self.address();
        let nonce = retry_async("get_transaction_count", RetryPolicy::RPC, |_| async move {
            self.provider.get_transaction_count(owner).pending().await
        })
        .await
        .map_err(|e| AppError::Connection(format!("nonce fetch failed: {e}")))?;

        let mut raw_tx = TxEip1559 {
            chain_id: self.network.chain_id(),
            nonce,
            max_priority_fee_per_gas,
            max_fee_per_gas,
            gas_limit,
            to: TxKind::Call(tx.to),
            value: tx.value,
            access_list: Default::default(),
            input: tx.data,
        };

        let sig = TxSignerSync::sign_transaction_sync(&self.signer, &mut raw_tx)
            .map_err(|e| AppError::Transaction {
                hash: String::new(),
                reason: format!("Sign tx failed: {e}"),
            })?;
        let signed: TxEnvelope = raw_tx.into_signed(sig).into();
        let encoded = signed.encoded_2718();
        let pending = self
            .provider
            .send_raw_transaction(&encoded)
            .await
            .map_err(|e| AppError::Transaction {
                hash: format!("{:#x}", signed.tx_hash()),
                reason: e.to_string(),
            })?;
        let hash = *pending.tx_hash();
        tracing::debug!(
            target: "rpc",
            network = %self.network,
            account = %owner,
            hash = %hash,
            nonce,
            gas_limit,
            "Transaction sent"
        );
        Ok(hash)
    }

    async fn confirm(&self, hash: B256, timeout: Duration) -> Result<bool, AppError> {
        let started = Instant::now();
        loop {
            match self.provider.get_transaction_receipt(hash).await {
                Ok(Some(rcpt)) => {
                    let status = rcpt.status();
                    if !status {
                        tracing::warn!(target: "rpc", hash = %hash, "Transaction reverted");
                    }
                    return Ok(status);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(target: "rpc", hash = %hash, error = %e, "Receipt poll failed");
                }
            }
            if started.elapsed() >= timeout {
                tracing::warn!(target: "rpc", hash = %hash, "No receipt before timeout");
                return Ok(false);
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}

/// Builds connectors for an account on a network.
pub trait ConnectorFactory: Send + Sync {
    fn connect(
        &self,
        account: &Account,
        network: Network,
    ) -> Result<Arc<dyn ChainConnector>, AppError>;
}

/// Production factory. HTTP clients are shared per proxy.
pub struct EvmConnectorFactory {
    rpc_urls: HashMap<Network, String>,
    clients: Mutex<HashMap<Option<String>, reqwest::Client>>,
}

impl EvmConnectorFactory {
    pub fn from_settings(settings: &GlobalSettings) -> Self {
        let rpc_urls = Network::ALL
            .iter()
            .map(|n| (*n, settings.rpc_url(*n)))
            .collect();
        Self {
            rpc_urls,
            clients: Mutex::new(HashMap::new()),
        }
    }

    fn client_for(&self, proxy: Option<&str>) -> Result<reqwest::Client, AppError> {
        let key = proxy.map(ToString::to_string);
        let mut guard = self
            .clients
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(client) = guard.get(&key) {
            return Ok(client.clone());
        }
        let client = ConnectionFactory::http_client(proxy)?;
        guard.insert(key, client.clone());
        Ok(client)
    }
}

impl ConnectorFactory for EvmConnectorFactory {
    fn connect(
        &self,
        account: &Account,
        network: Network,
    ) -> Result<Arc<dyn ChainConnector>, AppError> {
        let url = self
            .rpc_urls
            .get(&network)
            .ok_or_else(|| AppError::Config(format!("No RPC URL for {network}")))?;
        let client = self.client_for(account.proxy.as_deref())?;
        let provider = ConnectionFactory::http_with_client(url, client)?;
        let signer = account.private_key.signer()?;
        Ok(Arc::new(EvmConnector::new(network, signer, provider)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_limit_headroom_is_twenty_percent() {
        assert_eq!(apply_bps_u64(21_000, GAS_LIMIT_MULTIPLIER_BPS), 25_200);
    }

    #[test]
    fn tx_call_builder_sets_fields() {
        let call = TxCall::new(Address::repeat_byte(1), Bytes::from_static(&[1, 2]))
            .with_value(U256::from(5u64))
            .with_gas_limit(50_000);
        assert_eq!(call.value, U256::from(5u64));
        assert_eq!(call.gas_limit, Some(50_000));
    }
}
