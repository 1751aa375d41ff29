// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::app::config::OkxCredentials;
use crate::common::delay::{Span, sleep_range};
use crate::common::error::AppError;
use crate::common::retry::{RetryPolicy, retry_async};
use crate::domain::chain::Network;
use crate::domain::constants::OKX_API_BASE;
use crate::domain::token::Token;
use alloy::primitives::Address;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const STATE_COMPLETE: &str = "Withdrawal complete";
const STATE_CANCELLED: &str = "Cancelation complete";

/// Centralized-exchange withdrawal to an on-chain address.
///
/// Returns once the exchange reports the withdrawal as final. Arrival on
/// chain is the caller's concern. A withdrawal the exchange cancels
/// surfaces as [`AppError::WithdrawalCancelled`].
#[async_trait]
pub trait ExchangeWithdrawal: Send + Sync {
    async fn withdraw(
        &self,
        amount: f64,
        token: Token,
        network: Network,
        to: Address,
    ) -> Result<(), AppError>;
}

#[derive(Deserialize, Debug)]
struct Envelope<T> {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SubAccount {
    sub_acct: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SubBalance {
    avail_bal: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct WithdrawalReceipt {
    wd_id: String,
}

#[derive(Deserialize, Debug)]
struct WithdrawalStatus {
    state: String,
}

/// Final-status outcome derived from the status text OKX reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusOutcome {
    Complete,
    Cancelled,
    Pending,
}

fn classify_status(state: &str) -> StatusOutcome {
    if state.contains(STATE_CANCELLED) {
        StatusOutcome::Cancelled
    } else if state.contains(STATE_COMPLETE) {
        StatusOutcome::Complete
    } else {
        StatusOutcome::Pending
    }
}

/// `OK-ACCESS-SIGN`: base64(HMAC-SHA256(secret, ts + method + path + body)).
pub fn sign_request(secret: &str, timestamp: &str, method: &str, path: &str, body: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC accepts keys of any length"),
    };
    mac.update(timestamp.as_bytes());
    mac.update(method.as_bytes());
    mac.update(path.as_bytes());
    mac.update(body.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// OKX REST v5 client for main-account withdrawals.
pub struct OkxClient {
    client: Client,
    base_url: String,
    credentials: OkxCredentials,
    status_attempts: u32,
    status_delay: Span<u64>,
}

impl OkxClient {
    pub fn new(
        client: Client,
        credentials: OkxCredentials,
        status_attempts: u32,
        status_delay: Span<u64>,
    ) -> Self {
        Self {
            client,
            base_url: OKX_API_BASE.to_string(),
            credentials,
            status_attempts,
            status_delay,
        }
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Vec<T>, AppError> {
        let body_text = body.map(Value::to_string).unwrap_or_default();
        let timestamp = chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();
        let signature = sign_request(
            &self.credentials.secret,
            &timestamp,
            method.as_str(),
            path,
            &body_text,
        );

        let mut req = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header("OK-ACCESS-KEY", &self.credentials.key)
            .header("OK-ACCESS-SIGN", signature)
            .header("OK-ACCESS-TIMESTAMP", timestamp)
            .header("OK-ACCESS-PASSPHRASE", &self.credentials.passphrase)
            .header("Content-Type", "application/json");
        if body.is_some() {
            req = req.body(body_text);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| AppError::Connection(format!("OKX request failed: {e}")))?;
        let status = resp.status();
        let envelope: Envelope<T> = resp.json().await.map_err(|_| AppError::ApiCall {
            provider: format!("OKX {path}"),
            status: status.as_u16(),
        })?;
        if envelope.code != "0" {
            tracing::warn!(
                target: "okx",
                path,
                code = %envelope.code,
                msg = %envelope.msg,
                "OKX rejected request"
            );
            return Err(AppError::ApiCall {
                provider: format!("OKX {path}: {} {}", envelope.code, envelope.msg),
                status: status.as_u16(),
            });
        }
        Ok(envelope.data)
    }

    /// Moves every sub-account's available balance to the main funding
    /// account. Individual sub-account failures are logged and skipped.
    async fn sweep_sub_accounts(&self, ccy: &str) -> Result<(), AppError> {
        let subs: Vec<SubAccount> = self
            .request(Method::GET, "/api/v5/users/subaccount/list", None)
            .await?;
        for sub in subs {
            let path = format!(
                "/api/v5/asset/subaccount/balances?subAcct={}&ccy={ccy}",
                sub.sub_acct
            );
            let balances: Vec<SubBalance> = match self.request(Method::GET, &path, None).await {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(target: "okx", sub = %sub.sub_acct, error = %e, "Sub-account balance failed");
                    continue;
                }
            };
            let Some(amount) = balances.first().map(|b| b.avail_bal.clone()) else {
                continue;
            };
            if amount.parse::<f64>().unwrap_or(0.0) <= 0.0 {
                continue;
            }
            let body = json!({
                "ccy": ccy,
                "amt": amount,
                "from": "6",
                "to": "6",
                "type": "2",
                "subAcct": &sub.sub_acct,
            });
            match self
                .request::<Value>(Method::POST, "/api/v5/asset/transfer", Some(&body))
                .await
            {
                Ok(_) => tracing::info!(
                    target: "okx",
                    sub = %sub.sub_acct,
                    amount = %amount,
                    ccy,
                    "Swept sub-account to main account"
                ),
                Err(e) => tracing::warn!(
                    target: "okx",
                    sub = %sub.sub_acct,
                    error = %e,
                    "Sub-account transfer failed"
                ),
            }
        }
        Ok(())
    }

    async fn await_final_status(&self, wd_id: &str) -> Result<(), AppError> {
        let path = format!("/api/v5/asset/deposit-withdraw-status?wdId={wd_id}");
        for attempt in 1..=self.status_attempts {
            let statuses: Vec<WithdrawalStatus> =
                self.request(Method::GET, &path, None).await?;
            let state = statuses.first().map(|s| s.state.as_str()).unwrap_or("");
            match classify_status(state) {
                StatusOutcome::Complete => {
                    tracing::info!(target: "okx", wd_id, "Withdrawal sent from OKX");
                    return Ok(());
                }
                StatusOutcome::Cancelled => {
                    tracing::error!(target: "okx", wd_id, "Withdrawal cancelled by OKX");
                    return Err(AppError::WithdrawalCancelled(wd_id.to_string()));
                }
                StatusOutcome::Pending => {
                    tracing::debug!(target: "okx", wd_id, attempt, state, "Withdrawal pending");
                    sleep_range(self.status_delay).await;
                }
            }
        }
        Err(AppError::ApiCall {
            provider: format!("OKX withdrawal {wd_id} not final after {} checks", self.status_attempts),
            status: 0,
        })
    }
}

#[async_trait]
impl ExchangeWithdrawal for OkxClient {
    async fn withdraw(
        &self,
        amount: f64,
        token: Token,
        network: Network,
        to: Address,
    ) -> Result<(), AppError> {
        let (okx_network, fee) = network.okx_withdrawal().ok_or_else(|| {
            AppError::Validation {
                field: "network".into(),
                message: format!("OKX does not withdraw to {network}"),
            }
        })?;
        let ccy = token.symbol();
        tracing::info!(
            target: "okx",
            account = %to,
            amount,
            ccy,
            network = %network,
            "Withdrawing from OKX"
        );

        self.sweep_sub_accounts(ccy).await?;

        let body = json!({
            "ccy": ccy,
            "amt": amount.to_string(),
            "dest": "4",
            "toAddr": to.to_string(),
            "fee": fee,
            "chain": format!("{ccy}-{okx_network}"),
        });
        let body = &body;
        let receipts: Vec<WithdrawalReceipt> =
            retry_async("okx_withdrawal", RetryPolicy::EXCHANGE, move |_| {
                self.request(Method::POST, "/api/v5/asset/withdrawal", Some(body))
            })
            .await?;
        let wd_id = receipts
            .first()
            .map(|r| r.wd_id.clone())
            .ok_or_else(|| AppError::ApiCall {
                provider: "OKX withdrawal returned no wdId".into(),
                status: 0,
            })?;

        self.await_final_status(&wd_id).await
    }
}
