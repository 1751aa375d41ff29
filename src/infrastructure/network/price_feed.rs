// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use crate::common::retry::{RetryPolicy, retry_async};
use crate::domain::constants::TOKEN_PRICE_URL;
use crate::domain::token::Token;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const CACHE_TTL: Duration = Duration::from_secs(60);

/// Reference-currency (USD) prices for tokens, in input order.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn prices(&self, tokens: &[Token]) -> Result<Vec<f64>, AppError>;

    async fn price(&self, token: Token) -> Result<f64, AppError> {
        let prices = self.prices(&[token]).await?;
        prices.first().copied().ok_or_else(|| AppError::ApiCall {
            provider: "price oracle".into(),
            status: 0,
        })
    }
}

#[derive(Deserialize, Debug)]
struct TickerEntry {
    id: String,
    price_usd: String,
}

/// Coinlore ticker client. Prices are cached per ticker id.
#[derive(Clone)]
pub struct PriceFeed {
    client: Client,
    base_url: String,
    // Map: ticker id -> (price, fetched at)
    cache: Arc<RwLock<HashMap<String, (f64, Instant)>>>,
}

impl PriceFeed {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, TOKEN_PRICE_URL)
    }

    pub fn with_base_url(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn fetch(&self, ids: &[&'static str]) -> Result<HashMap<String, f64>, AppError> {
        let url = format!("{}{}", self.base_url, ids.join(","));
        let entries: Vec<TickerEntry> = retry_async("price_fetch", RetryPolicy::PRICE, |_| {
            let url = url.clone();
            async move {
                let resp = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| AppError::Connection(format!("price request failed: {e}")))?;
                if !resp.status().is_success() {
                    return Err(AppError::ApiCall {
                        provider: "coinlore".into(),
                        status: resp.status().as_u16(),
                    });
                }
                resp.json::<Vec<TickerEntry>>()
                    .await
                    .map_err(|_| AppError::ApiCall {
                        provider: "coinlore JSON".into(),
                        status: 0,
                    })
            }
        })
        .await?;

        Ok(entries
            .into_iter()
            .filter_map(|e| e.price_usd.parse::<f64>().ok().map(|p| (e.id, p)))
            .collect())
    }
}

#[async_trait]
impl PriceOracle for PriceFeed {
    async fn prices(&self, tokens: &[Token]) -> Result<Vec<f64>, AppError> {
        let mut found: HashMap<&'static str, f64> = HashMap::new();
        {
            let read_guard = self.cache.read().await;
            for token in tokens {
                if let Some((price, at)) = read_guard.get(token.price_id())
                    && at.elapsed() < CACHE_TTL
                {
                    found.insert(token.price_id(), *price);
                }
            }
        }

        let mut missing: Vec<&'static str> = tokens
            .iter()
            .map(|t| t.price_id())
            .filter(|id| !found.contains_key(id))
            .collect();
        missing.sort_unstable();
        missing.dedup();

        if !missing.is_empty() {
            let fetched = self.fetch(&missing).await?;
            let mut write_guard = self.cache.write().await;
            for id in missing {
                let price = fetched.get(id).copied().ok_or_else(|| AppError::ApiCall {
                    provider: format!("coinlore id {id}"),
                    status: 0,
                })?;
                write_guard.insert(id.to_string(), (price, Instant::now()));
                found.insert(id, price);
            }
        }

        Ok(tokens.iter().map(|t| found[t.price_id()]).collect())
    }
}

/// Fixed prices, for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticPrices(pub HashMap<Token, f64>);

#[async_trait]
impl PriceOracle for StaticPrices {
    async fn prices(&self, tokens: &[Token]) -> Result<Vec<f64>, AppError> {
        tokens
            .iter()
            .map(|t| {
                self.0.get(t).copied().ok_or_else(|| AppError::ApiCall {
                    provider: format!("static price {t}"),
                    status: 0,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cached_prices_skip_the_network() {
        // Unroutable base URL: any fetch would fail.
        let feed = PriceFeed::with_base_url(Client::new(), "http://127.0.0.1:9/?id=");
        {
            let mut guard = feed.cache.write().await;
            guard.insert("80".into(), (3000.0, Instant::now()));
            guard.insert("518".into(), (1.0, Instant::now()));
        }
        let prices = feed.prices(&[Token::Weth, Token::Usdt, Token::Eth]).await.unwrap();
        assert_eq!(prices, vec![3000.0, 1.0, 3000.0]);
    }

    #[tokio::test]
    async fn static_prices_report_missing_tokens() {
        let oracle = StaticPrices(HashMap::from([(Token::Eth, 2500.0)]));
        assert_eq!(oracle.price(Token::Eth).await.unwrap(), 2500.0);
        assert!(oracle.price(Token::Usdc).await.is_err());
    }

    #[test]
    fn ticker_payload_decodes() {
        let body = r#"[{"id":"80","symbol":"ETH","price_usd":"3120.55"}]"#;
        let parsed: Vec<TickerEntry> = serde_json::from_str(body).unwrap();
        assert_eq!(parsed[0].id, "80");
        assert_eq!(parsed[0].price_usd, "3120.55");
    }
}
