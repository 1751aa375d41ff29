// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use alloy::network::Ethereum;
use alloy::providers::RootProvider;
use alloy::rpc::client::RpcClient;
use alloy::transports::http::Http;
use std::time::Duration;
use url::Url;

pub type HttpProvider = RootProvider<Ethereum>;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ConnectionFactory;

impl ConnectionFactory {
    pub fn http(rpc_url: &str) -> Result<HttpProvider, AppError> {
        let url =
            Url::parse(rpc_url).map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))?;

        let provider = RootProvider::new_http(url);
        Ok(provider)
    }

    /// HTTP provider on a caller-supplied client, so per-account proxies
    /// apply to RPC traffic too.
    pub fn http_with_client(rpc_url: &str, client: reqwest::Client) -> Result<HttpProvider, AppError> {
        let url =
            Url::parse(rpc_url).map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))?;
        let rpc = RpcClient::new(Http::with_client(client, url), false);
        Ok(RootProvider::new(rpc))
    }

    /// reqwest client routed through `proxy` (already in URL form).
    pub fn http_client(proxy: Option<&str>) -> Result<reqwest::Client, AppError> {
        let mut builder = reqwest::Client::builder().timeout(HTTP_TIMEOUT);
        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| AppError::Config(format!("Invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }
        builder
            .build()
            .map_err(|e| AppError::Initialization(format!("HTTP client build failed: {}", e)))
    }
}
