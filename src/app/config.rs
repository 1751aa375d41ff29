// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::data_path::{DataPaths, resolve_data_dir};
use crate::common::delay::Span;
use crate::domain::chain::Network;
use crate::domain::error::AppError;
use crate::domain::token::Token;
use crate::domain::venue::{ActionFamily, BridgeVenue, LendingVenue, SwapVenue};
use alloy::primitives::{Address, address};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use url::Url;

/// One NFT2Me collection the warmup may mint from.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct NftCollection {
    pub address: Address,
    #[serde(default = "default_mint_fee")]
    pub mint_fee: f64,
    #[serde(default = "default_nft_amount")]
    pub amount: Span<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_false")]
    pub log_json: bool,
    pub data_dir: Option<String>,
    pub database_path: Option<String>,
    /// Network name (lowercase) -> HTTP RPC URL.
    pub http_providers: Option<HashMap<String, String>>,
    #[serde(default = "default_true")]
    pub shuffle_database: bool,

    // Pacing
    #[serde(default = "default_tx_delay_range")]
    pub tx_delay_range: Span<u64>,
    #[serde(default = "default_wallet_delay_range")]
    pub wallet_delay_range: Span<u64>,
    #[serde(default = "default_post_bridge_delay_range")]
    pub post_bridge_delay_range: Span<u64>,
    #[serde(default = "default_arrival_delay_range")]
    pub arrival_delay_range: Span<u64>,
    #[serde(default = "default_arrival_attempts")]
    pub arrival_attempts: u32,

    // Fee guard
    #[serde(default = "default_gas_threshold_gwei")]
    pub gas_threshold_gwei: f64,
    #[serde(default = "default_gas_delay_range")]
    pub gas_delay_range: Span<u64>,
    /// "ERC20" (mainnet) or "SCROLL".
    #[serde(default = "default_gas_chain")]
    pub gas_chain: String,

    // Warmup quotas
    #[serde(default)]
    pub swap_counts: BTreeMap<SwapVenue, Span<u32>>,
    #[serde(default)]
    pub lending_counts: BTreeMap<LendingVenue, Span<u32>>,
    #[serde(default = "default_zero_count")]
    pub dmail_count: Span<u32>,
    #[serde(default = "default_rubyscore_count")]
    pub rubyscore_count: Span<u32>,
    #[serde(default = "default_nft_collections")]
    pub nft_collections: Vec<NftCollection>,
    #[serde(default = "default_max_nft_owned")]
    pub max_nft_owned: u32,
    #[serde(default = "default_false")]
    pub register_domains: bool,

    // Warmup sizing
    #[serde(default = "default_swap_percentage_range")]
    pub swap_percentage_range: Span<u32>,
    #[serde(default = "default_true")]
    pub use_eth_backswap: bool,
    #[serde(default = "default_lending_percentage_range")]
    pub lending_percentage_range: Span<u32>,
    #[serde(default = "default_slippage_percent")]
    pub slippage_percent: f64,

    // Directed bridge
    #[serde(default = "default_bridge_venue")]
    pub bridge_to_use: String,
    #[serde(default = "default_bridge_src_chain")]
    pub bridge_src_chain: String,
    #[serde(default = "default_bridge_dst_chain")]
    pub bridge_dst_chain: String,
    #[serde(default = "default_false")]
    pub use_okx_withdraw: bool,
    #[serde(default = "default_okx_withdraw_amount_range")]
    pub okx_withdraw_amount_range: Span<f64>,
    #[serde(default = "default_bridge_amount_range")]
    pub bridge_amount_range: Span<f64>,
    #[serde(default = "default_true")]
    pub bridge_full_balance: bool,
    #[serde(default = "default_false")]
    pub bridge_use_keep_amount: bool,
    #[serde(default = "default_zero_amount")]
    pub bridge_keep_amount_range: Span<f64>,

    // Volume cycles
    #[serde(default = "default_volume_chain")]
    pub volume_chain: String,
    #[serde(default = "default_bridge_venue")]
    pub volume_bridge_in: String,
    #[serde(default = "default_bridge_venue")]
    pub volume_bridge_out: String,
    #[serde(default = "default_true")]
    pub volume_use_keep_amount: bool,
    #[serde(default = "default_zero_amount")]
    pub amount_to_leave_on_src_chain_range: Span<f64>,
    #[serde(default = "default_zero_amount")]
    pub amount_to_leave_on_scroll_range: Span<f64>,
    #[serde(default = "default_zero_amount")]
    pub amount_to_leave_before_transfer: Span<f64>,
    #[serde(default = "default_zero_amount")]
    pub cog_volume_goal_range: Span<f64>,
    #[serde(default = "default_wrap_percentage_range")]
    pub wrap_percentage_range: Span<u32>,
    #[serde(default = "default_wrap_percentage_range")]
    pub wrapped_usage_percentage_range: Span<u32>,
    #[serde(default = "default_zero_amount")]
    pub volume_usd_goal_range: Span<f64>,
    /// Family -> venue names, e.g. `swap = ["spacefi", "zebra"]`.
    #[serde(default = "default_volume_dapps")]
    pub volume_dapps: BTreeMap<String, Vec<String>>,
    pub cog_pool_address: Option<Address>,

    // Collector
    #[serde(default = "default_min_collect_usd")]
    pub min_collect_usd: f64,
    #[serde(default = "default_tokens_to_collect")]
    pub tokens_to_collect: Vec<String>,

    // Exchange
    pub okx_api_key: Option<String>,
    pub okx_api_secret: Option<String>,
    pub okx_api_password: Option<String>,
    #[serde(default = "default_okx_status_attempts")]
    pub okx_status_attempts: u32,
    #[serde(default = "default_okx_status_delay_range")]
    pub okx_status_delay_range: Span<u64>,

    // Proxies
    #[serde(default = "default_false")]
    pub use_mobile_proxy: bool,
    pub proxy_change_ip_url: Option<String>,

    // Notifications
    #[serde(default = "default_false")]
    pub log_to_telegram: bool,
    pub telegram_bot_token: Option<String>,
    #[serde(default)]
    pub telegram_ids: Vec<i64>,
    #[serde(default = "default_notify_levels")]
    pub notify_levels: Vec<String>,
}

// Defaults
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_tx_delay_range() -> Span<u64> {
    Span::new(30, 100)
}
fn default_wallet_delay_range() -> Span<u64> {
    Span::new(1, 5)
}
fn default_post_bridge_delay_range() -> Span<u64> {
    Span::new(20, 30)
}
fn default_arrival_delay_range() -> Span<u64> {
    Span::new(60, 60)
}
fn default_arrival_attempts() -> u32 {
    30
}
fn default_gas_threshold_gwei() -> f64 {
    60.0
}
fn default_gas_delay_range() -> Span<u64> {
    Span::new(10, 15)
}
fn default_gas_chain() -> String {
    "ERC20".to_string()
}
fn default_zero_count() -> Span<u32> {
    Span::new(0, 0)
}
fn default_rubyscore_count() -> Span<u32> {
    Span::new(1, 1)
}
fn default_mint_fee() -> f64 {
    0.0006
}
fn default_nft_amount() -> Span<u32> {
    Span::new(0, 1)
}
fn default_nft_collections() -> Vec<NftCollection> {
    [
        address!("A17D12bdA7B910281E2D1f52c6FD3002a0DBF8EF"),
        address!("08d544c99c92E4Ad3fCEa33148da223b15BABB51"),
        address!("049FCf09b857DC2CE5AaCBa3543256e1B31399C1"),
        address!("09ad16d391b08b529Ebe07e67098745248E00BD8"),
        address!("E0455ACFfb322f4eCEA6B8e86C558A398Abc7C6d"),
        address!("Be08E34B25276B42A802e795759e094C96f9BbFe"),
        address!("a715d214Fe2BA8E9eCaF35B61B42E07fB9AE6d8F"),
        address!("a4E928b809807b73CC63F57b98D972D11913532e"),
        address!("bBd3595240C8218328b52890ed9406EC0a941B00"),
    ]
    .into_iter()
    .map(|address| NftCollection {
        address,
        mint_fee: default_mint_fee(),
        amount: default_nft_amount(),
    })
    .collect()
}
fn default_max_nft_owned() -> u32 {
    2
}
fn default_swap_percentage_range() -> Span<u32> {
    Span::new(55, 65)
}
fn default_lending_percentage_range() -> Span<u32> {
    Span::new(20, 30)
}
fn default_slippage_percent() -> f64 {
    5.0
}
fn default_bridge_venue() -> String {
    "orbiter".to_string()
}
fn default_bridge_src_chain() -> String {
    "LINEA".to_string()
}
fn default_bridge_dst_chain() -> String {
    "SCROLL".to_string()
}
fn default_okx_withdraw_amount_range() -> Span<f64> {
    Span::new(0.003, 0.004)
}
fn default_bridge_amount_range() -> Span<f64> {
    Span::new(0.1, 0.2)
}
fn default_zero_amount() -> Span<f64> {
    Span::new(0.0, 0.0)
}
fn default_volume_chain() -> String {
    "LINEA".to_string()
}
fn default_wrap_percentage_range() -> Span<u32> {
    Span::new(80, 90)
}
fn default_volume_dapps() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([
        (
            "swap".to_string(),
            SwapVenue::ALL.iter().map(|v| v.to_string()).collect(),
        ),
        (
            "lending".to_string(),
            LendingVenue::ALL.iter().map(|v| v.to_string()).collect(),
        ),
    ])
}
fn default_min_collect_usd() -> f64 {
    0.05
}
fn default_tokens_to_collect() -> Vec<String> {
    ["WETH", "lETH", "USDC", "USDT"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_okx_status_attempts() -> u32 {
    60
}
fn default_okx_status_delay_range() -> Span<u64> {
    Span::new(20, 30)
}
fn default_notify_levels() -> Vec<String> {
    vec!["error".to_string()]
}

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let selected_config = resolve_config_path(path);
        let mut builder = Config::builder();

        if let Some(ref selected_path) = selected_config {
            builder = builder.add_source(File::from(Path::new(selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Environment wins over the selected file.
        builder = builder.add_source(Environment::default());

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load() -> Result<Self, AppError> {
        Self::load_with_path(None)
    }

    /// Every field at its default, with no file or environment sources.
    pub fn from_defaults() -> Result<Self, AppError> {
        let settings: GlobalSettings = Config::builder().build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would only fail later, mid-run.
    pub fn validate(&self) -> Result<(), AppError> {
        self.gas_network()?;
        self.bridge_src_network()?;
        self.bridge_dst_network()?;
        self.volume_network()?;
        self.bridge_venue()?;
        self.volume_bridge_in_venue()?;
        self.volume_bridge_out_venue()?;
        self.tokens_to_collect()?;
        self.volume_actions()?;
        if self.min_collect_usd.is_nan() || self.min_collect_usd <= 0.0 {
            return Err(AppError::Config(format!(
                "min_collect_usd must be positive, got {}",
                self.min_collect_usd
            )));
        }
        for network in Network::ALL {
            let url = self.rpc_url(network);
            Url::parse(&url).map_err(|e| {
                AppError::Config(format!("Invalid RPC URL for {network}: {url} ({e})"))
            })?;
        }
        if self.use_mobile_proxy && self.proxy_change_ip_url().is_none() {
            return Err(AppError::Config(
                "use_mobile_proxy requires proxy_change_ip_url".to_string(),
            ));
        }
        Ok(())
    }

    pub fn data_paths(&self) -> DataPaths {
        DataPaths::in_dir(resolve_data_dir(self.data_dir.as_deref()))
            .with_database(self.database_path.as_deref())
    }

    /// RPC URL for a network: configured map, then `http_provider_<name>`
    /// env, then the public default.
    pub fn rpc_url(&self, network: Network) -> String {
        let key = network.name().to_ascii_lowercase();
        if let Some(urls) = &self.http_providers
            && let Some(url) = urls.get(&key)
        {
            return url.trim().to_string();
        }
        if let Ok(v) = std::env::var(format!("http_provider_{key}")) {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
        network.default_rpc().to_string()
    }

    pub fn gas_network(&self) -> Result<Network, AppError> {
        let network: Network = self.gas_chain.parse()?;
        match network {
            Network::Mainnet | Network::Scroll => Ok(network),
            other => Err(AppError::Config(format!(
                "gas_chain must be ERC20 or SCROLL, got {other}"
            ))),
        }
    }

    pub fn bridge_src_network(&self) -> Result<Network, AppError> {
        self.bridge_src_chain.parse()
    }

    pub fn bridge_dst_network(&self) -> Result<Network, AppError> {
        self.bridge_dst_chain.parse()
    }

    pub fn volume_network(&self) -> Result<Network, AppError> {
        let network: Network = self.volume_chain.parse()?;
        match network {
            Network::Zksync | Network::Linea | Network::Arbitrum => Ok(network),
            other => Err(AppError::Config(format!(
                "volume_chain must be ZKSYNC, LINEA or ARBITRUM, got {other}"
            ))),
        }
    }

    pub fn bridge_venue(&self) -> Result<BridgeVenue, AppError> {
        parse_venue("bridge_to_use", &self.bridge_to_use)
    }

    pub fn volume_bridge_in_venue(&self) -> Result<BridgeVenue, AppError> {
        parse_venue("volume_bridge_in", &self.volume_bridge_in)
    }

    pub fn volume_bridge_out_venue(&self) -> Result<BridgeVenue, AppError> {
        parse_venue("volume_bridge_out", &self.volume_bridge_out)
    }

    pub fn tokens_to_collect(&self) -> Result<Vec<Token>, AppError> {
        let mut out = Vec::with_capacity(self.tokens_to_collect.len());
        for raw in &self.tokens_to_collect {
            let token: Token = raw.parse()?;
            if token.is_native() {
                return Err(AppError::Config(
                    "tokens_to_collect cannot contain ETH".to_string(),
                ));
            }
            if !out.contains(&token) {
                out.push(token);
            }
        }
        Ok(out)
    }

    /// Configured volume-mode families and their venues. Unknown venue names
    /// are rejected here rather than skipped mid-cycle.
    pub fn volume_actions(&self) -> Result<VolumeActions, AppError> {
        let mut actions = VolumeActions::default();
        for (family, venues) in &self.volume_dapps {
            let family: ActionFamily = family
                .parse()
                .map_err(|e| AppError::Config(format!("volume_dapps: {e}")))?;
            for venue in venues {
                match family {
                    ActionFamily::Swap => actions.swaps.push(parse_venue("volume_dapps", venue)?),
                    ActionFamily::Lending => {
                        actions.lendings.push(parse_venue("volume_dapps", venue)?)
                    }
                }
            }
        }
        Ok(actions)
    }

    pub fn okx_credentials(&self) -> Option<OkxCredentials> {
        let key = non_empty(self.okx_api_key.as_deref())?;
        let secret = non_empty(self.okx_api_secret.as_deref())?;
        let passphrase = non_empty(self.okx_api_password.as_deref())?;
        Some(OkxCredentials {
            key,
            secret,
            passphrase,
        })
    }

    pub fn proxy_change_ip_url(&self) -> Option<String> {
        non_empty(self.proxy_change_ip_url.as_deref())
    }

    pub fn telegram_bot_token(&self) -> Option<String> {
        non_empty(self.telegram_bot_token.as_deref())
    }

    pub fn slippage_bps(&self) -> u64 {
        (self.slippage_percent.clamp(0.0, 100.0) * 100.0).round() as u64
    }
}

/// Venues the mixed volume cycle may pick from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeActions {
    pub swaps: Vec<SwapVenue>,
    pub lendings: Vec<LendingVenue>,
}

impl VolumeActions {
    pub fn families(&self) -> Vec<ActionFamily> {
        let mut out = Vec::new();
        if !self.swaps.is_empty() {
            out.push(ActionFamily::Swap);
        }
        if !self.lendings.is_empty() {
            out.push(ActionFamily::Lending);
        }
        out
    }
}

#[derive(Clone)]
pub struct OkxCredentials {
    pub key: String,
    pub secret: String,
    pub passphrase: String,
}

impl std::fmt::Debug for OkxCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OkxCredentials")
            .field("key", &"<redacted>")
            .finish()
    }
}

fn parse_venue<T>(field: &str, raw: &str) -> Result<T, AppError>
where
    T: std::str::FromStr<Err = crate::domain::venue::UnknownVenue>,
{
    raw.parse::<T>()
        .map_err(|e| AppError::Config(format!("{field}: {e}")))
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn resolve_config_path(path: Option<&str>) -> Option<String> {
    if let Some(path) = path {
        return Some(path.to_string());
    }
    detect_active_config_file()
}

fn detect_active_config_file() -> Option<String> {
    let priority_files = ["config.prod.toml", "config.dev.toml", "config.toml"];

    for file in priority_files.iter() {
        if let Some(true) = config_has_active_flag(file) {
            return Some((*file).to_string());
        }
    }

    // Fallback: scan current dir for config.*.toml with THIS_ACTIVE = true
    if let Ok(entries) = fs::read_dir(".") {
        for entry in entries.flatten() {
            let path = entry.path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str())
                && name.starts_with("config.")
                && name.ends_with(".toml")
                && let Some(true) = config_has_active_flag(name)
            {
                return Some(name.to_string());
            }
        }
    }

    None
}

fn config_has_active_flag(path: &str) -> Option<bool> {
    let p = Path::new(path);
    if !p.exists() {
        return None;
    }

    Config::builder()
        .add_source(File::from(p))
        .build()
        .ok()?
        .get_bool("THIS_ACTIVE")
        .ok()
}
