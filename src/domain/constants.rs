// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, address};
use std::time::Duration;

// =============================================================================
// SCROLL ASSETS
// =============================================================================

pub const WETH_SCROLL: Address = address!("5300000000000000000000000000000000000004");
pub const USDC_SCROLL: Address = address!("06eFdBFf2a14a7c8E15944D1F4A48F9F95F663A4");
pub const USDT_SCROLL: Address = address!("f55BEC9cafDbE8730f096Aa55dad6D22d44099Df");
pub const LETH_SCROLL: Address = address!("274C3795dadfEbf562932992bF241ae087e0a98C");

// =============================================================================
// SCROLL PROTOCOLS
// =============================================================================

pub const SPACEFI_ROUTER: Address = address!("18b71386418A9FCa5Ae7165E31c385a5130011b6");
pub const ZEBRA_ROUTER: Address = address!("0122960d6e391478bfe8fb2408ba412d5600f621");
pub const LAYERBANK_CORE: Address = address!("EC53c830f4444a8A56455c6836b5D2aA794289Aa");
pub const DMAIL_CONTRACT: Address = address!("47fbe95e981C0Df9737B6971B451fB15fdC989d9");
pub const RUBYSCORE_CONTRACT: Address = address!("e10Add2ad591A7AC3CA46788a06290De017b9fB4");

/// RubyScore `vote()` selector; the contract takes no arguments.
pub const RUBYSCORE_VOTE_SELECTOR: [u8; 4] = [0x63, 0x2a, 0x9a, 0x52];

// =============================================================================
// ORBITER
// =============================================================================

/// Orbiter maker EOA, shared across supported source chains.
pub const ORBITER_MAKER: Address = address!("80C67432656d59144cEFf962E8fAF8926599bCF8");
/// Routing code base; the destination id is added and encoded in the last wei digits.
pub const ORBITER_CHAIN_CODE_BASE: u64 = 9000;
/// Wei digits reserved for the routing code.
pub const ORBITER_CODE_DIGITS: u32 = 4;
/// Value used when estimating gas for a full-balance bridge.
pub const ORBITER_SIMULATION_VALUE_WEI: u128 = 100_000_000_000_000;
/// Maker trading fee added on top of the bridged amount (ETH-ETH routes).
pub const ORBITER_TRADING_FEE_WEI: u128 = 1_300_000_000_000_000;
pub const ORBITER_MIN_AMOUNT_WEI: u128 = 5_000_000_000_000_000;
pub const ORBITER_MAX_AMOUNT_WEI: u128 = 10_000_000_000_000_000_000;

// =============================================================================
// GAS & TRANSACTION CONSTANTS
// =============================================================================

pub const GAS_LIMIT_MULTIPLIER_BPS: u64 = 12_000;
pub const SCROLL_GAS_PRICE_MULTIPLIER_BPS: u64 = 11_000;
/// Extra headroom on gas cost when sending the whole native balance.
pub const FULL_BALANCE_GAS_HEADROOM_BPS: u64 = 15_500;
pub const TRANSFER_SIMULATION_VALUE_WEI: u128 = 1_000_000_000_000;
pub const DEFAULT_PRIORITY_FEE_WEI: u128 = 1_000_000;
pub const VERIFY_TX_TIMEOUT: Duration = Duration::from_secs(200);
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const SWAP_DEADLINE_SECS: u64 = 1800;

/// Share of a token balance used when a step intends to move "everything".
pub const FULL_BALANCE_USAGE_BPS: u64 = 9_990;

// =============================================================================
// EXTERNAL APIS
// =============================================================================

pub const TOKEN_PRICE_URL: &str = "https://api.coinlore.net/api/ticker/?id=";
pub const OKX_API_BASE: &str = "https://www.okx.com";
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

// =============================================================================
// FILES
// =============================================================================

pub const PRIVATE_KEYS_FILE: &str = "private_keys.txt";
pub const PROXIES_FILE: &str = "proxies.txt";
pub const DEPOSIT_ADDRESSES_FILE: &str = "deposit_addresses.txt";
pub const DATABASE_FILE: &str = "database.json";
