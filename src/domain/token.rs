// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants::{LETH_SCROLL, USDC_SCROLL, USDT_SCROLL, WETH_SCROLL};
use crate::domain::error::AppError;
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a balance query targets on a given chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Asset {
    Native,
    Erc20(Address),
}

/// Tokens the workflows hold on Scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Token {
    #[serde(rename = "ETH")]
    Eth,
    #[serde(rename = "WETH")]
    Weth,
    #[serde(rename = "USDC")]
    Usdc,
    #[serde(rename = "USDT")]
    Usdt,
    /// LayerBank receipt token for supplied ETH.
    #[serde(rename = "lETH")]
    LEth,
}

impl Token {
    /// Tokens considered when picking the swap input by largest value.
    pub const SWAPPABLE: [Token; 3] = [Token::Eth, Token::Usdc, Token::Usdt];

    pub fn symbol(self) -> &'static str {
        match self {
            Token::Eth => "ETH",
            Token::Weth => "WETH",
            Token::Usdc => "USDC",
            Token::Usdt => "USDT",
            Token::LEth => "lETH",
        }
    }

    pub fn decimals(self) -> u8 {
        match self {
            Token::Usdc | Token::Usdt => 6,
            _ => 18,
        }
    }

    pub fn is_native(self) -> bool {
        matches!(self, Token::Eth)
    }

    pub fn is_stable(self) -> bool {
        matches!(self, Token::Usdc | Token::Usdt)
    }

    /// Contract address on Scroll; native ETH routes through WETH in DEX paths.
    pub fn address(self) -> Address {
        match self {
            Token::Eth | Token::Weth => WETH_SCROLL,
            Token::Usdc => USDC_SCROLL,
            Token::Usdt => USDT_SCROLL,
            Token::LEth => LETH_SCROLL,
        }
    }

    pub fn asset(self) -> Asset {
        match self {
            Token::Eth => Asset::Native,
            other => Asset::Erc20(other.address()),
        }
    }

    /// Ticker id used by the price API. ETH-backed tokens share the ETH price.
    pub fn price_id(self) -> &'static str {
        match self {
            Token::Eth | Token::Weth | Token::LEth => "80",
            Token::Usdc => "33285",
            Token::Usdt => "518",
        }
    }

    pub fn to_units(self, amount: f64) -> U256 {
        float_to_units(amount, self.decimals())
    }

    pub fn from_units(self, value: U256) -> f64 {
        units_to_float(value, self.decimals())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Token {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "ETH" => Ok(Token::Eth),
            "WETH" => Ok(Token::Weth),
            "USDC" => Ok(Token::Usdc),
            "USDT" => Ok(Token::Usdt),
            "lETH" | "LETH" => Ok(Token::LEth),
            other => Err(AppError::Config(format!("Unknown token '{other}'"))),
        }
    }
}

pub fn units_to_float(value: U256, decimals: u8) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    let num = value.to_string().parse::<f64>().unwrap_or(0.0);
    num / scale
}

pub fn float_to_units(value: f64, decimals: u8) -> U256 {
    if !value.is_finite() || value <= 0.0 {
        return U256::ZERO;
    }
    let scaled = (value * 10f64.powi(decimals as i32)).floor();
    if !scaled.is_finite() || scaled <= 0.0 {
        return U256::ZERO;
    }
    U256::from(scaled.min(u128::MAX as f64) as u128)
}

pub fn eth_to_wei(value: f64) -> U256 {
    float_to_units(value, 18)
}

pub fn wei_to_eth(value: U256) -> f64 {
    units_to_float(value, 18)
}

/// `value * bps / 10_000`, saturating.
pub fn apply_bps(value: U256, bps: u64) -> U256 {
    value.saturating_mul(U256::from(bps)) / U256::from(10_000u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_conversions_respect_decimals() {
        assert_eq!(Token::Usdc.to_units(1.5), U256::from(1_500_000u64));
        assert_eq!(eth_to_wei(0.001), U256::from(1_000_000_000_000_000u64));
        assert!((wei_to_eth(U256::from(2_500_000_000_000_000_000u128)) - 2.5).abs() < 1e-12);
        assert_eq!(eth_to_wei(-1.0), U256::ZERO);
    }

    #[test]
    fn symbols_round_trip_through_serde() {
        let json = serde_json::to_string(&Token::LEth).unwrap();
        assert_eq!(json, "\"lETH\"");
        let back: Token = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Token::LEth);
    }

    #[test]
    fn apply_bps_scales_down() {
        assert_eq!(apply_bps(U256::from(10_000u64), 9_990), U256::from(9_990u64));
    }
}
