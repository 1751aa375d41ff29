// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Networks the workflows move funds across. Scroll is the rollup where
/// protocol interaction happens; the rest are exchange/bridge endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Scroll,
    Arbitrum,
    Zksync,
    Linea,
}

impl Network {
    pub const ALL: [Network; 5] = [
        Network::Mainnet,
        Network::Scroll,
        Network::Arbitrum,
        Network::Zksync,
        Network::Linea,
    ];

    pub fn chain_id(self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Scroll => 534_352,
            Network::Arbitrum => 42_161,
            Network::Zksync => 324,
            Network::Linea => 59_144,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Network::Mainnet => "MAINNET",
            Network::Scroll => "SCROLL",
            Network::Arbitrum => "ARBITRUM",
            Network::Zksync => "ZKSYNC",
            Network::Linea => "LINEA",
        }
    }

    pub fn explorer(self) -> &'static str {
        match self {
            Network::Mainnet => "https://etherscan.io/",
            Network::Scroll => "https://scrollscan.com/",
            Network::Arbitrum => "https://arbiscan.io/",
            Network::Zksync => "https://explorer.zksync.io/",
            Network::Linea => "https://lineascan.build/",
        }
    }

    pub fn default_rpc(self) -> &'static str {
        match self {
            Network::Mainnet => "https://rpc.ankr.com/eth",
            Network::Scroll => "https://rpc.ankr.com/scroll",
            Network::Arbitrum => "https://rpc.ankr.com/arbitrum",
            Network::Zksync => "https://mainnet.era.zksync.io",
            Network::Linea => "https://linea.blockpi.network/v1/rpc/public",
        }
    }

    /// Orbiter's internal chain id, appended to the transfer value as a routing code.
    pub fn orbiter_id(self) -> u32 {
        match self {
            Network::Mainnet => 1,
            Network::Arbitrum => 2,
            Network::Zksync => 14,
            Network::Scroll => 19,
            Network::Linea => 23,
        }
    }

    /// OKX withdrawal network name and fixed fee. Scroll is not an OKX network.
    pub fn okx_withdrawal(self) -> Option<(&'static str, &'static str)> {
        match self {
            Network::Mainnet => Some(("ERC20", "0.0036")),
            Network::Arbitrum => Some(("Arbitrum One", "0.0001")),
            Network::Zksync => Some(("zkSync Era", "0.000041")),
            Network::Linea => Some(("Linea", "0.0002")),
            Network::Scroll => None,
        }
    }

    /// Where funds leaving the rollup are consolidated. zkSync deposits are
    /// not accepted by the exchange, so those cycles exit through Arbitrum.
    pub fn consolidation_target(self) -> Network {
        match self {
            Network::Zksync => Network::Arbitrum,
            other => other,
        }
    }

    pub fn tx_url(self, hash: &str) -> String {
        format!("{}tx/{}", self.explorer(), hash)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "MAINNET" | "ERC20" | "ETHEREUM" => Ok(Network::Mainnet),
            "SCROLL" => Ok(Network::Scroll),
            "ARBITRUM" => Ok(Network::Arbitrum),
            "ZKSYNC" => Ok(Network::Zksync),
            "LINEA" => Ok(Network::Linea),
            other => Err(AppError::Config(format!("Unknown network '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_names_parse_case_insensitively() {
        assert_eq!("linea".parse::<Network>().unwrap(), Network::Linea);
        assert_eq!("ERC20".parse::<Network>().unwrap(), Network::Mainnet);
        assert!("solana".parse::<Network>().is_err());
    }

    #[test]
    fn zksync_consolidates_through_arbitrum() {
        assert_eq!(Network::Zksync.consolidation_target(), Network::Arbitrum);
        assert_eq!(Network::Linea.consolidation_target(), Network::Linea);
        assert!(Network::Scroll.okx_withdrawal().is_none());
    }
}
