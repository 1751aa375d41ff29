// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! Protocol adapters, one capability trait per action family, and the
//! catalog that resolves a venue to its adapter.

pub mod bridge;
pub mod contracts;
pub mod dex;
pub mod lending;
pub mod social;
pub mod wrap;

use crate::common::error::AppError;
use crate::domain::chain::Network;
use crate::domain::token::Token;
use crate::domain::venue::{BridgeVenue, LendingVenue, SwapVenue};
use crate::infrastructure::network::connector::ChainConnector;
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Dex: Send + Sync {
    fn venue(&self) -> SwapVenue;
    /// Swap exactly `amount` (base units of `token_in`).
    async fn swap(&self, token_in: Token, token_out: Token, amount: U256) -> Result<(), AppError>;
}

#[async_trait]
pub trait Lending: Send + Sync {
    fn venue(&self) -> LendingVenue;
    /// Token a supply is paid in.
    fn collateral(&self) -> Token;
    async fn supplied(&self) -> Result<U256, AppError>;
    async fn supply(&self, amount: U256) -> Result<(), AppError>;
    /// Withdraws the whole supplied position.
    async fn withdraw(&self) -> Result<(), AppError>;
}

#[async_trait]
pub trait Bridge: Send + Sync {
    fn venue(&self) -> BridgeVenue;
    /// Bridge native currency to `dst`. `None` bridges the full balance
    /// minus gas.
    async fn bridge(&self, amount: Option<U256>, dst: Network) -> Result<(), AppError>;
}

#[async_trait]
pub trait NftMinter: Send + Sync {
    async fn owned(&self, collection: Address) -> Result<u32, AppError>;
    async fn mint(&self, collection: Address, fee: U256) -> Result<(), AppError>;
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_mail(&self) -> Result<(), AppError>;
}

#[async_trait]
pub trait Voter: Send + Sync {
    async fn vote(&self) -> Result<(), AppError>;
}

#[async_trait]
pub trait DomainRegistrar: Send + Sync {
    async fn register(&self) -> Result<(), AppError>;
}

#[async_trait]
pub trait WrapGateway: Send + Sync {
    async fn wrap(&self, amount: U256) -> Result<(), AppError>;
    async fn unwrap(&self, amount: U256) -> Result<(), AppError>;
}

/// Resolves (family, venue) to an adapter bound to `conn`. `None` means the
/// venue has no adapter; callers skip the action.
pub trait ActionCatalog: Send + Sync {
    fn dex(&self, venue: SwapVenue, conn: Arc<dyn ChainConnector>) -> Option<Box<dyn Dex>>;
    fn lending(&self, venue: LendingVenue, conn: Arc<dyn ChainConnector>)
    -> Option<Box<dyn Lending>>;
    fn bridge(&self, venue: BridgeVenue, src: Arc<dyn ChainConnector>) -> Option<Box<dyn Bridge>>;
    fn nft_minter(&self, conn: Arc<dyn ChainConnector>) -> Option<Box<dyn NftMinter>>;
    fn mailer(&self, conn: Arc<dyn ChainConnector>) -> Option<Box<dyn Mailer>>;
    fn voter(&self, conn: Arc<dyn ChainConnector>) -> Option<Box<dyn Voter>>;
    fn domain_registrar(&self, conn: Arc<dyn ChainConnector>) -> Option<Box<dyn DomainRegistrar>>;
    fn wrap_gateway(&self, conn: Arc<dyn ChainConnector>) -> Box<dyn WrapGateway>;
}

/// Adapters for the Scroll deployment.
#[derive(Debug, Clone)]
pub struct ScrollCatalog {
    slippage_bps: u64,
    cog_pool: Option<Address>,
}

impl ScrollCatalog {
    pub fn new(slippage_bps: u64, cog_pool: Option<Address>) -> Self {
        Self {
            slippage_bps,
            cog_pool,
        }
    }
}

impl ActionCatalog for ScrollCatalog {
    fn dex(&self, venue: SwapVenue, conn: Arc<dyn ChainConnector>) -> Option<Box<dyn Dex>> {
        let router = dex::router_for(venue)?;
        Some(Box::new(dex::UniV2Dex::new(
            venue,
            router,
            conn,
            self.slippage_bps,
        )))
    }

    fn lending(
        &self,
        venue: LendingVenue,
        conn: Arc<dyn ChainConnector>,
    ) -> Option<Box<dyn Lending>> {
        match venue {
            LendingVenue::Layerbank => Some(Box::new(lending::LayerBank::new(conn))),
            LendingVenue::Cog => self
                .cog_pool
                .map(|pool| Box::new(lending::CogPool::new(pool, conn)) as Box<dyn Lending>),
        }
    }

    fn bridge(&self, venue: BridgeVenue, src: Arc<dyn ChainConnector>) -> Option<Box<dyn Bridge>> {
        match venue {
            BridgeVenue::Orbiter => Some(Box::new(bridge::Orbiter::new(src))),
            BridgeVenue::Nitro | BridgeVenue::Official => None,
        }
    }

    fn nft_minter(&self, conn: Arc<dyn ChainConnector>) -> Option<Box<dyn NftMinter>> {
        Some(Box::new(social::Nft2MeMinter::new(conn)))
    }

    fn mailer(&self, conn: Arc<dyn ChainConnector>) -> Option<Box<dyn Mailer>> {
        Some(Box::new(social::Dmail::new(conn)))
    }

    fn voter(&self, conn: Arc<dyn ChainConnector>) -> Option<Box<dyn Voter>> {
        Some(Box::new(social::RubyScore::new(conn)))
    }

    fn domain_registrar(&self, _conn: Arc<dyn ChainConnector>) -> Option<Box<dyn DomainRegistrar>> {
        None
    }

    fn wrap_gateway(&self, conn: Arc<dyn ChainConnector>) -> Box<dyn WrapGateway> {
        Box::new(wrap::WethGateway::new(conn))
    }
}
