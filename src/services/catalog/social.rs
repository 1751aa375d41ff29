// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::domain::constants::{DMAIL_CONTRACT, RUBYSCORE_CONTRACT, RUBYSCORE_VOTE_SELECTOR};
use crate::infrastructure::network::connector::{ChainConnector, TxCall};
use crate::infrastructure::network::erc20;
use crate::services::catalog::contracts::{DmailHub, Nft2Me};
use crate::services::catalog::{Mailer, NftMinter, Voter};
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Hex sha256 of random bytes. Dmail only stores digests.
pub fn random_digest<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut seed = [0u8; 32];
    rng.fill(&mut seed);
    hex::encode(Sha256::digest(seed))
}

pub struct Dmail {
    conn: Arc<dyn ChainConnector>,
}

impl Dmail {
    pub fn new(conn: Arc<dyn ChainConnector>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Mailer for Dmail {
    async fn send_mail(&self) -> Result<(), AppError> {
        let (to, subject) = {
            let mut rng = rand::thread_rng();
            (random_digest(&mut rng), random_digest(&mut rng))
        };
        tracing::info!(target: "social", account = %self.conn.address(), "Sending Dmail");
        let data = DmailHub::send_mailCall { to, subject }.abi_encode();
        self.conn
            .submit(TxCall::new(DMAIL_CONTRACT, data.into()))
            .await
            .map(|_| ())
    }
}

pub struct RubyScore {
    conn: Arc<dyn ChainConnector>,
}

impl RubyScore {
    pub fn new(conn: Arc<dyn ChainConnector>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Voter for RubyScore {
    async fn vote(&self) -> Result<(), AppError> {
        tracing::info!(target: "social", account = %self.conn.address(), "Voting on RubyScore");
        let data = Bytes::copy_from_slice(&RUBYSCORE_VOTE_SELECTOR);
        self.conn
            .submit(TxCall::new(RUBYSCORE_CONTRACT, data))
            .await
            .map(|_| ())
    }
}

pub struct Nft2MeMinter {
    conn: Arc<dyn ChainConnector>,
}

impl Nft2MeMinter {
    pub fn new(conn: Arc<dyn ChainConnector>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl NftMinter for Nft2MeMinter {
    async fn owned(&self, collection: Address) -> Result<u32, AppError> {
        let count = erc20::nft_balance_of(self.conn.as_ref(), collection, self.conn.address()).await?;
        Ok(count.saturating_to::<u32>())
    }

    async fn mint(&self, collection: Address, fee: U256) -> Result<(), AppError> {
        tracing::info!(
            target: "social",
            account = %self.conn.address(),
            collection = %collection,
            "Minting NFT"
        );
        let data = Nft2Me::mintCall {}.abi_encode();
        self.conn
            .submit(TxCall::new(collection, data.into()).with_value(fee))
            .await
            .map(|_| ())
    }
}
