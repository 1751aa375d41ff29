// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>
#![allow(dead_code)]

//! In-memory chain, adapters and exchange shared by the integration tests.
//! Adapters move balances in a single ledger so workflows observe the
//! effects of their own actions.

use alloy::primitives::{Address, B256, Bytes, U256, address};
use async_trait::async_trait;
use scroll_machine::app::config::GlobalSettings;
use scroll_machine::common::delay::Span;
use scroll_machine::domain::account::{Account, Credential, Quotas};
use scroll_machine::domain::chain::Network;
use scroll_machine::domain::error::AppError;
use scroll_machine::domain::token::{Asset, Token};
use scroll_machine::domain::venue::{BridgeVenue, LendingVenue, SwapVenue};
use scroll_machine::infrastructure::data::registry::AccountRegistry;
use scroll_machine::infrastructure::data::store::MemoryStore;
use scroll_machine::infrastructure::network::connector::{
    ChainConnector, ConnectorFactory, TxCall,
};
use scroll_machine::infrastructure::network::exchange::ExchangeWithdrawal;
use scroll_machine::infrastructure::network::gas::FeeSource;
use scroll_machine::infrastructure::network::price_feed::StaticPrices;
use scroll_machine::services::catalog::{
    ActionCatalog, Bridge, Dex, DomainRegistrar, Lending, Mailer, NftMinter, Voter, WrapGateway,
};
use scroll_machine::services::fee_guard::FeeGuard;
use scroll_machine::services::workflow::WorkflowContext;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const KEYS: [&str; 3] = [
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
];

pub const DEPOSIT: Address = address!("00000000000000000000000000000000000000d0");
pub const ETH_PRICE: f64 = 3000.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Swap {
        venue: SwapVenue,
        token_in: Token,
        token_out: Token,
        amount: U256,
    },
    Supply {
        venue: LendingVenue,
        amount: U256,
    },
    Withdraw {
        venue: LendingVenue,
    },
    Bridge {
        from: Network,
        to: Network,
        amount: U256,
    },
    Wrap(U256),
    Unwrap(U256),
    Mail,
    Vote,
    Mint(Address),
    Transfer {
        network: Network,
        to: Address,
        value: U256,
    },
    ExchangeWithdrawal {
        network: Network,
        amount: f64,
    },
}

#[derive(Default)]
pub struct Ledger {
    balances: HashMap<(Address, Network, Asset), U256>,
    cog_supplied: HashMap<Address, U256>,
    nfts: HashMap<(Address, Address), u32>,
    pub events: Vec<Event>,
    /// When false, bridges debit the source but never credit the destination.
    pub deliver_bridges: bool,
}

pub type SharedLedger = Arc<Mutex<Ledger>>;

impl Ledger {
    pub fn shared() -> SharedLedger {
        Arc::new(Mutex::new(Ledger {
            deliver_bridges: true,
            ..Ledger::default()
        }))
    }

    pub fn balance(&self, owner: Address, network: Network, asset: Asset) -> U256 {
        self.balances
            .get(&(owner, network, asset))
            .copied()
            .unwrap_or_default()
    }

    pub fn set(&mut self, owner: Address, network: Network, asset: Asset, value: U256) {
        self.balances.insert((owner, network, asset), value);
    }

    pub fn credit(&mut self, owner: Address, network: Network, asset: Asset, value: U256) {
        let now = self.balance(owner, network, asset);
        self.set(owner, network, asset, now + value);
    }

    pub fn debit(
        &mut self,
        owner: Address,
        network: Network,
        asset: Asset,
        value: U256,
    ) -> Result<(), AppError> {
        let now = self.balance(owner, network, asset);
        if now < value {
            return Err(AppError::InsufficientFunds {
                required: value.to_string(),
                available: now.to_string(),
            });
        }
        self.set(owner, network, asset, now - value);
        Ok(())
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

fn price(token: Token) -> f64 {
    match token {
        Token::Usdc | Token::Usdt => 1.0,
        _ => ETH_PRICE,
    }
}

pub fn prices() -> StaticPrices {
    StaticPrices(
        [Token::Eth, Token::Weth, Token::LEth, Token::Usdc, Token::Usdt]
            .into_iter()
            .map(|t| (t, price(t)))
            .collect(),
    )
}

pub struct MockConnector {
    ledger: SharedLedger,
    owner: Address,
    network: Network,
}

const GAS_PRICE: u128 = 1_000_000;
const GAS: u64 = 21_000;

#[async_trait]
impl ChainConnector for MockConnector {
    fn network(&self) -> Network {
        self.network
    }

    fn address(&self) -> Address {
        self.owner
    }

    async fn balance(&self, asset: Asset) -> Result<U256, AppError> {
        Ok(self.ledger.lock().unwrap().balance(self.owner, self.network, asset))
    }

    async fn gas_price(&self) -> Result<u128, AppError> {
        Ok(GAS_PRICE)
    }

    async fn estimate_gas(&self, _tx: &TxCall) -> Result<u64, AppError> {
        Ok(GAS)
    }

    async fn call(&self, _tx: &TxCall) -> Result<Bytes, AppError> {
        Ok(Bytes::new())
    }

    async fn send(&self, tx: TxCall) -> Result<B256, AppError> {
        let mut ledger = self.ledger.lock().unwrap();
        ledger.debit(self.owner, self.network, Asset::Native, tx.value)?;
        ledger.credit(tx.to, self.network, Asset::Native, tx.value);
        ledger.events.push(Event::Transfer {
            network: self.network,
            to: tx.to,
            value: tx.value,
        });
        Ok(B256::repeat_byte(0xab))
    }

    async fn confirm(&self, _hash: B256, _timeout: Duration) -> Result<bool, AppError> {
        Ok(true)
    }
}

pub struct MockFactory(pub SharedLedger);

impl ConnectorFactory for MockFactory {
    fn connect(
        &self,
        account: &Account,
        network: Network,
    ) -> Result<Arc<dyn ChainConnector>, AppError> {
        Ok(Arc::new(MockConnector {
            ledger: self.0.clone(),
            owner: account.address,
            network,
        }))
    }
}

struct Bound {
    ledger: SharedLedger,
    owner: Address,
    network: Network,
}

impl Bound {
    fn new(ledger: &SharedLedger, conn: &Arc<dyn ChainConnector>) -> Self {
        Self {
            ledger: ledger.clone(),
            owner: conn.address(),
            network: conn.network(),
        }
    }
}

struct MockDex {
    venue: SwapVenue,
    at: Bound,
}

#[async_trait]
impl Dex for MockDex {
    fn venue(&self) -> SwapVenue {
        self.venue
    }

    async fn swap(&self, token_in: Token, token_out: Token, amount: U256) -> Result<(), AppError> {
        let mut l = self.at.ledger.lock().unwrap();
        l.debit(self.at.owner, self.at.network, token_in.asset(), amount)?;
        let usd = token_in.from_units(amount) * price(token_in);
        let out = token_out.to_units(usd / price(token_out));
        l.credit(self.at.owner, self.at.network, token_out.asset(), out);
        l.events.push(Event::Swap {
            venue: self.venue,
            token_in,
            token_out,
            amount,
        });
        Ok(())
    }
}

struct MockLending {
    venue: LendingVenue,
    at: Bound,
}

#[async_trait]
impl Lending for MockLending {
    fn venue(&self) -> LendingVenue {
        self.venue
    }

    fn collateral(&self) -> Token {
        match self.venue {
            LendingVenue::Layerbank => Token::Eth,
            LendingVenue::Cog => Token::Weth,
        }
    }

    async fn supplied(&self) -> Result<U256, AppError> {
        let l = self.at.ledger.lock().unwrap();
        Ok(match self.venue {
            LendingVenue::Layerbank => l.balance(self.at.owner, self.at.network, Token::LEth.asset()),
            LendingVenue::Cog => l.cog_supplied.get(&self.at.owner).copied().unwrap_or_default(),
        })
    }

    async fn supply(&self, amount: U256) -> Result<(), AppError> {
        let mut l = self.at.ledger.lock().unwrap();
        let (owner, network) = (self.at.owner, self.at.network);
        l.debit(owner, network, self.collateral().asset(), amount)?;
        match self.venue {
            LendingVenue::Layerbank => l.credit(owner, network, Token::LEth.asset(), amount),
            LendingVenue::Cog => *l.cog_supplied.entry(owner).or_default() += amount,
        }
        l.events.push(Event::Supply {
            venue: self.venue,
            amount,
        });
        Ok(())
    }

    async fn withdraw(&self) -> Result<(), AppError> {
        let mut l = self.at.ledger.lock().unwrap();
        let (owner, network) = (self.at.owner, self.at.network);
        let supplied = match self.venue {
            LendingVenue::Layerbank => {
                let v = l.balance(owner, network, Token::LEth.asset());
                l.set(owner, network, Token::LEth.asset(), U256::ZERO);
                v
            }
            LendingVenue::Cog => l.cog_supplied.remove(&owner).unwrap_or_default(),
        };
        if supplied.is_zero() {
            return Err(AppError::Validation {
                field: "withdraw".into(),
                message: "nothing supplied".into(),
            });
        }
        l.credit(owner, network, self.collateral().asset(), supplied);
        l.events.push(Event::Withdraw { venue: self.venue });
        Ok(())
    }
}

struct MockBridge {
    at: Bound,
}

#[async_trait]
impl Bridge for MockBridge {
    fn venue(&self) -> BridgeVenue {
        BridgeVenue::Orbiter
    }

    async fn bridge(&self, amount: Option<U256>, dst: Network) -> Result<(), AppError> {
        let mut l = self.at.ledger.lock().unwrap();
        let (owner, src) = (self.at.owner, self.at.network);
        let amount = amount.unwrap_or_else(|| l.balance(owner, src, Asset::Native));
        l.debit(owner, src, Asset::Native, amount)?;
        if l.deliver_bridges {
            l.credit(owner, dst, Asset::Native, amount);
        }
        l.events.push(Event::Bridge {
            from: src,
            to: dst,
            amount,
        });
        Ok(())
    }
}

struct MockWrap {
    at: Bound,
}

#[async_trait]
impl WrapGateway for MockWrap {
    async fn wrap(&self, amount: U256) -> Result<(), AppError> {
        let mut l = self.at.ledger.lock().unwrap();
        let (owner, network) = (self.at.owner, self.at.network);
        l.debit(owner, network, Asset::Native, amount)?;
        l.credit(owner, network, Token::Weth.asset(), amount);
        l.events.push(Event::Wrap(amount));
        Ok(())
    }

    async fn unwrap(&self, amount: U256) -> Result<(), AppError> {
        let mut l = self.at.ledger.lock().unwrap();
        let (owner, network) = (self.at.owner, self.at.network);
        l.debit(owner, network, Token::Weth.asset(), amount)?;
        l.credit(owner, network, Asset::Native, amount);
        l.events.push(Event::Unwrap(amount));
        Ok(())
    }
}

struct MockSocial {
    at: Bound,
}

#[async_trait]
impl Mailer for MockSocial {
    async fn send_mail(&self) -> Result<(), AppError> {
        self.at.ledger.lock().unwrap().events.push(Event::Mail);
        Ok(())
    }
}

#[async_trait]
impl Voter for MockSocial {
    async fn vote(&self) -> Result<(), AppError> {
        self.at.ledger.lock().unwrap().events.push(Event::Vote);
        Ok(())
    }
}

#[async_trait]
impl NftMinter for MockSocial {
    async fn owned(&self, collection: Address) -> Result<u32, AppError> {
        let l = self.at.ledger.lock().unwrap();
        Ok(l.nfts.get(&(self.at.owner, collection)).copied().unwrap_or(0))
    }

    async fn mint(&self, collection: Address, _fee: U256) -> Result<(), AppError> {
        let mut l = self.at.ledger.lock().unwrap();
        *l.nfts.entry((self.at.owner, collection)).or_default() += 1;
        l.events.push(Event::Mint(collection));
        Ok(())
    }
}

/// Every family resolves; swap venues only for Spacefi and Zebra.
pub struct MockCatalog(pub SharedLedger);

impl ActionCatalog for MockCatalog {
    fn dex(&self, venue: SwapVenue, conn: Arc<dyn ChainConnector>) -> Option<Box<dyn Dex>> {
        matches!(venue, SwapVenue::Spacefi | SwapVenue::Zebra).then(|| {
            Box::new(MockDex {
                venue,
                at: Bound::new(&self.0, &conn),
            }) as Box<dyn Dex>
        })
    }

    fn lending(
        &self,
        venue: LendingVenue,
        conn: Arc<dyn ChainConnector>,
    ) -> Option<Box<dyn Lending>> {
        Some(Box::new(MockLending {
            venue,
            at: Bound::new(&self.0, &conn),
        }))
    }

    fn bridge(&self, venue: BridgeVenue, src: Arc<dyn ChainConnector>) -> Option<Box<dyn Bridge>> {
        (venue == BridgeVenue::Orbiter).then(|| {
            Box::new(MockBridge {
                at: Bound::new(&self.0, &src),
            }) as Box<dyn Bridge>
        })
    }

    fn nft_minter(&self, conn: Arc<dyn ChainConnector>) -> Option<Box<dyn NftMinter>> {
        Some(Box::new(MockSocial {
            at: Bound::new(&self.0, &conn),
        }))
    }

    fn mailer(&self, conn: Arc<dyn ChainConnector>) -> Option<Box<dyn Mailer>> {
        Some(Box::new(MockSocial {
            at: Bound::new(&self.0, &conn),
        }))
    }

    fn voter(&self, conn: Arc<dyn ChainConnector>) -> Option<Box<dyn Voter>> {
        Some(Box::new(MockSocial {
            at: Bound::new(&self.0, &conn),
        }))
    }

    fn domain_registrar(&self, _conn: Arc<dyn ChainConnector>) -> Option<Box<dyn DomainRegistrar>> {
        None
    }

    fn wrap_gateway(&self, conn: Arc<dyn ChainConnector>) -> Box<dyn WrapGateway> {
        Box::new(MockWrap {
            at: Bound::new(&self.0, &conn),
        })
    }
}

/// Credits the withdrawn amount on the target network immediately.
pub struct MockExchange(pub SharedLedger);

#[async_trait]
impl ExchangeWithdrawal for MockExchange {
    async fn withdraw(
        &self,
        amount: f64,
        token: Token,
        network: Network,
        to: Address,
    ) -> Result<(), AppError> {
        let mut l = self.0.lock().unwrap();
        l.credit(to, network, token.asset(), token.to_units(amount));
        l.events.push(Event::ExchangeWithdrawal { network, amount });
        Ok(())
    }
}

/// An exchange whose withdrawals are always cancelled after submission.
#[derive(Default)]
pub struct CancellingExchange {
    pub attempts: Mutex<usize>,
}

impl CancellingExchange {
    pub fn new() -> Self {
        Self {
            attempts: Mutex::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl ExchangeWithdrawal for CancellingExchange {
    async fn withdraw(
        &self,
        _amount: f64,
        _token: Token,
        _network: Network,
        _to: Address,
    ) -> Result<(), AppError> {
        let mut attempts = self.attempts.lock().unwrap();
        *attempts += 1;
        Err(AppError::WithdrawalCancelled(format!("wd-{}", *attempts)))
    }
}

/// Replays scripted fee readings, then reports zero.
pub struct ScriptedFees {
    pub readings: Mutex<VecDeque<f64>>,
    pub reads: Mutex<usize>,
}

impl ScriptedFees {
    pub fn new(readings: &[f64]) -> Self {
        Self {
            readings: Mutex::new(readings.iter().copied().collect()),
            reads: Mutex::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        *self.reads.lock().unwrap()
    }
}

#[async_trait]
impl FeeSource for ScriptedFees {
    async fn current_fee_gwei(&self) -> Result<f64, AppError> {
        *self.reads.lock().unwrap() += 1;
        Ok(self.readings.lock().unwrap().pop_front().unwrap_or(0.0))
    }
}

/// Defaults with every delay zeroed and a single arrival poll.
pub fn settings() -> GlobalSettings {
    let mut s = GlobalSettings::from_defaults().unwrap();
    let none = Span::new(0, 0);
    s.tx_delay_range = none;
    s.wallet_delay_range = none;
    s.post_bridge_delay_range = none;
    s.arrival_delay_range = none;
    s.gas_delay_range = none;
    s.arrival_attempts = 1;
    s.shuffle_database = false;
    s
}

pub fn context(
    settings: GlobalSettings,
    ledger: &SharedLedger,
    fees: Arc<dyn FeeSource>,
) -> WorkflowContext {
    let fee_guard = FeeGuard::new(fees, settings.gas_threshold_gwei, settings.gas_delay_range);
    WorkflowContext {
        settings: Arc::new(settings),
        connectors: Arc::new(MockFactory(ledger.clone())),
        catalog: Arc::new(MockCatalog(ledger.clone())),
        prices: Arc::new(prices()),
        exchange: Some(Arc::new(MockExchange(ledger.clone()))),
        fee_guard,
    }
}

pub fn account(key: &str, quotas: Quotas) -> Account {
    Account::new(Credential::new(key), None, Some(DEPOSIT), quotas).unwrap()
}

pub fn registry(accounts: Vec<Account>) -> (AccountRegistry, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let registry = AccountRegistry::create(store.clone(), accounts).unwrap();
    (registry, store)
}

pub fn eth(amount: f64) -> U256 {
    Token::Eth.to_units(amount)
}

/// Every snapshot survives a JSON round trip unchanged.
pub fn assert_snapshots_round_trip(store: &MemoryStore) {
    for n in 0..store.snapshot_count() {
        let snapshot = store.snapshot(n).unwrap();
        let text = serde_json::to_string_pretty(&snapshot).unwrap();
        let back: Vec<Account> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, snapshot, "snapshot {n} changed across JSON");
    }
}
