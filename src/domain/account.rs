// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::error::AppError;
use crate::domain::token::Token;
use crate::domain::venue::{LendingVenue, SwapVenue};
use alloy::primitives::{Address, U256};
use alloy::signers::local::PrivateKeySigner;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Hex private key. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn signer(&self) -> Result<PrivateKeySigner, AppError> {
        self.0
            .trim()
            .parse::<PrivateKeySigner>()
            .map_err(|e| AppError::Validation {
                field: "private_key".into(),
                message: e.to_string(),
            })
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// One quota counter, addressed independently of how it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuotaKey {
    Swap(SwapVenue),
    LendingSupply(LendingVenue),
    LendingWithdraw(LendingVenue),
    Mail,
    Vote,
    NftMint(Address),
}

/// Remaining action counts for the warmup workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quotas {
    #[serde(default)]
    pub swaps: BTreeMap<SwapVenue, u32>,
    #[serde(default)]
    pub lending_supplies: BTreeMap<LendingVenue, u32>,
    #[serde(default)]
    pub lending_withdrawals: BTreeMap<LendingVenue, u32>,
    #[serde(default)]
    pub mails: u32,
    #[serde(default)]
    pub votes: u32,
    #[serde(default)]
    pub nft_mints: BTreeMap<Address, u32>,
}

impl Quotas {
    pub fn remaining(&self, key: QuotaKey) -> u32 {
        match key {
            QuotaKey::Swap(v) => self.swaps.get(&v).copied().unwrap_or(0),
            QuotaKey::LendingSupply(v) => self.lending_supplies.get(&v).copied().unwrap_or(0),
            QuotaKey::LendingWithdraw(v) => self.lending_withdrawals.get(&v).copied().unwrap_or(0),
            QuotaKey::Mail => self.mails,
            QuotaKey::Vote => self.votes,
            QuotaKey::NftMint(addr) => self.nft_mints.get(&addr).copied().unwrap_or(0),
        }
    }

    fn slot(&mut self, key: QuotaKey) -> Option<&mut u32> {
        match key {
            QuotaKey::Swap(v) => self.swaps.get_mut(&v),
            QuotaKey::LendingSupply(v) => self.lending_supplies.get_mut(&v),
            QuotaKey::LendingWithdraw(v) => self.lending_withdrawals.get_mut(&v),
            QuotaKey::Mail => Some(&mut self.mails),
            QuotaKey::Vote => Some(&mut self.votes),
            QuotaKey::NftMint(addr) => self.nft_mints.get_mut(&addr),
        }
    }

    /// Decrement by one. Returns false (and changes nothing) at zero.
    pub fn consume(&mut self, key: QuotaKey) -> bool {
        match self.slot(key) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self, key: QuotaKey) {
        if let Some(count) = self.slot(key) {
            *count = 0;
        }
    }

    pub fn total(&self) -> u64 {
        let maps = self
            .swaps
            .values()
            .chain(self.lending_supplies.values())
            .chain(self.lending_withdrawals.values())
            .chain(self.nft_mints.values());
        maps.map(|c| *c as u64).sum::<u64>() + self.mails as u64 + self.votes as u64
    }

    pub fn is_exhausted(&self) -> bool {
        self.total() == 0
    }

    /// A venue where more supplies than withdrawals have executed. Its
    /// withdrawal runs before anything else.
    pub fn forced_withdrawal(&self) -> Option<LendingVenue> {
        self.lending_withdrawals
            .iter()
            .find(|(venue, withdrawals)| {
                **withdrawals > self.lending_supplies.get(venue).copied().unwrap_or(0)
            })
            .map(|(venue, _)| *venue)
    }

    pub fn active_nfts(&self) -> Vec<Address> {
        self.nft_mints
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(addr, _)| *addr)
            .collect()
    }
}

/// What the warmup workflow does next for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmupAction {
    Swap(SwapVenue),
    Lending(LendingVenue),
    Mail,
    Vote,
    Mint(Address),
    RegisterDomain,
}

#[derive(Clone, Copy)]
enum WarmupCandidate {
    Action(WarmupAction),
    AnyNft,
}

/// Optional exchange withdrawal, then bridge, then arrival check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectBridgeState {
    #[serde(default)]
    pub exchange_withdrawn: Option<f64>,
    #[serde(default)]
    pub dst_balance_before_bridge: Option<U256>,
    #[serde(default)]
    pub finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgePhase {
    ExchangeWithdrawal,
    Bridge,
    InFlight,
    Done,
}

impl DirectBridgeState {
    pub fn phase(&self, exchange_required: bool) -> BridgePhase {
        if self.finished {
            BridgePhase::Done
        } else if self.dst_balance_before_bridge.is_some() {
            BridgePhase::InFlight
        } else if exchange_required && self.exchange_withdrawn.is_none() {
            BridgePhase::ExchangeWithdrawal
        } else {
            BridgePhase::Bridge
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LendingAction {
    Supply,
    Withdraw,
}

/// Progress of one volume cycle. Each flag is set once, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeCycleState {
    pub volume_goal: f64,
    #[serde(default)]
    pub volume_reached: f64,
    #[serde(default)]
    pub exchange_withdrawn: Option<f64>,
    #[serde(default)]
    pub dst_balance_before_bridge: Option<U256>,
    #[serde(default)]
    pub bridged_in: bool,
    #[serde(default)]
    pub native_wrapped: bool,
    #[serde(default)]
    pub native_unwrapped: bool,
    #[serde(default)]
    pub last_action: Option<LendingAction>,
    #[serde(default)]
    pub open_lending: Option<LendingVenue>,
    #[serde(default)]
    pub positions_drained: bool,
    #[serde(default)]
    pub bridged_out: bool,
    #[serde(default)]
    pub consolidated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumePhase {
    WithdrawExchange,
    BridgeIn,
    AwaitArrivalIn,
    Prepare,
    Accumulate,
    DrainPositions,
    BridgeOut,
    AwaitArrivalOut,
    Consolidate,
    Done,
}

impl VolumeCycleState {
    pub fn new(volume_goal: f64) -> Self {
        Self {
            volume_goal,
            ..Self::default()
        }
    }

    pub fn has_open_position(&self) -> bool {
        self.open_lending.is_some()
    }

    /// The accumulate loop keeps running while under goal or while a
    /// supply is still open.
    pub fn accumulation_pending(&self) -> bool {
        self.volume_reached < self.volume_goal || self.has_open_position()
    }

    /// `prepare_wrap` selects the variant that wraps native once before
    /// accumulating.
    pub fn phase(&self, prepare_wrap: bool) -> VolumePhase {
        if self.consolidated {
            return VolumePhase::Done;
        }
        if !self.bridged_in {
            return if self.dst_balance_before_bridge.is_some() {
                VolumePhase::AwaitArrivalIn
            } else if self.exchange_withdrawn.is_none() {
                VolumePhase::WithdrawExchange
            } else {
                VolumePhase::BridgeIn
            };
        }
        if prepare_wrap && !self.native_wrapped {
            return VolumePhase::Prepare;
        }
        if self.accumulation_pending() {
            return VolumePhase::Accumulate;
        }
        if !self.positions_drained {
            return VolumePhase::DrainPositions;
        }
        if !self.bridged_out {
            return if self.dst_balance_before_bridge.is_some() {
                VolumePhase::AwaitArrivalOut
            } else {
                VolumePhase::BridgeOut
            };
        }
        VolumePhase::Consolidate
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeVariant {
    /// Single lending venue, wrapped native, goal in native units.
    LendingCycle,
    /// Weighted mix of swaps and lending, goal in reference currency.
    Mixed,
}

impl VolumeVariant {
    pub fn name(self) -> &'static str {
        match self {
            VolumeVariant::LendingCycle => "cog-volume",
            VolumeVariant::Mixed => "volume",
        }
    }
}

/// One managed wallet and everything the workflows remember about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub private_key: Credential,
    pub address: Address,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub deposit_address: Option<Address>,
    #[serde(default)]
    pub quotas: Quotas,
    #[serde(default)]
    pub warmup_finished: bool,
    #[serde(default)]
    pub domain_registered: bool,
    #[serde(default)]
    pub bridge: DirectBridgeState,
    #[serde(default)]
    pub cog_volume: VolumeCycleState,
    #[serde(default)]
    pub volume_mode: VolumeCycleState,
    #[serde(default)]
    pub tokens_collected: BTreeSet<Token>,
}

impl Account {
    pub fn new(
        private_key: Credential,
        proxy: Option<String>,
        deposit_address: Option<Address>,
        quotas: Quotas,
    ) -> Result<Self, AppError> {
        let address = private_key.signer()?.address();
        Ok(Self {
            private_key,
            address,
            proxy,
            deposit_address,
            quotas,
            warmup_finished: false,
            domain_registered: false,
            bridge: DirectBridgeState::default(),
            cog_volume: VolumeCycleState::default(),
            volume_mode: VolumeCycleState::default(),
            tokens_collected: BTreeSet::new(),
        })
    }

    pub fn short(&self) -> String {
        let hex = self.address.to_string();
        format!("{}...{}", &hex[..6], &hex[hex.len() - 4..])
    }

    pub fn volume_state(&self, variant: VolumeVariant) -> &VolumeCycleState {
        match variant {
            VolumeVariant::LendingCycle => &self.cog_volume,
            VolumeVariant::Mixed => &self.volume_mode,
        }
    }

    pub fn volume_state_mut(&mut self, variant: VolumeVariant) -> &mut VolumeCycleState {
        match variant {
            VolumeVariant::LendingCycle => &mut self.cog_volume,
            VolumeVariant::Mixed => &mut self.volume_mode,
        }
    }

    pub fn has_warmup_actions(&self, register_domains: bool) -> bool {
        !self.quotas.is_exhausted() || (register_domains && !self.domain_registered)
    }

    /// Pick the next warmup action: a forced lending withdrawal first,
    /// otherwise one eligible family uniformly at random.
    pub fn next_warmup_action<R: Rng + ?Sized>(
        &self,
        register_domains: bool,
        rng: &mut R,
    ) -> Option<WarmupAction> {
        if let Some(venue) = self.quotas.forced_withdrawal() {
            return Some(WarmupAction::Lending(venue));
        }

        let q = &self.quotas;
        let mut candidates: Vec<WarmupCandidate> = Vec::new();
        for venue in SwapVenue::ALL {
            if q.remaining(QuotaKey::Swap(*venue)) > 0 {
                candidates.push(WarmupCandidate::Action(WarmupAction::Swap(*venue)));
            }
        }
        for venue in LendingVenue::ALL {
            if q.remaining(QuotaKey::LendingSupply(*venue)) > 0
                || q.remaining(QuotaKey::LendingWithdraw(*venue)) > 0
            {
                candidates.push(WarmupCandidate::Action(WarmupAction::Lending(*venue)));
            }
        }
        if q.mails > 0 {
            candidates.push(WarmupCandidate::Action(WarmupAction::Mail));
        }
        if q.votes > 0 {
            candidates.push(WarmupCandidate::Action(WarmupAction::Vote));
        }
        if !q.active_nfts().is_empty() {
            candidates.push(WarmupCandidate::AnyNft);
        }
        if register_domains && !self.domain_registered {
            candidates.push(WarmupCandidate::Action(WarmupAction::RegisterDomain));
        }

        match candidates.choose(rng)? {
            WarmupCandidate::Action(action) => Some(*action),
            WarmupCandidate::AnyNft => q.active_nfts().choose(rng).map(|a| WarmupAction::Mint(*a)),
        }
    }

    pub fn collection_pending(&self, tokens: &[Token]) -> Vec<Token> {
        tokens
            .iter()
            .copied()
            .filter(|t| !self.tokens_collected.contains(t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    fn account_with(quotas: Quotas) -> Account {
        Account::new(Credential::new(KEY), None, None, quotas).unwrap()
    }

    #[test]
    fn credential_debug_is_redacted() {
        let text = format!("{:?}", Credential::new(KEY));
        assert!(!text.contains("59c6995e"));
    }

    #[test]
    fn address_is_derived_from_key() {
        let acct = account_with(Quotas::default());
        assert_eq!(
            acct.address,
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse::<Address>().unwrap()
        );
        assert_eq!(acct.short(), "0x7099...79C8");
    }

    #[test]
    fn consume_saturates_at_zero() {
        let mut quotas = Quotas::default();
        quotas.swaps.insert(SwapVenue::Spacefi, 1);
        assert!(quotas.consume(QuotaKey::Swap(SwapVenue::Spacefi)));
        assert!(!quotas.consume(QuotaKey::Swap(SwapVenue::Spacefi)));
        assert!(!quotas.consume(QuotaKey::Swap(SwapVenue::Zebra)));
        assert_eq!(quotas.remaining(QuotaKey::Swap(SwapVenue::Spacefi)), 0);
        assert!(quotas.is_exhausted());
    }

    #[test]
    fn pending_withdrawal_is_forced_first() {
        let mut quotas = Quotas::default();
        quotas.swaps.insert(SwapVenue::Zebra, 5);
        quotas.lending_supplies.insert(LendingVenue::Layerbank, 1);
        quotas.lending_withdrawals.insert(LendingVenue::Layerbank, 2);
        let acct = account_with(quotas);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(
                acct.next_warmup_action(false, &mut rng),
                Some(WarmupAction::Lending(LendingVenue::Layerbank))
            );
        }
    }

    #[test]
    fn domain_registration_counts_as_pending_only_when_enabled() {
        let acct = account_with(Quotas::default());
        let mut rng = StdRng::seed_from_u64(1);
        assert!(!acct.has_warmup_actions(false));
        assert!(acct.has_warmup_actions(true));
        assert_eq!(acct.next_warmup_action(false, &mut rng), None);
        assert_eq!(
            acct.next_warmup_action(true, &mut rng),
            Some(WarmupAction::RegisterDomain)
        );
    }

    #[test]
    fn bridge_phase_follows_persisted_fields() {
        let mut state = DirectBridgeState::default();
        assert_eq!(state.phase(true), BridgePhase::ExchangeWithdrawal);
        assert_eq!(state.phase(false), BridgePhase::Bridge);
        state.exchange_withdrawn = Some(0.003);
        assert_eq!(state.phase(true), BridgePhase::Bridge);
        state.dst_balance_before_bridge = Some(U256::from(10u64));
        assert_eq!(state.phase(true), BridgePhase::InFlight);
        state.finished = true;
        assert_eq!(state.phase(true), BridgePhase::Done);
    }

    #[test]
    fn volume_phase_walks_the_cycle() {
        let mut s = VolumeCycleState::new(1.0);
        assert_eq!(s.phase(true), VolumePhase::WithdrawExchange);
        s.exchange_withdrawn = Some(0.01);
        assert_eq!(s.phase(true), VolumePhase::BridgeIn);
        s.dst_balance_before_bridge = Some(U256::ZERO);
        assert_eq!(s.phase(true), VolumePhase::AwaitArrivalIn);
        s.dst_balance_before_bridge = None;
        s.bridged_in = true;
        assert_eq!(s.phase(true), VolumePhase::Prepare);
        assert_eq!(s.phase(false), VolumePhase::Accumulate);
        s.native_wrapped = true;
        s.volume_reached = 1.2;
        s.open_lending = Some(LendingVenue::Cog);
        assert_eq!(s.phase(true), VolumePhase::Accumulate);
        s.open_lending = None;
        assert_eq!(s.phase(true), VolumePhase::DrainPositions);
        s.positions_drained = true;
        assert_eq!(s.phase(true), VolumePhase::BridgeOut);
        s.dst_balance_before_bridge = Some(U256::ZERO);
        assert_eq!(s.phase(true), VolumePhase::AwaitArrivalOut);
        s.dst_balance_before_bridge = None;
        s.bridged_out = true;
        assert_eq!(s.phase(true), VolumePhase::Consolidate);
        s.consolidated = true;
        assert_eq!(s.phase(true), VolumePhase::Done);
    }
}
