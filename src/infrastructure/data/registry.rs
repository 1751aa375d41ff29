// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::app::config::GlobalSettings;
use crate::common::error::AppError;
use crate::common::parsing::{parse_private_key, parse_proxy, parse_settlement_address};
use crate::domain::account::{Account, Quotas, VolumeCycleState};
use crate::infrastructure::data::inputs::RawInputs;
use crate::infrastructure::data::store::RegistryStore;
use rand::Rng;
use rand::seq::SliceRandom;
use std::sync::Arc;

/// Ordered, index-stable collection of accounts with write-through
/// persistence. Every mutation is saved before it returns.
pub struct AccountRegistry {
    accounts: Vec<Account>,
    store: Arc<dyn RegistryStore>,
}

impl AccountRegistry {
    /// Builds fresh accounts from raw input lines. Fails when there are more
    /// proxies than keys or any line is malformed.
    pub fn build<R: Rng + ?Sized>(
        inputs: &RawInputs,
        settings: &GlobalSettings,
        rng: &mut R,
    ) -> Result<Vec<Account>, AppError> {
        let proxies: Vec<String> = if settings.use_mobile_proxy {
            match inputs.proxies.first() {
                Some(p) => vec![p.clone(); inputs.private_keys.len()],
                None => Vec::new(),
            }
        } else {
            inputs.proxies.clone()
        };
        if inputs.private_keys.len() < proxies.len() {
            return Err(AppError::Config(format!(
                "{} private keys but {} proxies",
                inputs.private_keys.len(),
                proxies.len()
            )));
        }
        if inputs.deposit_addresses.len() > inputs.private_keys.len() {
            tracing::warn!(
                target: "registry",
                extra = inputs.deposit_addresses.len() - inputs.private_keys.len(),
                "More deposit addresses than private keys; extras ignored"
            );
        }

        let mut accounts = Vec::with_capacity(inputs.private_keys.len());
        for (i, raw_key) in inputs.private_keys.iter().enumerate() {
            let fatal = |e: AppError| AppError::Config(format!("line {}: {e}", i + 1));
            let key = parse_private_key(raw_key).map_err(fatal)?;
            let proxy = proxies
                .get(i)
                .map(|p| parse_proxy(p))
                .transpose()
                .map_err(fatal)?;
            let deposit = inputs
                .deposit_addresses
                .get(i)
                .map(|a| parse_settlement_address(a))
                .transpose()
                .map_err(fatal)?;

            let mut account =
                Account::new(key, proxy, deposit, sample_quotas(settings, rng)).map_err(fatal)?;
            account.cog_volume =
                VolumeCycleState::new(settings.cog_volume_goal_range.sample_rounded(rng, 5));
            account.volume_mode =
                VolumeCycleState::new(settings.volume_usd_goal_range.sample_rounded(rng, 5));
            accounts.push(account);
        }

        if settings.shuffle_database {
            accounts.shuffle(rng);
        }
        Ok(accounts)
    }

    /// Wraps freshly built accounts and writes the first snapshot.
    pub fn create(store: Arc<dyn RegistryStore>, accounts: Vec<Account>) -> Result<Self, AppError> {
        let registry = Self { accounts, store };
        registry.persist()?;
        tracing::info!(target: "registry", accounts = registry.len(), "Registry created");
        Ok(registry)
    }

    pub fn load(store: Arc<dyn RegistryStore>) -> Result<Self, AppError> {
        let accounts = store.load()?;
        tracing::info!(target: "registry", accounts = accounts.len(), "Registry loaded");
        Ok(Self { accounts, store })
    }

    pub fn persist(&self) -> Result<(), AppError> {
        self.store.save(&self.accounts)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn get(&self, index: usize) -> Result<&Account, AppError> {
        self.accounts.get(index).ok_or_else(|| out_of_bounds(index, self.len()))
    }

    pub fn any<F: Fn(&Account) -> bool>(&self, pred: F) -> bool {
        self.accounts.iter().any(pred)
    }

    /// Uniform random choice among matching accounts.
    pub fn select<R, F>(&self, rng: &mut R, pred: F) -> Option<(usize, &Account)>
    where
        R: Rng + ?Sized,
        F: Fn(&Account) -> bool,
    {
        let matches: Vec<usize> = self
            .accounts
            .iter()
            .enumerate()
            .filter(|(_, a)| pred(a))
            .map(|(i, _)| i)
            .collect();
        let index = *matches.choose(rng)?;
        Some((index, &self.accounts[index]))
    }

    /// First matching account in stored order.
    pub fn select_first<F: Fn(&Account) -> bool>(&self, pred: F) -> Option<(usize, &Account)> {
        self.accounts.iter().enumerate().find(|(_, a)| pred(a))
    }

    /// Applies `update` to the account at `index`, then persists.
    pub fn mutate<F>(&mut self, index: usize, update: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut Account),
    {
        let len = self.len();
        let account = self
            .accounts
            .get_mut(index)
            .ok_or_else(|| out_of_bounds(index, len))?;
        update(account);
        self.persist()
    }
}

fn out_of_bounds(index: usize, len: usize) -> AppError {
    AppError::Persistence(format!("account index {index} out of bounds ({len} accounts)"))
}

/// Independent samples per quota; lending supply and withdraw share one
/// sample so every supply has a matching withdrawal.
pub fn sample_quotas<R: Rng + ?Sized>(settings: &GlobalSettings, rng: &mut R) -> Quotas {
    let mut quotas = Quotas::default();
    for (venue, span) in &settings.swap_counts {
        quotas.swaps.insert(*venue, span.sample(rng));
    }
    for (venue, span) in &settings.lending_counts {
        let n = span.sample(rng);
        quotas.lending_supplies.insert(*venue, n);
        quotas.lending_withdrawals.insert(*venue, n);
    }
    quotas.mails = settings.dmail_count.sample(rng);
    quotas.votes = settings.rubyscore_count.sample(rng);
    for nft in &settings.nft_collections {
        quotas.nft_mints.insert(nft.address, nft.amount.sample(rng));
    }
    quotas
}
