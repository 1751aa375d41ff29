// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use crate::domain::account::Account;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Durable home of the account registry.
pub trait RegistryStore: Send + Sync {
    fn load(&self) -> Result<Vec<Account>, AppError>;
    fn save(&self, accounts: &[Account]) -> Result<(), AppError>;
    fn exists(&self) -> bool;
}

/// Pretty-printed JSON array on disk. Writes go to a sibling temp file that
/// is renamed over the target, so a reader never sees a half-written file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "database.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl RegistryStore for JsonFileStore {
    fn load(&self) -> Result<Vec<Account>, AppError> {
        let body = fs::read_to_string(&self.path).map_err(|e| {
            AppError::Persistence(format!("read {} failed: {e}", self.path.display()))
        })?;
        serde_json::from_str(&body).map_err(|e| {
            AppError::Persistence(format!("{} is malformed: {e}", self.path.display()))
        })
    }

    fn save(&self, accounts: &[Account]) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Persistence(format!("create {} failed: {e}", parent.display()))
            })?;
        }
        let body = serde_json::to_string_pretty(accounts)?;
        let tmp = self.temp_path();
        fs::write(&tmp, body)
            .map_err(|e| AppError::Persistence(format!("write {} failed: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            AppError::Persistence(format!("replace {} failed: {e}", self.path.display()))
        })
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// Keeps every saved snapshot in memory. Loading returns the latest one,
/// which is what a restart after a crash would see.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Decoded snapshot `n` (0-based, in save order).
    pub fn snapshot(&self, n: usize) -> Option<Vec<Account>> {
        let guard = self.snapshots.lock().ok()?;
        serde_json::from_str(guard.get(n)?).ok()
    }
}

impl RegistryStore for MemoryStore {
    fn load(&self) -> Result<Vec<Account>, AppError> {
        let guard = self
            .snapshots
            .lock()
            .map_err(|_| AppError::Persistence("memory store poisoned".into()))?;
        let last = guard
            .last()
            .ok_or_else(|| AppError::Persistence("no snapshot saved".into()))?;
        Ok(serde_json::from_str(last)?)
    }

    fn save(&self, accounts: &[Account]) -> Result<(), AppError> {
        let body = serde_json::to_string(accounts)?;
        self.snapshots
            .lock()
            .map_err(|_| AppError::Persistence("memory store poisoned".into()))?
            .push(body);
        Ok(())
    }

    fn exists(&self) -> bool {
        self.snapshot_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{Credential, Quotas};

    const KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    fn sample() -> Vec<Account> {
        vec![Account::new(Credential::new(KEY), None, None, Quotas::default()).unwrap()]
    }

    #[test]
    fn file_store_replaces_atomically_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("database.json"));
        assert!(!store.exists());

        store.save(&sample()).unwrap();
        assert!(store.exists());
        assert!(!store.temp_path().exists());
        assert_eq!(store.load().unwrap(), sample());
    }

    #[test]
    fn malformed_file_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.json");
        fs::write(&path, "[{\"address\": 1}").unwrap();
        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn memory_store_returns_latest_snapshot() {
        let store = MemoryStore::new();
        assert!(store.load().is_err());
        let mut accounts = sample();
        store.save(&accounts).unwrap();
        accounts[0].warmup_finished = true;
        store.save(&accounts).unwrap();

        assert_eq!(store.snapshot_count(), 2);
        assert!(!store.snapshot(0).unwrap()[0].warmup_finished);
        assert!(store.load().unwrap()[0].warmup_finished);
    }
}
