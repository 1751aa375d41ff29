// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants::{
    DATABASE_FILE, DEPOSIT_ADDRESSES_FILE, PRIVATE_KEYS_FILE, PROXIES_FILE,
};
use crate::domain::error::AppError;
use std::path::{Path, PathBuf};

const DATA_DIR_ENV: &str = "DATA_DIR";

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn env_data_dir() -> Option<String> {
    non_empty(std::env::var(DATA_DIR_ENV).ok().as_deref())
}

/// Resolve the data directory: `DATA_DIR` env, then the configured value,
/// then `./data`.
pub fn resolve_data_dir(configured: Option<&str>) -> PathBuf {
    let dir = env_data_dir()
        .or_else(|| non_empty(configured))
        .unwrap_or_else(|| "data".to_string());
    absolute(PathBuf::from(dir))
}

/// Absolute paths pass through; relative ones land under the data dir.
pub fn resolve_in(dir: &Path, raw: &str) -> PathBuf {
    let as_path = PathBuf::from(raw.trim());
    if as_path.is_absolute() {
        return as_path;
    }
    let rel = as_path
        .strip_prefix("data")
        .map(PathBuf::from)
        .unwrap_or(as_path);
    dir.join(rel)
}

/// Every file the workflows read or write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub dir: PathBuf,
    pub private_keys: PathBuf,
    pub proxies: PathBuf,
    pub deposit_addresses: PathBuf,
    pub database: PathBuf,
}

impl DataPaths {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            private_keys: dir.join(PRIVATE_KEYS_FILE),
            proxies: dir.join(PROXIES_FILE),
            deposit_addresses: dir.join(DEPOSIT_ADDRESSES_FILE),
            database: dir.join(DATABASE_FILE),
            dir,
        }
    }

    pub fn with_database(mut self, raw: Option<&str>) -> Self {
        if let Some(raw) = non_empty(raw) {
            self.database = resolve_in(&self.dir, &raw);
        }
        self
    }

    pub fn require(path: &Path) -> Result<&Path, AppError> {
        if path.exists() {
            return Ok(path);
        }
        Err(AppError::Config(format!(
            "expected {}; set DATA_DIR or data_dir",
            path.display()
        )))
    }
}
