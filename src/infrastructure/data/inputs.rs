// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::data_path::DataPaths;
use crate::common::error::AppError;
use std::fs;
use std::path::Path;

/// Raw lines from the three input files, not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInputs {
    pub private_keys: Vec<String>,
    pub proxies: Vec<String>,
    pub deposit_addresses: Vec<String>,
}

impl RawInputs {
    /// Private keys are required; proxies and deposit addresses may be absent.
    pub fn read(paths: &DataPaths) -> Result<Self, AppError> {
        let private_keys = read_lines(DataPaths::require(&paths.private_keys)?)?;
        if private_keys.is_empty() {
            return Err(AppError::Config(format!(
                "{} has no private keys",
                paths.private_keys.display()
            )));
        }
        Ok(Self {
            private_keys,
            proxies: read_optional_lines(&paths.proxies)?,
            deposit_addresses: read_optional_lines(&paths.deposit_addresses)?,
        })
    }
}

/// Trimmed, non-empty lines.
pub fn read_lines(path: &Path) -> Result<Vec<String>, AppError> {
    let body = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("read {} failed: {e}", path.display())))?;
    Ok(body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(ToString::to_string)
        .collect())
}

fn read_optional_lines(path: &Path) -> Result<Vec<String>, AppError> {
    if !path.exists() {
        tracing::debug!(target: "registry", path = %path.display(), "Optional input file missing");
        return Ok(Vec::new());
    }
    read_lines(path)
}
