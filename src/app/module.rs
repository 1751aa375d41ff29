// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use std::fmt;
use std::str::FromStr;

/// Top-level run modes, numbered as in the interactive menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    Build,
    Warmup,
    Bridge,
    CogVolume,
    Volume,
    Collect,
}

impl Module {
    pub const ALL: [Module; 6] = [
        Module::Build,
        Module::Warmup,
        Module::Bridge,
        Module::CogVolume,
        Module::Volume,
        Module::Collect,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Module::Build => "build",
            Module::Warmup => "warmup",
            Module::Bridge => "bridge",
            Module::CogVolume => "cog-volume",
            Module::Volume => "volume",
            Module::Collect => "collect",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Module::Build => "Create the account database from the input files",
            Module::Warmup => "Run randomized warmup actions",
            Module::Bridge => "Exchange withdrawal and bridge",
            Module::CogVolume => "Cog lending volume cycle",
            Module::Volume => "Mixed swap and lending volume cycle",
            Module::Collect => "Collect leftover tokens to ETH",
        }
    }

    pub fn menu() -> String {
        Module::ALL
            .iter()
            .enumerate()
            .map(|(i, m)| format!("{}. {:<11} {}", i + 1, m.name(), m.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Module {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim().to_ascii_lowercase();
        if let Ok(n) = needle.parse::<usize>()
            && (1..=Module::ALL.len()).contains(&n)
        {
            return Ok(Module::ALL[n - 1]);
        }
        Module::ALL
            .iter()
            .copied()
            .find(|m| m.name() == needle)
            .ok_or_else(|| AppError::Config(format!("Unknown module '{}'", raw.trim())))
    }
}
