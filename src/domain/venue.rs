// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! venue_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVenue;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let needle = raw.trim().to_ascii_lowercase();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == needle)
                    .ok_or_else(|| UnknownVenue(raw.trim().to_string()))
            }
        }
    };
}

/// A venue name from configuration that no enum variant knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVenue(pub String);

impl fmt::Display for UnknownVenue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown venue '{}'", self.0)
    }
}

venue_enum!(
    /// DEX venues on Scroll.
    SwapVenue {
        Izumi => "izumi",
        Skydrome => "skydrome",
        Spacefi => "spacefi",
        Syncswap => "syncswap",
        Zebra => "zebra",
    }
);

venue_enum!(
    /// Lending markets on Scroll.
    LendingVenue {
        Layerbank => "layerbank",
        Cog => "cog",
    }
);

venue_enum!(
    /// Bridges between Scroll and the exchange-facing chains.
    BridgeVenue {
        Orbiter => "orbiter",
        Nitro => "nitro",
        Official => "official",
    }
);

/// Action families the catalog resolves adapters for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionFamily {
    Swap,
    Lending,
}

impl FromStr for ActionFamily {
    type Err = UnknownVenue;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "swap" => Ok(ActionFamily::Swap),
            "lending" => Ok(ActionFamily::Lending),
            other => Err(UnknownVenue(other.to_string())),
        }
    }
}
