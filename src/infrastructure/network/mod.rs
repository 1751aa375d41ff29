// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod connector;
pub mod erc20;
pub mod exchange;
pub mod gas;
pub mod ip_rotation;
pub mod price_feed;
pub mod provider;
