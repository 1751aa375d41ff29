// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

pub mod account;
pub mod chain;
pub mod constants;
pub mod error;
pub mod token;
pub mod venue;
