// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod catalog;
pub mod fee_guard;
pub mod orchestrator;
pub mod workflow;
