// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

mod common;

use alloy::primitives::U256;
use common::{Event, Ledger, ScriptedFees};
use scroll_machine::domain::account::Quotas;
use scroll_machine::domain::chain::Network;
use scroll_machine::domain::token::{Asset, Token};
use scroll_machine::infrastructure::network::ip_rotation::NoRotation;
use scroll_machine::services::orchestrator::Orchestrator;
use scroll_machine::services::workflow::Collector;
use std::collections::BTreeSet;
use std::sync::Arc;

#[tokio::test]
async fn worthwhile_tokens_are_converted_and_dust_is_only_marked() {
    let ledger = Ledger::shared();
    let account = common::account(common::KEYS[0], Quotas::default());
    let address = account.address;
    {
        let mut guard = ledger.lock().unwrap();
        guard.set(address, Network::Scroll, Token::Weth.asset(), common::eth(0.01));
        guard.set(address, Network::Scroll, Token::Usdc.asset(), U256::from(5_000_000u64));
        // One cent of USDT sits under the 0.05 minimum.
        guard.set(address, Network::Scroll, Token::Usdt.asset(), U256::from(10_000u64));
    }
    let (mut registry, store) = common::registry(vec![account]);

    let settings = common::settings();
    let tokens = settings.tokens_to_collect().unwrap();
    let ctx = common::context(settings, &ledger, Arc::new(ScriptedFees::new(&[])));
    let summary = Orchestrator::new(ctx, Arc::new(NoRotation))
        .with_max_selections(10)
        .run(&mut registry, &Collector::new(tokens.clone()))
        .await
        .unwrap();

    assert_eq!(summary.selections, 2);
    assert_eq!(summary.finished, 1);
    let collected: BTreeSet<Token> = tokens.into_iter().collect();
    assert_eq!(registry.accounts()[0].tokens_collected, collected);

    let ledger = ledger.lock().unwrap();
    assert_eq!(ledger.count(|e| matches!(e, Event::Unwrap(_))), 1);
    assert_eq!(
        ledger.count(|e| matches!(e, Event::Swap { token_in: Token::Usdc, token_out: Token::Eth, .. })),
        1
    );
    assert_eq!(
        ledger.count(|e| matches!(e, Event::Swap { token_in: Token::Usdt, .. })),
        0
    );
    assert_eq!(
        ledger.balance(address, Network::Scroll, Token::Usdt.asset()),
        U256::from(10_000u64)
    );
    assert!(ledger.balance(address, Network::Scroll, Asset::Native) > common::eth(0.0099));
    drop(ledger);
    common::assert_snapshots_round_trip(&store);
}

#[tokio::test]
async fn account_with_nothing_to_collect_finishes_in_one_step() {
    let ledger = Ledger::shared();
    let account = common::account(common::KEYS[1], Quotas::default());
    let (mut registry, _store) = common::registry(vec![account]);

    let settings = common::settings();
    let tokens = settings.tokens_to_collect().unwrap();
    let ctx = common::context(settings, &ledger, Arc::new(ScriptedFees::new(&[])));
    let summary = Orchestrator::new(ctx, Arc::new(NoRotation))
        .run(&mut registry, &Collector::new(tokens))
        .await
        .unwrap();

    assert_eq!(summary.selections, 1);
    assert_eq!(summary.finished, 1);
    assert!(ledger.lock().unwrap().events.is_empty());
}
