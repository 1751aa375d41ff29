// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

mod common;

use alloy::primitives::{U256, address};
use common::{CancellingExchange, DEPOSIT, Event, Ledger, ScriptedFees};
use scroll_machine::domain::account::{LendingAction, Quotas, VolumeCycleState, VolumeVariant};
use scroll_machine::domain::chain::Network;
use scroll_machine::domain::token::{Asset, Token, wei_to_eth};
use scroll_machine::domain::venue::LendingVenue;
use scroll_machine::infrastructure::network::ip_rotation::NoRotation;
use scroll_machine::services::orchestrator::Orchestrator;
use scroll_machine::services::workflow::VolumeCycle;
use std::collections::BTreeMap;
use std::sync::Arc;

#[tokio::test]
async fn lending_cycle_stops_on_the_supply_that_crosses_the_goal() {
    let ledger = Ledger::shared();
    let mut account = common::account(common::KEYS[0], Quotas::default());
    account.cog_volume = VolumeCycleState::new(0.01);
    let address = account.address;
    let (mut registry, store) = common::registry(vec![account]);

    let mut settings = common::settings();
    settings.cog_pool_address = Some(address!("00000000000000000000000000000000000000c0"));
    let ctx = common::context(settings, &ledger, Arc::new(ScriptedFees::new(&[])));
    let summary = Orchestrator::new(ctx, Arc::new(NoRotation))
        .with_max_selections(3)
        .run(&mut registry, &VolumeCycle::new(VolumeVariant::LendingCycle))
        .await
        .unwrap();
    assert_eq!(summary.finished, 1);
    assert_eq!(summary.stalls, 0);

    let state = &registry.accounts()[0].cog_volume;
    assert!(state.consolidated);
    assert!(state.open_lending.is_none());
    assert!(state.volume_reached >= state.volume_goal);

    let ledger = ledger.lock().unwrap();
    let supplies: Vec<U256> = ledger
        .events
        .iter()
        .filter_map(|e| match e {
            Event::Supply { venue, amount } => {
                assert_eq!(*venue, LendingVenue::Cog);
                Some(*amount)
            }
            _ => None,
        })
        .collect();
    let withdraws = ledger.count(|e| matches!(e, Event::Withdraw { .. }));
    assert_eq!(supplies.len(), withdraws);

    let last = wei_to_eth(*supplies.last().unwrap());
    assert!(state.volume_reached - last < state.volume_goal);

    assert_eq!(ledger.count(|e| matches!(e, Event::Wrap(_))), 1);
    assert_eq!(ledger.count(|e| matches!(e, Event::Unwrap(_))), 1);
    assert_eq!(ledger.balance(address, Network::Scroll, Token::Weth.asset()), U256::ZERO);
    assert!(ledger.balance(DEPOSIT, Network::Linea, Asset::Native) > U256::ZERO);
    // Every supply is closed before the next one opens.
    let lending: Vec<&Event> = ledger
        .events
        .iter()
        .filter(|e| matches!(e, Event::Supply { .. } | Event::Withdraw { .. }))
        .collect();
    for pair in lending.chunks(2) {
        assert!(matches!(pair[0], Event::Supply { .. }));
        assert!(matches!(pair[1], Event::Withdraw { .. }));
    }
    drop(ledger);
    common::assert_snapshots_round_trip(&store);
}

#[tokio::test]
async fn mixed_cycle_runs_through_consolidation() {
    let ledger = Ledger::shared();
    let mut account = common::account(common::KEYS[1], Quotas::default());
    account.volume_mode = VolumeCycleState::new(20.0);
    let address = account.address;
    let (mut registry, store) = common::registry(vec![account]);

    let ctx = common::context(common::settings(), &ledger, Arc::new(ScriptedFees::new(&[])));
    let summary = Orchestrator::new(ctx, Arc::new(NoRotation))
        .with_max_selections(3)
        .run(&mut registry, &VolumeCycle::new(VolumeVariant::Mixed))
        .await
        .unwrap();
    assert_eq!(summary.finished, 1);

    let stored = &registry.accounts()[0];
    let state = &stored.volume_mode;
    assert!(state.consolidated);
    assert!(state.positions_drained);
    assert!(!state.native_wrapped);
    assert!(state.open_lending.is_none());
    assert!(state.volume_reached >= 20.0);
    assert_eq!(stored.cog_volume, VolumeCycleState::default());

    let ledger = ledger.lock().unwrap();
    let supplies = ledger.count(|e| matches!(e, Event::Supply { .. }));
    let withdraws = ledger.count(|e| matches!(e, Event::Withdraw { .. }));
    assert_eq!(supplies, withdraws);
    for token in [Token::Weth, Token::LEth] {
        assert_eq!(ledger.balance(address, Network::Scroll, token.asset()), U256::ZERO);
    }
    assert!(ledger.balance(DEPOSIT, Network::Linea, Asset::Native) > U256::ZERO);
    assert!(matches!(
        ledger.events.last(),
        Some(Event::Transfer { network: Network::Linea, to, .. }) if *to == DEPOSIT
    ));
    drop(ledger);
    common::assert_snapshots_round_trip(&store);
}

#[tokio::test]
async fn missing_deposit_address_aborts_before_any_withdrawal() {
    let ledger = Ledger::shared();
    let mut account = common::account(common::KEYS[2], Quotas::default());
    account.deposit_address = None;
    account.volume_mode = VolumeCycleState::new(5.0);
    let (mut registry, _store) = common::registry(vec![account]);

    let ctx = common::context(common::settings(), &ledger, Arc::new(ScriptedFees::new(&[])));
    let err = Orchestrator::new(ctx, Arc::new(NoRotation))
        .run(&mut registry, &VolumeCycle::new(VolumeVariant::Mixed))
        .await
        .unwrap_err();

    assert!(err.is_fatal());
    assert!(ledger.lock().unwrap().events.is_empty());
}

#[tokio::test]
async fn lending_cycle_requires_a_pool_address() {
    let ledger = Ledger::shared();
    let account = common::account(common::KEYS[0], Quotas::default());
    let (mut registry, _store) = common::registry(vec![account]);

    let ctx = common::context(common::settings(), &ledger, Arc::new(ScriptedFees::new(&[])));
    let err = Orchestrator::new(ctx, Arc::new(NoRotation))
        .run(&mut registry, &VolumeCycle::new(VolumeVariant::LendingCycle))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("cog_pool_address"));
}

#[tokio::test]
async fn accounts_are_worked_in_stored_order() {
    for _ in 0..20 {
        let ledger = Ledger::shared();
        let mut done = common::account(common::KEYS[0], Quotas::default());
        done.volume_mode = VolumeCycleState::new(20.0);
        done.volume_mode.consolidated = true;
        let mut second = common::account(common::KEYS[1], Quotas::default());
        second.volume_mode = VolumeCycleState::new(20.0);
        let mut third = common::account(common::KEYS[2], Quotas::default());
        third.volume_mode = VolumeCycleState::new(20.0);
        let untouched = third.volume_mode.clone();
        let (mut registry, _store) = common::registry(vec![done, second, third]);

        let ctx = common::context(common::settings(), &ledger, Arc::new(ScriptedFees::new(&[])));
        let summary = Orchestrator::new(ctx, Arc::new(NoRotation))
            .with_max_selections(1)
            .run(&mut registry, &VolumeCycle::new(VolumeVariant::Mixed))
            .await
            .unwrap();

        assert_eq!(summary.selections, 1);
        assert!(registry.accounts()[1].volume_mode.exchange_withdrawn.is_some());
        assert_eq!(registry.accounts()[2].volume_mode, untouched);
    }
}

#[tokio::test]
async fn open_position_already_closed_on_chain_is_settled_without_a_withdrawal() {
    let ledger = Ledger::shared();
    let mut account = common::account(common::KEYS[0], Quotas::default());
    account.volume_mode = VolumeCycleState {
        bridged_in: true,
        volume_reached: 2.0,
        open_lending: Some(LendingVenue::Layerbank),
        last_action: Some(LendingAction::Supply),
        ..VolumeCycleState::new(1.0)
    };
    ledger
        .lock()
        .unwrap()
        .set(account.address, Network::Scroll, Asset::Native, common::eth(0.05));
    let (mut registry, store) = common::registry(vec![account]);

    let ctx = common::context(common::settings(), &ledger, Arc::new(ScriptedFees::new(&[])));
    let summary = Orchestrator::new(ctx, Arc::new(NoRotation))
        .with_max_selections(3)
        .run(&mut registry, &VolumeCycle::new(VolumeVariant::Mixed))
        .await
        .unwrap();

    assert_eq!(summary.stalls, 0);
    assert_eq!(summary.finished, 1);
    let state = &registry.accounts()[0].volume_mode;
    assert!(state.open_lending.is_none());
    assert_eq!(state.last_action, Some(LendingAction::Withdraw));
    assert!(state.consolidated);

    let ledger = ledger.lock().unwrap();
    assert_eq!(ledger.count(|e| matches!(e, Event::Withdraw { .. })), 0);
    assert!(ledger.balance(DEPOSIT, Network::Linea, Asset::Native) > U256::ZERO);
    drop(ledger);
    common::assert_snapshots_round_trip(&store);
}

#[tokio::test]
async fn closed_cog_position_is_settled_in_the_lending_cycle() {
    let ledger = Ledger::shared();
    let mut account = common::account(common::KEYS[1], Quotas::default());
    account.cog_volume = VolumeCycleState {
        bridged_in: true,
        native_wrapped: true,
        volume_reached: 0.5,
        open_lending: Some(LendingVenue::Cog),
        last_action: Some(LendingAction::Supply),
        ..VolumeCycleState::new(0.1)
    };
    ledger
        .lock()
        .unwrap()
        .set(account.address, Network::Scroll, Asset::Native, common::eth(0.05));
    let (mut registry, _store) = common::registry(vec![account]);

    let mut settings = common::settings();
    settings.cog_pool_address = Some(address!("00000000000000000000000000000000000000c0"));
    let ctx = common::context(settings, &ledger, Arc::new(ScriptedFees::new(&[])));
    let summary = Orchestrator::new(ctx, Arc::new(NoRotation))
        .with_max_selections(3)
        .run(&mut registry, &VolumeCycle::new(VolumeVariant::LendingCycle))
        .await
        .unwrap();

    assert_eq!(summary.stalls, 0);
    assert_eq!(summary.finished, 1);
    assert!(registry.accounts()[0].cog_volume.consolidated);
    assert_eq!(
        ledger.lock().unwrap().count(|e| matches!(e, Event::Withdraw { .. } | Event::Supply { .. })),
        0
    );
}

#[tokio::test]
async fn cancelled_exchange_withdrawal_leaves_the_cycle_at_its_start() {
    let ledger = Ledger::shared();
    let mut account = common::account(common::KEYS[2], Quotas::default());
    account.volume_mode = VolumeCycleState::new(5.0);
    let (mut registry, store) = common::registry(vec![account]);

    let exchange = Arc::new(CancellingExchange::new());
    let mut ctx = common::context(common::settings(), &ledger, Arc::new(ScriptedFees::new(&[])));
    ctx.exchange = Some(exchange.clone());
    let summary = Orchestrator::new(ctx, Arc::new(NoRotation))
        .with_max_selections(2)
        .run(&mut registry, &VolumeCycle::new(VolumeVariant::Mixed))
        .await
        .unwrap();

    assert_eq!(summary.stalls, 2);
    assert_eq!(exchange.attempts(), 2);
    assert_eq!(registry.accounts()[0].volume_mode, VolumeCycleState::new(5.0));
    assert!(ledger.lock().unwrap().events.is_empty());
    for n in 0..store.snapshot_count() {
        assert_eq!(store.snapshot(n).unwrap()[0].volume_mode.exchange_withdrawn, None);
    }
}

#[tokio::test]
async fn swap_family_without_any_adapter_is_rejected_before_running() {
    let ledger = Ledger::shared();
    let mut account = common::account(common::KEYS[0], Quotas::default());
    account.volume_mode = VolumeCycleState::new(5.0);
    let (mut registry, _store) = common::registry(vec![account]);

    let mut settings = common::settings();
    settings.volume_dapps = BTreeMap::from([
        ("swap".to_string(), vec!["izumi".to_string(), "syncswap".to_string()]),
        ("lending".to_string(), vec!["layerbank".to_string()]),
    ]);
    let ctx = common::context(settings, &ledger, Arc::new(ScriptedFees::new(&[])));
    let err = Orchestrator::new(ctx, Arc::new(NoRotation))
        .run(&mut registry, &VolumeCycle::new(VolumeVariant::Mixed))
        .await
        .unwrap_err();

    assert!(err.is_fatal());
    assert!(err.to_string().contains("volume_dapps.swap"));
    assert!(ledger.lock().unwrap().events.is_empty());
}
