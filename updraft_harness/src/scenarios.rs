// Copyright 2026 the Updraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Whole-system scenarios: a manager, a simulated host, and scripted roots
//! driven the way a platform event loop would drive them.

use alloc::boxed::Box;
use alloc::vec::Vec;

use updraft_core::component::Component;
use updraft_core::flags::UpdateFlags;
use updraft_core::manager::{ExecuteManager, ManagerConfig};
use updraft_core::time::Delay;
use updraft_core::timer::PassKind;

use crate::{ManualHost, ProbeComponent, TraversalLog, fire_due, run_until_idle};

fn fixture() -> (ExecuteManager<ManualHost>, ManualHost, TraversalLog) {
    let host = ManualHost::new();
    let manager = ExecuteManager::new(host.clone());
    (manager, host, TraversalLog::new())
}

fn assert_at_most_one_armed(manager: &ExecuteManager<ManualHost>) {
    assert!(
        !(manager.timer_armed(PassKind::Compile) && manager.timer_armed(PassKind::Execute)),
        "at most one timer may be armed at any instant"
    );
}

#[test]
fn inert_forest_stays_idle() {
    let (mut manager, host, log) = fixture();
    for label in ["a", "b", "c"] {
        manager.insert_root(Box::new(ProbeComponent::new(label, &log)));
    }
    assert_eq!(manager.root_flags(), UpdateFlags::empty());
    assert!(!host.any_armed());
    assert_eq!(run_until_idle(&mut manager, &host, 10), 0);
    assert!(log.records().is_empty());
}

#[test]
fn execute_only_request_full_lifecycle() {
    let (mut manager, host, log) = fixture();
    let probe = ProbeComponent::new("r", &log);
    let id = manager.insert_root(Box::new(probe.clone()));

    probe.set_flags(UpdateFlags::NEEDS_EXECUTE);
    manager.request_update(id, UpdateFlags::NEEDS_EXECUTE, false);
    assert!(manager.timer_armed(PassKind::Compile), "compile always leads");

    assert_eq!(fire_due(&mut manager, &host), Some(PassKind::Compile));
    assert_eq!(
        log.count("r", PassKind::Compile),
        0,
        "a root with no compile work is skipped by the compile pass"
    );
    assert_eq!(
        host.deadline(PassKind::Execute),
        Some(host.current() + manager.config().min_execute_interval)
    );

    assert_eq!(fire_due(&mut manager, &host), Some(PassKind::Execute));
    assert_eq!(log.count("r", PassKind::Execute), 1);
    assert_eq!(probe.flags(), UpdateFlags::empty());
    assert!(!host.any_armed());
    assert_eq!(fire_due(&mut manager, &host), None);
}

#[test]
fn compile_pass_visits_dirty_roots_in_insertion_order() {
    let (mut manager, host, log) = fixture();
    let first = ProbeComponent::new("first", &log);
    let second = ProbeComponent::new("second", &log);
    let clean = ProbeComponent::new("clean", &log);
    first.set_flags(UpdateFlags::NEEDS_COMPILE);
    second.set_flags(UpdateFlags::NEEDS_COMPILE);
    manager.insert_root(Box::new(first));
    manager.insert_root(Box::new(clean));
    manager.insert_root(Box::new(second));

    assert_eq!(fire_due(&mut manager, &host), Some(PassKind::Compile));
    assert_eq!(log.visits(PassKind::Compile), ["first", "second"]);
}

#[test]
fn sustained_overruns_double_the_delay_up_to_the_cap() {
    let (mut manager, host, log) = fixture();
    let probe = ProbeComponent::new("slow", &log);
    let id = manager.insert_root(Box::new(probe.clone()));

    // The cost has to exceed max_update_delay for every pass to overrun;
    // anything cheaper starts decaying once the budget outgrows it.
    host.set_traversal_cost(Delay(200));
    let mut observed = Vec::new();
    for _ in 0..9 {
        probe.set_flags(UpdateFlags::NEEDS_COMPILE);
        manager.request_update(id, UpdateFlags::NEEDS_COMPILE, false);
        assert_eq!(fire_due(&mut manager, &host), Some(PassKind::Compile));
        observed.push(manager.update_delay());
    }
    assert_eq!(
        observed,
        [
            Delay(2),
            Delay(4),
            Delay(8),
            Delay(16),
            Delay(32),
            Delay(64),
            Delay(128),
            Delay(167),
            Delay(167),
        ]
    );

    // Back under budget, the default zero minimum pins the delay to zero.
    host.set_traversal_cost(Delay::ZERO);
    probe.set_flags(UpdateFlags::NEEDS_COMPILE);
    manager.request_update(id, UpdateFlags::NEEDS_COMPILE, false);
    assert_eq!(fire_due(&mut manager, &host), Some(PassKind::Compile));
    assert_eq!(manager.update_delay(), Delay::ZERO);
}

#[test]
fn unpower_mid_timer_then_clean_rearm() {
    let (mut manager, host, log) = fixture();
    let probe = ProbeComponent::new("r", &log);
    let id = manager.insert_root(Box::new(probe.clone()));
    manager.on_power();
    log.clear();

    // Build up some back-off, then leave a timer armed.
    host.set_traversal_cost(Delay(40));
    probe.set_flags(UpdateFlags::NEEDS_COMPILE);
    manager.request_update(id, UpdateFlags::NEEDS_COMPILE, false);
    assert_eq!(fire_due(&mut manager, &host), Some(PassKind::Compile));
    assert_eq!(manager.update_delay(), Delay(2));
    manager.request_update(id, UpdateFlags::NEEDS_COMPILE, false);
    assert!(host.any_armed());

    manager.on_unpower();
    assert!(!host.any_armed(), "unpower must disarm the pending timer");
    assert_eq!(manager.update_delay(), manager.config().min_update_delay);
    assert!(!probe.is_powered());
    assert_eq!(fire_due(&mut manager, &host), None);

    // The system comes back responsive.
    host.set_traversal_cost(Delay::ZERO);
    probe.set_flags(UpdateFlags::NEEDS_COMPILE);
    manager.request_update(id, UpdateFlags::NEEDS_COMPILE, false);
    assert_eq!(
        host.deadline(PassKind::Compile),
        Some(host.current()),
        "re-arm starts from the minimum delay again"
    );
    assert_eq!(fire_due(&mut manager, &host), Some(PassKind::Compile));
}

#[test]
fn immediate_request_completes_synchronously_when_keeping_up() {
    let (mut manager, host, log) = fixture();
    let probe = ProbeComponent::new("r", &log);
    let id = manager.insert_root(Box::new(probe.clone()));

    probe.set_flags(UpdateFlags::NEEDS_COMPILE | UpdateFlags::NEEDS_EXECUTE);
    manager.request_update(
        id,
        UpdateFlags::NEEDS_COMPILE | UpdateFlags::NEEDS_EXECUTE,
        true,
    );
    assert_eq!(log.count("r", PassKind::Compile), 1);
    assert_eq!(log.count("r", PassKind::Execute), 1);
    assert!(!host.any_armed());
    assert_eq!(fire_due(&mut manager, &host), None);
}

#[test]
fn immediate_request_degrades_to_deferred_under_load() {
    let (mut manager, host, log) = fixture();
    let probe = ProbeComponent::new("r", &log);
    let id = manager.insert_root(Box::new(probe.clone()));

    host.set_traversal_cost(Delay(40));
    for _ in 0..6 {
        probe.set_flags(UpdateFlags::NEEDS_COMPILE);
        manager.request_update(id, UpdateFlags::NEEDS_COMPILE, false);
        assert_eq!(fire_due(&mut manager, &host), Some(PassKind::Compile));
    }
    assert!(manager.update_delay() > manager.config().max_compile_interval);
    host.set_traversal_cost(Delay::ZERO);
    log.clear();

    probe.set_flags(UpdateFlags::NEEDS_COMPILE | UpdateFlags::NEEDS_EXECUTE);
    manager.request_update(
        id,
        UpdateFlags::NEEDS_COMPILE | UpdateFlags::NEEDS_EXECUTE,
        true,
    );
    assert!(log.records().is_empty(), "nothing may run synchronously");
    assert!(manager.timer_armed(PassKind::Compile));

    // The deferred path still drains everything.
    run_until_idle(&mut manager, &host, 10);
    assert_eq!(log.count("r", PassKind::Compile), 1);
    assert_eq!(log.count("r", PassKind::Execute), 1);
    assert!(!host.any_armed());
}

#[test]
fn at_most_one_timer_armed_throughout_a_busy_run() {
    let (mut manager, host, log) = fixture();
    let probe = ProbeComponent::new("busy", &log);
    let id = manager.insert_root(Box::new(probe.clone()));
    probe.set_flags(UpdateFlags::NEEDS_COMPILE | UpdateFlags::NEEDS_EXECUTE);
    probe.request_on_next_compile(UpdateFlags::NEEDS_EXECUTE);
    probe.request_on_next_execute(UpdateFlags::NEEDS_COMPILE);
    probe.repeat_execute(true);
    manager.request_update(
        id,
        UpdateFlags::NEEDS_COMPILE | UpdateFlags::NEEDS_EXECUTE,
        false,
    );
    assert_at_most_one_armed(&manager);

    for _ in 0..12 {
        assert!(fire_due(&mut manager, &host).is_some(), "repeat keeps it busy");
        assert_at_most_one_armed(&manager);
    }
    probe.repeat_execute(false);
    let drained = run_until_idle(&mut manager, &host, 20);
    assert!(drained < 20, "the run must settle once the repeat stops");
    assert!(log.count("busy", PassKind::Compile) >= 2);
    assert!(log.count("busy", PassKind::Execute) >= 4);
}

#[test]
fn delay_stays_bounded_under_erratic_pass_durations() {
    let (mut manager, host, log) = fixture();
    let probe = ProbeComponent::new("erratic", &log);
    let id = manager.insert_root(Box::new(probe.clone()));

    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    for _ in 0..200 {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        host.set_traversal_cost(Delay((state >> 33) % 50));
        probe.set_flags(UpdateFlags::NEEDS_COMPILE);
        manager.request_update(id, UpdateFlags::NEEDS_COMPILE, false);
        assert_eq!(fire_due(&mut manager, &host), Some(PassKind::Compile));

        let delay = manager.update_delay();
        assert!(delay <= manager.config().max_update_delay);
        assert!(
            delay == Delay::ZERO || (Delay(2)..=manager.config().max_update_delay).contains(&delay),
            "delay must be zero or within the back-off range, got {delay:?}"
        );
        assert_at_most_one_armed(&manager);
    }
}

#[test]
fn inserting_a_dirty_tree_schedules_it_end_to_end() {
    let (mut manager, host, log) = fixture();
    let parent = ProbeComponent::new("parent", &log);
    let child = ProbeComponent::new("child", &log);
    child.set_flags(UpdateFlags::NEEDS_RESOLVE | UpdateFlags::NEEDS_REVISE);
    parent.push_child(child.clone());
    parent.set_flags(UpdateFlags::NEEDS_RESOLVE | UpdateFlags::NEEDS_REVISE);
    manager.insert_root(Box::new(parent.clone()));

    assert!(
        manager
            .root_flags()
            .contains(UpdateFlags::NEEDS_COMPILE | UpdateFlags::NEEDS_EXECUTE),
        "pre-existing sub-flags are canonicalized on insertion"
    );
    run_until_idle(&mut manager, &host, 10);
    assert_eq!(log.visits(PassKind::Compile), ["parent", "child"]);
    assert_eq!(log.visits(PassKind::Execute), ["parent", "child"]);
    assert_eq!(parent.flags(), UpdateFlags::empty());
    assert_eq!(child.flags(), UpdateFlags::empty());
}

#[test]
fn animation_loop_settles_into_the_idle_repeat_cadence() {
    let (mut manager, host, log) = fixture();
    let probe = ProbeComponent::new("anim", &log);
    let id = manager.insert_root(Box::new(probe.clone()));
    probe.repeat_execute(true);
    probe.set_flags(UpdateFlags::NEEDS_EXECUTE);
    manager.request_update(id, UpdateFlags::NEEDS_EXECUTE, false);

    // First frame goes through the usual compile-then-execute hand-off; after
    // that each execute pass re-arms itself at the idle-repeat interval.
    for _ in 0..6 {
        assert!(fire_due(&mut manager, &host).is_some());
        assert_at_most_one_armed(&manager);
    }
    probe.repeat_execute(false);
    run_until_idle(&mut manager, &host, 5);

    let stamps: Vec<_> = log
        .records()
        .iter()
        .filter(|record| record.pass == PassKind::Execute)
        .map(|record| record.update_time)
        .collect();
    assert!(stamps.len() >= 4);
    let cadence = manager.config().max_execute_interval;
    for pair in stamps[1..].windows(2) {
        assert_eq!(
            pair[1].saturating_since(pair[0]),
            cadence,
            "steady-state frames arrive one idle-repeat interval apart"
        );
    }
    assert!(!host.any_armed());
}

#[test]
fn panicking_root_aborts_one_pass_not_the_scheduler() {
    let (mut manager, host, log) = fixture();
    let failing = ProbeComponent::new("failing", &log);
    let healthy = ProbeComponent::new("healthy", &log);
    failing.set_flags(UpdateFlags::NEEDS_COMPILE);
    failing.panic_on_next_compile();
    let failing_id = manager.insert_root(Box::new(failing.clone()));
    manager.insert_root(Box::new(healthy.clone()));
    manager.request_update(failing_id, UpdateFlags::NEEDS_COMPILE, false);

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        fire_due(&mut manager, &host);
    }));
    assert!(outcome.is_err(), "the scripted panic must propagate");
    assert!(
        !manager.root_flags().intersects(UpdateFlags::UPDATING_MASK),
        "control bits must be restored after the unwind"
    );

    // The next request schedules and completes normally.
    healthy.set_flags(UpdateFlags::NEEDS_COMPILE | UpdateFlags::NEEDS_EXECUTE);
    failing.set_flags(UpdateFlags::empty());
    manager.request_update(failing_id, UpdateFlags::NEEDS_COMPILE | UpdateFlags::NEEDS_EXECUTE, false);
    run_until_idle(&mut manager, &host, 10);
    assert_eq!(log.count("healthy", PassKind::Compile), 1);
    assert_eq!(log.count("healthy", PassKind::Execute), 1);
}

#[test]
fn respects_a_custom_frame_profile() {
    let host = ManualHost::new();
    let mut manager = ExecuteManager::with_config(host.clone(), ManagerConfig::frame_120hz());
    let log = TraversalLog::new();
    let probe = ProbeComponent::new("r", &log);
    let id = manager.insert_root(Box::new(probe.clone()));

    probe.set_flags(UpdateFlags::NEEDS_EXECUTE);
    manager.request_update(id, UpdateFlags::NEEDS_EXECUTE, false);
    assert_eq!(fire_due(&mut manager, &host), Some(PassKind::Compile));
    assert_eq!(
        host.deadline(PassKind::Execute),
        Some(host.current() + Delay(2)),
        "the 120 Hz profile halves the execute hand-off"
    );
}
