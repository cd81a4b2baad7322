// Copyright 2026 the Updraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulation harness for the update scheduler.
//!
//! Drives an [`ExecuteManager`] without real timers or a real clock:
//!
//! - [`ManualHost`] — a [`TimerHost`](updraft_core::timer::TimerHost) with a
//!   hand-cranked clock and inspectable timer slots. Clone handles share
//!   state, so a test keeps one handle while the manager owns another.
//! - [`ProbeComponent`] — a scriptable component that records every cascade
//!   into a shared [`TraversalLog`] and can be told to request follow-up
//!   work, repeat, or fail mid-pass.
//! - [`fire_due`] / [`run_until_idle`] — drivers that advance the simulated
//!   clock to each deadline and deliver the firing, the way a platform event
//!   loop would.
//!
//! The whole-system scenario tests for the scheduler live in this crate.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod host;
mod probe;
#[cfg(test)]
mod scenarios;

pub use host::ManualHost;
pub use probe::{CascadeRecord, ProbeComponent, TraversalLog};

use updraft_core::manager::ExecuteManager;
use updraft_core::timer::PassKind;

/// Delivers the earliest due firing, advancing the clock to its deadline.
///
/// Returns the pass that fired, or `None` if no timer is armed. When both
/// slots are somehow armed (which the manager's invariant forbids), the
/// earlier deadline wins and compile breaks ties.
pub fn fire_due(
    manager: &mut ExecuteManager<ManualHost>,
    host: &ManualHost,
) -> Option<PassKind> {
    let (pass, deadline) = host.next_deadline()?;
    host.advance_to(deadline);
    host.take_deadline(pass);
    manager.fire(pass);
    Some(pass)
}

/// Fires due timers until the manager goes idle or `max_firings` is reached.
///
/// Returns the number of firings delivered. A scheduler that re-requests its
/// own work never goes idle, so the cap doubles as the test's loop budget.
pub fn run_until_idle(
    manager: &mut ExecuteManager<ManualHost>,
    host: &ManualHost,
    max_firings: u32,
) -> u32 {
    let mut fired = 0;
    while fired < max_firings {
        if fire_due(manager, host).is_none() {
            break;
        }
        fired += 1;
    }
    fired
}
