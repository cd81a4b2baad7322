// Copyright 2026 the Updraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scheduler instrumentation.
//!
//! [`TraceSink`] receives one event per interesting scheduler action: an
//! update request arriving, a pass beginning and ending, the adaptive delay
//! changing, timers arming or being cancelled, and power transitions. All
//! methods default to no-ops, so a sink implements only what it cares about.
//!
//! The manager only emits events when the `trace` crate feature is enabled;
//! without it, an installed sink is never called and the emission sites
//! compile to nothing.

use crate::component::RootId;
use crate::flags::UpdateFlags;
use crate::time::{Delay, UpdateTime};
use crate::timer::PassKind;

/// Emitted when [`request_update`](crate::manager::ExecuteManager::request_update)
/// accepts a request.
#[derive(Clone, Copy, Debug)]
pub struct UpdateRequestedEvent {
    /// The root the request was made against.
    pub target: RootId,
    /// The canonicalized flags that were merged into the aggregate.
    pub flags: UpdateFlags,
    /// Whether the caller asked for synchronous execution.
    pub immediate: bool,
}

/// Marks the beginning of a pass.
#[derive(Clone, Copy, Debug)]
pub struct PassBeginEvent {
    /// Which phase is starting.
    pub pass: PassKind,
    /// Whether the pass runs on the immediate fast path.
    pub immediate: bool,
    /// The traversal timestamp stamped into the shared context.
    pub timestamp: UpdateTime,
}

/// Marks the end of a pass.
#[derive(Clone, Copy, Debug)]
pub struct PassEndEvent {
    /// Which phase is ending.
    pub pass: PassKind,
    /// Whether the pass ran on the immediate fast path.
    pub immediate: bool,
    /// How many roots were actually cascaded.
    pub roots_visited: u32,
    /// Wall time the full traversal took.
    pub elapsed: Delay,
}

/// Emitted when a compile pass retunes the adaptive delay.
#[derive(Clone, Copy, Debug)]
pub struct DelayAdjustedEvent {
    /// The delay before this pass.
    pub old: Delay,
    /// The delay after this pass.
    pub new: Delay,
    /// The measured traversal time that drove the adjustment.
    pub elapsed: Delay,
}

/// Emitted when a deferred timer is armed.
#[derive(Clone, Copy, Debug)]
pub struct TimerArmedEvent {
    /// Which phase was deferred.
    pub pass: PassKind,
    /// How far in the future it comes due.
    pub delay: Delay,
}

/// Emitted on a power transition.
#[derive(Clone, Copy, Debug)]
pub struct PowerEvent {
    /// `true` for power-on, `false` for power-off.
    pub powered: bool,
    /// How many roots changed state.
    pub roots: u32,
}

/// Receives scheduler trace events.
///
/// All methods have default no-op implementations.
pub trait TraceSink {
    /// Called when an update request is accepted.
    fn on_update_requested(&mut self, e: &UpdateRequestedEvent) {
        _ = e;
    }

    /// Called at the beginning of a pass.
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        _ = e;
    }

    /// Called at the end of a pass. Not called when a pass ends by panic
    /// unwind; only the control bits are restored in that case.
    fn on_pass_end(&mut self, e: &PassEndEvent) {
        _ = e;
    }

    /// Called after the adaptive delay is retuned.
    fn on_delay_adjusted(&mut self, e: &DelayAdjustedEvent) {
        _ = e;
    }

    /// Called when a timer is armed.
    fn on_timer_armed(&mut self, e: &TimerArmedEvent) {
        _ = e;
    }

    /// Called when both timer slots are disarmed.
    fn on_timers_cancelled(&mut self) {}

    /// Called on a power transition.
    fn on_power(&mut self, e: &PowerEvent) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}
