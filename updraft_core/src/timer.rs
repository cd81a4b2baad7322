// Copyright 2026 the Updraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The deferred-timer capability the manager schedules against.
//!
//! [`TimerHost`] abstracts "schedule after a delay, cancel" plus a monotonic
//! clock, so the pass logic can run against a simulated clock in tests and
//! against `setTimeout`/platform timers in production. The host never decides
//! *what* runs — when a deferred pass comes due, the host's owner feeds it
//! back via [`ExecuteManager::fire`](crate::manager::ExecuteManager::fire).

use alloc::boxed::Box;

use crate::time::{Delay, UpdateTime};

/// Which phase a deferred timer belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Layout-like phase, always scheduled first.
    Compile,
    /// Render-like phase, scheduled after compile work settles.
    Execute,
}

/// Clock and deferred-timer capability.
///
/// One timer slot per [`PassKind`]: deferring a pass that is already
/// deferred replaces the earlier deadline. After [`cancel`](Self::cancel)
/// the host must not deliver that firing (the manager also guards against
/// stale deliveries with its own armed bookkeeping, so a best-effort host is
/// acceptable).
pub trait TimerHost {
    /// The current time.
    fn now(&self) -> UpdateTime;

    /// Arranges for `pass` to come due after `delay`.
    fn defer(&mut self, pass: PassKind, delay: Delay);

    /// Revokes any pending deferral of `pass`. Idempotent.
    fn cancel(&mut self, pass: PassKind);
}

impl<T: TimerHost + ?Sized> TimerHost for Box<T> {
    fn now(&self) -> UpdateTime {
        (**self).now()
    }

    fn defer(&mut self, pass: PassKind, delay: Delay) {
        (**self).defer(pass, delay);
    }

    fn cancel(&mut self, pass: PassKind) {
        (**self).cancel(pass);
    }
}
