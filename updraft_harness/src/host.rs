// Copyright 2026 the Updraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hand-cranked clock and timer host.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use updraft_core::time::{Delay, UpdateTime};
use updraft_core::timer::{PassKind, TimerHost};

/// A simulated [`TimerHost`] with shared-handle semantics.
///
/// Cloning yields another handle onto the same clock and timer slots, so a
/// test can hold one handle while the manager under test owns the other —
/// the same shape as a platform host whose timer queue outlives any one
/// borrower.
///
/// Time never moves on its own. [`advance`](Self::advance) and
/// [`advance_to`](Self::advance_to) move the clock; additionally, every
/// `now()` *read* advances it by the configured
/// [`traversal_cost`](Self::set_traversal_cost), which is how a test makes a
/// pass appear slow (the manager reads the clock once before and once after
/// each traversal).
#[derive(Clone, Default)]
pub struct ManualHost {
    inner: Rc<HostInner>,
}

#[derive(Default)]
struct HostInner {
    now: Cell<u64>,
    traversal_cost: Cell<u64>,
    compile_deadline: Cell<Option<u64>>,
    execute_deadline: Cell<Option<u64>>,
    armed_history: RefCell<Vec<(PassKind, Delay)>>,
}

impl ManualHost {
    /// Creates a host with the clock at zero and no timers armed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current simulated time, without advancing it.
    #[must_use]
    pub fn current(&self) -> UpdateTime {
        UpdateTime(self.inner.now.get())
    }

    /// Moves the clock forward.
    pub fn advance(&self, delay: Delay) {
        let now = self.inner.now.get();
        self.inner.now.set(now + delay.as_millis());
    }

    /// Moves the clock to `time` if it lies in the future.
    pub fn advance_to(&self, time: UpdateTime) {
        if time.as_millis() > self.inner.now.get() {
            self.inner.now.set(time.as_millis());
        }
    }

    /// Sets how much each `now()` read advances the clock.
    ///
    /// The manager brackets a traversal with two reads, so a cost of `c`
    /// makes every pass measure an elapsed time of `c`.
    pub fn set_traversal_cost(&self, cost: Delay) {
        self.inner.traversal_cost.set(cost.as_millis());
    }

    /// The absolute deadline of the given pass's timer slot, if armed.
    #[must_use]
    pub fn deadline(&self, pass: PassKind) -> Option<UpdateTime> {
        self.slot(pass).get().map(UpdateTime)
    }

    /// The earliest armed deadline, compile winning ties.
    #[must_use]
    pub fn next_deadline(&self) -> Option<(PassKind, UpdateTime)> {
        let compile = self.inner.compile_deadline.get();
        let execute = self.inner.execute_deadline.get();
        match (compile, execute) {
            (Some(c), Some(e)) if e < c => Some((PassKind::Execute, UpdateTime(e))),
            (Some(c), _) => Some((PassKind::Compile, UpdateTime(c))),
            (None, Some(e)) => Some((PassKind::Execute, UpdateTime(e))),
            (None, None) => None,
        }
    }

    /// Whether any timer slot is armed.
    #[must_use]
    pub fn any_armed(&self) -> bool {
        self.inner.compile_deadline.get().is_some() || self.inner.execute_deadline.get().is_some()
    }

    /// Clears the given slot (a firing consumes its deadline).
    pub fn take_deadline(&self, pass: PassKind) {
        self.slot(pass).set(None);
    }

    /// Every `(pass, delay)` the manager has armed, in order.
    #[must_use]
    pub fn armed_history(&self) -> Vec<(PassKind, Delay)> {
        self.inner.armed_history.borrow().clone()
    }

    fn slot(&self, pass: PassKind) -> &Cell<Option<u64>> {
        match pass {
            PassKind::Compile => &self.inner.compile_deadline,
            PassKind::Execute => &self.inner.execute_deadline,
        }
    }
}

impl fmt::Debug for ManualHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualHost")
            .field("now", &self.inner.now.get())
            .field("compile_deadline", &self.inner.compile_deadline.get())
            .field("execute_deadline", &self.inner.execute_deadline.get())
            .finish_non_exhaustive()
    }
}

impl TimerHost for ManualHost {
    fn now(&self) -> UpdateTime {
        let now = self.inner.now.get();
        self.inner.now.set(now + self.inner.traversal_cost.get());
        UpdateTime(now)
    }

    fn defer(&mut self, pass: PassKind, delay: Delay) {
        let deadline = self.inner.now.get() + delay.as_millis();
        self.slot(pass).set(Some(deadline));
        self.inner.armed_history.borrow_mut().push((pass, delay));
    }

    fn cancel(&mut self, pass: PassKind) {
        self.slot(pass).set(None);
    }
}
