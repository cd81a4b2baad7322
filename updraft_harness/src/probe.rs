// Copyright 2026 the Updraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scriptable components that record cascade traffic.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use updraft_core::component::{Component, UpdateContext, UpdateRequests};
use updraft_core::flags::UpdateFlags;
use updraft_core::time::UpdateTime;
use updraft_core::timer::PassKind;

/// One recorded cascade invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CascadeRecord {
    /// The label of the probe that was cascaded.
    pub label: &'static str,
    /// Which phase cascaded it.
    pub pass: PassKind,
    /// The traversal timestamp the probe read from the shared context.
    pub update_time: UpdateTime,
}

/// Shared, ordered log of cascade invocations across a probe forest.
///
/// Clone handles append to the same log, so cross-root ordering is
/// observable from a single place.
#[derive(Clone, Default)]
pub struct TraversalLog {
    entries: Rc<RefCell<Vec<CascadeRecord>>>,
}

impl TraversalLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of all records, in cascade order.
    #[must_use]
    pub fn records(&self) -> Vec<CascadeRecord> {
        self.entries.borrow().clone()
    }

    /// The labels visited by the given phase, in order.
    #[must_use]
    pub fn visits(&self, pass: PassKind) -> Vec<&'static str> {
        self.entries
            .borrow()
            .iter()
            .filter(|record| record.pass == pass)
            .map(|record| record.label)
            .collect()
    }

    /// How many times the given probe was cascaded by the given phase.
    #[must_use]
    pub fn count(&self, label: &str, pass: PassKind) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|record| record.label == label && record.pass == pass)
            .count()
    }

    /// Forgets all records.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    fn push(&self, record: CascadeRecord) {
        self.entries.borrow_mut().push(record);
    }
}

impl fmt::Debug for TraversalLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraversalLog")
            .field("len", &self.entries.borrow().len())
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct ProbeState {
    flags: Cell<UpdateFlags>,
    powered: Cell<bool>,
    request_on_compile: Cell<UpdateFlags>,
    request_on_execute: Cell<UpdateFlags>,
    repeat_execute: Cell<bool>,
    panic_on_compile: Cell<bool>,
    children: RefCell<Vec<ProbeComponent>>,
}

/// A scriptable component tree node.
///
/// Clones share state: the clone handed to the manager (boxed) and the clone
/// kept by the test observe and mutate the same probe. Children cascade
/// recursively in insertion order, mirroring how a real component tree fans
/// a pass out to its descendants.
#[derive(Clone)]
pub struct ProbeComponent {
    label: &'static str,
    log: TraversalLog,
    state: Rc<ProbeState>,
}

impl ProbeComponent {
    /// Creates a probe that records into `log`.
    #[must_use]
    pub fn new(label: &'static str, log: &TraversalLog) -> Self {
        Self {
            label,
            log: log.clone(),
            state: Rc::new(ProbeState::default()),
        }
    }

    /// The probe's label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// The probe's own pending flags.
    #[must_use]
    pub fn flags(&self) -> UpdateFlags {
        self.state.flags.get()
    }

    /// Sets the probe's pending flags directly (simulating an invalidation
    /// that has not yet been reported to the manager).
    pub fn set_flags(&self, flags: UpdateFlags) {
        self.state.flags.set(flags);
    }

    /// Appends a child; it will be cascaded after the parent.
    pub fn push_child(&self, child: ProbeComponent) {
        self.state.children.borrow_mut().push(child);
    }

    /// Scripts a one-shot follow-up request made from inside the next
    /// compile cascade (the probe also re-dirties itself with `flags`).
    pub fn request_on_next_compile(&self, flags: UpdateFlags) {
        self.state.request_on_compile.set(flags);
    }

    /// Scripts a one-shot follow-up request made from inside the next
    /// execute cascade.
    pub fn request_on_next_execute(&self, flags: UpdateFlags) {
        self.state.request_on_execute.set(flags);
    }

    /// Makes every execute cascade re-request execute work, like an
    /// animation that never settles.
    pub fn repeat_execute(&self, repeat: bool) {
        self.state.repeat_execute.set(repeat);
    }

    /// Makes the next compile cascade panic (one-shot).
    pub fn panic_on_next_compile(&self) {
        self.state.panic_on_compile.set(true);
    }
}

impl fmt::Debug for ProbeComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeComponent")
            .field("label", &self.label)
            .field("flags", &self.state.flags.get())
            .field("powered", &self.state.powered.get())
            .finish_non_exhaustive()
    }
}

impl Component for ProbeComponent {
    fn component_flags(&self) -> UpdateFlags {
        self.state.flags.get()
    }

    fn cascade_compile(
        &mut self,
        base_flags: UpdateFlags,
        cx: &UpdateContext,
        requests: &mut UpdateRequests,
    ) {
        if self.state.panic_on_compile.get() {
            self.state.panic_on_compile.set(false);
            panic!("probe '{}' scripted compile failure", self.label);
        }
        self.log.push(CascadeRecord {
            label: self.label,
            pass: PassKind::Compile,
            update_time: cx.update_time,
        });
        let flags = self.state.flags.get();
        self.state.flags.set(flags & !UpdateFlags::COMPILE_MASK);

        let follow_up = self.state.request_on_compile.take();
        if !follow_up.is_empty() {
            self.state.flags.set(self.state.flags.get() | follow_up);
            requests.request(follow_up);
        }

        for child in self.state.children.borrow_mut().iter_mut() {
            if (child.component_flags() | base_flags).intersects(UpdateFlags::COMPILE_MASK) {
                child.cascade_compile(base_flags, cx, requests);
            }
        }
    }

    fn cascade_execute(
        &mut self,
        base_flags: UpdateFlags,
        cx: &UpdateContext,
        requests: &mut UpdateRequests,
    ) {
        self.log.push(CascadeRecord {
            label: self.label,
            pass: PassKind::Execute,
            update_time: cx.update_time,
        });
        let flags = self.state.flags.get();
        self.state.flags.set(flags & !UpdateFlags::EXECUTE_MASK);

        let follow_up = self.state.request_on_execute.take();
        if !follow_up.is_empty() {
            self.state.flags.set(self.state.flags.get() | follow_up);
            requests.request(follow_up);
        }
        if self.state.repeat_execute.get() {
            self.state
                .flags
                .set(self.state.flags.get() | UpdateFlags::NEEDS_EXECUTE);
            requests.request(UpdateFlags::NEEDS_EXECUTE);
        }

        for child in self.state.children.borrow_mut().iter_mut() {
            if (child.component_flags() | base_flags).intersects(UpdateFlags::EXECUTE_MASK) {
                child.cascade_execute(base_flags, cx, requests);
            }
        }
    }

    fn cascade_power(&mut self) {
        self.state.powered.set(true);
        for child in self.state.children.borrow_mut().iter_mut() {
            child.cascade_power();
        }
    }

    fn cascade_unpower(&mut self) {
        self.state.powered.set(false);
        for child in self.state.children.borrow_mut().iter_mut() {
            child.cascade_unpower();
        }
    }

    fn is_powered(&self) -> bool {
        self.state.powered.get()
    }
}
