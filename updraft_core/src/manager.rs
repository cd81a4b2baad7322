// Copyright 2026 the Updraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The two-phase update scheduler.
//!
//! [`ExecuteManager`] owns a set of root components (independent trees) and
//! decides when their pending work runs. Work is split into two phases that
//! never overlap: the *compile* pass (layout-like, latency-sensitive) and the
//! *execute* pass (render-like, follows compile). A compile pass for a given
//! firing always precedes the execute pass that follows it.
//!
//! # Scheduling
//!
//! A [`request_update`](ExecuteManager::request_update) ORs canonicalized
//! flags into the aggregate [`root_flags`](ExecuteManager::root_flags) and
//! either runs a synchronous immediate pass (when asked, when the system is
//! keeping up, and when no pass is in progress) or arms the compile timer.
//! When a pass finishes it re-arms whichever timer the remaining work calls
//! for — at most one timer is armed at any instant.
//!
//! # Adaptive delay
//!
//! Each compile pass measures its own traversal time and retunes
//! [`update_delay`](ExecuteManager::update_delay): exponential back-off when
//! a pass overruns its budget, halving decay once the system keeps up. Only
//! the compile pass tunes the delay; execute timing is fixed by config.
//!
//! # Failure containment
//!
//! A panic inside any component cascade propagates to the caller, but drop
//! guards restore the control bits on the way out, so a misbehaving node can
//! abort one pass without wedging all future passes.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::ops::{Deref, DerefMut};

use crate::component::{Component, RootId, UpdateContext, UpdateRequests};
use crate::flags::UpdateFlags;
use crate::time::Delay;
use crate::timer::{PassKind, TimerHost};
#[cfg(feature = "trace")]
use crate::trace::{
    DelayAdjustedEvent, PassBeginEvent, PassEndEvent, PowerEvent, TimerArmedEvent,
    UpdateRequestedEvent,
};
use crate::trace::TraceSink;

/// Tunable intervals and power behavior for an [`ExecuteManager`].
///
/// All delays are in milliseconds. The defaults ([`frame_60hz`](Self::frame_60hz))
/// are sized against a ~60 Hz frame budget.
#[derive(Clone, Copy, Debug)]
pub struct ManagerConfig {
    /// Lower bound of the adaptive delay.
    ///
    /// Note: the decay rule is `min(min_update_delay, update_delay / 2)`, as
    /// in the system this scheduler descends from. With a nonzero minimum the
    /// delay can decay *below* the configured minimum and never climb back to
    /// it without a back-off. Changing this would change observable
    /// throttling dynamics, so the rule is kept as-is.
    pub min_update_delay: Delay,
    /// Upper bound of the adaptive delay.
    pub max_update_delay: Delay,
    /// Floor of the compile-pass time budget.
    pub min_compile_interval: Delay,
    /// Load threshold: immediate mode degrades to compile-only (and then to
    /// fully deferred) once the adaptive delay exceeds this.
    pub max_compile_interval: Delay,
    /// Delay between a compile pass and the execute pass it queues.
    pub min_execute_interval: Delay,
    /// Idle-repeat delay between consecutive execute passes.
    pub max_execute_interval: Delay,
    /// Flags requested for each root on power-on. A powered-off root may have
    /// missed invalidations, so the default demands a full update.
    pub power_flags: UpdateFlags,
}

impl ManagerConfig {
    /// Defaults for a ~60 Hz host (16.7 ms frame budget).
    #[must_use]
    pub const fn frame_60hz() -> Self {
        Self {
            min_update_delay: Delay::ZERO,
            max_update_delay: Delay::from_millis(167),
            min_compile_interval: Delay::from_millis(12),
            max_compile_interval: Delay::from_millis(33),
            min_execute_interval: Delay::from_millis(4),
            max_execute_interval: Delay::from_millis(16),
            power_flags: UpdateFlags::NEEDS_COMPILE.union(UpdateFlags::NEEDS_EXECUTE),
        }
    }

    /// Defaults for a ~120 Hz host: intervals halved, same power behavior.
    #[must_use]
    pub const fn frame_120hz() -> Self {
        Self {
            min_update_delay: Delay::ZERO,
            max_update_delay: Delay::from_millis(83),
            min_compile_interval: Delay::from_millis(6),
            max_compile_interval: Delay::from_millis(16),
            min_execute_interval: Delay::from_millis(2),
            max_execute_interval: Delay::from_millis(8),
            power_flags: UpdateFlags::NEEDS_COMPILE.union(UpdateFlags::NEEDS_EXECUTE),
        }
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::frame_60hz()
    }
}

/// Lifecycle hooks around manager operations.
///
/// All methods have default no-op implementations. Not required for
/// scheduling correctness; collaborators use this to mirror the root set or
/// audit update traffic.
pub trait ExecuteObserver {
    /// Called before a root is attached.
    fn will_insert_root(&mut self, id: RootId) {
        _ = id;
    }

    /// Called after a root is attached and its initial update was requested.
    fn did_insert_root(&mut self, id: RootId) {
        _ = id;
    }

    /// Called before a root is detached.
    fn will_remove_root(&mut self, id: RootId) {
        _ = id;
    }

    /// Called after a root is detached.
    fn did_remove_root(&mut self, id: RootId) {
        _ = id;
    }

    /// Called after a request has been merged and scheduled.
    fn did_request_update(&mut self, target: RootId, flags: UpdateFlags, immediate: bool) {
        _ = (target, flags, immediate);
    }
}

struct Root {
    id: RootId,
    node: Box<dyn Component>,
}

/// The two-phase update scheduler. See the [module docs](self).
pub struct ExecuteManager<H: TimerHost> {
    config: ManagerConfig,
    roots: Vec<Root>,
    next_root_id: u64,
    root_flags: UpdateFlags,
    compile_timer_armed: bool,
    execute_timer_armed: bool,
    update_delay: Delay,
    context: UpdateContext,
    host: H,
    observer: Option<Box<dyn ExecuteObserver>>,
    sink: Option<Box<dyn TraceSink>>,
}

impl<H: TimerHost> fmt::Debug for ExecuteManager<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecuteManager")
            .field("root_count", &self.roots.len())
            .field("root_flags", &self.root_flags)
            .field("compile_timer_armed", &self.compile_timer_armed)
            .field("execute_timer_armed", &self.execute_timer_armed)
            .field("update_delay", &self.update_delay)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl<H: TimerHost> ExecuteManager<H> {
    /// Creates a manager with [`ManagerConfig::frame_60hz`] defaults.
    pub fn new(host: H) -> Self {
        Self::with_config(host, ManagerConfig::frame_60hz())
    }

    /// Creates a manager with the given configuration.
    pub fn with_config(host: H, config: ManagerConfig) -> Self {
        Self {
            update_delay: config.min_update_delay,
            config,
            roots: Vec::new(),
            next_root_id: 0,
            root_flags: UpdateFlags::empty(),
            compile_timer_armed: false,
            execute_timer_armed: false,
            context: UpdateContext::default(),
            host,
            observer: None,
            sink: None,
        }
    }

    /// Installs the lifecycle observer, replacing any previous one.
    pub fn set_observer(&mut self, observer: Box<dyn ExecuteObserver>) {
        self.observer = Some(observer);
    }

    /// Installs the trace sink, replacing any previous one.
    ///
    /// Only consulted when the `trace` crate feature is enabled.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.sink = Some(sink);
    }

    #[inline]
    fn emit(&mut self, f: impl FnOnce(&mut dyn TraceSink)) {
        #[cfg(feature = "trace")]
        if let Some(sink) = self.sink.as_deref_mut() {
            f(sink);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = f;
        }
    }

    // -- Introspection --

    /// The aggregate pending-work and pass-state flags across all roots.
    #[must_use]
    pub fn root_flags(&self) -> UpdateFlags {
        self.root_flags
    }

    /// The current adaptive compile delay.
    #[must_use]
    pub fn update_delay(&self) -> Delay {
        self.update_delay
    }

    /// Whether the given phase currently has a deferred timer armed.
    #[must_use]
    pub fn timer_armed(&self, pass: PassKind) -> bool {
        match pass {
            PassKind::Compile => self.compile_timer_armed,
            PassKind::Execute => self.execute_timer_armed,
        }
    }

    /// The shared per-traversal context.
    #[must_use]
    pub fn context(&self) -> &UpdateContext {
        &self.context
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Number of attached roots.
    #[must_use]
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Ids of the attached roots, in traversal order.
    pub fn root_ids(&self) -> impl Iterator<Item = RootId> + '_ {
        self.roots.iter().map(|root| root.id)
    }

    /// Resolves a root id.
    #[must_use]
    pub fn root(&self, id: RootId) -> Option<&dyn Component> {
        self.roots
            .iter()
            .find(|root| root.id == id)
            .map(|root| &*root.node)
    }

    /// Resolves a root id mutably.
    pub fn root_mut(&mut self, id: RootId) -> Option<&mut (dyn Component + '_)> {
        match self.roots.iter_mut().find(|root| root.id == id) {
            Some(root) => Some(&mut *root.node),
            None => None,
        }
    }

    // -- Root-set mutation --

    /// Attaches a root tree, in traversal order after all existing roots.
    ///
    /// Any pending flags the root already carries are immediately requested
    /// (non-immediate), so a newly attached tree is guaranteed to be
    /// scheduled.
    pub fn insert_root(&mut self, node: Box<dyn Component>) -> RootId {
        let id = RootId(self.next_root_id);
        self.next_root_id += 1;
        if let Some(observer) = &mut self.observer {
            observer.will_insert_root(id);
        }
        let pending = node.component_flags() & UpdateFlags::UPDATE_MASK;
        self.roots.push(Root { id, node });
        self.request_update(id, pending, false);
        if let Some(observer) = &mut self.observer {
            observer.did_insert_root(id);
        }
        id
    }

    /// Detaches a root, preserving the order of the remaining roots.
    ///
    /// Aggregate flags contributed by the departing root are not recalled;
    /// at worst the next pass fires and finds nothing to cascade.
    pub fn remove_root(&mut self, id: RootId) -> Option<Box<dyn Component>> {
        let index = self.roots.iter().position(|root| root.id == id)?;
        if let Some(observer) = &mut self.observer {
            observer.will_remove_root(id);
        }
        let root = self.roots.remove(index);
        if let Some(observer) = &mut self.observer {
            observer.did_remove_root(id);
        }
        Some(root.node)
    }

    // -- Update requests --

    /// Requests compile- and/or execute-family work.
    ///
    /// `target` is informational (forwarded to the observer); the request
    /// affects the shared aggregate. Flags outside
    /// [`UPDATE_MASK`](UpdateFlags::UPDATE_MASK) are ignored; sub-flags are
    /// lifted to their family's canonical bit.
    ///
    /// `immediate` asks for synchronous execution, honored only when the
    /// adaptive delay is at most
    /// [`max_compile_interval`](ManagerConfig::max_compile_interval) and no
    /// pass or immediate update is already in progress; otherwise the
    /// request degrades to a deferred schedule.
    pub fn request_update(&mut self, target: RootId, update_flags: UpdateFlags, immediate: bool) {
        let flags = update_flags.canonicalized();
        self.root_flags |= flags;
        #[cfg(feature = "trace")]
        self.emit(|sink| {
            sink.on_update_requested(&UpdateRequestedEvent {
                target,
                flags,
                immediate,
            });
        });
        if self.root_flags.intersects(UpdateFlags::UPDATE_MASK) {
            if immediate
                && self.update_delay <= self.config.max_compile_interval
                && !self
                    .root_flags
                    .intersects(UpdateFlags::TRAVERSING | UpdateFlags::IMMEDIATE)
            {
                self.run_immediate_pass();
            } else {
                self.schedule_update();
            }
        }
        if let Some(observer) = &mut self.observer {
            observer.did_request_update(target, flags, immediate);
        }
    }

    /// Arms the compile timer after the current adaptive delay, if no timer
    /// is armed, no pass is in progress, and work is actually pending.
    /// Idempotent.
    pub fn schedule_update(&mut self) {
        let flags = self.root_flags;
        if !self.compile_timer_armed
            && !self.execute_timer_armed
            && !flags.intersects(UpdateFlags::UPDATING_MASK)
            && flags.intersects(UpdateFlags::UPDATE_MASK)
        {
            self.arm(PassKind::Compile, self.update_delay);
        }
    }

    /// Disarms both timers. Idempotent, always safe.
    pub fn cancel_update(&mut self) {
        let was_armed = self.compile_timer_armed || self.execute_timer_armed;
        if self.compile_timer_armed {
            self.host.cancel(PassKind::Compile);
            self.compile_timer_armed = false;
        }
        if self.execute_timer_armed {
            self.host.cancel(PassKind::Execute);
            self.execute_timer_armed = false;
        }
        if was_armed {
            self.emit(|sink| sink.on_timers_cancelled());
        }
    }

    fn arm(&mut self, pass: PassKind, delay: Delay) {
        match pass {
            PassKind::Compile => self.compile_timer_armed = true,
            PassKind::Execute => self.execute_timer_armed = true,
        }
        self.host.defer(pass, delay);
        #[cfg(feature = "trace")]
        self.emit(|sink| sink.on_timer_armed(&TimerArmedEvent { pass, delay }));
    }

    /// Delivers a timer expiry.
    ///
    /// The host's owner calls this when a deferred pass comes due. A firing
    /// for a pass that is no longer armed (cancelled after the host already
    /// queued the callback) is ignored.
    pub fn fire(&mut self, pass: PassKind) {
        match pass {
            PassKind::Compile => {
                if !self.compile_timer_armed {
                    return;
                }
                self.compile_timer_armed = false;
                self.run_compile_pass(false);
            }
            PassKind::Execute => {
                if !self.execute_timer_armed {
                    return;
                }
                self.execute_timer_armed = false;
                self.run_execute_pass(false);
            }
        }
    }

    // -- Passes --

    /// Runs compile (and, when the system is keeping up, execute) work
    /// synchronously.
    ///
    /// The execute step is skipped when the adaptive delay has grown past
    /// [`max_compile_interval`](ManagerConfig::max_compile_interval) — under
    /// load, immediate mode must not block the caller for a full two-phase
    /// update.
    fn run_immediate_pass(&mut self) {
        self.root_flags |= UpdateFlags::IMMEDIATE;
        let mut guard = PassGuard::new(self, UpdateFlags::IMMEDIATE);
        if guard.root_flags.intersects(UpdateFlags::COMPILE_MASK) {
            guard.cancel_update();
            guard.run_compile_pass(true);
        }
        if guard.root_flags.intersects(UpdateFlags::EXECUTE_MASK)
            && guard.update_delay <= guard.config.max_compile_interval
        {
            guard.cancel_update();
            guard.run_execute_pass(true);
        }
    }

    /// Runs one compile pass over all roots with pending compile work.
    ///
    /// Normally reached through [`fire`](Self::fire) or the immediate fast
    /// path. Public so embedders with their own timer plumbing can drive
    /// passes directly.
    pub fn run_compile_pass(&mut self, immediate: bool) {
        self.root_flags |= UpdateFlags::TRAVERSING | UpdateFlags::COMPILING;
        self.root_flags &= !UpdateFlags::COMPILE_MASK;
        let mut guard = PassGuard::new(self, UpdateFlags::TRAVERSING | UpdateFlags::COMPILING);
        guard.compile_traversal(immediate);
    }

    fn compile_traversal(&mut self, immediate: bool) {
        let t0 = self.host.now();
        self.context.update_time = t0;
        #[cfg(feature = "trace")]
        self.emit(|sink| {
            sink.on_pass_begin(&PassBeginEvent {
                pass: PassKind::Compile,
                immediate,
                timestamp: t0,
            });
        });

        let mut requests = UpdateRequests::new();
        let mut visited: u32 = 0;
        for root in &mut self.roots {
            if root
                .node
                .component_flags()
                .intersects(UpdateFlags::COMPILE_MASK)
            {
                visited += 1;
                root.node
                    .cascade_compile(UpdateFlags::empty(), &self.context, &mut requests);
            }
        }
        self.root_flags |= requests.flags().canonicalized();

        let elapsed = self.host.now().saturating_since(t0);
        // The re-arm below deliberately uses the pre-adjustment budget.
        let mut compile_delay = self.config.min_compile_interval.max(self.update_delay);
        let old_delay = self.update_delay;
        if elapsed > compile_delay {
            self.update_delay = Delay::from_millis(2)
                .max(self.update_delay.doubled())
                .min(self.config.max_update_delay);
        } else {
            // Decay takes the smaller of the configured minimum and the
            // halved value; see `ManagerConfig::min_update_delay`.
            self.update_delay = self.config.min_update_delay.min(self.update_delay.halved());
        }
        #[cfg(feature = "trace")]
        {
            let new_delay = self.update_delay;
            self.emit(|sink| {
                sink.on_delay_adjusted(&DelayAdjustedEvent {
                    old: old_delay,
                    new: new_delay,
                    elapsed,
                });
            });
            self.emit(|sink| {
                sink.on_pass_end(&PassEndEvent {
                    pass: PassKind::Compile,
                    immediate,
                    roots_visited: visited,
                    elapsed,
                });
            });
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = (old_delay, visited);
        }

        self.cancel_update();
        if self.root_flags.intersects(UpdateFlags::EXECUTE_MASK) {
            self.arm(PassKind::Execute, self.config.min_execute_interval);
        } else if self.root_flags.intersects(UpdateFlags::COMPILE_MASK) {
            if immediate {
                compile_delay = self.config.max_compile_interval.max(compile_delay);
            }
            self.arm(PassKind::Compile, compile_delay);
        }
    }

    /// Runs one execute pass over all roots with pending execute work.
    ///
    /// Unlike the compile pass, the traversal time does not feed the
    /// adaptive delay — compile is the latency-sensitive phase.
    pub fn run_execute_pass(&mut self, immediate: bool) {
        self.root_flags |= UpdateFlags::TRAVERSING | UpdateFlags::EXECUTING;
        self.root_flags &= !UpdateFlags::EXECUTE_MASK;
        let mut guard = PassGuard::new(self, UpdateFlags::TRAVERSING | UpdateFlags::EXECUTING);
        guard.execute_traversal(immediate);
    }

    fn execute_traversal(&mut self, immediate: bool) {
        let t0 = self.host.now();
        self.context.update_time = t0;
        #[cfg(feature = "trace")]
        self.emit(|sink| {
            sink.on_pass_begin(&PassBeginEvent {
                pass: PassKind::Execute,
                immediate,
                timestamp: t0,
            });
        });

        let mut requests = UpdateRequests::new();
        let mut visited: u32 = 0;
        for root in &mut self.roots {
            if root
                .node
                .component_flags()
                .intersects(UpdateFlags::EXECUTE_MASK)
            {
                visited += 1;
                root.node
                    .cascade_execute(UpdateFlags::empty(), &self.context, &mut requests);
            }
        }
        self.root_flags |= requests.flags().canonicalized();

        #[cfg(feature = "trace")]
        {
            let elapsed = self.host.now().saturating_since(t0);
            self.emit(|sink| {
                sink.on_pass_end(&PassEndEvent {
                    pass: PassKind::Execute,
                    immediate,
                    roots_visited: visited,
                    elapsed,
                });
            });
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = visited;
        }

        self.cancel_update();
        if self.root_flags.intersects(UpdateFlags::COMPILE_MASK) {
            let mut compile_delay = self.update_delay;
            if immediate {
                compile_delay = self.config.max_compile_interval.max(compile_delay);
            }
            self.arm(PassKind::Compile, compile_delay);
        } else if self.root_flags.intersects(UpdateFlags::EXECUTE_MASK) {
            self.arm(PassKind::Execute, self.config.max_execute_interval);
        }
    }

    // -- Power --

    /// Powers on every unpowered root and requests
    /// [`power_flags`](ManagerConfig::power_flags) for it.
    pub fn on_power(&mut self) {
        let power_flags = self.config.power_flags;
        let mut powered: u32 = 0;
        for index in 0..self.roots.len() {
            if !self.roots[index].node.is_powered() {
                self.roots[index].node.cascade_power();
                powered += 1;
                let id = self.roots[index].id;
                self.request_update(id, power_flags, false);
            }
        }
        #[cfg(feature = "trace")]
        self.emit(|sink| {
            sink.on_power(&PowerEvent {
                powered: true,
                roots: powered,
            });
        });
        #[cfg(not(feature = "trace"))]
        {
            _ = powered;
        }
    }

    /// Cancels all scheduled work, resets the adaptive delay to its minimum,
    /// and powers off every powered root.
    ///
    /// The delay reset makes the system start fresh and responsive on the
    /// next power-on.
    pub fn on_unpower(&mut self) {
        self.cancel_update();
        self.update_delay = self.config.min_update_delay;
        let mut unpowered: u32 = 0;
        for root in &mut self.roots {
            if root.node.is_powered() {
                root.node.cascade_unpower();
                unpowered += 1;
            }
        }
        #[cfg(feature = "trace")]
        self.emit(|sink| {
            sink.on_power(&PowerEvent {
                powered: false,
                roots: unpowered,
            });
        });
        #[cfg(not(feature = "trace"))]
        {
            _ = unpowered;
        }
    }
}

/// Restores control bits on every exit path out of a pass, panic included.
struct PassGuard<'a, H: TimerHost> {
    manager: &'a mut ExecuteManager<H>,
    clear: UpdateFlags,
}

impl<'a, H: TimerHost> PassGuard<'a, H> {
    fn new(manager: &'a mut ExecuteManager<H>, clear: UpdateFlags) -> Self {
        Self { manager, clear }
    }
}

impl<H: TimerHost> Deref for PassGuard<'_, H> {
    type Target = ExecuteManager<H>;

    fn deref(&self) -> &Self::Target {
        self.manager
    }
}

impl<H: TimerHost> DerefMut for PassGuard<'_, H> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.manager
    }
}

impl<H: TimerHost> Drop for PassGuard<'_, H> {
    fn drop(&mut self) {
        self.manager.root_flags &= !self.clear;
    }
}
