// Copyright 2026 the Updraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `setTimeout`-backed timer host.
//!
//! [`TimeoutHost`] implements [`TimerHost`] on top of the browser's
//! `setTimeout` / `clearTimeout` pair, one slot per pass, with
//! `performance.now()` as the clock. When a timeout comes due it invokes the
//! dispatch callback installed with [`connect`](TimeoutHost::connect), which
//! is expected to call
//! [`ExecuteManager::fire`](updraft_core::manager::ExecuteManager::fire).

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use updraft_core::time::{Delay, UpdateTime};
use updraft_core::timer::{PassKind, TimerHost};

// Direct global bindings instead of `web_sys::Window` methods — avoids
// fetching (and unwrapping) the Window/Performance objects on every call.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, delay_ms: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

type DispatchFn = Box<dyn FnMut(PassKind)>;
type TimeoutClosure = Closure<dyn FnMut()>;

/// A browser [`TimerHost`] with shared-handle semantics.
///
/// Cloning yields another handle onto the same timer slots, so the embedder
/// keeps one handle (to [`connect`](Self::connect) the dispatch callback)
/// while the manager owns the other. Pending timeouts are cleared when the
/// last handle is dropped.
#[derive(Clone)]
pub struct TimeoutHost {
    inner: Rc<TimeoutInner>,
}

#[derive(Default)]
struct TimeoutSlot {
    /// The ID of the pending `setTimeout`, if any.
    id: Cell<Option<i32>>,

    /// The JS closure registered with `setTimeout`, kept alive until the
    /// timeout fires or is cancelled.
    closure: RefCell<Option<TimeoutClosure>>,
}

#[derive(Default)]
struct TimeoutInner {
    dispatch: RefCell<Option<DispatchFn>>,
    compile: TimeoutSlot,
    execute: TimeoutSlot,
}

impl TimeoutInner {
    fn slot(&self, pass: PassKind) -> &TimeoutSlot {
        match pass {
            PassKind::Compile => &self.compile,
            PassKind::Execute => &self.execute,
        }
    }

    fn clear_slot(&self, pass: PassKind) {
        let slot = self.slot(pass);
        if let Some(id) = slot.id.take() {
            clear_timeout(id);
        }
        slot.closure.borrow_mut().take();
    }
}

impl Drop for TimeoutInner {
    fn drop(&mut self) {
        self.clear_slot(PassKind::Compile);
        self.clear_slot(PassKind::Execute);
    }
}

impl TimeoutHost {
    /// Creates a host with no dispatch callback and no timers pending.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(TimeoutInner::default()),
        }
    }

    /// Installs the callback that receives timer expiries.
    ///
    /// The usual shape closes over an `Rc<RefCell<ExecuteManager<TimeoutHost>>>`
    /// and forwards each expiry to `fire`.
    pub fn connect(&self, dispatch: impl FnMut(PassKind) + 'static) {
        *self.inner.dispatch.borrow_mut() = Some(Box::new(dispatch));
    }

    /// Whether a timeout is pending for the given pass.
    #[must_use]
    pub fn is_pending(&self, pass: PassKind) -> bool {
        self.inner.slot(pass).id.get().is_some()
    }
}

impl Default for TimeoutHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerHost for TimeoutHost {
    fn now(&self) -> UpdateTime {
        let ms = performance_now();
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "performance.now() returns a small positive f64; ms fits in u64"
        )]
        UpdateTime(ms as u64)
    }

    fn defer(&mut self, pass: PassKind, delay: Delay) {
        self.inner.clear_slot(pass);

        let inner = Rc::clone(&self.inner);
        let closure = Closure::wrap(Box::new(move || {
            let slot = inner.slot(pass);
            slot.id.set(None);
            // Move the executing closure out of the slot so a re-arm for the
            // same pass inside `dispatch` installs a fresh one instead of
            // dropping this one mid-invocation.
            let _keep_alive = slot.closure.borrow_mut().take();
            if let Some(dispatch) = inner.dispatch.borrow_mut().as_mut() {
                dispatch(pass);
            }
        }) as Box<dyn FnMut()>);

        let delay_ms = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let id = set_timeout(closure.as_ref().unchecked_ref(), delay_ms);
        let slot = self.inner.slot(pass);
        slot.id.set(Some(id));
        *slot.closure.borrow_mut() = Some(closure);
    }

    fn cancel(&mut self, pass: PassKind) {
        self.inner.clear_slot(pass);
    }
}

impl core::fmt::Debug for TimeoutHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimeoutHost")
            .field("compile_pending", &self.inner.compile.id.get().is_some())
            .field("execute_pending", &self.inner.execute.id.get().is_some())
            .finish_non_exhaustive()
    }
}
