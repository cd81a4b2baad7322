// Copyright 2026 the Updraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two-phase reactive update scheduler for component trees.
//!
//! `updraft_core` decides *when* layout-like ("compile") and render-like
//! ("execute") work runs for a forest of stateful component trees: batching
//! against wall-clock budgets, escalating to synchronous execution on
//! request, and suspending everything while the host is invisible. It is
//! `no_std` compatible (with `alloc`); real timers, clocks, and visibility
//! events are injected from backend crates.
//!
//! # Architecture
//!
//! ```text
//!   application / view code          platform backend
//!        │ request_update()               │ visibility, timer expiries
//!        ▼                                ▼
//!   ExecuteManager ◄──────────── PowerController / fire()
//!        │ cascade_compile / cascade_execute
//!        ▼
//!   Component roots (opaque trees behind the flag protocol)
//! ```
//!
//! **[`flags`]** — The bitmask dirty-state protocol: compile and execute
//! work families, manager-owned control bits, and the first-class family
//! partition used to canonicalize requests.
//!
//! **[`component`]** — The [`Component`](component::Component) interface the
//! manager drives, the shared per-traversal [`UpdateContext`](component::UpdateContext),
//! and the [`UpdateRequests`](component::UpdateRequests) re-entrancy seam.
//!
//! **[`timer`]** — The injectable [`TimerHost`](timer::TimerHost)
//! clock/deferral capability, so pass logic is testable against a simulated
//! clock.
//!
//! **[`manager`]** — The [`ExecuteManager`](manager::ExecuteManager):
//! pass scheduling, the adaptive compile delay, the immediate fast path,
//! and failure containment of the control bits.
//!
//! **[`power`]** — Visibility-driven power transitions.
//!
//! **[`time`]** — Millisecond [`UpdateTime`](time::UpdateTime) /
//! [`Delay`](time::Delay) newtypes.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) instrumentation events,
//! compiled out without the `trace` feature.
//!
//! **[`ambient`]** (`std` only) — Opt-in init-once thread-local default
//! manager.
//!
//! # Crate features
//!
//! - `std` (disabled by default): enables the [`ambient`] accessor.
//! - `trace` (disabled by default): enables trace-event emission from the
//!   manager.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

#[cfg(feature = "std")]
pub mod ambient;
pub mod component;
pub mod flags;
pub mod manager;
pub mod power;
pub mod time;
pub mod timer;
pub mod trace;
