// Copyright 2026 the Updraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visibility-driven power transitions.
//!
//! The manager suspends all scheduled work while the host is not visible
//! (a browser tab in the background, a minimized window). [`PowerController`]
//! is the narrow adapter between a platform visibility event source and the
//! manager's [`on_power`](crate::manager::ExecuteManager::on_power) /
//! [`on_unpower`](crate::manager::ExecuteManager::on_unpower) transitions —
//! it de-duplicates repeated same-state events and nothing more. Event
//! *sources* (e.g. a DOM `visibilitychange` listener) live in backend crates.

use crate::manager::ExecuteManager;
use crate::timer::TimerHost;

/// Host visibility, as reported by a platform event source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// The host is visible; roots should receive scheduled work.
    Visible,
    /// The host is not visible; all scheduled work is suspended.
    Hidden,
}

/// Forwards visibility transitions to a manager, dropping duplicates.
///
/// Platform sources often re-report the current state (on attach, on focus
/// churn). Power transitions are not idempotent from the roots' point of
/// view — power-on requests a full update per root — so only genuine
/// transitions are forwarded. The first observed event is always forwarded.
#[derive(Clone, Copy, Debug, Default)]
pub struct PowerController {
    last: Option<Visibility>,
}

impl PowerController {
    /// Creates a controller that has not yet observed any visibility state.
    #[must_use]
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// The most recently observed visibility, if any.
    #[must_use]
    pub const fn visibility(&self) -> Option<Visibility> {
        self.last
    }

    /// Applies a visibility report to `manager`.
    ///
    /// Returns `true` if this was a transition (the manager was notified).
    pub fn observe<H: TimerHost>(
        &mut self,
        visibility: Visibility,
        manager: &mut ExecuteManager<H>,
    ) -> bool {
        if self.last == Some(visibility) {
            return false;
        }
        self.last = Some(visibility);
        match visibility {
            Visibility::Visible => manager.on_power(),
            Visibility::Hidden => manager.on_unpower(),
        }
        true
    }
}
