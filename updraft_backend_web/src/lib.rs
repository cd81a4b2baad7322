// Copyright 2026 the Updraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for updraft.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`TimeoutHost`]: a [`TimerHost`](updraft_core::timer::TimerHost) backed
//!   by `setTimeout` / `clearTimeout` and `performance.now()`
//! - [`VisibilityWatcher`]: a `visibilitychange` event source for
//!   [`PowerController`](updraft_core::power::PowerController)

#![no_std]

extern crate alloc;

mod timeout;
mod visibility;

pub use timeout::TimeoutHost;
pub use visibility::VisibilityWatcher;

use updraft_core::time::UpdateTime;

/// Returns the current host time from `performance.now()`.
///
/// `performance.now()` reports fractional milliseconds; the scheduler works
/// in whole milliseconds, so the fraction is truncated.
#[must_use]
pub fn now() -> UpdateTime {
    let ms = timeout::performance_now();
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "performance.now() returns a small positive f64; ms fits in u64"
    )]
    UpdateTime(ms as u64)
}
