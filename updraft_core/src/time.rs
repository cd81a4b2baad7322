// Copyright 2026 the Updraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Millisecond-resolution monotonic time for pass scheduling.
//!
//! [`UpdateTime`] is a point in time; [`Delay`] is a span. Both are newtypes
//! over `u64` milliseconds. One millisecond is the scheduler's "time unit":
//! all interval constants in [`ManagerConfig`](crate::manager::ManagerConfig)
//! are sized against a ~60 Hz frame budget (16.7 ms per frame).
//!
//! The epoch is arbitrary — whatever the [`TimerHost`](crate::timer::TimerHost)
//! reports. Only differences between two [`UpdateTime`]s are meaningful, so
//! arithmetic saturates rather than panicking on clock anomalies.

use core::fmt;
use core::ops::{Add, Sub};

/// A point in time, in milliseconds from an arbitrary epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UpdateTime(pub u64);

impl UpdateTime {
    /// The epoch itself.
    pub const ZERO: Self = Self(0);

    /// Returns the raw millisecond value.
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Returns the span between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_since(self, earlier: Self) -> Delay {
        Delay(self.0.saturating_sub(earlier.0))
    }

    /// Checked addition of a delay.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, delay: Delay) -> Option<Self> {
        match self.0.checked_add(delay.0) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }
}

impl Add<Delay> for UpdateTime {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Delay) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub<Delay> for UpdateTime {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Delay) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Sub for UpdateTime {
    type Output = Delay;

    #[inline]
    fn sub(self, rhs: Self) -> Delay {
        Delay(self.0 - rhs.0)
    }
}

impl fmt::Debug for UpdateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UpdateTime({}ms)", self.0)
    }
}

/// A span of time, in milliseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Delay(pub u64);

impl Delay {
    /// A zero-length delay.
    pub const ZERO: Self = Self(0);

    /// Creates a delay from a millisecond count.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the raw millisecond value.
    #[inline]
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Saturating doubling (back-off step).
    #[inline]
    #[must_use]
    pub const fn doubled(self) -> Self {
        Self(self.0.saturating_mul(2))
    }

    /// Integer halving (decay step).
    #[inline]
    #[must_use]
    pub const fn halved(self) -> Self {
        Self(self.0 / 2)
    }

    /// The larger of two delays.
    #[inline]
    #[must_use]
    pub const fn max(self, rhs: Self) -> Self {
        if self.0 >= rhs.0 { self } else { rhs }
    }

    /// The smaller of two delays.
    #[inline]
    #[must_use]
    pub const fn min(self, rhs: Self) -> Self {
        if self.0 <= rhs.0 { self } else { rhs }
    }
}

impl Add for Delay {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Delay {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Debug for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Delay({}ms)", self.0)
    }
}
