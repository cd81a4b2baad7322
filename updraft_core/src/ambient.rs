// Copyright 2026 the Updraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opt-in thread-local default manager.
//!
//! Explicit construction and injection is the primary way to use
//! [`ExecuteManager`]; most embedders should build one per scheduling domain
//! and pass it to whatever owns the component trees. Some hosts want an
//! ambient instance anyway (one document, one scheduler), so this module
//! offers exactly that — with explicit init-once semantics instead of lazy
//! magic: a manager cannot be conjured without a timer host, so [`init`]
//! must be called before [`with`].
//!
//! The instance is thread-local. Component trees, observers, and trace sinks
//! are not `Send`, and the hosts this accessor serves drive the scheduler
//! from a single thread anyway.
//!
//! Requires the `std` feature.

use std::boxed::Box;
use std::cell::{OnceCell, RefCell};

use crate::manager::{ExecuteManager, ManagerConfig};
use crate::timer::TimerHost;

/// The type-erased host the default manager runs on.
pub type AmbientHost = Box<dyn TimerHost>;

/// Why an ambient-accessor call failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmbientError {
    /// [`init`] was called more than once on this thread.
    AlreadyInitialized,
    /// [`with`] was called before [`init`].
    NotInitialized,
    /// [`with`] was called from inside another [`with`] closure.
    InUse,
}

impl core::fmt::Display for AmbientError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AlreadyInitialized => f.write_str("ambient manager already initialized"),
            Self::NotInitialized => f.write_str("ambient manager not initialized"),
            Self::InUse => f.write_str("ambient manager already borrowed"),
        }
    }
}

impl core::error::Error for AmbientError {}

std::thread_local! {
    static AMBIENT: OnceCell<RefCell<ExecuteManager<AmbientHost>>> = OnceCell::new();
}

/// Installs this thread's default manager. May be called at most once per
/// thread.
pub fn init(host: AmbientHost, config: ManagerConfig) -> Result<(), AmbientError> {
    AMBIENT.with(|cell| {
        cell.set(RefCell::new(ExecuteManager::with_config(host, config)))
            .map_err(|_| AmbientError::AlreadyInitialized)
    })
}

/// Runs `f` with exclusive access to this thread's default manager.
pub fn with<R>(
    f: impl FnOnce(&mut ExecuteManager<AmbientHost>) -> R,
) -> Result<R, AmbientError> {
    AMBIENT.with(|cell| {
        let manager = cell.get().ok_or(AmbientError::NotInitialized)?;
        let mut manager = manager.try_borrow_mut().map_err(|_| AmbientError::InUse)?;
        Ok(f(&mut manager))
    })
}

/// Whether [`init`] has been called on this thread.
#[must_use]
pub fn is_initialized() -> bool {
    AMBIENT.with(|cell| cell.get().is_some())
}
