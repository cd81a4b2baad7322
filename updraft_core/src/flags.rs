// Copyright 2026 the Updraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The dirty-state flag protocol shared by components and the manager.
//!
//! [`UpdateFlags`] is a bitmask with three logical groups:
//!
//! - **Compile family** — layout-like work, resolved first.
//!   [`NEEDS_COMPILE`](UpdateFlags::NEEDS_COMPILE) is the canonical bit;
//!   [`NEEDS_RESOLVE`](UpdateFlags::NEEDS_RESOLVE) and
//!   [`NEEDS_ASSEMBLE`](UpdateFlags::NEEDS_ASSEMBLE) are node-specific
//!   sub-flags that imply it.
//! - **Execute family** — render-like work, resolved after compile.
//!   [`NEEDS_EXECUTE`](UpdateFlags::NEEDS_EXECUTE) is canonical;
//!   [`NEEDS_REVISE`](UpdateFlags::NEEDS_REVISE) and
//!   [`NEEDS_COMPUTE`](UpdateFlags::NEEDS_COMPUTE) imply it.
//! - **Control bits** — never requested by components. The manager sets
//!   [`TRAVERSING`](UpdateFlags::TRAVERSING) plus one of
//!   [`COMPILING`](UpdateFlags::COMPILING) /
//!   [`EXECUTING`](UpdateFlags::EXECUTING) for the duration of a pass, and
//!   [`IMMEDIATE`](UpdateFlags::IMMEDIATE) around a synchronous fast-path
//!   update.
//!
//! The family partition is first-class: [`FlagFamily`] enumerates the two
//! work families and maps each to its mask, and
//! [`UpdateFlags::canonicalized`] lifts any sub-flag to its family's
//! canonical bit. Nothing else in the crate encodes family membership.

use bitflags::bitflags;

bitflags! {
    /// Pending-work and pass-state bits.
    ///
    /// Each component owns its flags and is the only party that clears its
    /// dirty bits (during its cascade callbacks). The manager maintains a
    /// separate aggregate of these bits across all roots, plus the control
    /// bits, in [`ExecuteManager::root_flags`](crate::manager::ExecuteManager::root_flags).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct UpdateFlags: u32 {
        /// A pass is traversing the root set.
        const TRAVERSING = 1 << 0;
        /// A compile pass is running.
        const COMPILING = 1 << 1;
        /// An execute pass is running.
        const EXECUTING = 1 << 2;
        /// A synchronous immediate update is in progress.
        const IMMEDIATE = 1 << 3;

        /// Layout-like work is pending (canonical compile bit).
        const NEEDS_COMPILE = 1 << 4;
        /// References or bindings must be re-resolved before layout.
        const NEEDS_RESOLVE = 1 << 5;
        /// Structural output must be re-assembled after layout.
        const NEEDS_ASSEMBLE = 1 << 6;

        /// Render-like work is pending (canonical execute bit).
        const NEEDS_EXECUTE = 1 << 7;
        /// Derived output values must be revised before rendering.
        const NEEDS_REVISE = 1 << 8;
        /// Computed output must be regenerated after rendering state changes.
        const NEEDS_COMPUTE = 1 << 9;

        /// All compile-family bits.
        const COMPILE_MASK = Self::NEEDS_COMPILE.bits()
            | Self::NEEDS_RESOLVE.bits()
            | Self::NEEDS_ASSEMBLE.bits();
        /// All execute-family bits.
        const EXECUTE_MASK = Self::NEEDS_EXECUTE.bits()
            | Self::NEEDS_REVISE.bits()
            | Self::NEEDS_COMPUTE.bits();
        /// All requestable work bits.
        const UPDATE_MASK = Self::COMPILE_MASK.bits() | Self::EXECUTE_MASK.bits();
        /// All pass-in-progress control bits.
        const UPDATING_MASK = Self::TRAVERSING.bits()
            | Self::COMPILING.bits()
            | Self::EXECUTING.bits();
    }
}

impl UpdateFlags {
    /// Returns the work bits with each family's canonical bit filled in.
    ///
    /// Any compile-mask bit implies [`NEEDS_COMPILE`](Self::NEEDS_COMPILE);
    /// any execute-mask bit implies [`NEEDS_EXECUTE`](Self::NEEDS_EXECUTE).
    /// Control bits are stripped. This is the translation the manager applies
    /// to every requested flag set before aggregating it.
    #[must_use]
    pub fn canonicalized(self) -> Self {
        let mut out = self & Self::UPDATE_MASK;
        if out.intersects(Self::COMPILE_MASK) {
            out |= Self::NEEDS_COMPILE;
        }
        if out.intersects(Self::EXECUTE_MASK) {
            out |= Self::NEEDS_EXECUTE;
        }
        out
    }

    /// Whether any bit of `family` is set.
    #[inline]
    #[must_use]
    pub fn needs(self, family: FlagFamily) -> bool {
        self.intersects(family.mask())
    }
}

/// The two work families, in resolution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlagFamily {
    /// Layout-like work, resolved before [`Execute`](Self::Execute).
    Compile,
    /// Render-like work, resolved after [`Compile`](Self::Compile).
    Execute,
}

impl FlagFamily {
    /// Both families, in resolution order.
    pub const ALL: [Self; 2] = [Self::Compile, Self::Execute];

    /// The full bit mask of this family.
    #[inline]
    #[must_use]
    pub const fn mask(self) -> UpdateFlags {
        match self {
            Self::Compile => UpdateFlags::COMPILE_MASK,
            Self::Execute => UpdateFlags::EXECUTE_MASK,
        }
    }

    /// The canonical "needs work" bit of this family.
    #[inline]
    #[must_use]
    pub const fn canonical(self) -> UpdateFlags {
        match self {
            Self::Compile => UpdateFlags::NEEDS_COMPILE,
            Self::Execute => UpdateFlags::NEEDS_EXECUTE,
        }
    }
}
