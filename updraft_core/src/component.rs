// Copyright 2026 the Updraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The component-node interface the manager drives.
//!
//! A *component* is a node in a tree of stateful UI-like objects. The
//! scheduler knows nothing about a component's internals — only the flag
//! protocol ([`UpdateFlags`]) and the entry points declared on [`Component`].
//! The component tree itself (child ordering, parent back-references, what
//! "compile" and "execute" actually do) is the application's business.
//!
//! # Re-entrancy
//!
//! During a cascade a node frequently discovers *new* work — layout learns a
//! child must re-render, rendering learns a sibling needs re-layout. Nodes
//! report this through the [`UpdateRequests`] accumulator passed to each
//! cascade. The manager folds the accumulated flags back into its aggregate
//! after the traversal, which makes mid-pass requests exactly as the contract
//! promises: they OR flags and never start a nested pass.

use crate::flags::UpdateFlags;
use crate::time::UpdateTime;

/// Stable identity of a root attached to a manager.
///
/// Ids come from a monotonic counter and are never reused, so a stale id
/// simply fails to resolve instead of aliasing a different root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RootId(pub u64);

/// Per-traversal state shared with every node visited during a pass.
///
/// The manager overwrites [`update_time`](Self::update_time) immediately
/// before each traversal. Nodes must treat the context as read-only during
/// their own callback; it exists so they can read "now" without querying a
/// clock themselves (and so every node in one pass sees the same instant).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateContext {
    /// The timestamp of the pass in progress.
    pub update_time: UpdateTime,
}

/// Accumulates update requests made from inside a pass.
///
/// Handed by the manager to every cascade invocation. Requests are ORed
/// together; the manager canonicalizes and merges them into its root flags
/// once the traversal completes, then re-arms timers as usual. A request
/// made this way for a flag the node is *currently* clearing is therefore
/// re-scheduled rather than swallowed.
#[derive(Clone, Copy, Debug, Default)]
pub struct UpdateRequests {
    flags: UpdateFlags,
}

impl UpdateRequests {
    /// Creates an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            flags: UpdateFlags::empty(),
        }
    }

    /// Requests further work. Only update-mask bits are kept.
    pub fn request(&mut self, flags: UpdateFlags) {
        self.flags |= flags & UpdateFlags::UPDATE_MASK;
    }

    /// The flags requested so far.
    #[must_use]
    pub const fn flags(&self) -> UpdateFlags {
        self.flags
    }

    /// Whether anything was requested.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// A schedulable component tree root.
///
/// These six operations are the only entry points the manager calls.
/// Implementations are expected to recurse over their own children in
/// whatever order they define, clearing the dirty bits they satisfy as they
/// go.
pub trait Component {
    /// The node's current pending-work flags.
    ///
    /// The manager reads this to decide whether the node participates in a
    /// pass; only the node itself ever clears its dirty bits.
    fn component_flags(&self) -> UpdateFlags;

    /// Performs compile-family (layout-like) work for this node and its
    /// descendants.
    ///
    /// `base_flags` are flags the caller forces on this node in addition to
    /// its own. Must clear any compile bits it satisfies. New work discovered
    /// mid-cascade goes through `requests`.
    fn cascade_compile(
        &mut self,
        base_flags: UpdateFlags,
        cx: &UpdateContext,
        requests: &mut UpdateRequests,
    );

    /// Performs execute-family (render-like) work for this node and its
    /// descendants. Symmetric to [`cascade_compile`](Self::cascade_compile).
    fn cascade_execute(
        &mut self,
        base_flags: UpdateFlags,
        cx: &UpdateContext,
        requests: &mut UpdateRequests,
    );

    /// Recursively transitions this subtree to the powered state.
    fn cascade_power(&mut self);

    /// Recursively transitions this subtree to the unpowered state.
    fn cascade_unpower(&mut self);

    /// Whether this subtree is currently powered.
    fn is_powered(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_keep_only_update_mask_bits() {
        let mut requests = UpdateRequests::new();
        requests.request(UpdateFlags::TRAVERSING | UpdateFlags::NEEDS_COMPILE);
        assert_eq!(requests.flags(), UpdateFlags::NEEDS_COMPILE);
    }

    #[test]
    fn requests_accumulate() {
        let mut requests = UpdateRequests::new();
        assert!(requests.is_empty());
        requests.request(UpdateFlags::NEEDS_RESOLVE);
        requests.request(UpdateFlags::NEEDS_EXECUTE);
        assert_eq!(
            requests.flags(),
            UpdateFlags::NEEDS_RESOLVE | UpdateFlags::NEEDS_EXECUTE
        );
    }
}
