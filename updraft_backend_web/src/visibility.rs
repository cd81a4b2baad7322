// Copyright 2026 the Updraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `visibilitychange` event source.
//!
//! [`VisibilityWatcher`] subscribes to the document's `visibilitychange`
//! event and reports each state as a [`Visibility`], which the embedder
//! forwards to a [`PowerController`](updraft_core::power::PowerController).
//! The listener is removed when the watcher is dropped.

use alloc::boxed::Box;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use updraft_core::power::Visibility;

type VisibilityClosure = Closure<dyn FnMut()>;

/// Watches the document's visibility state.
pub struct VisibilityWatcher {
    document: web_sys::Document,
    closure: VisibilityClosure,
}

impl VisibilityWatcher {
    /// Subscribes to `visibilitychange`.
    ///
    /// `callback` receives the new state on every change. It does not fire
    /// for the initial state; read [`current`](Self::current) once after
    /// construction and feed it through the same path.
    ///
    /// # Errors
    ///
    /// Fails when no `window`/`document` is available (for example in a
    /// worker) or when the listener cannot be registered.
    pub fn new(mut callback: impl FnMut(Visibility) + 'static) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let doc = document.clone();
        let closure = Closure::wrap(Box::new(move || {
            callback(visibility_of(&doc));
        }) as Box<dyn FnMut()>);
        document.add_event_listener_with_callback(
            "visibilitychange",
            closure.as_ref().unchecked_ref(),
        )?;

        Ok(Self { document, closure })
    }

    /// The document's current visibility state.
    #[must_use]
    pub fn current(&self) -> Visibility {
        visibility_of(&self.document)
    }
}

fn visibility_of(document: &web_sys::Document) -> Visibility {
    match document.visibility_state() {
        web_sys::VisibilityState::Visible => Visibility::Visible,
        _ => Visibility::Hidden,
    }
}

impl Drop for VisibilityWatcher {
    fn drop(&mut self) {
        let _ = self.document.remove_event_listener_with_callback(
            "visibilitychange",
            self.closure.as_ref().unchecked_ref(),
        );
    }
}

impl core::fmt::Debug for VisibilityWatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VisibilityWatcher")
            .field("current", &self.current())
            .finish_non_exhaustive()
    }
}
