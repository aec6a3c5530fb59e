//! UI-thread dispatch for consumer-visible emissions.
//!
//! Every signal a drag source or drop target emits is routed through a single
//! injected [`UiDispatcher`]. Embedders that need listener code to run inside a
//! particular scope (a framework zone, a re-render batch, a profiling span)
//! wrap it here. Dispatch is synchronous: the emitter reads veto flags and
//! rewritten values back as soon as `dispatch` returns.

use std::fmt;

use crate::signal::Signal;

/// Runs consumer-visible emissions inside the host's UI scope.
pub trait UiDispatcher: Send + Sync {
    /// Invoke `emit` exactly once before returning.
    fn dispatch(&self, emit: &mut dyn FnMut());
}

/// A dispatcher that runs emissions inline.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectDispatcher;

impl UiDispatcher for DirectDispatcher {
    #[inline]
    fn dispatch(&self, emit: &mut dyn FnMut()) {
        emit();
    }
}

impl<F> UiDispatcher for F
where
    F: Fn(&mut dyn FnMut()) + Send + Sync,
{
    fn dispatch(&self, emit: &mut dyn FnMut()) {
        self(emit)
    }
}

/// Emit `signal` inside the dispatcher's scope.
///
/// Slot changes to `args` (veto flags, rewritten coordinates) are visible to
/// the caller once this returns.
pub fn emit_with<Args>(dispatcher: &dyn UiDispatcher, signal: &Signal<Args>, args: &mut Args) {
    dispatcher.dispatch(&mut || signal.emit(&mut *args));
}

impl fmt::Debug for dyn UiDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UiDispatcher")
    }
}
