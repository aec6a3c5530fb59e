//! Logging and tracing facilities for dragline.
//!
//! dragline uses the `tracing` crate for instrumentation. Nothing is printed
//! unless the embedding application installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("dragline=debug,dragline_core=trace")
//!     .init();
//! ```
//!
//! The constants in [`targets`] match the `target:` used by every event, so a
//! single subsystem can be enabled on its own, e.g. `dragline::autoscroll=trace`.

/// Span names used throughout dragline for tracing.
pub mod span_names {
    /// A full pointer gesture from press to release.
    pub const GESTURE: &str = "dragline::gesture";
    /// One throttled pointer-move tick.
    pub const MOVE_TICK: &str = "dragline::move_tick";
    /// Hit-testing at a page point.
    pub const HIT_TEST: &str = "dragline::hit_test";
    /// Timer processing span.
    pub const TIMER: &str = "dragline_core::timer";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core target.
    pub const CORE: &str = "dragline_core";
    /// Timer system target.
    pub const TIMER: &str = "dragline_core::timer";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "dragline_core::signal";
    /// Drag gesture state machine.
    pub const DRAG: &str = "dragline::drag";
    /// Drop targets and the drop broker.
    pub const DROP: &str = "dragline::drop";
    /// Ghost proxy lifecycle.
    pub const GHOST: &str = "dragline::ghost";
    /// Edge auto-scrolling.
    pub const AUTOSCROLL: &str = "dragline::autoscroll";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::debug_span!(target: "dragline::perf", "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_are_namespaced() {
        for target in [targets::DRAG, targets::DROP, targets::GHOST, targets::AUTOSCROLL] {
            assert!(target.starts_with("dragline::"));
        }
        assert!(targets::SIGNAL.starts_with(targets::CORE));
        assert_eq!(span_names::TIMER, targets::TIMER);
    }

    #[test]
    fn test_perf_span_under_subscriber() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let _span = PerfSpan::new(span_names::HIT_TEST);
            tracing::trace!(target: targets::DRAG, "inside span");
        });
    }
}
