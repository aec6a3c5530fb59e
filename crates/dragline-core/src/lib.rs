//! Core systems for dragline.
//!
//! This crate provides the host-agnostic building blocks the drag/drop engine
//! is assembled from:
//!
//! - **Signal/Slot System**: observer lists whose slots may veto or rewrite a payload
//! - **Timers**: host-driven one-shot and repeating timers
//! - **UI Dispatch**: a single seam through which consumer-visible emissions run
//! - **Logging**: tracing targets and span helpers
//!
//! # Signal Example
//!
//! ```
//! use dragline_core::Signal;
//!
//! let moved = Signal::<(f64, f64)>::new();
//! let conn_id = moved.connect(|(x, _y)| {
//!     // Clamp the proposed x coordinate.
//!     *x = x.min(100.0);
//! });
//!
//! let mut next = (250.0, 10.0);
//! moved.emit(&mut next);
//! assert_eq!(next, (100.0, 10.0));
//!
//! moved.disconnect(conn_id);
//! ```
//!
//! # Timer Example
//!
//! ```
//! use dragline_core::TimerManager;
//! use std::time::{Duration, Instant};
//!
//! let start = Instant::now();
//! let mut timers = TimerManager::new();
//! let tick = timers.start_repeating_at(start, Duration::from_millis(10));
//!
//! assert_eq!(timers.process_expired(start + Duration::from_millis(10)), vec![tick]);
//! ```

mod dispatch;
mod error;
pub mod logging;
pub mod signal;
mod timer;

pub use dispatch::{DirectDispatcher, UiDispatcher, emit_with};
pub use error::{CoreError, Result, TimerError};
pub use logging::PerfSpan;
pub use signal::{ConnectionId, Signal};
pub use timer::{TimerId, TimerKind, TimerManager};
