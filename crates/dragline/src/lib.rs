//! Dragline - pointer-driven drag and drop for document-style UIs.
//!
//! The engine is host-agnostic: everything it knows about the document comes
//! through the [`Viewport`] trait, and the host drives it by feeding pointer
//! input, animation frames, timer ticks and transition-end notifications to a
//! [`DragDropManager`]. [`Scene`] is an in-memory viewport for tests and
//! headless use.
//!
//! - [`DragSource`]: a draggable element with tolerance, axis locking, an
//!   optional ghost proxy, handles and edge auto-scrolling
//! - [`DropTarget`]: an element that reacts to linked drags and applies a
//!   [`DropStrategy`] on drop
//! - [`Channel`]: which sources may interact with which targets
//!
//! Consumers observe and steer a drag through [`Signal`]s. Cancelable events
//! carry a `cancel` flag; `drag_move` slots may rewrite the next position.
//!
//! Logging uses `tracing` with the targets in [`dragline_core::logging::targets`].

mod animation;
mod autoscroll;
mod broker;
mod channel;
mod config;
mod drag;
mod drop;
mod error;
mod events;
mod geometry;
mod ghost;
mod input;
mod manager;
mod scene;
mod strategy;
pub mod transform;
mod viewport;

pub use animation::{Easing, TransitionArgs, css_seconds};
pub use autoscroll::{ScrollDirection, detect_direction};
pub use channel::{Channel, ChannelId};
pub use config::{AutoScrollConfig, DragAxis, DragSourceConfig, DropTargetConfig};
pub use drag::{
    DRAG_CLASS, DragCommands, DragSignals, DragSource, DragState, SELECT_DISABLED_CLASS, SourceId,
    TransitionTarget,
};
pub use drop::{DRAG_OVER_CLASS, DropSignals, DropTarget, TargetId, insert_index};
pub use error::{DragDropError, Result};
pub use events::{
    DragBaseEventArgs, DragMoveEventArgs, DragStartEventArgs, DropDroppedEventArgs, DropEventArgs,
    GhostEventArgs, Payload,
};
pub use geometry::{DragLocation, Insets, Point, Rect, Size};
pub use input::{InputKind, PointerInput};
pub use manager::DragDropManager;
pub use scene::Scene;
pub use strategy::DropStrategy;
pub use viewport::{CssPosition, ElementId, Viewport};

pub use dragline_core::{ConnectionId, DirectDispatcher, Signal, UiDispatcher};
