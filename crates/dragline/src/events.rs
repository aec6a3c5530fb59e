//! Event payloads emitted by drag sources and drop targets.
//!
//! Cancelable payloads carry a `cancel` flag that listeners set to veto the
//! effect. The engine reads it back after every listener has run.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::drag::SourceId;
use crate::drop::TargetId;
use crate::geometry::Point;
use crate::input::PointerInput;
use crate::viewport::ElementId;

/// Arbitrary data attached to a drag source or drop target.
///
/// Cloning is cheap; every clone shares the same value.
#[derive(Clone, Default)]
pub struct Payload {
    value: Option<Arc<dyn Any + Send + Sync>>,
}

impl Payload {
    /// Wrap a value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Some(Arc::new(value)),
        }
    }

    /// A payload carrying nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Borrow the value if it has type `T`.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.value.as_ref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(_) => f.write_str("Payload(..)"),
            None => f.write_str("Payload(empty)"),
        }
    }
}

/// Payload of `drag_end`, `drag_click` and `transitioned`.
#[derive(Debug, Clone)]
pub struct DragBaseEventArgs {
    /// The input that caused the event; `None` for host notifications such
    /// as transition end.
    pub original_event: Option<PointerInput>,
    pub owner: SourceId,
    /// Page coordinates where the gesture started.
    pub start: Point,
    /// Current page coordinates.
    pub page: Point,
}

/// Payload of the cancelable `drag_start`.
#[derive(Debug, Clone)]
pub struct DragStartEventArgs {
    pub original_event: PointerInput,
    pub owner: SourceId,
    pub start: Point,
    pub page: Point,
    pub cancel: bool,
}

/// Payload of the cancelable `drag_move`.
///
/// Listeners may rewrite `next` to constrain where the drag goes.
#[derive(Debug, Clone)]
pub struct DragMoveEventArgs {
    pub original_event: PointerInput,
    pub owner: SourceId,
    pub start: Point,
    /// Position after the previous move.
    pub page: Point,
    /// Proposed position after this move.
    pub next: Point,
    pub cancel: bool,
}

/// Payload of the cancelable `ghost_create` and `ghost_destroy`.
#[derive(Debug, Clone)]
pub struct GhostEventArgs {
    pub owner: SourceId,
    pub ghost: ElementId,
    pub cancel: bool,
}

/// Payload of a drop target's `enter`, `over` and `leave`.
#[derive(Debug, Clone)]
pub struct DropEventArgs {
    pub original_event: PointerInput,
    pub owner: TargetId,
    /// The drag source being dragged over the target.
    pub drag: SourceId,
    pub drag_data: Payload,
    pub start: Point,
    pub page: Point,
    /// Pointer position relative to the target's top-left corner.
    pub offset: Point,
}

/// Payload of the cancelable `dropped`.
#[derive(Debug, Clone)]
pub struct DropDroppedEventArgs {
    pub base: DropEventArgs,
    pub cancel: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_downcast() {
        #[derive(Debug, PartialEq)]
        struct Row {
            id: u32,
        }

        let payload = Payload::new(Row { id: 7 });
        assert_eq!(payload.get::<Row>(), Some(&Row { id: 7 }));
        assert!(payload.get::<String>().is_none());

        let shared = payload.clone();
        assert_eq!(shared.get::<Row>().map(|r| r.id), Some(7));
    }

    #[test]
    fn test_empty_payload() {
        let payload = Payload::empty();
        assert!(payload.is_empty());
        assert!(payload.get::<u32>().is_none());
        assert_eq!(format!("{payload:?}"), "Payload(empty)");
    }
}
