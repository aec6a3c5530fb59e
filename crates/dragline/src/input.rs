//! Normalized pointer, touch, and mouse input.
//!
//! Hosts translate their native events into [`PointerInput`] and hand them to
//! the [`DragDropManager`](crate::DragDropManager). Touch input reports the
//! first touch point as its page position.

use crate::geometry::Point;
use crate::viewport::ElementId;

/// The input family an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    /// Pointer events with pointer capture.
    #[default]
    Pointer,
    /// Touch events; moves and ends are delivered at window level.
    Touch,
    /// Legacy mouse events; moves and ends are delivered at window level.
    Mouse,
}

/// One normalized input event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointerInput {
    pub kind: InputKind,
    /// The pointer id, for pointer events.
    pub pointer_id: Option<i32>,
    /// Position in page coordinates.
    pub page: Point,
    /// All active touch points, for touch events.
    pub touches: Vec<Point>,
    /// The innermost element the event was dispatched to.
    pub target: Option<ElementId>,
    /// The element whose listener is handling the event. `None` for events
    /// delivered at window level.
    pub current_target: Option<ElementId>,
    default_prevented: bool,
}

impl PointerInput {
    /// A pointer event.
    pub fn pointer(pointer_id: i32, page: Point) -> Self {
        Self {
            kind: InputKind::Pointer,
            pointer_id: Some(pointer_id),
            page,
            ..Default::default()
        }
    }

    /// A touch event. The page position is taken from the first touch point.
    pub fn touch(touches: impl IntoIterator<Item = Point>) -> Self {
        let touches: Vec<Point> = touches.into_iter().collect();
        Self {
            kind: InputKind::Touch,
            page: touches.first().copied().unwrap_or_default(),
            touches,
            ..Default::default()
        }
    }

    /// A mouse event.
    pub fn mouse(page: Point) -> Self {
        Self {
            kind: InputKind::Mouse,
            page,
            ..Default::default()
        }
    }

    /// Set the element the event was dispatched to.
    pub fn with_target(mut self, target: ElementId) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the element whose listener handles the event.
    pub fn with_current_target(mut self, current_target: ElementId) -> Self {
        self.current_target = Some(current_target);
        self
    }

    /// Whether this is a touch event.
    pub fn is_touch(&self) -> bool {
        self.kind == InputKind::Touch
    }

    /// Ask the host to suppress its default handling of this event.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}
