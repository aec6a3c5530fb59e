//! The viewport adapter: every read and write the engine performs against the
//! host's visual tree goes through [`Viewport`].
//!
//! The gesture state machines never touch a real document. A browser binding,
//! a native retained-mode toolkit, or the in-memory [`Scene`](crate::Scene)
//! used by the tests all plug in here.

use slotmap::new_key_type;

use crate::geometry::{Insets, Point, Rect, Size};

new_key_type! {
    /// Identifies one element of the host's visual tree.
    ///
    /// Shadow roots are elements too: [`Viewport::shadow_root`] returns the
    /// id of the root node of a host's encapsulated sub-tree.
    pub struct ElementId;
}

/// The computed CSS `position` of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CssPosition {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

/// Host-environment operations consumed by the drag/drop engine.
///
/// Geometry is reported the way a browser reports it: [`bounding_rect`] is in
/// viewport space, scroll offsets and sizes are in CSS pixels, and
/// [`elements_from_point`] takes a viewport point and returns elements
/// topmost-first.
///
/// [`bounding_rect`]: Viewport::bounding_rect
/// [`elements_from_point`]: Viewport::elements_from_point
pub trait Viewport {
    // =========================================================================
    // Tree
    // =========================================================================

    /// The document body, where ghosts go when no ghost host is configured.
    fn body(&self) -> ElementId;

    fn parent(&self, element: ElementId) -> Option<ElementId>;

    /// Direct element children, in document order.
    fn children(&self, element: ElementId) -> Vec<ElementId>;

    /// Append `child` as the last child of `parent`, detaching it first.
    fn append_child(&mut self, parent: ElementId, child: ElementId);

    /// Insert `child` into `parent` directly before `reference`.
    fn insert_before(&mut self, parent: ElementId, child: ElementId, reference: ElementId);

    /// Detach `element` from its parent. Detached elements keep their subtree.
    fn remove(&mut self, element: ElementId);

    /// Deep-clone an element. The clone starts detached.
    fn clone_element(&mut self, element: ElementId) -> ElementId;

    /// Instantiate a ghost template and return its root element, detached.
    fn instantiate_template(&mut self, template: ElementId) -> Option<ElementId>;

    /// Destroy a view previously returned by [`instantiate_template`].
    ///
    /// [`instantiate_template`]: Viewport::instantiate_template
    fn destroy_view(&mut self, root: ElementId);

    /// Release a detached element (and its subtree) that will not be reused.
    fn discard(&mut self, element: ElementId);

    // =========================================================================
    // Geometry
    // =========================================================================

    /// The element's border box in viewport coordinates.
    fn bounding_rect(&self, element: ElementId) -> Rect;

    /// The element's layout size (`offsetWidth`/`offsetHeight`).
    fn offset_size(&self, element: ElementId) -> Size;

    /// Scroll offset of a scrollable element.
    fn scroll_offset(&self, element: ElementId) -> Point;

    fn set_scroll_offset(&mut self, element: ElementId, offset: Point);

    /// Total scrollable content size of an element.
    fn scroll_size(&self, element: ElementId) -> Size;

    /// Visible content size of an element.
    fn client_size(&self, element: ElementId) -> Size;

    // =========================================================================
    // Window
    // =========================================================================

    fn window_scroll(&self) -> Point;

    /// Scroll the window by a delta. Hosts clamp to the scrollable range.
    fn scroll_window_by(&mut self, delta: Point);

    /// The window's inner (viewport) size.
    fn window_inner_size(&self) -> Size;

    /// Scrollable size of the root document.
    fn document_scroll_size(&self) -> Size;

    /// Visible size of the root document.
    fn document_client_size(&self) -> Size;

    // =========================================================================
    // Style
    // =========================================================================

    /// Read an inline style property.
    fn style(&self, element: ElementId, property: &str) -> Option<String>;

    /// Write an inline style property. An empty value clears it.
    fn set_style(&mut self, element: ElementId, property: &str, value: &str);

    fn computed_margin(&self, element: ElementId) -> Insets;

    fn computed_position(&self, element: ElementId) -> CssPosition;

    /// The nearest positioned ancestor, as `offsetParent` reports it.
    fn offset_parent(&self, element: ElementId) -> Option<ElementId>;

    fn add_class(&mut self, element: ElementId, class: &str);

    fn remove_class(&mut self, element: ElementId, class: &str);

    /// Whether the element carries the droppable marker.
    fn is_droppable(&self, element: ElementId) -> bool;

    fn set_droppable(&mut self, element: ElementId, droppable: bool);

    // =========================================================================
    // Input
    // =========================================================================

    /// Route all events for `pointer_id` to `element`.
    ///
    /// Returns `false` when the host has no pointer capture.
    fn set_pointer_capture(&mut self, element: ElementId, pointer_id: i32) -> bool;

    fn focus(&mut self, element: ElementId);

    // =========================================================================
    // Hit testing
    // =========================================================================

    /// Elements under a viewport point, topmost first.
    ///
    /// With `scope == None` the document is queried; with `Some(root)` the
    /// shadow root `root` is queried on its own, as `ShadowRoot.elementsFromPoint`
    /// does. Nested shadow trees are not descended into.
    fn elements_from_point(&self, scope: Option<ElementId>, point: Point) -> Vec<ElementId>;

    /// The shadow root hosted by `element`, if any.
    fn shadow_root(&self, element: ElementId) -> Option<ElementId>;
}
