//! Ghost proxy lifecycle.
//!
//! A ghost is a detached clone of the dragged element (or an instantiated
//! template) that is positioned absolutely in page space and moved in place of
//! the element itself. A drag source owns at most one ghost at a time.

use dragline_core::logging::targets;

use crate::geometry::Point;
use crate::transform::{format_px, page_position, parse_px};
use crate::viewport::{CssPosition, ElementId, Viewport};

/// How a ghost is built and where it lives.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GhostRequest<'a> {
    /// The element being dragged; cloned when there is no template.
    pub source: ElementId,
    pub template: Option<ElementId>,
    pub class: Option<&'a str>,
    /// Parent for the ghost; the document body when `None`.
    pub host: Option<ElementId>,
}

/// A live ghost element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Ghost {
    element: ElementId,
    templated: bool,
    /// Page position of the ghost's containing block.
    host_offset: Point,
}

/// The page-space origin the ghost's `left`/`top` are relative to.
///
/// A statically positioned host does not establish a containing block, so
/// its offset parent is used instead; the document body contributes nothing.
pub(crate) fn ghost_host_offset<V: Viewport + ?Sized>(viewport: &V, host: Option<ElementId>) -> Point {
    let Some(host) = host else {
        return Point::ZERO;
    };
    if viewport.computed_position(host) == CssPosition::Static {
        match viewport.offset_parent(host) {
            Some(parent) if parent == viewport.body() => return Point::ZERO,
            Some(parent) => return page_position(viewport, parent),
            None => {}
        }
    }
    page_position(viewport, host)
}

impl Ghost {
    /// Build a ghost, ask `confirm` whether to keep it, then insert it at
    /// `page` (the ghost's top-left in page space).
    ///
    /// When `confirm` returns `false` the clone or template view is released
    /// without ever entering the tree, and `None` is returned.
    pub(crate) fn create<V, F>(
        viewport: &mut V,
        request: GhostRequest<'_>,
        page: Point,
        confirm: F,
    ) -> Option<Self>
    where
        V: Viewport + ?Sized,
        F: FnOnce(ElementId) -> bool,
    {
        let (element, templated) = match request.template {
            Some(template) => (viewport.instantiate_template(template)?, true),
            None => (viewport.clone_element(request.source), false),
        };
        let host_offset = ghost_host_offset(viewport, request.host);

        viewport.set_style(element, "transition-duration", "0s");
        viewport.set_style(element, "position", "absolute");
        if let Some(class) = request.class.filter(|c| !c.is_empty()) {
            viewport.add_class(element, class);
        }

        let ghost = Self {
            element,
            templated,
            host_offset,
        };

        if !confirm(element) {
            tracing::debug!(target: targets::GHOST, ?element, "ghost creation vetoed");
            ghost.release(viewport);
            return None;
        }

        let parent = request.host.unwrap_or_else(|| viewport.body());
        viewport.append_child(parent, element);
        ghost.set_page_position(viewport, page);

        tracing::debug!(target: targets::GHOST, ?element, templated, x = page.x, y = page.y, "ghost created");
        Some(ghost)
    }

    pub(crate) fn element(&self) -> ElementId {
        self.element
    }

    /// The ghost's top-left corner in page space.
    pub(crate) fn page_position<V: Viewport + ?Sized>(&self, viewport: &V) -> Point {
        let margin = viewport.computed_margin(self.element);
        let left = viewport
            .style(self.element, "left")
            .map(|v| parse_px(&v))
            .unwrap_or(0.0);
        let top = viewport
            .style(self.element, "top")
            .map(|v| parse_px(&v))
            .unwrap_or(0.0);
        Point::new(left + margin.left, top + margin.top) + self.host_offset
    }

    /// Move the ghost so its top-left sits at `page`.
    pub(crate) fn set_page_position<V: Viewport + ?Sized>(&self, viewport: &mut V, page: Point) {
        let margin = viewport.computed_margin(self.element);
        let left = page.x - margin.left - self.host_offset.x;
        let top = page.y - margin.top - self.host_offset.y;
        viewport.set_style(self.element, "left", &format_px(left));
        viewport.set_style(self.element, "top", &format_px(top));
    }

    /// Remove the ghost from the tree and release it.
    pub(crate) fn release<V: Viewport + ?Sized>(self, viewport: &mut V) {
        viewport.remove(self.element);
        if self.templated {
            viewport.destroy_view(self.element);
        } else {
            viewport.discard(self.element);
        }
        tracing::debug!(target: targets::GHOST, element = ?self.element, "ghost released");
    }
}
