//! An in-memory visual tree implementing [`Viewport`].
//!
//! `Scene` models just enough of a document for the drag/drop engine to run
//! without a browser: page-space layout boxes, inline styles, `translate3d`
//! transforms, absolute positioning, element and window scrolling, shadow
//! roots, and topmost-first hit-testing in tree order.
//!
//! # Example
//!
//! ```
//! use dragline::{Point, Rect, Scene, Size, Viewport};
//!
//! let mut scene = Scene::new(Size::new(800.0, 600.0));
//! let list = scene.add_element(scene.body(), "list", Rect::new(0.0, 0.0, 200.0, 400.0));
//! let item = scene.add_element(list, "item", Rect::new(0.0, 0.0, 200.0, 40.0));
//!
//! let hits = scene.elements_from_point(None, Point::new(10.0, 10.0));
//! assert_eq!(&hits[..2], &[item, list]);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as FmtWrite;

use slotmap::SlotMap;

use crate::geometry::{Insets, Point, Rect, Size};
use crate::transform::{parse_px, parse_translation};
use crate::viewport::{CssPosition, ElementId, Viewport};

#[derive(Debug, Clone, Default)]
struct Node {
    name: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    /// Page-space box in normal flow, before transforms and scrolling.
    layout: Rect,
    styles: BTreeMap<String, String>,
    classes: BTreeSet<String>,
    droppable: bool,
    position: CssPosition,
    margin: Insets,
    scroll: Point,
    scroll_size: Option<Size>,
    shadow_root: Option<ElementId>,
    /// Set on shadow root nodes: the element hosting them.
    host: Option<ElementId>,
    /// Root of an instantiated template view.
    view: bool,
}

/// An in-memory document.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: SlotMap<ElementId, Node>,
    root: ElementId,
    body: ElementId,
    window_scroll: Point,
    inner_size: Size,
    document_size: Size,
    pointer_capture_supported: bool,
    captures: HashMap<i32, ElementId>,
    focused: Option<ElementId>,
    destroyed_views: usize,
}

impl Scene {
    /// Create an empty document whose window has the given inner size.
    ///
    /// The document initially fits the window exactly, so nothing scrolls.
    pub fn new(inner_size: Size) -> Self {
        let mut nodes = SlotMap::with_key();
        let page = Rect {
            origin: Point::ZERO,
            size: inner_size,
        };
        let root = nodes.insert(Node {
            name: "html".into(),
            layout: page,
            ..Default::default()
        });
        let body = nodes.insert(Node {
            name: "body".into(),
            parent: Some(root),
            layout: page,
            ..Default::default()
        });
        nodes[root].children.push(body);

        Self {
            nodes,
            root,
            body,
            window_scroll: Point::ZERO,
            inner_size,
            document_size: inner_size,
            pointer_capture_supported: true,
            captures: HashMap::new(),
            focused: None,
            destroyed_views: 0,
        }
    }

    // =========================================================================
    // Building
    // =========================================================================

    /// Add an element as the last child of `parent`, laid out at a page rect.
    pub fn add_element(&mut self, parent: ElementId, name: &str, layout: Rect) -> ElementId {
        let id = self.nodes.insert(Node {
            name: name.into(),
            layout,
            ..Default::default()
        });
        self.append_child(parent, id);
        id
    }

    /// Attach a shadow root to `host` and return it.
    ///
    /// Elements added under the returned root are only reachable through
    /// [`Viewport::elements_from_point`] with the root as scope.
    pub fn attach_shadow(&mut self, host: ElementId) -> ElementId {
        if let Some(existing) = self.nodes.get(host).and_then(|n| n.shadow_root) {
            return existing;
        }
        let layout = self.nodes.get(host).map(|n| n.layout).unwrap_or_default();
        let root = self.nodes.insert(Node {
            name: "#shadow-root".into(),
            layout,
            host: Some(host),
            ..Default::default()
        });
        if let Some(node) = self.nodes.get_mut(host) {
            node.shadow_root = Some(root);
        }
        root
    }

    /// Create a detached template element usable as a ghost template.
    pub fn create_template(&mut self, name: &str, size: Size) -> ElementId {
        self.nodes.insert(Node {
            name: name.into(),
            layout: Rect {
                origin: Point::ZERO,
                size,
            },
            ..Default::default()
        })
    }

    /// Grow (or shrink) the scrollable document.
    pub fn set_document_size(&mut self, size: Size) {
        self.document_size = size;
        self.nodes[self.root].layout.size = size;
        self.nodes[self.body].layout.size = size;
    }

    pub fn set_window_scroll(&mut self, scroll: Point) {
        self.window_scroll = self.clamp_window_scroll(scroll);
    }

    pub fn set_layout(&mut self, element: ElementId, layout: Rect) {
        if let Some(node) = self.nodes.get_mut(element) {
            node.layout = layout;
        }
    }

    pub fn set_position(&mut self, element: ElementId, position: CssPosition) {
        if let Some(node) = self.nodes.get_mut(element) {
            node.position = position;
        }
    }

    pub fn set_margin(&mut self, element: ElementId, margin: Insets) {
        if let Some(node) = self.nodes.get_mut(element) {
            node.margin = margin;
        }
    }

    /// Make an element scrollable with the given content size.
    pub fn set_scroll_size(&mut self, element: ElementId, size: Size) {
        if let Some(node) = self.nodes.get_mut(element) {
            node.scroll_size = Some(size);
        }
    }

    /// Simulate a host without pointer capture (touch or mouse fallback).
    pub fn set_pointer_capture_supported(&mut self, supported: bool) {
        self.pointer_capture_supported = supported;
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn name(&self, element: ElementId) -> Option<&str> {
        self.nodes.get(element).map(|n| n.name.as_str())
    }

    /// Find the first live element with the given name.
    pub fn find(&self, name: &str) -> Option<ElementId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.name == name)
            .map(|(id, _)| id)
    }

    /// Whether the element has not been discarded.
    pub fn exists(&self, element: ElementId) -> bool {
        self.nodes.contains_key(element)
    }

    /// Whether the element is connected to the document (directly or
    /// through shadow hosts).
    pub fn is_attached(&self, element: ElementId) -> bool {
        let top = self.topmost(element);
        top == self.root
            || self
                .nodes
                .get(top)
                .and_then(|n| n.host)
                .is_some_and(|host| self.is_attached(host))
    }

    pub fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.nodes
            .get(element)
            .is_some_and(|n| n.classes.contains(class))
    }

    /// The element currently capturing `pointer_id`.
    pub fn pointer_capture(&self, pointer_id: i32) -> Option<ElementId> {
        self.captures.get(&pointer_id).copied()
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    /// How many template views have been destroyed.
    pub fn destroyed_views(&self) -> usize {
        self.destroyed_views
    }

    /// Number of live nodes, including the document root and body.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Render the attached tree for debugging.
    ///
    /// Droppable elements are marked with `*`, classes follow in brackets.
    pub fn format_tree(&self) -> String {
        let mut output = String::new();
        self.format_subtree_into(self.root, 0, true, &mut output);
        output
    }

    fn format_subtree_into(&self, id: ElementId, depth: usize, is_last: bool, output: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };

        output.push_str(&Self::build_prefix(depth, is_last));
        output.push_str(&node.name);
        if node.droppable {
            output.push('*');
        }
        if !node.classes.is_empty() {
            let classes: Vec<&str> = node.classes.iter().map(String::as_str).collect();
            let _ = write!(output, " [{}]", classes.join(" "));
        }
        output.push('\n');

        let mut children: Vec<ElementId> = node.shadow_root.into_iter().collect();
        children.extend(node.children.iter().copied());
        let child_count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.format_subtree_into(child, depth + 1, i + 1 == child_count, output);
        }
    }

    fn build_prefix(depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }
        let mut prefix = "\u{2502}  ".repeat(depth - 1);
        prefix.push_str(if is_last {
            "\u{2514}\u{2500}\u{2500} "
        } else {
            "\u{251c}\u{2500}\u{2500} "
        });
        prefix
    }

    // =========================================================================
    // Layout
    // =========================================================================

    fn topmost(&self, element: ElementId) -> ElementId {
        let mut current = element;
        while let Some(parent) = self.nodes.get(current).and_then(|n| n.parent) {
            current = parent;
        }
        current
    }

    /// Parent for geometry purposes: shadow roots hang off their host.
    fn layout_parent(&self, element: ElementId) -> Option<ElementId> {
        let node = self.nodes.get(element)?;
        node.parent.or(node.host)
    }

    fn position_of(&self, node: &Node) -> CssPosition {
        match node.styles.get("position").map(String::as_str) {
            Some("static") => CssPosition::Static,
            Some("relative") => CssPosition::Relative,
            Some("absolute") => CssPosition::Absolute,
            Some("fixed") => CssPosition::Fixed,
            Some("sticky") => CssPosition::Sticky,
            _ => node.position,
        }
    }

    /// Page-space top-left of the element's border box, transforms included.
    fn page_origin(&self, element: ElementId) -> Point {
        let Some(node) = self.nodes.get(element) else {
            return Point::ZERO;
        };

        let inset = Point::new(
            node.styles.get("left").map(|v| parse_px(v)).unwrap_or(0.0),
            node.styles.get("top").map(|v| parse_px(v)).unwrap_or(0.0),
        );
        let has_inset = node.styles.contains_key("left") || node.styles.contains_key("top");
        let margin = Point::new(node.margin.left, node.margin.top);

        let origin = match self.position_of(node) {
            CssPosition::Absolute if has_inset => self.containing_block_origin(element) + inset + margin,
            CssPosition::Fixed if has_inset => self.window_scroll + inset + margin,
            _ => {
                let shift = self
                    .layout_parent(element)
                    .map(|parent| self.child_shift(parent))
                    .unwrap_or(Point::ZERO);
                node.layout.origin + shift
            }
        };

        origin + translation_of(node)
    }

    /// How far an element's children are displaced from their layout boxes.
    fn child_shift(&self, element: ElementId) -> Point {
        let Some(node) = self.nodes.get(element) else {
            return Point::ZERO;
        };
        if element == self.root || element == self.body {
            return Point::ZERO;
        }
        self.page_origin(element) - node.layout.origin - node.scroll
    }

    fn containing_block_origin(&self, element: ElementId) -> Point {
        let mut current = self.layout_parent(element);
        while let Some(id) = current {
            if id == self.body || id == self.root {
                break;
            }
            if let Some(node) = self.nodes.get(id)
                && self.position_of(node) != CssPosition::Static
                && node.host.is_none()
            {
                return self.page_origin(id) - node.scroll;
            }
            current = self.layout_parent(id);
        }
        Point::ZERO
    }

    fn clamp_window_scroll(&self, scroll: Point) -> Point {
        let max_x = (self.document_size.width - self.inner_size.width).max(0.0);
        let max_y = (self.document_size.height - self.inner_size.height).max(0.0);
        Point::new(scroll.x.clamp(0.0, max_x), scroll.y.clamp(0.0, max_y))
    }

    // =========================================================================
    // Hit testing
    // =========================================================================

    /// Collect hits under `parent` in tree order, without entering shadow roots.
    fn collect_hits(&self, parent: ElementId, point: Point, hits: &mut Vec<ElementId>) {
        let Some(node) = self.nodes.get(parent) else {
            return;
        };
        for &child in &node.children {
            if self.bounding_rect(child).contains(point) {
                hits.push(child);
            }
            self.collect_hits(child, point, hits);
        }
    }

    fn detach(&mut self, element: ElementId) {
        let Some(parent) = self.nodes.get_mut(element).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.retain(|&c| c != element);
        }
    }

    fn clone_subtree(&mut self, element: ElementId) -> Option<ElementId> {
        let source = self.nodes.get(element)?.clone();
        let copy = self.nodes.insert(Node {
            parent: None,
            children: Vec::new(),
            shadow_root: None,
            host: None,
            view: false,
            ..source.clone()
        });
        for child in source.children {
            if let Some(child_copy) = self.clone_subtree(child) {
                self.nodes[child_copy].parent = Some(copy);
                self.nodes[copy].children.push(child_copy);
            }
        }
        Some(copy)
    }

    fn delete_subtree(&mut self, element: ElementId) {
        let Some(node) = self.nodes.remove(element) else {
            return;
        };
        self.captures.retain(|_, &mut captured| captured != element);
        if self.focused == Some(element) {
            self.focused = None;
        }
        for child in node.children {
            self.delete_subtree(child);
        }
        if let Some(root) = node.shadow_root {
            self.delete_subtree(root);
        }
    }
}

fn translation_of(node: &Node) -> Point {
    node.styles
        .get("transform")
        .map(|value| parse_translation(value))
        .unwrap_or(Point::ZERO)
}

impl Viewport for Scene {
    fn body(&self) -> ElementId {
        self.body
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.nodes.get(element).and_then(|n| n.parent)
    }

    fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.nodes
            .get(element)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn append_child(&mut self, parent: ElementId, child: ElementId) {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return;
        }
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    fn insert_before(&mut self, parent: ElementId, child: ElementId, reference: ElementId) {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return;
        }
        self.detach(child);
        let children = &mut self.nodes[parent].children;
        let index = children
            .iter()
            .position(|&c| c == reference)
            .unwrap_or(children.len());
        children.insert(index, child);
        self.nodes[child].parent = Some(parent);
    }

    fn remove(&mut self, element: ElementId) {
        self.detach(element);
    }

    fn clone_element(&mut self, element: ElementId) -> ElementId {
        match self.clone_subtree(element) {
            Some(copy) => copy,
            None => self.nodes.insert(Node::default()),
        }
    }

    fn instantiate_template(&mut self, template: ElementId) -> Option<ElementId> {
        let root = self.clone_subtree(template)?;
        self.nodes[root].view = true;
        Some(root)
    }

    fn destroy_view(&mut self, root: ElementId) {
        if self.nodes.get(root).is_some_and(|n| n.view) {
            self.detach(root);
            self.delete_subtree(root);
            self.destroyed_views += 1;
        }
    }

    fn discard(&mut self, element: ElementId) {
        self.detach(element);
        self.delete_subtree(element);
    }

    fn bounding_rect(&self, element: ElementId) -> Rect {
        let Some(node) = self.nodes.get(element) else {
            return Rect::ZERO;
        };
        Rect {
            origin: self.page_origin(element) - self.window_scroll,
            size: node.layout.size,
        }
    }

    fn offset_size(&self, element: ElementId) -> Size {
        self.nodes
            .get(element)
            .map(|n| n.layout.size)
            .unwrap_or_default()
    }

    fn scroll_offset(&self, element: ElementId) -> Point {
        self.nodes
            .get(element)
            .map(|n| n.scroll)
            .unwrap_or_default()
    }

    fn set_scroll_offset(&mut self, element: ElementId, offset: Point) {
        let max = {
            let scroll = self.scroll_size(element);
            let client = self.client_size(element);
            Point::new(
                (scroll.width - client.width).max(0.0),
                (scroll.height - client.height).max(0.0),
            )
        };
        if let Some(node) = self.nodes.get_mut(element) {
            node.scroll = Point::new(offset.x.clamp(0.0, max.x), offset.y.clamp(0.0, max.y));
        }
    }

    fn scroll_size(&self, element: ElementId) -> Size {
        self.nodes
            .get(element)
            .map(|n| n.scroll_size.unwrap_or(n.layout.size))
            .unwrap_or_default()
    }

    fn client_size(&self, element: ElementId) -> Size {
        self.offset_size(element)
    }

    fn window_scroll(&self) -> Point {
        self.window_scroll
    }

    fn scroll_window_by(&mut self, delta: Point) {
        self.window_scroll = self.clamp_window_scroll(self.window_scroll + delta);
    }

    fn window_inner_size(&self) -> Size {
        self.inner_size
    }

    fn document_scroll_size(&self) -> Size {
        self.document_size
    }

    fn document_client_size(&self) -> Size {
        self.inner_size
    }

    fn style(&self, element: ElementId, property: &str) -> Option<String> {
        self.nodes.get(element)?.styles.get(property).cloned()
    }

    fn set_style(&mut self, element: ElementId, property: &str, value: &str) {
        let Some(node) = self.nodes.get_mut(element) else {
            return;
        };
        if value.is_empty() {
            node.styles.remove(property);
        } else {
            node.styles.insert(property.into(), value.into());
        }
    }

    fn computed_margin(&self, element: ElementId) -> Insets {
        self.nodes
            .get(element)
            .map(|n| n.margin)
            .unwrap_or_default()
    }

    fn computed_position(&self, element: ElementId) -> CssPosition {
        self.nodes
            .get(element)
            .map(|n| self.position_of(n))
            .unwrap_or_default()
    }

    fn offset_parent(&self, element: ElementId) -> Option<ElementId> {
        if self.computed_position(element) == CssPosition::Fixed || !self.is_attached(element) {
            return None;
        }
        let mut current = self.layout_parent(element);
        while let Some(id) = current {
            if id == self.body {
                return Some(id);
            }
            if self.nodes.get(id).is_some_and(|n| n.host.is_none())
                && self.computed_position(id) != CssPosition::Static
            {
                return Some(id);
            }
            current = self.layout_parent(id);
        }
        None
    }

    fn add_class(&mut self, element: ElementId, class: &str) {
        if let Some(node) = self.nodes.get_mut(element) {
            node.classes.insert(class.into());
        }
    }

    fn remove_class(&mut self, element: ElementId, class: &str) {
        if let Some(node) = self.nodes.get_mut(element) {
            node.classes.remove(class);
        }
    }

    fn is_droppable(&self, element: ElementId) -> bool {
        self.nodes.get(element).is_some_and(|n| n.droppable)
    }

    fn set_droppable(&mut self, element: ElementId, droppable: bool) {
        if let Some(node) = self.nodes.get_mut(element) {
            node.droppable = droppable;
        }
    }

    fn set_pointer_capture(&mut self, element: ElementId, pointer_id: i32) -> bool {
        if !self.pointer_capture_supported || !self.nodes.contains_key(element) {
            return false;
        }
        self.captures.insert(pointer_id, element);
        true
    }

    fn focus(&mut self, element: ElementId) {
        if self.nodes.contains_key(element) {
            self.focused = Some(element);
        }
    }

    fn elements_from_point(&self, scope: Option<ElementId>, point: Point) -> Vec<ElementId> {
        match scope {
            None => {
                let mut hits = Vec::new();
                for id in [self.root, self.body] {
                    if self.bounding_rect(id).contains(point) {
                        hits.push(id);
                    }
                }
                self.collect_hits(self.body, point, &mut hits);
                hits.reverse();
                hits
            }
            Some(root) => {
                let Some(host) = self.nodes.get(root).and_then(|n| n.host) else {
                    return Vec::new();
                };
                let mut hits = Vec::new();
                self.collect_hits(root, point, &mut hits);
                hits.reverse();

                // Retargeted light-tree results: everything under the point in
                // the tree that contains the host.
                let top = self.topmost(host);
                let outer_scope = self.nodes.get(top).and_then(|n| n.host).map(|_| top);
                hits.extend(self.elements_from_point(outer_scope, point));
                hits
            }
        }
    }

    fn shadow_root(&self, element: ElementId) -> Option<ElementId> {
        self.nodes.get(element).and_then(|n| n.shadow_root)
    }
}
