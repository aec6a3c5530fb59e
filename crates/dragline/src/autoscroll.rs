//! Edge auto-scrolling while dragging.
//!
//! Every move tick the drag source asks [`detect_direction`] whether its
//! current position is within the threshold of a scrollable edge of the window
//! or of its scroll container. A [`ScrollLoop`] then steps the scroll position
//! on a repeating timer until the direction disappears or the gesture ends.

use dragline_core::TimerId;
use dragline_core::logging::targets;

use crate::geometry::{Point, Rect, Size};
use crate::viewport::{ElementId, Viewport};

/// The direction an edge scroll moves the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    fn unit(self) -> Point {
        match self {
            Self::Up => Point::new(0.0, -1.0),
            Self::Down => Point::new(0.0, 1.0),
            Self::Left => Point::new(-1.0, 0.0),
            Self::Right => Point::new(1.0, 0.0),
        }
    }
}

/// Decide whether a dragged box at `location` (page space) should scroll its
/// container, and in which direction.
///
/// `container` is the scroll container, or `None` for the window. Scrolling
/// up or left requires that the container has already been scrolled on that
/// axis; scrolling down or right does not.
pub fn detect_direction<V: Viewport + ?Sized>(
    viewport: &V,
    location: Point,
    size: Size,
    container: Option<ElementId>,
    threshold: f64,
) -> Option<ScrollDirection> {
    let window_scroll = viewport.window_scroll();
    let (bounds, scrolled) = match container {
        Some(container) => (
            viewport.bounding_rect(container),
            viewport.scroll_offset(container),
        ),
        None => (
            Rect {
                origin: Point::ZERO,
                size: viewport.window_inner_size(),
            },
            window_scroll,
        ),
    };

    let top = bounds.top() + window_scroll.y + threshold;
    let bottom = bounds.bottom() + window_scroll.y - threshold - size.height;
    let left = bounds.left() + window_scroll.x + threshold;
    let right = bounds.right() + window_scroll.x - threshold - size.width;

    if location.y <= top && scrolled.y > 0.0 {
        Some(ScrollDirection::Up)
    } else if location.y > bottom {
        Some(ScrollDirection::Down)
    } else if location.x < left && scrolled.x > 0.0 {
        Some(ScrollDirection::Left)
    } else if location.x > right {
        Some(ScrollDirection::Right)
    } else {
        None
    }
}

/// A running edge-scroll loop.
///
/// The direction and the scrollable extent are captured when the loop
/// starts and do not change while it runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScrollLoop {
    pub timer: TimerId,
    pub direction: ScrollDirection,
    extent: Size,
}

impl ScrollLoop {
    pub(crate) fn start<V: Viewport + ?Sized>(
        viewport: &V,
        timer: TimerId,
        direction: ScrollDirection,
        container: Option<ElementId>,
    ) -> Self {
        let extent = match container {
            Some(container) => viewport.scroll_size(container),
            None => viewport.document_scroll_size(),
        };
        tracing::debug!(target: targets::AUTOSCROLL, ?direction, ?extent, "scroll loop started");
        Self {
            timer,
            direction,
            extent,
        }
    }

    /// The displacement for one tick: `step` pixels in the loop's direction,
    /// or zero on an axis already at its limit.
    pub(crate) fn step_delta<V: Viewport + ?Sized>(
        &self,
        viewport: &V,
        container: Option<ElementId>,
        step: f64,
    ) -> Point {
        let (scroll, client) = match container {
            Some(container) => (
                viewport.scroll_offset(container),
                viewport.client_size(container),
            ),
            None => (viewport.window_scroll(), viewport.document_client_size()),
        };
        let max = Point::new(
            self.extent.width - client.width,
            self.extent.height - client.height,
        );

        let mut unit = self.direction.unit();
        if (scroll.x <= 0.0 && unit.x < 0.0) || (scroll.x >= max.x && unit.x > 0.0) {
            unit.x = 0.0;
        }
        if (scroll.y <= 0.0 && unit.y < 0.0) || (scroll.y >= max.y && unit.y > 0.0) {
            unit.y = 0.0;
        }
        Point::new(unit.x * step, unit.y * step)
    }

    /// Scroll by `delta` and return how far the content actually moved.
    pub(crate) fn apply<V: Viewport + ?Sized>(
        viewport: &mut V,
        container: Option<ElementId>,
        delta: Point,
    ) -> Point {
        match container {
            Some(container) => {
                let before = viewport.scroll_offset(container);
                viewport.set_scroll_offset(container, before + delta);
                viewport.scroll_offset(container) - before
            }
            None => {
                let before = viewport.window_scroll();
                viewport.scroll_window_by(delta);
                viewport.window_scroll() - before
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use dragline_core::TimerManager;

    const THRESHOLD: f64 = 25.0;
    const CARD: Size = Size::new(80.0, 40.0);

    fn tall_scene() -> Scene {
        let mut scene = Scene::new(Size::new(800.0, 600.0));
        scene.set_document_size(Size::new(1600.0, 2000.0));
        scene
    }

    #[test]
    fn test_bottom_edge_scrolls_down() {
        let scene = tall_scene();
        // Bottom edge of the card 20px above the viewport bottom.
        let location = Point::new(300.0, 540.0);
        assert_eq!(
            detect_direction(&scene, location, CARD, None, THRESHOLD),
            Some(ScrollDirection::Down)
        );
        assert_eq!(
            detect_direction(&scene, Point::new(300.0, 300.0), CARD, None, THRESHOLD),
            None
        );
    }

    #[test]
    fn test_top_edge_requires_scrolled_window() {
        let mut scene = tall_scene();
        let near_top = Point::new(300.0, 10.0);
        assert_eq!(detect_direction(&scene, near_top, CARD, None, THRESHOLD), None);

        scene.set_window_scroll(Point::new(0.0, 100.0));
        let near_top = Point::new(300.0, 110.0);
        assert_eq!(
            detect_direction(&scene, near_top, CARD, None, THRESHOLD),
            Some(ScrollDirection::Up)
        );
    }

    #[test]
    fn test_left_requires_scroll_right_does_not() {
        let mut scene = tall_scene();
        assert_eq!(
            detect_direction(&scene, Point::new(5.0, 300.0), CARD, None, THRESHOLD),
            None
        );
        assert_eq!(
            detect_direction(&scene, Point::new(700.0, 300.0), CARD, None, THRESHOLD),
            Some(ScrollDirection::Right)
        );

        scene.set_window_scroll(Point::new(50.0, 0.0));
        assert_eq!(
            detect_direction(&scene, Point::new(60.0, 300.0), CARD, None, THRESHOLD),
            Some(ScrollDirection::Left)
        );
    }

    #[test]
    fn test_container_bounds() {
        let mut scene = tall_scene();
        let container = scene.add_element(scene.body(), "list", Rect::new(100.0, 100.0, 300.0, 200.0));
        scene.set_scroll_size(container, Size::new(300.0, 1000.0));

        assert_eq!(
            detect_direction(&scene, Point::new(150.0, 250.0), CARD, Some(container), THRESHOLD),
            Some(ScrollDirection::Down)
        );
        assert_eq!(
            detect_direction(&scene, Point::new(150.0, 150.0), CARD, Some(container), THRESHOLD),
            None
        );
    }

    #[test]
    fn test_step_clamps_at_extent() {
        let mut scene = tall_scene();
        let mut timers = TimerManager::new();
        let timer = timers.start_repeating(std::time::Duration::from_millis(10));
        let scroll = ScrollLoop::start(&scene, timer, ScrollDirection::Down, None);

        let delta = scroll.step_delta(&scene, None, 5.0);
        assert_eq!(delta, Point::new(0.0, 5.0));
        assert_eq!(ScrollLoop::apply(&mut scene, None, delta), Point::new(0.0, 5.0));

        scene.set_window_scroll(Point::new(0.0, 1400.0));
        assert_eq!(scroll.step_delta(&scene, None, 5.0), Point::ZERO);
    }

    #[test]
    fn test_extent_is_captured_at_start() {
        let mut scene = tall_scene();
        let mut timers = TimerManager::new();
        let timer = timers.start_repeating(std::time::Duration::from_millis(10));
        let scroll = ScrollLoop::start(&scene, timer, ScrollDirection::Down, None);

        // Content growing during the loop does not extend it.
        scene.set_document_size(Size::new(1600.0, 4000.0));
        scene.set_window_scroll(Point::new(0.0, 1400.0));
        assert_eq!(scroll.step_delta(&scene, None, 5.0), Point::ZERO);
    }

    #[test]
    fn test_apply_reports_clamped_container_delta() {
        let mut scene = tall_scene();
        let container = scene.add_element(scene.body(), "list", Rect::new(0.0, 0.0, 300.0, 200.0));
        scene.set_scroll_size(container, Size::new(300.0, 203.0));

        let moved = ScrollLoop::apply(&mut scene, Some(container), Point::new(0.0, 5.0));
        assert_eq!(moved, Point::new(0.0, 3.0));
        assert_eq!(scene.scroll_offset(container), Point::new(0.0, 3.0));
    }
}
