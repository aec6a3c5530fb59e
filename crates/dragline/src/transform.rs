//! Coordinate and transform helpers.
//!
//! Pure functions over a [`Viewport`]: reading and writing an element's
//! `translate3d` offset and converting between viewport and page space.

use std::sync::LazyLock;

use regex::Regex;

use crate::geometry::Point;
use crate::viewport::{ElementId, Viewport};

static TRANSLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"translate(?:3d)?\(\s*(-?[\d.]+)(?:px)?\s*,\s*(-?[\d.]+)(?:px)?")
        .expect("translate regex should compile")
});

static LENGTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(-?\d*\.?\d+)").expect("length regex should compile")
});

/// Parse the x/y translation out of a CSS `transform` value.
///
/// Anything that is not a `translate`/`translate3d` value yields zero.
pub fn parse_translation(value: &str) -> Point {
    TRANSLATE_RE
        .captures(value)
        .map(|caps| Point::new(number(&caps[1]), number(&caps[2])))
        .unwrap_or(Point::ZERO)
}

/// Format a translation as the `transform` value the engine writes.
pub fn format_translation(translation: Point) -> String {
    format!("translate3d({}px, {}px, 0px)", translation.x, translation.y)
}

/// Parse a CSS length such as `"12px"` or `"-3.5"`, leniently.
///
/// Returns zero when there is no leading number.
pub fn parse_px(value: &str) -> f64 {
    LENGTH_RE
        .captures(value)
        .map(|caps| number(&caps[1]))
        .unwrap_or(0.0)
}

/// Format a pixel length for a style property.
pub fn format_px(value: f64) -> String {
    format!("{value}px")
}

fn number(text: &str) -> f64 {
    text.parse().unwrap_or(0.0)
}

/// The element's current translation offset.
pub fn translation<V: Viewport + ?Sized>(viewport: &V, element: ElementId) -> Point {
    viewport
        .style(element, "transform")
        .map(|value| parse_translation(&value))
        .unwrap_or(Point::ZERO)
}

pub fn set_translation<V: Viewport + ?Sized>(viewport: &mut V, element: ElementId, translation: Point) {
    viewport.set_style(element, "transform", &format_translation(translation));
}

/// Convert a page point to viewport space.
pub fn page_to_viewport<V: Viewport + ?Sized>(viewport: &V, page: Point) -> Point {
    page - viewport.window_scroll()
}

/// The element's top-left corner in page space.
pub fn page_position<V: Viewport + ?Sized>(viewport: &V, element: ElementId) -> Point {
    viewport.bounding_rect(element).top_left() + viewport.window_scroll()
}

/// Where the element's top-left would be in page space without its translation.
pub fn origin_position<V: Viewport + ?Sized>(viewport: &V, element: ElementId) -> Point {
    page_position(viewport, element) - translation(viewport, element)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile() {
        assert!(TRANSLATE_RE.is_match("translate3d(1px, 2px, 0px)"));
        assert!(LENGTH_RE.is_match("12px"));
    }

    #[test]
    fn test_parse_translate3d() {
        assert_eq!(
            parse_translation("translate3d(10px, -20.5px, 0px)"),
            Point::new(10.0, -20.5)
        );
        assert_eq!(parse_translation("translate(3px,4px)"), Point::new(3.0, 4.0));
    }

    #[test]
    fn test_parse_translation_fallback() {
        assert_eq!(parse_translation(""), Point::ZERO);
        assert_eq!(parse_translation("rotate(45deg)"), Point::ZERO);
    }

    #[test]
    fn test_format_parses_back() {
        let value = format_translation(Point::new(40.0, -2.25));
        assert_eq!(value, "translate3d(40px, -2.25px, 0px)");
        assert_eq!(parse_translation(&value), Point::new(40.0, -2.25));
    }

    #[test]
    fn test_parse_px() {
        assert_eq!(parse_px("12px"), 12.0);
        assert_eq!(parse_px(" -3.5px"), -3.5);
        assert_eq!(parse_px(".5"), 0.5);
        assert_eq!(parse_px("auto"), 0.0);
        assert_eq!(format_px(7.0), "7px");
    }
}
