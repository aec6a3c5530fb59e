//! Transition timing for programmatic repositioning.
//!
//! The engine never interpolates positions itself: it arms a CSS transition on
//! the moved element (or ghost) and lets the host animate it, then waits for
//! the host's transition-end notification.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DragDropError;
use crate::viewport::{ElementId, Viewport};

static CUBIC_BEZIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^cubic-bezier\(\s*(-?[\d.]+)\s*,\s*(-?[\d.]+)\s*,\s*(-?[\d.]+)\s*,\s*(-?[\d.]+)\s*\)$",
    )
    .expect("cubic-bezier regex should compile")
});

static STEPS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^steps\(\s*(\d+)\s*\)$").expect("steps regex should compile")
});

/// A CSS transition timing function.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Easing {
    /// Constant speed.
    Linear,
    /// The CSS default: slight acceleration, longer deceleration.
    #[default]
    Ease,
    /// Starts slow, accelerates.
    EaseIn,
    /// Starts fast, decelerates.
    EaseOut,
    /// Smooth start and end.
    EaseInOut,
    /// A custom cubic Bézier curve through (x1, y1) and (x2, y2).
    CubicBezier(f32, f32, f32, f32),
    /// A stepped curve with the given number of intervals.
    Steps(u32),
}

impl Easing {
    /// The value written to `transition-timing-function`.
    pub fn css(&self) -> String {
        match self {
            Self::Linear => "linear".into(),
            Self::Ease => "ease".into(),
            Self::EaseIn => "ease-in".into(),
            Self::EaseOut => "ease-out".into(),
            Self::EaseInOut => "ease-in-out".into(),
            Self::CubicBezier(x1, y1, x2, y2) => format!("cubic-bezier({x1}, {y1}, {x2}, {y2})"),
            Self::Steps(n) => format!("steps({n})"),
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css())
    }
}

impl FromStr for Easing {
    type Err = DragDropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "linear" => return Ok(Self::Linear),
            "ease" => return Ok(Self::Ease),
            "ease-in" => return Ok(Self::EaseIn),
            "ease-out" => return Ok(Self::EaseOut),
            "ease-in-out" => return Ok(Self::EaseInOut),
            _ => {}
        }

        let invalid = || DragDropError::InvalidEasing(s.to_owned());
        let float = |text: &str| text.parse::<f32>().map_err(|_| invalid());

        if let Some(caps) = CUBIC_BEZIER_RE.captures(s) {
            return Ok(Self::CubicBezier(
                float(&caps[1])?,
                float(&caps[2])?,
                float(&caps[3])?,
                float(&caps[4])?,
            ));
        }
        if let Some(caps) = STEPS_RE.captures(s) {
            let steps = caps[1].parse::<u32>().map_err(|_| invalid())?;
            if steps > 0 {
                return Ok(Self::Steps(steps));
            }
        }
        Err(invalid())
    }
}

impl TryFrom<String> for Easing {
    type Error = DragDropError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Easing> for String {
    fn from(value: Easing) -> Self {
        value.css()
    }
}

/// Custom timing for `transition_to` and `transition_to_origin`.
///
/// Unset (or zero) fields fall back to the source's default return duration,
/// the host's default timing function, and no delay.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransitionArgs {
    pub duration: Option<Duration>,
    pub easing: Option<Easing>,
    pub delay: Option<Duration>,
}

impl TransitionArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Format a duration as CSS seconds, e.g. `0.5s`.
pub fn css_seconds(duration: Duration) -> String {
    format!("{}s", duration.as_secs_f64())
}

/// Arm a CSS transition on `element` for the given properties.
pub(crate) fn arm_transition<V: Viewport + ?Sized>(
    viewport: &mut V,
    element: ElementId,
    properties: &str,
    args: &TransitionArgs,
    default_duration: Duration,
) {
    let duration = args
        .duration
        .filter(|d| !d.is_zero())
        .unwrap_or(default_duration);
    let timing = args.easing.map(|e| e.css()).unwrap_or_default();
    let delay = args
        .delay
        .filter(|d| !d.is_zero())
        .map(css_seconds)
        .unwrap_or_default();

    viewport.set_style(element, "transition-property", properties);
    viewport.set_style(element, "transition-duration", &css_seconds(duration));
    viewport.set_style(element, "transition-timing-function", &timing);
    viewport.set_style(element, "transition-delay", &delay);
}

/// Put the element back to instant, untransitioned style changes.
pub(crate) fn disarm_transition<V: Viewport + ?Sized>(viewport: &mut V, element: ElementId) {
    viewport.set_style(element, "transition-property", "");
    viewport.set_style(element, "transition-duration", "0s");
    viewport.set_style(element, "transition-timing-function", "");
    viewport.set_style(element, "transition-delay", "");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Size};
    use crate::scene::Scene;

    #[test]
    fn test_patterns_compile() {
        assert!(CUBIC_BEZIER_RE.is_match("cubic-bezier(0.1, 0.2, 0.3, 1)"));
        assert!(STEPS_RE.is_match("steps(3)"));
    }

    #[test]
    fn test_easing_css_names() {
        assert_eq!(Easing::EaseInOut.css(), "ease-in-out");
        assert_eq!(
            Easing::CubicBezier(0.25, 0.1, 0.25, 1.0).css(),
            "cubic-bezier(0.25, 0.1, 0.25, 1)"
        );
        assert_eq!(Easing::Steps(4).to_string(), "steps(4)");
    }

    #[test]
    fn test_easing_parse() {
        assert_eq!("ease-out".parse::<Easing>().unwrap(), Easing::EaseOut);
        assert_eq!(
            "cubic-bezier(0.4, 0, 0.2, 1)".parse::<Easing>().unwrap(),
            Easing::CubicBezier(0.4, 0.0, 0.2, 1.0)
        );
        assert_eq!("steps(3)".parse::<Easing>().unwrap(), Easing::Steps(3));
        assert!("steps(0)".parse::<Easing>().is_err());
        assert!("bounce".parse::<Easing>().is_err());
    }

    #[test]
    fn test_css_seconds() {
        assert_eq!(css_seconds(Duration::from_millis(500)), "0.5s");
        assert_eq!(css_seconds(Duration::from_secs(2)), "2s");
    }

    #[test]
    fn test_arm_and_disarm() {
        let mut scene = Scene::new(Size::new(100.0, 100.0));
        let el = scene.add_element(scene.body(), "el", Rect::ZERO);
        let args = TransitionArgs::new()
            .with_easing(Easing::Linear)
            .with_delay(Duration::from_millis(100));

        arm_transition(&mut scene, el, "left, top", &args, Duration::from_millis(500));
        assert_eq!(scene.style(el, "transition-property").as_deref(), Some("left, top"));
        assert_eq!(scene.style(el, "transition-duration").as_deref(), Some("0.5s"));
        assert_eq!(scene.style(el, "transition-timing-function").as_deref(), Some("linear"));
        assert_eq!(scene.style(el, "transition-delay").as_deref(), Some("0.1s"));

        disarm_transition(&mut scene, el);
        assert_eq!(scene.style(el, "transition-property"), None);
        assert_eq!(scene.style(el, "transition-duration").as_deref(), Some("0s"));
        assert_eq!(scene.style(el, "transition-delay"), None);
    }
}
