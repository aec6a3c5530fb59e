//! Drag source and drop target configuration.
//!
//! Configuration structs are plain serde types with the engine's defaults, so
//! they can be built in code or loaded from TOML:
//!
//! ```
//! use dragline::{Channel, DragAxis, DragSourceConfig};
//!
//! let config = DragSourceConfig::from_toml(r#"
//!     tolerance = 8
//!     axis = "horizontal"
//!     channel = ["rows", "columns"]
//!     ghost = false
//! "#).unwrap();
//!
//! assert_eq!(config.tolerance, 8.0);
//! assert_eq!(config.axis, DragAxis::Horizontal);
//! assert_eq!(config.channel, Channel::many(["rows", "columns"]));
//! ```
//!
//! Element references (handles, ghost host, ghost template, scroll container)
//! are not configuration: they are set on [`DragSource`](crate::DragSource)
//! directly.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::error::Result;
use crate::strategy::DropStrategy;

/// Axes along which a drag source may move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragAxis {
    Vertical,
    Horizontal,
    #[default]
    Both,
}

impl DragAxis {
    pub fn allows_x(self) -> bool {
        self != Self::Vertical
    }

    pub fn allows_y(self) -> bool {
        self != Self::Horizontal
    }
}

/// Edge auto-scrolling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutoScrollConfig {
    /// Distance from a scrollable edge, in pixels, that triggers scrolling.
    pub threshold: f64,
    /// Pixels scrolled per tick.
    pub step: f64,
    /// Milliseconds between ticks.
    pub interval_ms: u64,
}

impl Default for AutoScrollConfig {
    fn default() -> Self {
        Self {
            threshold: 25.0,
            step: 5.0,
            interval_ms: 10,
        }
    }
}

impl AutoScrollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Configuration for one drag source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DragSourceConfig {
    /// Pixels the pointer must travel on a permitted axis before a press
    /// becomes a drag.
    pub tolerance: f64,
    pub axis: DragAxis,
    #[serde(skip_serializing_if = "Channel::is_unset")]
    pub channel: Channel,
    /// Drag a floating clone instead of translating the element itself.
    pub ghost: bool,
    /// Class added to the ghost.
    pub ghost_class: Option<String>,
    /// Ghost x offset from the pointer. Defaults to where the pointer grabbed
    /// the element.
    pub ghost_offset_x: Option<f64>,
    /// Ghost y offset from the pointer.
    pub ghost_offset_y: Option<f64>,
    /// Duration of `transition_to*` animations without an explicit duration.
    pub return_duration_ms: u64,
    pub auto_scroll: AutoScrollConfig,
}

impl Default for DragSourceConfig {
    fn default() -> Self {
        Self {
            tolerance: 5.0,
            axis: DragAxis::Both,
            channel: Channel::Unset,
            ghost: true,
            ghost_class: None,
            ghost_offset_x: None,
            ghost_offset_y: None,
            return_duration_ms: 500,
            auto_scroll: AutoScrollConfig::default(),
        }
    }
}

impl DragSourceConfig {
    /// Parse a configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_axis(mut self, axis: DragAxis) -> Self {
        self.axis = axis;
        self
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_ghost(mut self, ghost: bool) -> Self {
        self.ghost = ghost;
        self
    }

    pub fn with_ghost_class(mut self, class: impl Into<String>) -> Self {
        self.ghost_class = Some(class.into());
        self
    }

    /// Override where the ghost sits relative to the pointer.
    pub fn with_ghost_offset(mut self, x: Option<f64>, y: Option<f64>) -> Self {
        self.ghost_offset_x = x;
        self.ghost_offset_y = y;
        self
    }

    pub fn with_return_duration(mut self, duration: Duration) -> Self {
        self.return_duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_auto_scroll(mut self, auto_scroll: AutoScrollConfig) -> Self {
        self.auto_scroll = auto_scroll;
        self
    }

    pub fn return_duration(&self) -> Duration {
        Duration::from_millis(self.return_duration_ms)
    }
}

/// Configuration for one drop target.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DropTargetConfig {
    #[serde(skip_serializing_if = "Channel::is_unset")]
    pub channel: Channel,
    pub strategy: DropStrategy,
}

impl DropTargetConfig {
    /// Parse a configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_strategy(mut self, strategy: DropStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}
