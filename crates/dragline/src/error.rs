//! Error types for the drag/drop engine.
//!
//! Gesture-level problems are never errors: vetoes roll back, and operations
//! invoked in the wrong state are silent no-ops. Errors are reserved for the
//! boundary, where a caller passes an id or configuration that cannot work.

use crate::drag::SourceId;
use crate::drop::TargetId;
use crate::viewport::ElementId;

/// Result type alias for drag/drop operations.
pub type Result<T> = std::result::Result<T, DragDropError>;

/// Errors surfaced by the drag/drop manager and configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum DragDropError {
    /// No drag source is registered under this id.
    #[error("unknown drag source {0:?}")]
    UnknownSource(SourceId),

    /// No drop target is registered under this id.
    #[error("unknown drop target {0:?}")]
    UnknownTarget(TargetId),

    /// The element already backs a drop target.
    #[error("element {0:?} is already a drop target")]
    DuplicateTarget(ElementId),

    /// A configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// A transition timing function was not recognized.
    #[error("invalid easing '{0}'")]
    InvalidEasing(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    #[test]
    fn test_error_display() {
        let err = DragDropError::InvalidEasing("bounce".into());
        assert_eq!(err.to_string(), "invalid easing 'bounce'");

        let err = DragDropError::UnknownSource(SourceId::from(KeyData::from_ffi(1)));
        assert!(err.to_string().starts_with("unknown drag source"));
    }

    #[test]
    fn test_config_error_from_toml() {
        let parse: std::result::Result<toml::Value, _> = toml::from_str("tolerance = ");
        let err = DragDropError::from(parse.unwrap_err());
        assert!(err.to_string().starts_with("invalid configuration:"));
    }
}
