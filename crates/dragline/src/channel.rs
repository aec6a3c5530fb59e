//! Channel linkage between drag sources and drop targets.
//!
//! A channel restricts which drop targets a drag source may link to. Either
//! side may carry a single id or a list of ids; a link exists when any id on
//! one side equals any id on the other. Two unset channels link to each other
//! and to nothing else.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One channel identifier.
///
/// Strings and numbers never compare equal: `"1"` does not link with `1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelId {
    Num(i64),
    Str(String),
}

impl From<&str> for ChannelId {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for ChannelId {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ChannelId {
    fn from(value: i64) -> Self {
        Self::Num(value)
    }
}

impl From<i32> for ChannelId {
    fn from(value: i32) -> Self {
        Self::Num(value.into())
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// The channel value of a drag source or drop target.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Channel {
    /// No channel configured.
    #[default]
    Unset,
    /// A single id.
    One(ChannelId),
    /// A list of ids.
    Many(Vec<ChannelId>),
}

impl Channel {
    /// Create a single-id channel.
    pub fn one(id: impl Into<ChannelId>) -> Self {
        Self::One(id.into())
    }

    /// Create a list channel.
    pub fn many<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ChannelId>,
    {
        Self::Many(ids.into_iter().map(Into::into).collect())
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    fn ids(&self) -> &[ChannelId] {
        match self {
            Self::Unset => &[],
            Self::One(id) => std::slice::from_ref(id),
            Self::Many(ids) => ids,
        }
    }

    /// Whether a source on `self` may link to a target on `other`.
    pub fn is_linked(&self, other: &Channel) -> bool {
        match (self, other) {
            (Self::Unset, Self::Unset) => true,
            (Self::Unset, _) | (_, Self::Unset) => false,
            _ => self.ids().iter().any(|id| other.ids().contains(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_source_scalar_target() {
        let source = Channel::many(["a", "b"]);
        let target = Channel::one("b");
        assert!(source.is_linked(&target));
        assert!(target.is_linked(&source));
    }

    #[test]
    fn test_scalar_source_list_target_disjoint() {
        let source = Channel::one("a");
        let target = Channel::many(["b", "c"]);
        assert!(!source.is_linked(&target));
    }

    #[test]
    fn test_scalars() {
        assert!(Channel::one(1).is_linked(&Channel::one(1)));
        assert!(!Channel::one(1).is_linked(&Channel::one("1")));
    }

    #[test]
    fn test_unset() {
        assert!(Channel::Unset.is_linked(&Channel::Unset));
        assert!(!Channel::Unset.is_linked(&Channel::one("a")));
        assert!(!Channel::many(["a"]).is_linked(&Channel::Unset));
        assert!(!Channel::many(Vec::<ChannelId>::new()).is_linked(&Channel::many(["a"])));
    }

    #[test]
    fn test_deserialize_shapes() {
        let scalar: Channel = serde_json::from_str(r#""rows""#).unwrap();
        assert_eq!(scalar, Channel::one("rows"));

        let number: Channel = serde_json::from_str("7").unwrap();
        assert_eq!(number, Channel::one(7));

        let mixed: Channel = serde_json::from_str(r#"["rows", 2]"#).unwrap();
        assert_eq!(mixed, Channel::Many(vec!["rows".into(), 2.into()]));

        assert!(serde_json::from_str::<Channel>(r#"{"a": 1}"#).is_err());
    }
}
