//! Format-independent value tree
//!
//! [`Node`] is both the input value type (user settings) and the building
//! block of rendered documents. Mappings keep insertion order so that a
//! rendered document serializes in exactly the order it was assembled.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered mapping of string keys to nodes
pub type NodeMap = IndexMap<String, Node>;

/// A configuration value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Explicit null
    Null,
    /// Boolean scalar
    Bool(bool),
    /// Integer scalar
    Integer(i64),
    /// Floating point scalar
    Float(f64),
    /// String scalar
    String(String),
    /// Sequence
    List(Vec<Node>),
    /// Mapping
    Map(NodeMap),
}

impl Node {
    /// Empty mapping
    #[inline]
    #[must_use]
    pub fn map() -> Self {
        Self::Map(NodeMap::new())
    }

    /// List of string scalars
    #[must_use]
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(|s| Self::String(s.into())).collect())
    }

    /// Short type name used in diagnostics
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "mapping",
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&NodeMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Iterate string items of a list, skipping anything that is not a string
    pub fn str_items(&self) -> impl Iterator<Item = &str> {
        self.as_list()
            .unwrap_or_default()
            .iter()
            .filter_map(Node::as_str)
    }

    /// Empty list or empty mapping
    #[inline]
    #[must_use]
    pub fn is_empty_container(&self) -> bool {
        match self {
            Self::List(items) => items.is_empty(),
            Self::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    /// True when the node holds nothing but (nested) empty containers
    #[must_use]
    pub fn is_hollow(&self) -> bool {
        match self {
            Self::List(items) => items.iter().all(Node::is_hollow),
            Self::Map(map) => map.values().all(Node::is_hollow),
            _ => false,
        }
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<NodeMap> for Node {
    fn from(value: NodeMap) -> Self {
        Self::Map(value)
    }
}

impl From<Vec<Node>> for Node {
    fn from(value: Vec<Node>) -> Self {
        Self::List(value)
    }
}
