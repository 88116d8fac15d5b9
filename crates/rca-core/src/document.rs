//! Rendered configuration document
//!
//! [`ConfigDocument`] is an ordered tree rooted at a mapping. It knows nothing
//! about router versions; the adapter decides which paths get written.

use std::str::FromStr;

use serde::Serialize;

use crate::digest::DocumentDigest;
use crate::error::DocumentError;
use crate::node::{Node, NodeMap};
use crate::path::{DocPath, Segment};

/// Configuration document tree
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ConfigDocument {
    root: NodeMap,
}

impl ConfigDocument {
    /// Create empty document
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level mapping
    #[inline]
    #[must_use]
    pub fn root(&self) -> &NodeMap {
        &self.root
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Parse from YAML string
    ///
    /// # Errors
    /// Returns error if YAML is invalid or the root is not a mapping
    pub fn from_yaml(yaml: &str) -> Result<Self, DocumentError> {
        Self::from_node(serde_yaml::from_str(yaml)?)
    }

    /// Parse from JSON string
    ///
    /// # Errors
    /// Returns error if JSON is invalid or the root is not a mapping
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Self::from_node(serde_json::from_str(json)?)
    }

    fn from_node(node: Node) -> Result<Self, DocumentError> {
        match node {
            Node::Map(root) => Ok(Self { root }),
            Node::Null => Ok(Self::new()),
            other => Err(DocumentError::NotAMapping(other.type_name())),
        }
    }

    /// Serialize to YAML string
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_yaml(&self) -> Result<String, DocumentError> {
        Ok(serde_yaml::to_string(&self.root)?)
    }

    /// Serialize to pretty JSON string
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    /// Blake3 digest of the YAML serialization
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn digest(&self) -> Result<DocumentDigest, DocumentError> {
        Ok(DocumentDigest::compute(self.to_yaml()?.as_bytes()))
    }

    /// Get value at path
    #[must_use]
    pub fn get(&self, path: &DocPath) -> Option<&Node> {
        let (first, rest) = path.segments().split_first()?;
        let mut current = self.root.get(first.as_key()?)?;
        for seg in rest {
            current = match (seg, current) {
                (Segment::Key(key), Node::Map(map)) => map.get(key)?,
                (Segment::Index(i), Node::List(items)) => items.get(*i)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Get value at a textual path; malformed paths yield `None`
    #[must_use]
    pub fn get_str(&self, path: &str) -> Option<&Node> {
        DocPath::from_str(path).ok().and_then(|p| self.get(&p))
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, path: &DocPath) -> bool {
        self.get(path).is_some()
    }

    /// Insert value at path, creating intermediate mappings and lists
    ///
    /// A mapping written over an existing mapping is merged key by key. Any
    /// other overlap with existing content is a conflict: nothing already in
    /// the document is ever replaced. List positions may only address an
    /// existing element or append one.
    ///
    /// # Errors
    /// Returns [`DocumentError::Conflict`] on overlap or a gap in a list
    pub fn insert(&mut self, path: &DocPath, node: Node) -> Result<(), DocumentError> {
        tracing::trace!(path = %path, "insert");
        let Some((first, rest)) = path.segments().split_first() else {
            return match node {
                Node::Map(map) => {
                    for (key, value) in map {
                        self.insert(&DocPath::root().child(key), value)?;
                    }
                    Ok(())
                }
                other => Err(DocumentError::NotAMapping(other.type_name())),
            };
        };
        let Segment::Key(key) = first else {
            return Err(DocumentError::Conflict(path.to_string()));
        };
        place_in_map(&mut self.root, key, rest, node, path)
    }

    /// Remove value at path
    ///
    /// Containers left holding nothing are pruned on the way back up, and
    /// trailing hollow list elements are popped. Removing a whole list
    /// element is only allowed for the last one, so that indices of the
    /// remaining elements stay stable.
    pub fn remove(&mut self, path: &DocPath) -> Option<Node> {
        let (first, rest) = path.segments().split_first()?;
        let key = first.as_key()?;
        if rest.is_empty() {
            return self.root.shift_remove(key);
        }
        let child = self.root.get_mut(key)?;
        let removed = take(child, rest)?;
        if child.is_hollow() {
            self.root.shift_remove(key);
        }
        Some(removed)
    }

    /// Path of the first value that is not an empty container
    ///
    /// Used to find content nobody claimed.
    #[must_use]
    pub fn first_content_path(&self) -> Option<DocPath> {
        self.root
            .iter()
            .find(|(_, node)| !node.is_hollow())
            .map(|(key, node)| descend(DocPath::root().child(key.clone()), node))
    }

    /// Paths of every empty mapping and empty list, in document order
    ///
    /// [`remove`](Self::remove) prunes these along with the containers it
    /// empties itself, so callers that need to tell the two apart collect
    /// them up front.
    #[must_use]
    pub fn empty_container_paths(&self) -> Vec<DocPath> {
        let mut found = Vec::new();
        for (key, node) in &self.root {
            collect_empty(DocPath::root().child(key.clone()), node, &mut found);
        }
        found
    }
}

fn place_in_map(
    map: &mut NodeMap,
    key: &str,
    rest: &[Segment],
    node: Node,
    full: &DocPath,
) -> Result<(), DocumentError> {
    if let Some(child) = map.get_mut(key) {
        place(child, rest, node, full)
    } else {
        map.insert(key.to_string(), build(rest, node, full)?);
        Ok(())
    }
}

fn place(
    slot: &mut Node,
    rest: &[Segment],
    node: Node,
    full: &DocPath,
) -> Result<(), DocumentError> {
    let Some((seg, tail)) = rest.split_first() else {
        return merge_into(slot, node, full);
    };
    match (seg, slot) {
        (Segment::Key(key), Node::Map(map)) => place_in_map(map, key, tail, node, full),
        (Segment::Index(i), Node::List(items)) => {
            if let Some(child) = items.get_mut(*i) {
                place(child, tail, node, full)
            } else if *i == items.len() {
                items.push(build(tail, node, full)?);
                Ok(())
            } else {
                Err(DocumentError::Conflict(full.to_string()))
            }
        }
        _ => Err(DocumentError::Conflict(full.to_string())),
    }
}

/// Build a fresh subtree holding `node` at `rest`
fn build(rest: &[Segment], node: Node, full: &DocPath) -> Result<Node, DocumentError> {
    match rest.split_first() {
        None => Ok(node),
        Some((Segment::Key(key), tail)) => {
            let mut map = NodeMap::new();
            map.insert(key.clone(), build(tail, node, full)?);
            Ok(Node::Map(map))
        }
        Some((Segment::Index(0), tail)) => Ok(Node::List(vec![build(tail, node, full)?])),
        Some((Segment::Index(_), _)) => Err(DocumentError::Conflict(full.to_string())),
    }
}

fn merge_into(slot: &mut Node, node: Node, full: &DocPath) -> Result<(), DocumentError> {
    match (slot, node) {
        (Node::Map(existing), Node::Map(incoming)) => {
            for (key, value) in incoming {
                if let Some(child) = existing.get_mut(&key) {
                    merge_into(child, value, &full.child(key))?;
                } else {
                    existing.insert(key, value);
                }
            }
            Ok(())
        }
        _ => Err(DocumentError::Conflict(full.to_string())),
    }
}

fn take(node: &mut Node, rest: &[Segment]) -> Option<Node> {
    let (seg, tail) = rest.split_first()?;
    match (seg, node) {
        (Segment::Key(key), Node::Map(map)) => {
            if tail.is_empty() {
                return map.shift_remove(key);
            }
            let child = map.get_mut(key)?;
            let removed = take(child, tail)?;
            if child.is_hollow() {
                map.shift_remove(key);
            }
            Some(removed)
        }
        (Segment::Index(i), Node::List(items)) => {
            let removed = if tail.is_empty() {
                if items.len().checked_sub(1) != Some(*i) {
                    return None;
                }
                items.pop()?
            } else {
                take(items.get_mut(*i)?, tail)?
            };
            while items.last().is_some_and(Node::is_hollow) {
                items.pop();
            }
            Some(removed)
        }
        _ => None,
    }
}

fn descend(path: DocPath, node: &Node) -> DocPath {
    match node {
        Node::Map(map) => match map.iter().find(|(_, child)| !child.is_hollow()) {
            Some((key, child)) => descend(path.child(key.clone()), child),
            None => path,
        },
        Node::List(items) => match items.iter().position(|child| !child.is_hollow()) {
            Some(i) => descend(path.item(i), &items[i]),
            None => path,
        },
        _ => path,
    }
}

fn collect_empty(path: DocPath, node: &Node, found: &mut Vec<DocPath>) {
    match node {
        _ if node.is_empty_container() => found.push(path),
        Node::Map(map) => {
            for (key, child) in map {
                collect_empty(path.child(key.clone()), child, found);
            }
        }
        Node::List(items) => {
            for (i, child) in items.iter().enumerate() {
                collect_empty(path.item(i), child, found);
            }
        }
        _ => {}
    }
}
