//! Document paths for addressing nodes inside a configuration tree
//!
//! Provides [`DocPath`] for hierarchical addressing of values within a
//! [`ConfigDocument`](crate::ConfigDocument).

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// One step of a [`DocPath`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// Mapping key
    Key(String),
    /// List position
    Index(usize),
}

impl Segment {
    /// Key segment
    #[inline]
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }

    /// Key text, if this is a key segment
    #[inline]
    #[must_use]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Self::Key(key) => Some(key),
            Self::Index(_) => None,
        }
    }
}

/// Path within a configuration document
///
/// Keys are separated by `.`, list positions are written `[n]`, and keys that
/// themselves contain `.` are double-quoted.
///
/// # Examples
/// - `cors.policies[0].origins`
/// - `connectors.sources."products.v1".$config`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DocPath(Vec<Segment>);

impl DocPath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    /// Empty path (document root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a key segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(Segment::Key(key.into()));
        new
    }

    /// Append an index segment, returning new path
    #[inline]
    #[must_use]
    pub fn item(&self, index: usize) -> Self {
        let mut new = self.clone();
        new.0.push(Segment::Index(index));
        new
    }

    /// Split into the segments before `at` and the segments from `at` on
    #[must_use]
    pub fn split_at(&self, at: usize) -> (Self, Self) {
        let at = at.min(self.0.len());
        (Self(self.0[..at].to_vec()), Self(self.0[at..].to_vec()))
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0 == other.0[..self.0.len()]
    }

    /// Rewrite every key segment, keeping indices as they are
    ///
    /// # Errors
    /// Returns the first error produced by `f`
    pub fn map_keys<E>(&self, mut f: impl FnMut(&str) -> Result<String, E>) -> Result<Self, E> {
        self.0
            .iter()
            .map(|seg| match seg {
                Segment::Key(key) => f(key).map(Segment::Key),
                Segment::Index(i) => Ok(Segment::Index(*i)),
            })
            .collect::<Result<Vec<_>, E>>()
            .map(Self)
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.0.iter()
    }
}

fn needs_quotes(key: &str) -> bool {
    key.is_empty() || key.contains(['.', '[', ']', '"'])
}

impl Display for DocPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                Segment::Index(index) => write!(f, "[{index}]")?,
                Segment::Key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    if needs_quotes(key) {
                        write!(f, "\"{key}\"")?;
                    } else {
                        f.write_str(key)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl FromStr for DocPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        let mut chars = s.chars().peekable();
        // A key is expected at the start and after every `.`
        let mut expect_key = !s.is_empty();

        while expect_key || chars.peek().is_some() {
            if expect_key {
                let key = if chars.peek() == Some(&'"') {
                    chars.next();
                    let mut key = String::new();
                    loop {
                        match chars.next() {
                            Some('"') => break,
                            Some(c) => key.push(c),
                            None => return Err(PathError::UnterminatedQuote(s.to_string())),
                        }
                    }
                    key
                } else {
                    let mut key = String::new();
                    while let Some(&c) = chars.peek() {
                        if c == '.' || c == '[' {
                            break;
                        }
                        if c == ']' || c == '"' {
                            return Err(PathError::InvalidSegment(s.to_string()));
                        }
                        key.push(c);
                        chars.next();
                    }
                    if key.is_empty() {
                        return Err(PathError::EmptySegment);
                    }
                    key
                };
                segments.push(Segment::Key(key));
                expect_key = false;
                continue;
            }

            match chars.next() {
                Some('.') => {
                    expect_key = true;
                    if chars.peek().is_none() {
                        return Err(PathError::EmptySegment);
                    }
                }
                Some('[') => {
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(c) if c.is_ascii_digit() => digits.push(c),
                            _ => return Err(PathError::InvalidIndex(s.to_string())),
                        }
                    }
                    let index = digits
                        .parse()
                        .map_err(|_| PathError::InvalidIndex(s.to_string()))?;
                    segments.push(Segment::Index(index));
                }
                _ => return Err(PathError::InvalidSegment(s.to_string())),
            }
        }

        Ok(Self(segments))
    }
}

/// Errors related to document paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Stray bracket or quote
    #[error("invalid segment in path: {0}")]
    InvalidSegment(String),

    /// List index is not a number
    #[error("invalid list index in path: {0}")]
    InvalidIndex(String),

    /// Quoted key never closed
    #[error("unterminated quote in path: {0}")]
    UnterminatedQuote(String),
}
