//! Stable textual addressing of nodes in a value tree.
//!
//! Paths are rendered the way detailed-diff consumers expect them:
//! `a.b[2].c`. Keys that are not plain identifiers are quoted, e.g.
//! `tags["kubernetes.io/name"]`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::BridgeError;

/// A single step in a [`PropertyPath`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    /// An object field or map key.
    Key(String),
    /// A list position or synthetic set index.
    Index(usize),
}

/// The address of a node in a value tree.
///
/// Ordering is segment-wise, so `tags[2]` sorts before `tags[10]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyPath {
    segments: Vec<PathSegment>,
}

impl PropertyPath {
    /// The empty path, addressing the resource itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// A single-key path.
    pub fn new(key: impl Into<String>) -> Self {
        Self::root().key(key)
    }

    /// Extend the path with a field or map key.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.into()));
        Self { segments }
    }

    /// Extend the path with a list or set index.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    /// The segments of this path.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last segment, if any.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// The top-level property this path lives under.
    pub fn top_level_key(&self) -> Option<&str> {
        match self.segments.first() {
            Some(PathSegment::Key(key)) => Some(key),
            _ => None,
        }
    }

    /// The path made of the first `len` segments.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// Whether `self` is `other` or lies beneath it.
    pub fn starts_with(&self, other: &PropertyPath) -> bool {
        self.segments.starts_with(&other.segments)
    }

    /// Parse a path rendered by the [`Display`](fmt::Display) implementation.
    pub fn parse(input: &str) -> Result<Self, BridgeError> {
        let invalid = || BridgeError::InvalidRequest(format!("invalid property path '{}'", input));
        let mut path = Self::root();
        let mut chars = input.chars().peekable();

        while let Some(&c) = chars.peek() {
            match c {
                '.' if !path.is_root() => {
                    chars.next();
                    let key = read_plain_key(&mut chars);
                    if key.is_empty() {
                        return Err(invalid());
                    }
                    path = path.key(key);
                },
                '[' => {
                    chars.next();
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        let mut key = String::new();
                        loop {
                            match chars.next() {
                                Some('\\') => key.push(chars.next().ok_or_else(invalid)?),
                                Some('"') => break,
                                Some(ch) => key.push(ch),
                                None => return Err(invalid()),
                            }
                        }
                        if chars.next() != Some(']') {
                            return Err(invalid());
                        }
                        path = path.key(key);
                    } else {
                        let mut digits = String::new();
                        while let Some(&d) = chars.peek() {
                            if d == ']' {
                                break;
                            }
                            digits.push(d);
                            chars.next();
                        }
                        if chars.next() != Some(']') {
                            return Err(invalid());
                        }
                        let index = digits.parse::<usize>().map_err(|_| invalid())?;
                        path = path.index(index);
                    }
                },
                _ if path.is_root() => {
                    let key = read_plain_key(&mut chars);
                    if key.is_empty() {
                        return Err(invalid());
                    }
                    path = path.key(key);
                },
                _ => return Err(invalid()),
            }
        }

        Ok(path)
    }
}

fn read_plain_key(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut key = String::new();
    while let Some(&c) = chars.peek() {
        if c == '.' || c == '[' {
            break;
        }
        key.push(c);
        chars.next();
    }
    key
}

fn is_plain_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '$')
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if is_plain_key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                },
                PathSegment::Key(key) => {
                    f.write_str("[\"")?;
                    for c in key.chars() {
                        if c == '"' || c == '\\' {
                            f.write_str("\\")?;
                        }
                        write!(f, "{}", c)?;
                    }
                    f.write_str("\"]")?;
                },
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

impl Serialize for PropertyPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PropertyPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        PropertyPath::parse(&raw).map_err(serde::de::Error::custom)
    }
}
