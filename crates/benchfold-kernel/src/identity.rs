//! Stable identities for result-tree nodes.
//!
//! A node's identity is derived from its fully-qualified dotted name path
//! and nothing else. Two independent parses of two different builds that
//! produce the same logical result therefore agree on its identity, which
//! is what lets the history engine line samples up across builds.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Identity key of a group or value, reproducible from its name path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StableHash(pub String);

impl StableHash {
    /// Hash an already-joined dotted path.
    pub fn from_dotted(path: &str) -> Self {
        let hash = Sha256::digest(path.as_bytes());
        Self(format!("{hash:x}"))
    }

    /// Hash a name path given as its segments, root first.
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        NamePath::from_segments(segments).stable_hash()
    }

    /// Short prefix for human-facing output.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(12);
        &self.0[..end]
    }
}

impl fmt::Display for StableHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fully-qualified dotted name path, root first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamePath {
    segments: Vec<String>,
}

impl NamePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        Self {
            segments: segments.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    /// Path extended by one segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }

    pub fn stable_hash(&self) -> StableHash {
        StableHash::from_dotted(&self.dotted())
    }
}

impl fmt::Display for NamePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.dotted())
        }
    }
}
