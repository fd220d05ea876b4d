//! Hierarchical content paths
//!
//! A [`ContentPath`] addresses a node in the content tree. Its canonical
//! string form is `/` for the root and `/a/b/c` otherwise.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("empty segment in content path: {0:?}")]
    EmptySegment(String),
    #[error("invalid segment {segment:?} in content path {path:?}")]
    InvalidSegment { path: String, segment: String },
}

/// A slash-delimited path into the content tree.
///
/// Ordering is lexicographic over the segment sequence, so a parent always
/// sorts before its descendants.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentPath {
    segments: Vec<String>,
}

impl ContentPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path string.
    ///
    /// `""` and `"/"` both name the root. A single leading and trailing slash
    /// are tolerated; empty inner segments, `.` and `..` are rejected.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            if segment.is_empty() {
                return Err(PathError::EmptySegment(path.to_string()));
            }
            if segment == "." || segment == ".." || segment.contains('\\') {
                return Err(PathError::InvalidSegment {
                    path: path.to_string(),
                    segment: segment.to_string(),
                });
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last segment, or `""` for the root.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The parent path. The root is its own parent.
    pub fn parent(&self) -> ContentPath {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    pub fn child(&self, segment: impl Into<String>) -> ContentPath {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// True if `prefix` is this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &ContentPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// All paths from the root down to and including this one.
    pub fn ancestry(&self) -> Vec<ContentPath> {
        (0..=self.segments.len())
            .map(|len| Self {
                segments: self.segments[..len].to_vec(),
            })
            .collect()
    }
}

impl fmt::Display for ContentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for ContentPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ContentPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContentPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ContentPath::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_round_trip() {
        for raw in ["/", "/blog", "/blog/post-1", "/a/b/@body", "/x/y/z/w"] {
            let path = ContentPath::parse(raw).unwrap();
            assert_eq!(path.to_string(), raw);
        }
    }

    #[test]
    fn test_root() {
        assert!(ContentPath::parse("/").unwrap().is_root());
        assert!(ContentPath::parse("").unwrap().is_root());
        assert!(!ContentPath::parse("/blog").unwrap().is_root());
        assert_eq!(ContentPath::root().parent(), ContentPath::root());
        assert_eq!(ContentPath::root().name(), "");
    }

    #[test]
    fn test_lenient_slashes() {
        assert_eq!(
            ContentPath::parse("blog/post-1/").unwrap(),
            ContentPath::parse("/blog/post-1").unwrap()
        );
    }

    #[test]
    fn test_rejects_bad_segments() {
        assert!(matches!(
            ContentPath::parse("/a//b"),
            Err(PathError::EmptySegment(_))
        ));
        assert!(ContentPath::parse("/a/../b").is_err());
        assert!(ContentPath::parse("/a/./b").is_err());
        assert!(ContentPath::parse("/a\\b").is_err());
    }

    #[test]
    fn test_parent_child() {
        let blog = ContentPath::parse("/blog").unwrap();
        let post = blog.child("post-1");
        assert_eq!(post.to_string(), "/blog/post-1");
        assert_eq!(post.parent(), blog);
        assert_eq!(post.name(), "post-1");
        assert!(post.starts_with(&blog));
        assert!(post.starts_with(&ContentPath::root()));
        assert!(!blog.starts_with(&post));
    }

    #[test]
    fn test_ordering_by_segments() {
        let mut paths: Vec<ContentPath> = ["/b", "/a/z", "/", "/a"]
            .iter()
            .map(|p| ContentPath::parse(p).unwrap())
            .collect();
        paths.sort();
        let rendered: Vec<String> = paths.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["/", "/a", "/a/z", "/b"]);
    }

    #[test]
    fn test_ancestry() {
        let path = ContentPath::parse("/blog/post-1").unwrap();
        let ancestry: Vec<String> = path.ancestry().iter().map(ToString::to_string).collect();
        assert_eq!(ancestry, vec!["/", "/blog", "/blog/post-1"]);
    }

    #[test]
    fn test_serde_as_string() {
        let path = ContentPath::parse("/blog/post-1").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"/blog/post-1\"");
        let back: ContentPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
