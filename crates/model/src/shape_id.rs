//! Qualified shape identifiers
//!
//! A shape ID has the form `namespace#Name` for top-level shapes and
//! `namespace#Name$member` for members.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a shape in the graph.
///
/// Stored as the full string; accessors slice out the parts. Ordering is
/// lexicographic on the full ID, which drives the deterministic emission
/// order for shapes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    pub fn new(id: impl Into<String>) -> Self {
        ShapeId(id.into())
    }

    /// ID of a member of this shape, e.g. `com.test#Foo$bar`.
    pub fn member(&self, member_name: &str) -> ShapeId {
        ShapeId(format!("{}${}", self.0, member_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Namespace part, or the whole ID if it is unqualified.
    pub fn namespace(&self) -> &str {
        match self.0.find('#') {
            Some(pos) => &self.0[..pos],
            None => &self.0,
        }
    }

    /// Shape name without namespace or member, e.g. "Foo" for
    /// "com.test#Foo$bar".
    pub fn shape_name(&self) -> &str {
        let after_hash = match self.0.find('#') {
            Some(pos) => &self.0[pos + 1..],
            None => &self.0,
        };
        match after_hash.find('$') {
            Some(pos) => &after_hash[..pos],
            None => after_hash,
        }
    }

    /// Member part, if this is a member ID.
    pub fn member_name(&self) -> Option<&str> {
        self.0.find('$').map(|pos| &self.0[pos + 1..])
    }

    /// Whether this ID is in the `smithy.api` prelude namespace.
    pub fn is_prelude(&self) -> bool {
        self.namespace() == "smithy.api"
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ShapeId {
    fn from(s: &str) -> Self {
        ShapeId(s.to_string())
    }
}

impl From<String> for ShapeId {
    fn from(s: String) -> Self {
        ShapeId(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts() {
        let id = ShapeId::new("com.amazonaws.s3#CreateBucket");
        assert_eq!(id.namespace(), "com.amazonaws.s3");
        assert_eq!(id.shape_name(), "CreateBucket");
        assert_eq!(id.member_name(), None);
    }

    #[test]
    fn test_member_id() {
        let id = ShapeId::new("com.test#Req").member("label1");
        assert_eq!(id.as_str(), "com.test#Req$label1");
        assert_eq!(id.shape_name(), "Req");
        assert_eq!(id.member_name(), Some("label1"));
    }

    #[test]
    fn test_prelude_detection() {
        assert!(ShapeId::new("smithy.api#String").is_prelude());
        assert!(!ShapeId::new("com.test#String").is_prelude());
    }
}
