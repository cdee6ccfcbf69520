//! Smithy JSON AST type definitions
//!
//! These types represent the structure of Smithy JSON AST documents
//! (`{"smithy": "2.0", "shapes": {...}}`). Shapes and members live in
//! `BTreeMap`s so that every iteration over the model is name-sorted and
//! code emission stays deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::shape_id::ShapeId;

/// Keyed trait data attached to a shape or member.
pub type TraitMap = BTreeMap<String, serde_json::Value>;

/// Root Smithy model document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmithyDocument {
    /// Smithy version (e.g., "2.0")
    pub smithy: String,

    /// Shape definitions (operations, structures, services, etc.)
    #[serde(default)]
    pub shapes: BTreeMap<ShapeId, Shape>,

    /// Metadata about the model
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Reference to another shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeRef {
    /// Target shape ID (e.g., "com.amazonaws.s3#Bucket")
    pub target: ShapeId,
}

/// Structure, union, list, set, or map member definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberShape {
    /// Target shape for this member
    pub target: ShapeId,

    /// Traits (metadata)
    #[serde(default)]
    pub traits: TraitMap,
}

/// A Smithy shape (service, operation, structure, simple type, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    /// Service definition
    Service {
        /// API version
        #[serde(default)]
        version: Option<String>,

        /// Operations exposed by this service
        #[serde(default)]
        operations: Vec<ShapeRef>,

        /// Resources managed by this service
        #[serde(default)]
        resources: Vec<ShapeRef>,

        /// Common errors attached at the service level
        #[serde(default)]
        errors: Vec<ShapeRef>,

        #[serde(default)]
        traits: TraitMap,
    },

    /// Operation definition
    Operation {
        /// Input shape
        #[serde(default)]
        input: Option<ShapeRef>,

        /// Output shape
        #[serde(default)]
        output: Option<ShapeRef>,

        /// Error shapes
        #[serde(default)]
        errors: Vec<ShapeRef>,

        #[serde(default)]
        traits: TraitMap,
    },

    /// Resource definition with lifecycle operations
    Resource {
        #[serde(default)]
        identifiers: BTreeMap<String, ShapeRef>,

        #[serde(default)]
        create: Option<ShapeRef>,

        #[serde(default)]
        read: Option<ShapeRef>,

        #[serde(default)]
        update: Option<ShapeRef>,

        #[serde(default)]
        delete: Option<ShapeRef>,

        #[serde(default)]
        list: Option<ShapeRef>,

        #[serde(default)]
        put: Option<ShapeRef>,

        #[serde(default)]
        operations: Vec<ShapeRef>,

        #[serde(default)]
        traits: TraitMap,
    },

    /// Structure definition (input/output types)
    Structure {
        /// Member fields, name-sorted
        #[serde(default)]
        members: BTreeMap<String, MemberShape>,

        #[serde(default)]
        traits: TraitMap,
    },

    /// Tagged union; exactly one member is set at a time
    Union {
        #[serde(default)]
        members: BTreeMap<String, MemberShape>,

        #[serde(default)]
        traits: TraitMap,
    },

    /// List type
    List {
        member: MemberShape,

        #[serde(default)]
        traits: TraitMap,
    },

    /// Set type (Smithy 1.0; collapses to list for serde purposes)
    Set {
        member: MemberShape,

        #[serde(default)]
        traits: TraitMap,
    },

    /// Map type; keys are always strings
    Map {
        key: MemberShape,

        value: MemberShape,

        #[serde(default)]
        traits: TraitMap,
    },

    Boolean {
        #[serde(default)]
        traits: TraitMap,
    },

    Byte {
        #[serde(default)]
        traits: TraitMap,
    },

    Short {
        #[serde(default)]
        traits: TraitMap,
    },

    Integer {
        #[serde(default)]
        traits: TraitMap,
    },

    Long {
        #[serde(default)]
        traits: TraitMap,
    },

    Float {
        #[serde(default)]
        traits: TraitMap,
    },

    Double {
        #[serde(default)]
        traits: TraitMap,
    },

    #[serde(rename = "bigInteger")]
    BigInteger {
        #[serde(default)]
        traits: TraitMap,
    },

    #[serde(rename = "bigDecimal")]
    BigDecimal {
        #[serde(default)]
        traits: TraitMap,
    },

    String {
        #[serde(default)]
        traits: TraitMap,
    },

    Blob {
        #[serde(default)]
        traits: TraitMap,
    },

    Timestamp {
        #[serde(default)]
        traits: TraitMap,
    },

    /// Untyped document value
    Document {
        #[serde(default)]
        traits: TraitMap,
    },

    /// Fallback for shape types this generator does not interpret
    #[serde(other)]
    Other,
}

/// Discriminant of a shape, used for serial-kind and symbol dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Service,
    Operation,
    Resource,
    Structure,
    Union,
    List,
    Set,
    Map,
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    BigInteger,
    BigDecimal,
    String,
    Blob,
    Timestamp,
    Document,
    Other,
}

impl ShapeType {
    /// Whether this is a list, set, or map.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            ShapeType::List | ShapeType::Set | ShapeType::Map
        )
    }
}

static EMPTY_TRAITS: std::sync::OnceLock<TraitMap> = std::sync::OnceLock::new();

impl Shape {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Shape::Service { .. } => ShapeType::Service,
            Shape::Operation { .. } => ShapeType::Operation,
            Shape::Resource { .. } => ShapeType::Resource,
            Shape::Structure { .. } => ShapeType::Structure,
            Shape::Union { .. } => ShapeType::Union,
            Shape::List { .. } => ShapeType::List,
            Shape::Set { .. } => ShapeType::Set,
            Shape::Map { .. } => ShapeType::Map,
            Shape::Boolean { .. } => ShapeType::Boolean,
            Shape::Byte { .. } => ShapeType::Byte,
            Shape::Short { .. } => ShapeType::Short,
            Shape::Integer { .. } => ShapeType::Integer,
            Shape::Long { .. } => ShapeType::Long,
            Shape::Float { .. } => ShapeType::Float,
            Shape::Double { .. } => ShapeType::Double,
            Shape::BigInteger { .. } => ShapeType::BigInteger,
            Shape::BigDecimal { .. } => ShapeType::BigDecimal,
            Shape::String { .. } => ShapeType::String,
            Shape::Blob { .. } => ShapeType::Blob,
            Shape::Timestamp { .. } => ShapeType::Timestamp,
            Shape::Document { .. } => ShapeType::Document,
            Shape::Other => ShapeType::Other,
        }
    }

    /// Trait map of this shape; empty for the `Other` fallback.
    pub fn traits(&self) -> &TraitMap {
        match self {
            Shape::Service { traits, .. }
            | Shape::Operation { traits, .. }
            | Shape::Resource { traits, .. }
            | Shape::Structure { traits, .. }
            | Shape::Union { traits, .. }
            | Shape::List { traits, .. }
            | Shape::Set { traits, .. }
            | Shape::Map { traits, .. }
            | Shape::Boolean { traits }
            | Shape::Byte { traits }
            | Shape::Short { traits }
            | Shape::Integer { traits }
            | Shape::Long { traits }
            | Shape::Float { traits }
            | Shape::Double { traits }
            | Shape::BigInteger { traits }
            | Shape::BigDecimal { traits }
            | Shape::String { traits }
            | Shape::Blob { traits }
            | Shape::Timestamp { traits }
            | Shape::Document { traits } => traits,
            Shape::Other => EMPTY_TRAITS.get_or_init(TraitMap::new),
        }
    }

    /// Structure or union members; empty for anything else.
    pub fn members(&self) -> &BTreeMap<String, MemberShape> {
        static EMPTY: std::sync::OnceLock<BTreeMap<String, MemberShape>> =
            std::sync::OnceLock::new();
        match self {
            Shape::Structure { members, .. } | Shape::Union { members, .. } => members,
            _ => EMPTY.get_or_init(BTreeMap::new),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_shapes() {
        let json = r#"{
            "type": "structure",
            "members": {
                "name": { "target": "smithy.api#String" }
            }
        }"#;

        let shape: Shape = serde_json::from_str(json).unwrap();
        assert_eq!(shape.shape_type(), ShapeType::Structure);
        assert_eq!(shape.members().len(), 1);
    }

    #[test]
    fn test_parse_big_number_shapes() {
        let shape: Shape = serde_json::from_str(r#"{ "type": "bigInteger" }"#).unwrap();
        assert_eq!(shape.shape_type(), ShapeType::BigInteger);

        let shape: Shape = serde_json::from_str(r#"{ "type": "bigDecimal" }"#).unwrap();
        assert_eq!(shape.shape_type(), ShapeType::BigDecimal);
    }

    #[test]
    fn test_unknown_shape_type_falls_back() {
        let shape: Shape = serde_json::from_str(r#"{ "type": "enum" }"#).unwrap();
        assert_eq!(shape.shape_type(), ShapeType::Other);
        assert!(shape.traits().is_empty());
    }

    #[test]
    fn test_members_are_name_sorted() {
        let json = r#"{
            "type": "structure",
            "members": {
                "zebra": { "target": "smithy.api#String" },
                "apple": { "target": "smithy.api#String" },
                "mango": { "target": "smithy.api#String" }
            }
        }"#;

        let shape: Shape = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = shape.members().keys().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["apple", "mango", "zebra"]);
    }
}
