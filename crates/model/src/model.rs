//! Queryable shape graph
//!
//! `Model` wraps a parsed Smithy document and exposes the read-only queries
//! the generator components run: shape lookup, trait checks, member and
//! operation walking. The graph is immutable once integration preprocessing
//! has completed.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::warn;

use kolibri_common::{CodegenError, Result};

use crate::ast::{MemberShape, Shape, ShapeRef, SmithyDocument};
use crate::shape_id::ShapeId;

/// Immutable Smithy shape graph.
#[derive(Debug, Clone)]
pub struct Model {
    doc: SmithyDocument,
}

impl Model {
    /// Load a Smithy JSON AST model from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            CodegenError::Parse(format!(
                "Failed to read Smithy model {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse a Smithy JSON AST model from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: SmithyDocument = serde_json::from_str(json)
            .map_err(|e| CodegenError::Parse(format!("Failed to parse Smithy JSON: {}", e)))?;

        if !doc.smithy.starts_with("1.") && !doc.smithy.starts_with("2.") {
            warn!("unrecognized Smithy version `{}`", doc.smithy);
        }

        Ok(Model { doc })
    }

    /// Smithy version declared by the document.
    pub fn smithy_version(&self) -> &str {
        &self.doc.smithy
    }

    /// All shapes, name-sorted.
    pub fn shapes(&self) -> &BTreeMap<ShapeId, Shape> {
        &self.doc.shapes
    }

    /// Look up a shape, `None` if absent. Prelude shapes the document does
    /// not define resolve against the synthesized `smithy.api` table.
    pub fn get_shape(&self, id: &ShapeId) -> Option<&Shape> {
        self.doc.shapes.get(id).or_else(|| {
            if id.is_prelude() {
                crate::prelude::prelude_shape(id.shape_name())
            } else {
                None
            }
        })
    }

    /// Look up a shape, failing with `UnknownShape` if absent.
    pub fn expect_shape(&self, id: &ShapeId) -> Result<&Shape> {
        self.get_shape(id)
            .ok_or_else(|| CodegenError::UnknownShape(id.to_string()))
    }

    /// Target shape of a member, failing with `UnknownShape` if dangling.
    pub fn target_of(&self, member: &MemberShape) -> Result<&Shape> {
        self.expect_shape(&member.target)
    }

    /// Whether `shape` carries the trait `trait_id`.
    pub fn has_trait(&self, shape: &Shape, trait_id: &str) -> bool {
        shape.traits().contains_key(trait_id)
    }

    /// Trait data for `trait_id` on `shape`, if present.
    pub fn get_trait<'a>(&self, shape: &'a Shape, trait_id: &str) -> Option<&'a serde_json::Value> {
        shape.traits().get(trait_id)
    }

    /// Ordered members of a structure or union, with their member IDs.
    ///
    /// `BTreeMap` iteration gives the member-name-sorted order every
    /// emitter relies on.
    pub fn members_of<'a>(
        &self,
        shape_id: &ShapeId,
        shape: &'a Shape,
    ) -> Vec<(String, ShapeId, &'a MemberShape)> {
        shape
            .members()
            .iter()
            .map(|(name, member)| (name.clone(), shape_id.member(name), member))
            .collect()
    }

    /// The single service shape of the model.
    pub fn expect_service(&self, service_id: &ShapeId) -> Result<&Shape> {
        let shape = self.expect_shape(service_id)?;
        match shape {
            Shape::Service { .. } => Ok(shape),
            _ => Err(CodegenError::UnknownShape(format!(
                "{} is not a service",
                service_id
            ))),
        }
    }

    /// Find the first service shape, if any. Used when the settings omit an
    /// explicit service ID.
    pub fn find_service(&self) -> Option<(&ShapeId, &Shape)> {
        self.doc
            .shapes
            .iter()
            .find(|(_, shape)| matches!(shape, Shape::Service { .. }))
    }

    /// All operations of a service, including those reached through
    /// resources, sorted by shape ID.
    pub fn service_operations(&self, service_id: &ShapeId) -> Result<Vec<ShapeId>> {
        let service = self.expect_service(service_id)?;
        let (operations, resources) = match service {
            Shape::Service {
                operations,
                resources,
                ..
            } => (operations, resources),
            _ => unreachable!("expect_service returned a non-service"),
        };

        let mut ids: Vec<ShapeId> = operations.iter().map(|r| r.target.clone()).collect();
        for resource in resources {
            self.collect_resource_operations(&resource.target, &mut ids)?;
        }

        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    fn collect_resource_operations(
        &self,
        resource_id: &ShapeId,
        out: &mut Vec<ShapeId>,
    ) -> Result<()> {
        let shape = self.expect_shape(resource_id)?;
        if let Shape::Resource {
            create,
            read,
            update,
            delete,
            list,
            put,
            operations,
            ..
        } = shape
        {
            let lifecycle: [&Option<ShapeRef>; 6] = [create, read, update, delete, list, put];
            for op in lifecycle.into_iter().flatten() {
                out.push(op.target.clone());
            }
            for op in operations {
                out.push(op.target.clone());
            }
        } else {
            warn!("service references non-resource shape {}", resource_id);
        }
        Ok(())
    }

    /// Input, output, and error structure IDs of an operation. The empty
    /// `smithy.api#Unit` marker counts as no input/output.
    pub fn operation_signature(
        &self,
        op_id: &ShapeId,
    ) -> Result<(Option<ShapeId>, Option<ShapeId>, Vec<ShapeId>)> {
        fn non_unit(shape_ref: &Option<ShapeRef>) -> Option<ShapeId> {
            shape_ref
                .as_ref()
                .map(|r| r.target.clone())
                .filter(|id| id.as_str() != "smithy.api#Unit")
        }

        match self.expect_shape(op_id)? {
            Shape::Operation {
                input,
                output,
                errors,
                ..
            } => Ok((
                non_unit(input),
                non_unit(output),
                errors.iter().map(|r| r.target.clone()).collect(),
            )),
            _ => Err(CodegenError::UnknownShape(format!(
                "{} is not an operation",
                op_id
            ))),
        }
    }

    /// Replace the shape table. Only the integration preprocessing phase may
    /// call this; afterwards the graph is immutable.
    pub fn with_shapes(mut self, shapes: BTreeMap<ShapeId, Shape>) -> Self {
        self.doc.shapes = shapes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "smithy": "2.0",
        "shapes": {
            "com.test#Example": {
                "type": "service",
                "version": "1.0.0",
                "operations": [ { "target": "com.test#GetFoo" } ]
            },
            "com.test#GetFoo": {
                "type": "operation",
                "input": { "target": "com.test#GetFooRequest" }
            },
            "com.test#GetFooRequest": {
                "type": "structure",
                "members": {
                    "id": { "target": "smithy.api#String" }
                }
            },
            "smithy.api#String": { "type": "string" }
        }
    }"#;

    #[test]
    fn test_parse_minimal_model() {
        let model = Model::from_json(MINIMAL).unwrap();
        assert_eq!(model.smithy_version(), "2.0");
        assert_eq!(model.shapes().len(), 4);
    }

    #[test]
    fn test_expect_shape_unknown() {
        let model = Model::from_json(MINIMAL).unwrap();
        let err = model
            .expect_shape(&ShapeId::new("com.test#Nope"))
            .unwrap_err();
        assert_eq!(err.code(), "E_UNKNOWN_SHAPE");
    }

    #[test]
    fn test_service_operations() {
        let model = Model::from_json(MINIMAL).unwrap();
        let ops = model
            .service_operations(&ShapeId::new("com.test#Example"))
            .unwrap();
        assert_eq!(ops, vec![ShapeId::new("com.test#GetFoo")]);
    }

    #[test]
    fn test_operation_signature() {
        let model = Model::from_json(MINIMAL).unwrap();
        let (input, output, errors) = model
            .operation_signature(&ShapeId::new("com.test#GetFoo"))
            .unwrap();
        assert_eq!(input, Some(ShapeId::new("com.test#GetFooRequest")));
        assert_eq!(output, None);
        assert!(errors.is_empty());
    }
}
