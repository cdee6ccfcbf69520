//! Shape-graph traversal
//!
//! Depth-first walking from seed shapes along filtered edges. The visited
//! set bounds re-entry, so recursive models terminate.

use std::collections::BTreeSet;

use kolibri_common::Result;

use crate::ast::Shape;
use crate::model::Model;
use crate::shape_id::ShapeId;

/// Kind of edge between a shape and a neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipType {
    StructureMember,
    UnionMember,
    ListMember,
    SetMember,
    MapKey,
    MapValue,
    MemberTarget,
    OperationInput,
    OperationOutput,
    OperationError,
}

/// Walk the graph depth-first from `seeds`, following only edges accepted
/// by `edge_filter`. Returns every visited shape, seeds included.
pub fn walk_from(
    model: &Model,
    seeds: &[ShapeId],
    edge_filter: impl Fn(RelationshipType) -> bool,
) -> Result<BTreeSet<ShapeId>> {
    let mut visited: BTreeSet<ShapeId> = BTreeSet::new();
    let mut stack: Vec<ShapeId> = seeds.to_vec();

    while let Some(id) = stack.pop() {
        if !visited.insert(id.clone()) {
            continue;
        }

        let shape = model.expect_shape(&id)?;
        for (rel, target) in neighbors(shape) {
            if edge_filter(rel) && edge_filter(RelationshipType::MemberTarget) {
                stack.push(target);
            }
        }
    }

    Ok(visited)
}

fn neighbors(shape: &Shape) -> Vec<(RelationshipType, ShapeId)> {
    match shape {
        Shape::Structure { members, .. } => members
            .values()
            .map(|m| (RelationshipType::StructureMember, m.target.clone()))
            .collect(),
        Shape::Union { members, .. } => members
            .values()
            .map(|m| (RelationshipType::UnionMember, m.target.clone()))
            .collect(),
        Shape::List { member, .. } => {
            vec![(RelationshipType::ListMember, member.target.clone())]
        }
        Shape::Set { member, .. } => {
            vec![(RelationshipType::SetMember, member.target.clone())]
        }
        Shape::Map { key, value, .. } => vec![
            (RelationshipType::MapKey, key.target.clone()),
            (RelationshipType::MapValue, value.target.clone()),
        ],
        Shape::Operation {
            input,
            output,
            errors,
            ..
        } => {
            let mut edges = Vec::new();
            if let Some(input) = input {
                edges.push((RelationshipType::OperationInput, input.target.clone()));
            }
            if let Some(output) = output {
                edges.push((RelationshipType::OperationOutput, output.target.clone()));
            }
            for error in errors {
                edges.push((RelationshipType::OperationError, error.target.clone()));
            }
            edges
        }
        _ => Vec::new(),
    }
}

/// Whether an edge participates in document serde: member targets through
/// structures, unions, lists, sets, and map values. Map keys are always
/// strings and never carry document serde of their own.
pub fn serde_edge(rel: RelationshipType) -> bool {
    matches!(
        rel,
        RelationshipType::StructureMember
            | RelationshipType::UnionMember
            | RelationshipType::ListMember
            | RelationshipType::SetMember
            | RelationshipType::MapValue
            | RelationshipType::MemberTarget
    )
}

/// Nested structure and union shapes reachable from `seeds` along
/// serde-relevant edges, excluding the seeds themselves.
///
/// Seeds are operation inputs (serialization side) or outputs plus errors
/// (deserialization side); each shape in the returned set gets a standalone
/// document serializer or deserializer in the `transform` package.
pub fn serde_closure(model: &Model, seeds: &[ShapeId]) -> Result<BTreeSet<ShapeId>> {
    let visited = walk_from(model, seeds, serde_edge)?;

    Ok(visited
        .into_iter()
        .filter(|id| !seeds.contains(id))
        .filter(|id| {
            matches!(
                model.get_shape(id),
                Some(Shape::Structure { .. }) | Some(Shape::Union { .. })
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NESTED: &str = r#"{
        "smithy": "2.0",
        "shapes": {
            "com.test#Req": {
                "type": "structure",
                "members": {
                    "payload3": { "target": "com.test#Nested" },
                    "tags": { "target": "com.test#TagList" }
                }
            },
            "com.test#Nested": {
                "type": "structure",
                "members": {
                    "inner": { "target": "com.test#Inner" }
                }
            },
            "com.test#Inner": {
                "type": "structure",
                "members": {
                    "x": { "target": "smithy.api#Integer" }
                }
            },
            "com.test#TagList": {
                "type": "list",
                "member": { "target": "com.test#Tag" }
            },
            "com.test#Tag": {
                "type": "structure",
                "members": {
                    "key": { "target": "smithy.api#String" }
                }
            },
            "smithy.api#Integer": { "type": "integer" },
            "smithy.api#String": { "type": "string" }
        }
    }"#;

    #[test]
    fn test_serde_closure_collects_nested_structs() {
        let model = Model::from_json(NESTED).unwrap();
        let seeds = vec![ShapeId::new("com.test#Req")];
        let closure = serde_closure(&model, &seeds).unwrap();

        let ids: Vec<&str> = closure.iter().map(|id| id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["com.test#Inner", "com.test#Nested", "com.test#Tag"]
        );
    }

    #[test]
    fn test_closure_excludes_seeds() {
        let model = Model::from_json(NESTED).unwrap();
        let seeds = vec![ShapeId::new("com.test#Req")];
        let closure = serde_closure(&model, &seeds).unwrap();
        assert!(!closure.contains(&ShapeId::new("com.test#Req")));
    }

    #[test]
    fn test_recursive_model_terminates() {
        let json = r#"{
            "smithy": "2.0",
            "shapes": {
                "com.test#Node": {
                    "type": "structure",
                    "members": {
                        "next": { "target": "com.test#Node" },
                        "value": { "target": "smithy.api#String" }
                    }
                },
                "smithy.api#String": { "type": "string" }
            }
        }"#;

        let model = Model::from_json(json).unwrap();
        let visited = walk_from(&model, &[ShapeId::new("com.test#Node")], serde_edge).unwrap();
        assert_eq!(visited.len(), 2);
    }
}
