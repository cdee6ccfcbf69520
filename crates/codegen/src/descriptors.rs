//! Serde field and object descriptors
//!
//! The generated serde code routes fields through runtime descriptor
//! constants: one `SdkFieldDescriptor` per member plus synthetic
//! descriptors for each nesting level of container members, and one
//! `SdkObjectDescriptor` listing the direct fields. A descriptor's index
//! equals its position in the member-name-sorted field list; the emitted
//! deserializer dispatches on that index.

use heck::ToShoutySnakeCase;

use kolibri_common::{CodegenError, Result};
use kolibri_model::{traits, MemberShape, Model, Shape, ShapeId, ShapeType};

use crate::writer::CodeWriter;

/// Wire-kind tag carried by a field descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialKind {
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    String,
    Blob,
    Timestamp,
    Document,
    BigNumber,
    List,
    Map,
    Struct,
}

impl SerialKind {
    /// Kind for a target shape. Sets collapse to lists; enums are strings
    /// on the wire; unions are structs.
    pub fn of(shape: &Shape, shape_id: &ShapeId) -> Result<SerialKind> {
        let kind = match shape.shape_type() {
            ShapeType::Boolean => SerialKind::Boolean,
            ShapeType::Byte => SerialKind::Byte,
            ShapeType::Short => SerialKind::Short,
            ShapeType::Integer => SerialKind::Integer,
            ShapeType::Long => SerialKind::Long,
            ShapeType::Float => SerialKind::Float,
            ShapeType::Double => SerialKind::Double,
            ShapeType::BigInteger | ShapeType::BigDecimal => SerialKind::BigNumber,
            ShapeType::String => SerialKind::String,
            ShapeType::Blob => SerialKind::Blob,
            ShapeType::Timestamp => SerialKind::Timestamp,
            ShapeType::Document => SerialKind::Document,
            ShapeType::List | ShapeType::Set => SerialKind::List,
            ShapeType::Map => SerialKind::Map,
            ShapeType::Structure | ShapeType::Union => SerialKind::Struct,
            ShapeType::Service
            | ShapeType::Operation
            | ShapeType::Resource
            | ShapeType::Other => {
                return Err(CodegenError::UnknownSerialKind(shape_id.to_string()))
            }
        };
        Ok(kind)
    }

    /// Kotlin runtime constant, e.g. `SerialKind.Integer`.
    pub fn runtime_name(&self) -> &'static str {
        match self {
            SerialKind::Boolean => "SerialKind.Boolean",
            SerialKind::Byte => "SerialKind.Byte",
            SerialKind::Short => "SerialKind.Short",
            SerialKind::Integer => "SerialKind.Integer",
            SerialKind::Long => "SerialKind.Long",
            SerialKind::Float => "SerialKind.Float",
            SerialKind::Double => "SerialKind.Double",
            SerialKind::String => "SerialKind.String",
            SerialKind::Blob => "SerialKind.Blob",
            SerialKind::Timestamp => "SerialKind.Timestamp",
            SerialKind::Document => "SerialKind.Document",
            SerialKind::BigNumber => "SerialKind.BigNumber",
            SerialKind::List => "SerialKind.List",
            SerialKind::Map => "SerialKind.Map",
            SerialKind::Struct => "SerialKind.Struct",
        }
    }
}

/// Descriptor for a direct field of a struct.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Kotlin constant name, e.g. `PAYLOAD1_DESCRIPTOR`
    pub const_name: String,
    /// Serialized name: `@jsonName` value or the member name
    pub serial_name: String,
    pub kind: SerialKind,
    /// Position in the member-name-sorted field list
    pub index: usize,
}

/// Synthetic descriptor for one nesting level of a container member.
#[derive(Debug, Clone)]
pub struct SyntheticDescriptor {
    /// Kotlin constant name, e.g. `FOO_C0_DESCRIPTOR`, `FOO_C0_C1_DESCRIPTOR`
    pub const_name: String,
    pub serial_name: String,
    pub kind: SerialKind,
}

/// All descriptors for one member: the root field plus one synthetic per
/// container nesting level.
#[derive(Debug, Clone)]
pub struct MemberDescriptors {
    pub member_name: String,
    pub root: FieldDescriptor,
    pub synthetics: Vec<SyntheticDescriptor>,
}

impl MemberDescriptors {
    /// Descriptor constant to use at `depth`: the root at depth 0, then
    /// the synthetics.
    pub fn at_depth(&self, depth: usize) -> &str {
        if depth == 0 {
            &self.root.const_name
        } else {
            &self.synthetics[depth - 1].const_name
        }
    }
}

/// Descriptor set for one emitted struct.
#[derive(Debug, Clone)]
pub struct StructDescriptors {
    pub members: Vec<MemberDescriptors>,
}

impl StructDescriptors {
    /// Build descriptors for the given members (already name-sorted).
    pub fn build(
        model: &Model,
        members: &[(String, ShapeId, &MemberShape)],
    ) -> Result<StructDescriptors> {
        let mut out = Vec::with_capacity(members.len());

        for (index, (member_name, member_id, member)) in members.iter().enumerate() {
            let target = model.target_of(member)?;
            let serial_name = traits::json_name(&member.traits)
                .unwrap_or(member_name)
                .to_string();
            let base = member_name.to_shouty_snake_case();

            let root = FieldDescriptor {
                const_name: format!("{}_DESCRIPTOR", base),
                serial_name: serial_name.clone(),
                kind: SerialKind::of(target, member_id)?,
                index,
            };

            // One synthetic descriptor per container level, named by the
            // accumulated nesting path (FOO_C0, FOO_C0_C1, ...).
            let mut synthetics = Vec::new();
            let mut path = base.clone();
            let mut depth = 0;
            let mut current = target;
            loop {
                let child = match current {
                    Shape::List { member, .. } | Shape::Set { member, .. } => &member.target,
                    Shape::Map { value, .. } => &value.target,
                    _ => break,
                };
                let child_shape = model.expect_shape(child)?;
                path = format!("{}_C{}", path, depth);
                synthetics.push(SyntheticDescriptor {
                    const_name: format!("{}_DESCRIPTOR", path),
                    serial_name: serial_name.clone(),
                    kind: SerialKind::of(child_shape, child)?,
                });
                depth += 1;
                current = child_shape;
            }

            out.push(MemberDescriptors {
                member_name: member_name.clone(),
                root,
                synthetics,
            });
        }

        Ok(StructDescriptors { members: out })
    }

    /// Descriptors for one member by name.
    pub fn for_member(&self, member_name: &str) -> Option<&MemberDescriptors> {
        self.members.iter().find(|m| m.member_name == member_name)
    }

    /// Emit the descriptor constants and the object descriptor.
    pub fn render(&self, writer: &mut CodeWriter) -> Result<()> {
        writer.add_import("aws.smithy.kotlin.runtime.serde.SdkFieldDescriptor");
        writer.add_import("aws.smithy.kotlin.runtime.serde.SdkObjectDescriptor");
        writer.add_import("aws.smithy.kotlin.runtime.serde.SerialKind");
        writer.add_dependency("aws.smithy.kotlin:serde");

        for member in &self.members {
            writer.write(format!(
                "private val {} = SdkFieldDescriptor(\"{}\", {})",
                member.root.const_name,
                member.root.serial_name,
                member.root.kind.runtime_name()
            ));
            for synthetic in &member.synthetics {
                writer.write(format!(
                    "private val {} = SdkFieldDescriptor(\"{}\", {})",
                    synthetic.const_name,
                    synthetic.serial_name,
                    synthetic.kind.runtime_name()
                ));
            }
        }

        writer.with_block("private val OBJ_DESCRIPTOR = SdkObjectDescriptor.build {", "}", |w| {
            for member in &self.members {
                w.write(format!("field({})", member.root.const_name));
            }
            Ok(())
        })
    }
}
