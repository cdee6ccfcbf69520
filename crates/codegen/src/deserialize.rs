//! Document deserialization emitters
//!
//! Mirror of the serialize emitters: emits the Kotlin code that rebuilds a
//! structure from the runtime `Deserializer`, routing fields by descriptor
//! index. Sparse containers store decoded nulls; dense containers drop the
//! element and continue.

use heck::ToUpperCamelCase;

use kolibri_common::Result;
use kolibri_model::traits;
use kolibri_model::{MemberShape, Shape, ShapeId, ShapeType};

use crate::bindings::document_timestamp_format;
use crate::context::CodegenContext;
use crate::descriptors::{MemberDescriptors, StructDescriptors};
use crate::writer::CodeWriter;

/// Render the standalone document deserializer type for a nested structure
/// or union shape (`transform/<Name>DocumentDeserializer.kt`).
pub fn render_document_deserializer(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    shape_id: &ShapeId,
) -> Result<()> {
    let shape = ctx.model.expect_shape(shape_id)?;
    let symbol = ctx.symbols.shape_symbol(ctx.model, shape_id)?;
    let members = ctx.model.members_of(shape_id, shape);
    let descriptors = StructDescriptors::build(ctx.model, &members)?;

    writer.add_import_for(&symbol);
    writer.add_import("aws.smithy.kotlin.runtime.serde.Deserializer");
    add_conversion_imports(ctx, writer, &members)?;

    descriptors.render(writer)?;
    writer.write("");

    let name = shape_id.shape_name().to_upper_camel_case();
    let class_name = format!("{}DocumentDeserializer", name);

    writer.with_block(&format!("internal class {} {{", class_name), "}", |w| {
        w.with_block(
            &format!("fun deserialize(deserializer: Deserializer): {} {{", symbol.name),
            "}",
            |w| match shape {
                Shape::Union { .. } => {
                    render_union_deserialize_body(ctx, w, &name, &members, &descriptors)
                }
                _ => {
                    w.write(format!("val builder = {}.Builder()", symbol.name));
                    render_struct_deserialize_loop(ctx, w, "builder", &members, &descriptors)?;
                    w.write("return builder.build()");
                    Ok(())
                }
            },
        )
    })
}

/// Emit `deserializer.deserializeStruct(OBJ_DESCRIPTOR) { ... }` with the
/// index-dispatch loop assigning into `receiver`.
pub fn render_struct_deserialize_loop(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    receiver: &str,
    members: &[(String, ShapeId, &MemberShape)],
    descriptors: &StructDescriptors,
) -> Result<()> {
    writer.with_block("deserializer.deserializeStruct(OBJ_DESCRIPTOR) {", "}", |w| {
        w.with_block("loop@ while (true) {", "}", |w| {
            w.with_block("when (findNextFieldIndex()) {", "}", |w| {
                for (member_name, member_id, member) in members {
                    let descriptor = descriptors
                        .for_member(member_name)
                        .expect("descriptors built from the same member list");
                    render_member_arm(ctx, w, receiver, member_name, member_id, member, descriptor)?;
                }
                w.write("null -> break@loop");
                w.write("else -> skipValue()");
                Ok(())
            })
        })
    })
}

fn render_union_deserialize_body(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    union_name: &str,
    members: &[(String, ShapeId, &MemberShape)],
    descriptors: &StructDescriptors,
) -> Result<()> {
    writer.write(format!(
        "var value: {} = {}.SdkUnknown",
        union_name, union_name
    ));
    writer.with_block("deserializer.deserializeStruct(OBJ_DESCRIPTOR) {", "}", |w| {
        w.with_block("loop@ while (true) {", "}", |w| {
            w.with_block("when (findNextFieldIndex()) {", "}", |w| {
                for (member_name, member_id, member) in members {
                    let descriptor = descriptors
                        .for_member(member_name)
                        .expect("descriptors built from the same member list");
                    let variant = member_name.to_upper_camel_case();
                    let target = ctx.model.target_of(member)?;
                    if target.shape_type().is_container() {
                        w.open_block(format!(
                            "{}.index -> value = {}.{}(",
                            descriptor.root.const_name, union_name, variant
                        ));
                        render_container_deserialize(ctx, w, member_id, member, target, descriptor, 0)?;
                        w.close_block(")");
                    } else {
                        let decoded = decode_value(ctx, member_id, member, target)?;
                        w.write(format!(
                            "{}.index -> value = {}.{}({})",
                            descriptor.root.const_name, union_name, variant, decoded
                        ));
                    }
                }
                w.write("null -> break@loop");
                w.write("else -> skipValue()");
                Ok(())
            })
        })
    })?;
    writer.write("return value");
    Ok(())
}

/// One `when` arm assigning a decoded member into the builder.
fn render_member_arm(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    receiver: &str,
    member_name: &str,
    member_id: &ShapeId,
    member: &MemberShape,
    descriptor: &MemberDescriptors,
) -> Result<()> {
    let target = ctx.model.target_of(member)?;

    if target.shape_type().is_container() {
        writer.open_block(format!(
            "{}.index -> {}.{} =",
            descriptor.root.const_name, receiver, member_name
        ));
        render_container_deserialize(ctx, writer, member_id, member, target, descriptor, 0)?;
        writer.close_block("");
        Ok(())
    } else {
        let decoded = decode_value(ctx, member_id, member, target)?;
        writer.write(format!(
            "{}.index -> {}.{} = {}",
            descriptor.root.const_name, receiver, member_name, decoded
        ));
        Ok(())
    }
}

/// Decode expression for a non-container target shape.
fn decode_value(
    ctx: &CodegenContext<'_>,
    member_id: &ShapeId,
    member: &MemberShape,
    target: &Shape,
) -> Result<String> {
    Ok(match target.shape_type() {
        ShapeType::Boolean => "deserializeBoolean()".to_string(),
        ShapeType::Byte => "deserializeByte()".to_string(),
        ShapeType::Short => "deserializeShort()".to_string(),
        ShapeType::Integer => "deserializeInt()".to_string(),
        ShapeType::Long => "deserializeLong()".to_string(),
        ShapeType::Float => "deserializeFloat()".to_string(),
        ShapeType::Double => "deserializeDouble()".to_string(),
        ShapeType::BigInteger => "deserializeBigInteger()".to_string(),
        ShapeType::BigDecimal => "deserializeBigDecimal()".to_string(),
        ShapeType::String => {
            if target.traits().contains_key(traits::ENUM) {
                let name = member.target.shape_name().to_upper_camel_case();
                // Unknown wire values become SdkUnknown; never throws.
                format!("deserializeString().let {{ {}.fromValue(it) }}", name)
            } else {
                "deserializeString()".to_string()
            }
        }
        ShapeType::Blob => "deserializeString().decodeBase64Bytes()".to_string(),
        ShapeType::Timestamp => {
            let format = document_timestamp_format(ctx.model, member_id, member)?;
            format!(
                "deserializeString().let {{ Instant.{}(it) }}",
                format.parse_fn()
            )
        }
        ShapeType::Document => "deserializeDocument()".to_string(),
        ShapeType::Structure | ShapeType::Union => {
            let name = member.target.shape_name().to_upper_camel_case();
            format!("{}DocumentDeserializer().deserialize(deserializer)", name)
        }
        ShapeType::List
        | ShapeType::Set
        | ShapeType::Map
        | ShapeType::Service
        | ShapeType::Operation
        | ShapeType::Resource
        | ShapeType::Other => unreachable!("decode_value called for a container or non-data shape"),
    })
}

/// Emit a `deserializer.deserializeList/Map(...) { ... }` block expression
/// for a container member at `depth`.
fn render_container_deserialize(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    member_id: &ShapeId,
    _member: &MemberShape,
    target: &Shape,
    descriptor: &MemberDescriptors,
    depth: usize,
) -> Result<()> {
    match target {
        Shape::List { member: element, traits: t } | Shape::Set { member: element, traits: t } => {
            let sparse = t.contains_key(traits::SPARSE);
            let is_set = matches!(target, Shape::Set { .. });
            writer.with_block(
                &format!(
                    "deserializer.deserializeList({}) {{",
                    descriptor.at_depth(depth)
                ),
                "}",
                |w| {
                    render_list_loop(ctx, w, member_id, element, descriptor, depth, sparse, is_set)
                },
            )
        }
        Shape::Map { value, traits: t, .. } => {
            let sparse = t.contains_key(traits::SPARSE);
            writer.with_block(
                &format!(
                    "deserializer.deserializeMap({}) {{",
                    descriptor.at_depth(depth)
                ),
                "}",
                |w| render_map_loop(ctx, w, member_id, value, descriptor, depth, sparse),
            )
        }
        _ => unreachable!("render_container_deserialize called for a non-container"),
    }
}

#[allow(clippy::too_many_arguments)]
fn render_list_loop(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    member_id: &ShapeId,
    element: &MemberShape,
    descriptor: &MemberDescriptors,
    depth: usize,
    sparse: bool,
    is_set: bool,
) -> Result<()> {
    let col = format!("collection{}", depth);
    let el = format!("el{}", depth);
    let element_symbol = ctx.symbols.shape_symbol(ctx.model, &element.target)?;
    let element_type = if sparse {
        format!("{}?", element_symbol.name)
    } else {
        element_symbol.name.clone()
    };
    let target = ctx.model.target_of(element)?;

    writer.write(format!("val {} = mutableListOf<{}>()", col, element_type));
    writer.with_block("while (hasNextElement()) {", "}", |w| {
        if target.shape_type().is_container() {
            w.open_block(format!("val {} = if (nextHasValue()) {{", el));
            render_container_deserialize(ctx, w, member_id, element, target, descriptor, depth + 1)?;
            if sparse {
                w.close_block("} else deserializeNull()");
            } else {
                w.close_block("} else { deserializeNull(); continue }");
            }
        } else {
            let decoded = decode_value(ctx, member_id, element, target)?;
            if sparse {
                w.write(format!(
                    "val {} = if (nextHasValue()) {} else deserializeNull()",
                    el, decoded
                ));
            } else {
                w.write(format!(
                    "val {} = if (nextHasValue()) {} else {{ deserializeNull(); continue }}",
                    el, decoded
                ));
            }
        }
        w.write(format!("{}.add({})", col, el));
        Ok(())
    })?;

    if is_set {
        writer.write(format!("{}.toSet()", col));
    } else {
        writer.write(col);
    }
    Ok(())
}

fn render_map_loop(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    member_id: &ShapeId,
    value: &MemberShape,
    descriptor: &MemberDescriptors,
    depth: usize,
    sparse: bool,
) -> Result<()> {
    let col = format!("collection{}", depth);
    let key = format!("key{}", depth);
    let val = format!("value{}", depth);
    let value_symbol = ctx.symbols.shape_symbol(ctx.model, &value.target)?;
    let value_type = if sparse {
        format!("{}?", value_symbol.name)
    } else {
        value_symbol.name.clone()
    };
    let target = ctx.model.target_of(value)?;

    writer.write(format!(
        "val {} = mutableMapOf<String, {}>()",
        col, value_type
    ));
    writer.with_block("while (hasNextEntry()) {", "}", |w| {
        w.write(format!("val {} = key()", key));
        if target.shape_type().is_container() {
            w.open_block(format!("val {} = if (nextHasValue()) {{", val));
            render_container_deserialize(ctx, w, member_id, value, target, descriptor, depth + 1)?;
            if sparse {
                w.close_block("} else deserializeNull()");
            } else {
                w.close_block("} else { deserializeNull(); continue }");
            }
        } else {
            let decoded = decode_value(ctx, member_id, value, target)?;
            if sparse {
                w.write(format!(
                    "val {} = if (nextHasValue()) {} else deserializeNull()",
                    val, decoded
                ));
            } else {
                w.write(format!(
                    "val {} = if (nextHasValue()) {} else {{ deserializeNull(); continue }}",
                    val, decoded
                ));
            }
        }
        w.write(format!("{}[{}] = {}", col, key, val));
        Ok(())
    })?;

    writer.write(col);
    Ok(())
}

/// Imports for decode conversions used by the member set: the target and
/// element types themselves (enums and structs from the model package,
/// `Instant` for timestamps) plus the base64 helper for blobs.
pub fn add_conversion_imports(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    members: &[(String, ShapeId, &MemberShape)],
) -> Result<()> {
    for (_, _, member) in members {
        let symbol = ctx.symbols.shape_symbol(ctx.model, &member.target)?;
        writer.add_import_for(&symbol);

        let mut target = ctx.model.target_of(member)?;
        loop {
            if target.shape_type() == ShapeType::Blob {
                writer.add_import("aws.smithy.kotlin.runtime.util.decodeBase64Bytes");
            }
            target = match target {
                Shape::List { member, .. } | Shape::Set { member, .. } => {
                    ctx.model.target_of(member)?
                }
                Shape::Map { value, .. } => ctx.model.target_of(value)?,
                _ => break,
            };
        }
    }
    Ok(())
}
