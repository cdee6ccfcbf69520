//! Document serialization emitters
//!
//! Recursively emits the Kotlin code that serializes a structure's members
//! and nested containers through the runtime `Serializer` API. Identifier
//! names (`el0`, `key0`, `value0`, ...) are parameterized on nesting depth
//! so recursive descent never shadows an outer binding.

use heck::ToUpperCamelCase;

use kolibri_common::Result;
use kolibri_model::traits;
use kolibri_model::{MemberShape, Model, Shape, ShapeId, ShapeType};

use crate::bindings::document_timestamp_format;
use crate::context::CodegenContext;
use crate::descriptors::{MemberDescriptors, StructDescriptors};
use crate::writer::CodeWriter;

/// Render the standalone document serializer type for a nested structure
/// or union shape (`transform/<Name>DocumentSerializer.kt`).
pub fn render_document_serializer(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    shape_id: &ShapeId,
) -> Result<()> {
    let shape = ctx.model.expect_shape(shape_id)?;
    let symbol = ctx.symbols.shape_symbol(ctx.model, shape_id)?;
    let members = ctx.model.members_of(shape_id, shape);
    let descriptors = StructDescriptors::build(ctx.model, &members)?;

    writer.add_import_for(&symbol);
    writer.add_import("aws.smithy.kotlin.runtime.serde.SdkSerializable");
    writer.add_import("aws.smithy.kotlin.runtime.serde.Serializer");

    let (uses_time, uses_base64) = uses_time_or_encoding(ctx.model, &members)?;
    if uses_time {
        writer.add_import("aws.smithy.kotlin.runtime.time.TimestampFormat");
    }
    if uses_base64 {
        writer.add_import("aws.smithy.kotlin.runtime.util.encodeBase64String");
    }

    descriptors.render(writer)?;
    writer.write("");

    let class_name = format!("{}DocumentSerializer", shape_id.shape_name().to_upper_camel_case());
    writer.with_block(
        &format!(
            "internal class {}(val input: {}) : SdkSerializable {{",
            class_name, symbol.name
        ),
        "}",
        |w| {
            w.with_block("override fun serialize(serializer: Serializer) {", "}", |w| {
                match shape {
                    Shape::Union { .. } => {
                        render_union_body(ctx, w, shape_id, &members, &descriptors)
                    }
                    _ => render_struct_body(ctx, w, &members, &descriptors, false),
                }
            })
        },
    )
}

/// Render `serializer.serializeStruct(OBJ_DESCRIPTOR) { ... }` for a
/// structure's members. `context_available` enables idempotency-token
/// fallbacks, which need the operation execution context.
pub fn render_struct_body(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    members: &[(String, ShapeId, &MemberShape)],
    descriptors: &StructDescriptors,
    context_available: bool,
) -> Result<()> {
    writer.with_block("serializer.serializeStruct(OBJ_DESCRIPTOR) {", "}", |w| {
        for (member_name, member_id, member) in members {
            let descriptor = descriptors
                .for_member(member_name)
                .expect("descriptors built from the same member list");
            render_member(ctx, w, member_name, member_id, member, descriptor, context_available)?;
        }
        Ok(())
    })
}

fn render_union_body(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    union_id: &ShapeId,
    members: &[(String, ShapeId, &MemberShape)],
    descriptors: &StructDescriptors,
) -> Result<()> {
    let union_name = union_id.shape_name().to_upper_camel_case();
    writer.with_block("serializer.serializeStruct(OBJ_DESCRIPTOR) {", "}", |w| {
        w.with_block("when (input) {", "}", |w| {
            for (member_name, member_id, member) in members {
                let descriptor = descriptors
                    .for_member(member_name)
                    .expect("descriptors built from the same member list");
                let variant = member_name.to_upper_camel_case();
                let target = ctx.model.target_of(member)?;
                if target.shape_type().is_container() {
                    w.open_block(format!("is {}.{} -> {{", union_name, variant));
                    render_container_field(ctx, w, member_id, target, descriptor, "input.value")?;
                    w.close_block("}");
                } else {
                    let encoded =
                        encoded_value(ctx.model, member_id, member, target, "input.value")?;
                    let call = field_call(ctx.model, member_id, member, target, descriptor, &encoded)?;
                    w.write(format!("is {}.{} -> {}", union_name, variant, call));
                }
            }
            w.write(format!(
                "is {}.SdkUnknown -> error(\"cannot serialize SdkUnknown\")",
                union_name
            ));
            Ok(())
        })
    })
}

/// Emit serialization of one member inside a `serializeStruct` block.
#[allow(clippy::too_many_arguments)]
fn render_member(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    member_name: &str,
    member_id: &ShapeId,
    member: &MemberShape,
    descriptor: &MemberDescriptors,
    context_available: bool,
) -> Result<()> {
    let target = ctx.model.target_of(member)?;
    let symbol = ctx.symbols.member_symbol(ctx.model, member_id, member)?;
    let access = format!("input.{}", member_name);

    if target.shape_type().is_container() {
        if symbol.nullable {
            writer.open_block(format!("if ({} != null) {{", access));
            render_container_field(ctx, writer, member_id, target, descriptor, &access)?;
            writer.close_block("}");
        } else {
            render_container_field(ctx, writer, member_id, target, descriptor, &access)?;
        }
        return Ok(());
    }

    let idempotency_token =
        context_available && member.traits.contains_key(traits::IDEMPOTENCY_TOKEN);

    if symbol.nullable {
        let encoded = encoded_value(ctx.model, member_id, member, target, "it")?;
        let call = field_call(ctx.model, member_id, member, target, descriptor, &encoded)?;
        if idempotency_token {
            // Tokens are auto-generated when absent so one is always sent.
            writer.write(format!(
                "{}?.let {{ {} }} ?: field({}, context.idempotencyTokenProvider.generateToken())",
                access, call, descriptor.root.const_name
            ));
        } else {
            writer.write(format!("{}?.let {{ {} }}", access, call));
        }
    } else {
        let encoded = encoded_value(ctx.model, member_id, member, target, &access)?;
        let call = field_call(ctx.model, member_id, member, target, descriptor, &encoded)?;
        writer.write(call);
    }

    Ok(())
}

/// `field(...)`/`rawField(...)` call for a non-container member value.
fn field_call(
    model: &Model,
    member_id: &ShapeId,
    member: &MemberShape,
    target: &Shape,
    descriptor: &MemberDescriptors,
    encoded: &str,
) -> Result<String> {
    let descr = &descriptor.root.const_name;
    match target.shape_type() {
        ShapeType::Timestamp => {
            let format = document_timestamp_format(model, member_id, member)?;
            if format.is_numeric() {
                // Numeric timestamp encodings must not be quoted.
                Ok(format!("rawField({}, {})", descr, encoded))
            } else {
                Ok(format!("field({}, {})", descr, encoded))
            }
        }
        _ => Ok(format!("field({}, {})", descr, encoded)),
    }
}

/// Expression serializing `expr` for a non-container target shape.
fn encoded_value(
    model: &Model,
    member_id: &ShapeId,
    member: &MemberShape,
    target: &Shape,
    expr: &str,
) -> Result<String> {
    Ok(match target.shape_type() {
        ShapeType::String => {
            if target.traits().contains_key(traits::ENUM) {
                format!("{}.value", expr)
            } else {
                expr.to_string()
            }
        }
        ShapeType::Blob => format!("{}.encodeBase64String()", expr),
        ShapeType::Timestamp => {
            let format = document_timestamp_format(model, member_id, member)?;
            format!("{}.format(TimestampFormat.{})", expr, format.runtime_name())
        }
        ShapeType::Structure | ShapeType::Union => {
            let name = member.target.shape_name().to_upper_camel_case();
            format!("{}DocumentSerializer({})", name, expr)
        }
        _ => expr.to_string(),
    })
}

/// Emit a `listField`/`mapField` block for a container member and recurse
/// through its nesting levels.
fn render_container_field(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    member_id: &ShapeId,
    target: &Shape,
    descriptor: &MemberDescriptors,
    access: &str,
) -> Result<()> {
    match target {
        Shape::List { member: element, traits: t } | Shape::Set { member: element, traits: t } => {
            let sparse = t.contains_key(traits::SPARSE);
            writer.open_block(format!("listField({}) {{", descriptor.root.const_name));
            render_list_elements(ctx, writer, member_id, element, descriptor, access, 0, sparse)?;
            writer.close_block("}");
        }
        Shape::Map { value, traits: t, .. } => {
            let sparse = t.contains_key(traits::SPARSE);
            writer.open_block(format!("mapField({}) {{", descriptor.root.const_name));
            render_map_entries(ctx, writer, member_id, value, descriptor, access, 0, sparse)?;
            writer.close_block("}");
        }
        _ => unreachable!("render_container_field called for a non-container"),
    }
    Ok(())
}

/// Emit the `for (elN in ...)` loop of a list at `depth`.
#[allow(clippy::too_many_arguments)]
fn render_list_elements(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    member_id: &ShapeId,
    element: &MemberShape,
    descriptor: &MemberDescriptors,
    access: &str,
    depth: usize,
    sparse: bool,
) -> Result<()> {
    let el = format!("el{}", depth);
    let target = ctx.model.target_of(element)?;

    writer.with_block(&format!("for ({} in {}) {{", el, access), "}", |w| {
        if target.shape_type().is_container() {
            render_nested_container(ctx, w, member_id, target, descriptor, &el, depth + 1)
        } else {
            let serialized = element_serialize_call(ctx.model, member_id, element, target, &el)?;
            if sparse {
                w.write(format!(
                    "if ({} == null) serializeNull({}) else {}",
                    el,
                    descriptor.at_depth(depth),
                    serialized
                ));
            } else {
                w.write(serialized);
            }
            Ok(())
        }
    })
}

/// Emit the `forEach { (keyN, valueN) -> ... }` body of a map at `depth`.
#[allow(clippy::too_many_arguments)]
fn render_map_entries(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    member_id: &ShapeId,
    value: &MemberShape,
    descriptor: &MemberDescriptors,
    access: &str,
    depth: usize,
    sparse: bool,
) -> Result<()> {
    let key = format!("key{}", depth);
    let val = format!("value{}", depth);
    let target = ctx.model.target_of(value)?;

    if target.shape_type().is_container() {
        writer.with_block(
            &format!("{}.forEach {{ ({}, {}) ->", access, key, val),
            "}",
            |w| {
                let entry_kind = match target.shape_type() {
                    ShapeType::Map => "mapEntry",
                    _ => "listEntry",
                };
                w.open_block(format!(
                    "{}({}, {}) {{",
                    entry_kind,
                    key,
                    descriptor.at_depth(depth + 1)
                ));
                match target {
                    Shape::List { member: element, traits: t }
                    | Shape::Set { member: element, traits: t } => {
                        let inner_sparse = t.contains_key(traits::SPARSE);
                        render_list_elements(
                            ctx, w, member_id, element, descriptor, &val, depth + 1, inner_sparse,
                        )?;
                    }
                    Shape::Map { value: inner, traits: t, .. } => {
                        let inner_sparse = t.contains_key(traits::SPARSE);
                        render_map_entries(
                            ctx, w, member_id, inner, descriptor, &val, depth + 1, inner_sparse,
                        )?;
                    }
                    _ => unreachable!(),
                }
                w.close_block("}");
                Ok(())
            },
        )
    } else {
        let encoded = encoded_value(ctx.model, member_id, value, target, &val)?;
        let entry = format!("entry({}, {})", key, encoded);
        if sparse {
            writer.write(format!(
                "{}.forEach {{ ({}, {}) -> if ({} == null) serializeNull({}) else {} }}",
                access,
                key,
                val,
                val,
                descriptor.at_depth(depth),
                entry
            ));
        } else {
            writer.write(format!(
                "{}.forEach {{ ({}, {}) -> {} }}",
                access, key, val, entry
            ));
        }
        Ok(())
    }
}

/// A nested container element inside a list: a fresh serializer scope over
/// the synthetic descriptor for that level.
#[allow(clippy::too_many_arguments)]
fn render_nested_container(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    member_id: &ShapeId,
    target: &Shape,
    descriptor: &MemberDescriptors,
    access: &str,
    depth: usize,
) -> Result<()> {
    match target {
        Shape::List { member: element, traits: t } | Shape::Set { member: element, traits: t } => {
            let sparse = t.contains_key(traits::SPARSE);
            writer.with_block(
                &format!("serializer.serializeList({}) {{", descriptor.at_depth(depth)),
                "}",
                |w| {
                    render_list_elements(ctx, w, member_id, element, descriptor, access, depth, sparse)
                },
            )
        }
        Shape::Map { value, traits: t, .. } => {
            let sparse = t.contains_key(traits::SPARSE);
            writer.with_block(
                &format!("serializer.serializeMap({}) {{", descriptor.at_depth(depth)),
                "}",
                |w| render_map_entries(ctx, w, member_id, value, descriptor, access, depth, sparse),
            )
        }
        _ => unreachable!("render_nested_container called for a non-container"),
    }
}

/// In-list serialization call for a non-container element.
fn element_serialize_call(
    model: &Model,
    member_id: &ShapeId,
    element: &MemberShape,
    target: &Shape,
    expr: &str,
) -> Result<String> {
    Ok(match target.shape_type() {
        ShapeType::Boolean => format!("serializeBoolean({})", expr),
        ShapeType::Byte => format!("serializeByte({})", expr),
        ShapeType::Short => format!("serializeShort({})", expr),
        ShapeType::Integer => format!("serializeInt({})", expr),
        ShapeType::Long => format!("serializeLong({})", expr),
        ShapeType::Float => format!("serializeFloat({})", expr),
        ShapeType::Double => format!("serializeDouble({})", expr),
        ShapeType::BigInteger => format!("serializeBigInteger({})", expr),
        ShapeType::BigDecimal => format!("serializeBigDecimal({})", expr),
        ShapeType::String => {
            if target.traits().contains_key(traits::ENUM) {
                format!("serializeString({}.value)", expr)
            } else {
                format!("serializeString({})", expr)
            }
        }
        ShapeType::Blob => format!("serializeString({}.encodeBase64String())", expr),
        ShapeType::Timestamp => {
            let format = document_timestamp_format(model, member_id, element)?;
            format!(
                "serializeInstant({}, TimestampFormat.{})",
                expr,
                format.runtime_name()
            )
        }
        ShapeType::Document => format!("serializeDocument({})", expr),
        ShapeType::Structure | ShapeType::Union => {
            let name = element.target.shape_name().to_upper_camel_case();
            format!("serializeSdkSerializable({}DocumentSerializer({}))", name, expr)
        }
        ShapeType::List
        | ShapeType::Set
        | ShapeType::Map
        | ShapeType::Service
        | ShapeType::Operation
        | ShapeType::Resource
        | ShapeType::Other => {
            unreachable!("element_serialize_call called for a container or non-data shape")
        }
    })
}

/// Whether any member (transitively through containers) is a timestamp or
/// blob, for import tracking.
pub fn uses_time_or_encoding(
    model: &Model,
    members: &[(String, ShapeId, &MemberShape)],
) -> Result<(bool, bool)> {
    let mut uses_time = false;
    let mut uses_base64 = false;
    for (_, _, member) in members {
        let mut target = model.target_of(member)?;
        loop {
            match target.shape_type() {
                ShapeType::Timestamp => uses_time = true,
                ShapeType::Blob => uses_base64 = true,
                _ => {}
            }
            target = match target {
                Shape::List { member, .. } | Shape::Set { member, .. } => {
                    model.target_of(member)?
                }
                Shape::Map { value, .. } => model.target_of(value)?,
                _ => break,
            };
        }
    }
    Ok((uses_time, uses_base64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_util::test_context;

    fn render(model_json: &str, shape: &str) -> String {
        let (model, settings, symbols) = test_context(model_json);
        let ctx = CodegenContext {
            model: &model,
            settings: &settings,
            symbols: &symbols,
            service_id: ShapeId::new("com.test#Example"),
        };
        let mut writer = CodeWriter::new("com.test.example.transform", "Test.kt");
        render_document_serializer(&ctx, &mut writer, &ShapeId::new(shape)).unwrap();
        writer.finalize().unwrap()
    }

    #[test]
    fn test_simple_struct_serializer() {
        let out = render(
            r#"{
                "smithy": "2.0",
                "shapes": {
                    "com.test#Nested": {
                        "type": "structure",
                        "members": {
                            "nestedField1": { "target": "smithy.api#String" }
                        }
                    }
                }
            }"#,
            "com.test#Nested",
        );

        assert!(out.contains("internal class NestedDocumentSerializer(val input: Nested) : SdkSerializable {"));
        assert!(out.contains("serializer.serializeStruct(OBJ_DESCRIPTOR) {"));
        assert!(out.contains("input.nestedField1?.let { field(NESTEDFIELD1_DESCRIPTOR, it) }"));
    }

    #[test]
    fn test_sparse_list_serializer() {
        let out = render(
            r#"{
                "smithy": "2.0",
                "shapes": {
                    "com.test#S": {
                        "type": "structure",
                        "members": { "l": { "target": "com.test#L" } }
                    },
                    "com.test#L": {
                        "type": "list",
                        "member": { "target": "smithy.api#Integer" },
                        "traits": { "smithy.api#sparse": {} }
                    }
                }
            }"#,
            "com.test#S",
        );

        assert!(out.contains("if (input.l != null) {"));
        assert!(out.contains("listField(L_DESCRIPTOR) {"));
        assert!(out.contains("for (el0 in input.l) {"));
        assert!(out.contains("if (el0 == null) serializeNull(L_DESCRIPTOR) else serializeInt(el0)"));
    }

    #[test]
    fn test_dense_map_of_structs_serializer() {
        let out = render(
            r#"{
                "smithy": "2.0",
                "shapes": {
                    "com.test#S": {
                        "type": "structure",
                        "members": { "m": { "target": "com.test#M" } }
                    },
                    "com.test#M": {
                        "type": "map",
                        "key": { "target": "smithy.api#String" },
                        "value": { "target": "com.test#V" }
                    },
                    "com.test#V": {
                        "type": "structure",
                        "members": { "x": { "target": "smithy.api#Integer" } }
                    }
                }
            }"#,
            "com.test#S",
        );

        assert!(out.contains("mapField(M_DESCRIPTOR) {"));
        assert!(out
            .contains("input.m.forEach { (key0, value0) -> entry(key0, VDocumentSerializer(value0)) }"));
    }

    #[test]
    fn test_sparse_map_of_integers_serializer() {
        let out = render(
            r#"{
                "smithy": "2.0",
                "shapes": {
                    "com.test#S": {
                        "type": "structure",
                        "members": { "m": { "target": "com.test#M" } }
                    },
                    "com.test#M": {
                        "type": "map",
                        "key": { "target": "smithy.api#String" },
                        "value": { "target": "smithy.api#Integer" },
                        "traits": { "smithy.api#sparse": {} }
                    }
                }
            }"#,
            "com.test#S",
        );

        assert!(out.contains("mapField(M_DESCRIPTOR) {"));
        assert!(out.contains(
            "input.m.forEach { (key0, value0) -> if (value0 == null) serializeNull(M_DESCRIPTOR) else entry(key0, value0) }"
        ));
    }

    #[test]
    fn test_timestamp_formats() {
        let out = render(
            r#"{
                "smithy": "2.0",
                "shapes": {
                    "com.test#S": {
                        "type": "structure",
                        "members": {
                            "a": {
                                "target": "smithy.api#Timestamp",
                                "traits": { "smithy.api#timestampFormat": "epoch-seconds" }
                            },
                            "b": {
                                "target": "smithy.api#Timestamp",
                                "traits": { "smithy.api#timestampFormat": "date-time" }
                            },
                            "c": {
                                "target": "smithy.api#Timestamp",
                                "traits": { "smithy.api#timestampFormat": "http-date" }
                            }
                        }
                    }
                }
            }"#,
            "com.test#S",
        );

        assert!(out.contains(
            "input.a?.let { rawField(A_DESCRIPTOR, it.format(TimestampFormat.EPOCH_SECONDS)) }"
        ));
        assert!(out
            .contains("input.b?.let { field(B_DESCRIPTOR, it.format(TimestampFormat.ISO_8601)) }"));
        assert!(out
            .contains("input.c?.let { field(C_DESCRIPTOR, it.format(TimestampFormat.RFC_5322)) }"));
    }

    #[test]
    fn test_nested_struct_field() {
        let out = render(
            r#"{
                "smithy": "2.0",
                "shapes": {
                    "com.test#Req": {
                        "type": "structure",
                        "members": {
                            "payload3": { "target": "com.test#Nested" }
                        }
                    },
                    "com.test#Nested": {
                        "type": "structure",
                        "members": { "nestedField1": { "target": "smithy.api#String" } }
                    }
                }
            }"#,
            "com.test#Req",
        );

        assert!(out
            .contains("input.payload3?.let { field(PAYLOAD3_DESCRIPTOR, NestedDocumentSerializer(it)) }"));
    }

    #[test]
    fn test_enum_member_serializes_value() {
        let out = render(
            r#"{
                "smithy": "2.0",
                "shapes": {
                    "com.test#S": {
                        "type": "structure",
                        "members": { "v": { "target": "com.test#Yn" } }
                    },
                    "com.test#Yn": {
                        "type": "string",
                        "traits": {
                            "smithy.api#enum": [
                                { "value": "YES", "name": "YES" },
                                { "value": "NO", "name": "NO" }
                            ]
                        }
                    }
                }
            }"#,
            "com.test#S",
        );

        assert!(out.contains("input.v?.let { field(V_DESCRIPTOR, it.value) }"));
    }

    #[test]
    fn test_union_serializer_dispatches_variants() {
        let out = render(
            r#"{
                "smithy": "2.0",
                "shapes": {
                    "com.test#U": {
                        "type": "union",
                        "members": {
                            "str": { "target": "smithy.api#String" },
                            "num": { "target": "smithy.api#Integer" }
                        }
                    }
                }
            }"#,
            "com.test#U",
        );

        assert!(out.contains("when (input) {"));
        assert!(out.contains("is U.Num -> field(NUM_DESCRIPTOR, input.value)"));
        assert!(out.contains("is U.Str -> field(STR_DESCRIPTOR, input.value)"));
        assert!(out.contains("is U.SdkUnknown -> error(\"cannot serialize SdkUnknown\")"));
    }

    #[test]
    fn test_nested_list_of_lists() {
        let out = render(
            r#"{
                "smithy": "2.0",
                "shapes": {
                    "com.test#S": {
                        "type": "structure",
                        "members": { "grid": { "target": "com.test#Outer" } }
                    },
                    "com.test#Outer": {
                        "type": "list",
                        "member": { "target": "com.test#Inner" }
                    },
                    "com.test#Inner": {
                        "type": "list",
                        "member": { "target": "smithy.api#Integer" }
                    }
                }
            }"#,
            "com.test#S",
        );

        assert!(out.contains("listField(GRID_DESCRIPTOR) {"));
        assert!(out.contains("for (el0 in input.grid) {"));
        assert!(out.contains("serializer.serializeList(GRID_C0_DESCRIPTOR) {"));
        assert!(out.contains("for (el1 in el0) {"));
        assert!(out.contains("serializeInt(el1)"));
    }
}
