//! HTTP operation serializer and deserializer generation
//!
//! Weaves the document emitters together with URI, query, header, and
//! payload handling: one `HttpSerialize` implementation per operation and
//! one `HttpDeserialize` implementation per operation output and per
//! modeled error.

use heck::ToUpperCamelCase;

use kolibri_common::{CodegenError, Result};
use kolibri_model::traits::{self, TimestampFormat, UriSegment};
use kolibri_model::{MemberShape, Shape, ShapeId, ShapeType};

use crate::bindings::{HttpBinding, HttpBindingResolver, HttpLocation};
use crate::context::CodegenContext;
use crate::descriptors::StructDescriptors;
use crate::deserialize::{add_conversion_imports, render_struct_deserialize_loop};
use crate::serialize::render_struct_body;
use crate::writer::CodeWriter;

/// Render `transform/<Operation>OperationSerializer.kt`.
pub fn render_operation_serializer(
    ctx: &CodegenContext<'_>,
    resolver: &HttpBindingResolver<'_>,
    writer: &mut CodeWriter,
    op_id: &ShapeId,
) -> Result<()> {
    let op_name = op_id.shape_name().to_upper_camel_case();
    let http = resolver.http_trait(op_id)?;
    let bindings = resolver.request_bindings(op_id)?;
    let (input_id, _, _) = ctx.model.operation_signature(op_id)?;

    let input_type = match &input_id {
        Some(id) => {
            let symbol = ctx.symbols.shape_symbol(ctx.model, id)?;
            writer.add_import_for(&symbol);
            symbol.name
        }
        None => "Unit".to_string(),
    };

    writer.add_import("aws.smithy.kotlin.runtime.http.operation.HttpSerialize");
    writer.add_import("aws.smithy.kotlin.runtime.http.request.HttpRequestBuilder");
    writer.add_import("aws.smithy.kotlin.runtime.http.HttpMethod");
    writer.add_import("aws.smithy.kotlin.runtime.operation.ExecutionContext");
    writer.add_dependency("aws.smithy.kotlin:http");
    add_binding_conversion_imports(ctx, writer, &bindings, true)?;

    // Descriptors cover only the members serialized into the document body.
    let document_members = members_for(&bindings, HttpLocation::Document);
    let descriptors = StructDescriptors::build(ctx.model, &document_members)?;
    if !document_members.is_empty() {
        let (uses_time, uses_base64) =
            crate::serialize::uses_time_or_encoding(ctx.model, &document_members)?;
        if uses_time {
            writer.add_import("aws.smithy.kotlin.runtime.time.TimestampFormat");
        }
        if uses_base64 {
            writer.add_import("aws.smithy.kotlin.runtime.util.encodeBase64String");
        }
        descriptors.render(writer)?;
        writer.write("");
    }

    writer.with_block(
        &format!(
            "internal class {}OperationSerializer : HttpSerialize<{}> {{",
            op_name, input_type
        ),
        "}",
        |w| {
            w.with_block(
                &format!(
                    "override suspend fun serialize(context: ExecutionContext, input: {}): HttpRequestBuilder {{",
                    input_type
                ),
                "}",
                |w| {
                    w.write("val builder = HttpRequestBuilder()");
                    w.write(format!("builder.method = HttpMethod.{}", http.method.to_uppercase()));
                    w.write("");

                    render_url_block(ctx, resolver, w, &http, &bindings)?;
                    render_request_headers(ctx, resolver, w, &bindings)?;
                    render_request_body(ctx, resolver, w, op_id, &bindings, &document_members, &descriptors)?;

                    w.write("return builder");
                    Ok(())
                },
            )
        },
    )
}

/// Members of `bindings` at `location`, in binding (member-name) order.
fn members_for(
    bindings: &[HttpBinding],
    location: HttpLocation,
) -> Vec<(String, ShapeId, &MemberShape)> {
    bindings
        .iter()
        .filter(|b| b.location == location)
        .map(|b| (b.member_name.clone(), b.member_id.clone(), &b.member))
        .collect()
}

/// Imports for conversions used by non-document bindings (labels, queries,
/// headers): timestamp formatting/parsing, base64, big numbers, and enum
/// types.
fn add_binding_conversion_imports(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    bindings: &[HttpBinding],
    request: bool,
) -> Result<()> {
    for binding in bindings {
        if binding.location == HttpLocation::Document {
            continue;
        }
        let mut target = ctx.model.target_of(&binding.member)?;
        if let Shape::List { member, .. } | Shape::Set { member, .. } = target {
            target = ctx.model.target_of(member)?;
        }
        match target.shape_type() {
            ShapeType::Timestamp => {
                if request {
                    writer.add_import("aws.smithy.kotlin.runtime.time.TimestampFormat");
                } else {
                    writer.add_import("aws.smithy.kotlin.runtime.time.Instant");
                }
            }
            ShapeType::Blob => {
                if request {
                    writer.add_import("aws.smithy.kotlin.runtime.util.encodeBase64String");
                } else {
                    writer.add_import("aws.smithy.kotlin.runtime.util.decodeBase64Bytes");
                }
            }
            ShapeType::BigInteger => writer.add_import("java.math.BigInteger"),
            ShapeType::BigDecimal => writer.add_import("java.math.BigDecimal"),
            ShapeType::String => {
                if target.traits().contains_key(traits::ENUM) {
                    let symbol = ctx.symbols.shape_symbol(ctx.model, &binding.member.target)?;
                    writer.add_import_for(&symbol);
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn render_url_block(
    ctx: &CodegenContext<'_>,
    resolver: &HttpBindingResolver<'_>,
    writer: &mut CodeWriter,
    http: &kolibri_model::traits::HttpTrait,
    bindings: &[HttpBinding],
) -> Result<()> {
    writer.with_block("builder.url {", "}", |w| {
        w.write(format!("path = \"{}\"", path_template(ctx, resolver, http, bindings)?));

        let queries: Vec<&HttpBinding> = bindings
            .iter()
            .filter(|b| {
                matches!(b.location, HttpLocation::Query | HttpLocation::QueryParams)
            })
            .collect();
        if http.uri.query_literals.is_empty() && queries.is_empty() {
            return Ok(());
        }

        w.with_block("parameters {", "}", |w| {
            for (name, value) in &http.uri.query_literals {
                w.write(format!("append(\"{}\", \"{}\")", name, value));
            }
            for binding in &queries {
                match binding.location {
                    HttpLocation::Query => render_query_binding(ctx, resolver, w, binding)?,
                    HttpLocation::QueryParams => render_query_params(ctx, w, binding)?,
                    _ => unreachable!(),
                }
            }
            Ok(())
        })
    })
}

/// Kotlin string template for the request path, substituting each label
/// segment with the bound member's stringified value.
fn path_template(
    ctx: &CodegenContext<'_>,
    resolver: &HttpBindingResolver<'_>,
    http: &kolibri_model::traits::HttpTrait,
    bindings: &[HttpBinding],
) -> Result<String> {
    let mut path = String::new();
    for segment in &http.uri.segments {
        path.push('/');
        match segment {
            UriSegment::Literal(text) => path.push_str(text),
            UriSegment::Label { name, .. } => {
                let binding = bindings
                    .iter()
                    .find(|b| b.location == HttpLocation::Label && b.member_name == *name)
                    .ok_or_else(|| CodegenError::InvalidBinding {
                        member: name.clone(),
                        reason: format!("uri label `{{{}}}` has no bound member", name),
                    })?;
                let expr = stringified_value(
                    ctx,
                    resolver,
                    binding,
                    &format!("input.{}", binding.member_name),
                )?;
                path.push_str(&format!("${{{}}}", expr));
            }
        }
    }
    if path.is_empty() {
        path.push('/');
    }
    Ok(path)
}

/// Expression converting a bound member value to its string form for
/// labels, queries, and headers.
fn stringified_value(
    ctx: &CodegenContext<'_>,
    resolver: &HttpBindingResolver<'_>,
    binding: &HttpBinding,
    expr: &str,
) -> Result<String> {
    let target = ctx.model.target_of(&binding.member)?;
    Ok(match target.shape_type() {
        ShapeType::String => {
            if target.traits().contains_key(traits::ENUM) {
                format!("{}.value", expr)
            } else {
                expr.to_string()
            }
        }
        ShapeType::Timestamp => {
            let format =
                resolver.timestamp_format(&binding.member_id, &binding.member, binding.location)?;
            format!("{}.format(TimestampFormat.{})", expr, format.runtime_name())
        }
        ShapeType::Blob => format!("{}.encodeBase64String()", expr),
        _ => format!("{}.toString()", expr),
    })
}

fn render_query_binding(
    ctx: &CodegenContext<'_>,
    resolver: &HttpBindingResolver<'_>,
    writer: &mut CodeWriter,
    binding: &HttpBinding,
) -> Result<()> {
    let target = ctx.model.target_of(&binding.member)?;
    let symbol = ctx
        .symbols
        .member_symbol(ctx.model, &binding.member_id, &binding.member)?;
    let access = format!("input.{}", binding.member_name);
    let name = &binding.location_name;

    match target {
        Shape::List { member: element, .. } | Shape::Set { member: element, .. } => {
            let element_target = ctx.model.target_of(element)?;
            let convert = element_to_string(resolver, binding, element_target)?;
            let guarded = if symbol.nullable {
                format!("if ({} != null) ", access)
            } else {
                String::new()
            };
            writer.write(format!(
                "{}appendAll(\"{}\", {}.map {{ {} }})",
                guarded, name, access, convert
            ));
        }
        _ => {
            let value = stringified_value(ctx, resolver, binding, &access)?;
            if symbol.nullable {
                writer.write(format!(
                    "if ({} != null) append(\"{}\", {})",
                    access, name, value
                ));
            } else if let Some(default) = &symbol.default_value {
                // Default-equal values are skipped outside the document.
                writer.write(format!(
                    "if ({} != {}) append(\"{}\", {})",
                    access, default, name, value
                ));
            } else {
                writer.write(format!("append(\"{}\", {})", name, value));
            }
        }
    }
    Ok(())
}

/// Per-element string conversion inside a `map { ... }` over a bound
/// collection.
fn element_to_string(
    resolver: &HttpBindingResolver<'_>,
    binding: &HttpBinding,
    element_target: &Shape,
) -> Result<String> {
    Ok(match element_target.shape_type() {
        ShapeType::String => {
            if element_target.traits().contains_key(traits::ENUM) {
                "it.value".to_string()
            } else {
                "it".to_string()
            }
        }
        ShapeType::Timestamp => {
            let format = resolver.timestamp_format(
                &binding.member_id,
                &binding.member,
                binding.location,
            )?;
            format!("it.format(TimestampFormat.{})", format.runtime_name())
        }
        _ => "it.toString()".to_string(),
    })
}

fn render_query_params(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    binding: &HttpBinding,
) -> Result<()> {
    let target = ctx.model.target_of(&binding.member)?;
    let access = format!("input.{}", binding.member_name);
    let value_is_list = match target {
        Shape::Map { value, .. } => {
            ctx.model.target_of(value)?.shape_type() == ShapeType::List
                || ctx.model.target_of(value)?.shape_type() == ShapeType::Set
        }
        _ => false,
    };

    if value_is_list {
        writer.write(format!(
            "{}?.forEach {{ (key, values) -> appendAll(key, values) }}",
            access
        ));
    } else {
        writer.write(format!(
            "{}?.forEach {{ (key, value) -> append(key, value) }}",
            access
        ));
    }
    Ok(())
}

fn render_request_headers(
    ctx: &CodegenContext<'_>,
    resolver: &HttpBindingResolver<'_>,
    writer: &mut CodeWriter,
    bindings: &[HttpBinding],
) -> Result<()> {
    let headers: Vec<&HttpBinding> = bindings
        .iter()
        .filter(|b| {
            matches!(
                b.location,
                HttpLocation::Header | HttpLocation::PrefixHeaders
            )
        })
        .collect();
    if headers.is_empty() {
        return Ok(());
    }

    writer.write("");
    writer.with_block("builder.headers {", "}", |w| {
        for binding in headers {
            match binding.location {
                HttpLocation::Header => render_header_binding(ctx, resolver, w, binding)?,
                HttpLocation::PrefixHeaders => {
                    let access = format!("input.{}", binding.member_name);
                    let prefix = &binding.location_name;
                    if prefix.is_empty() {
                        w.write(format!(
                            "{}?.forEach {{ (key, value) -> append(key, value) }}",
                            access
                        ));
                    } else {
                        w.write(format!(
                            "{}?.forEach {{ (key, value) -> append(\"{}$key\", value) }}",
                            access, prefix
                        ));
                    }
                }
                _ => unreachable!(),
            }
        }
        Ok(())
    })
}

fn render_header_binding(
    ctx: &CodegenContext<'_>,
    resolver: &HttpBindingResolver<'_>,
    writer: &mut CodeWriter,
    binding: &HttpBinding,
) -> Result<()> {
    let target = ctx.model.target_of(&binding.member)?;
    let symbol = ctx
        .symbols
        .member_symbol(ctx.model, &binding.member_id, &binding.member)?;
    let access = format!("input.{}", binding.member_name);
    let name = &binding.location_name;

    match target {
        Shape::List { member: element, .. } | Shape::Set { member: element, .. } => {
            let element_target = ctx.model.target_of(element)?;
            let mut convert = element_to_string(resolver, binding, element_target)?;
            // Header lists quote elements that may contain separators.
            if element_target.shape_type() == ShapeType::String
                && !element_target.traits().contains_key(traits::ENUM)
            {
                writer.add_import("aws.smithy.kotlin.runtime.http.util.quoteHeaderValue");
                convert = "quoteHeaderValue(it)".to_string();
            }
            writer.write(format!(
                "if ({}?.isNotEmpty() == true) appendAll(\"{}\", {}.map {{ {} }})",
                access, name, access, convert
            ));
        }
        Shape::String { traits: t } if !t.contains_key(traits::ENUM) => {
            if symbol.nullable {
                writer.write(format!(
                    "if ({}?.isNotEmpty() == true) append(\"{}\", {})",
                    access, name, access
                ));
            } else {
                writer.write(format!("append(\"{}\", {})", name, access));
            }
        }
        _ => {
            let value = stringified_value(ctx, resolver, binding, &access)?;
            if symbol.nullable {
                writer.write(format!(
                    "if ({} != null) append(\"{}\", {})",
                    access, name, value
                ));
            } else if let Some(default) = &symbol.default_value {
                // Default-equal values are skipped outside the document.
                writer.write(format!(
                    "if ({} != {}) append(\"{}\", {})",
                    access, default, name, value
                ));
            } else {
                writer.write(format!("append(\"{}\", {})", name, value));
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn render_request_body(
    ctx: &CodegenContext<'_>,
    resolver: &HttpBindingResolver<'_>,
    writer: &mut CodeWriter,
    op_id: &ShapeId,
    bindings: &[HttpBinding],
    document_members: &[(String, ShapeId, &MemberShape)],
    descriptors: &StructDescriptors,
) -> Result<()> {
    let payload = HttpBindingResolver::payload_binding(bindings);
    let has_body = payload.is_some() || !document_members.is_empty();
    if !has_body {
        return Ok(());
    }

    writer.write("");
    if let Some(payload) = payload {
        render_payload_body(ctx, writer, payload)?;
    } else {
        writer.add_import("aws.smithy.kotlin.runtime.http.content.ByteArrayContent");
        writer.write("val serializer = context.serializer()");
        render_struct_body(ctx, writer, document_members, descriptors, true)?;
        writer.write("builder.body = ByteArrayContent(serializer.toByteArray())");
    }

    // Content-Type is set last, and only when a body was produced.
    if let Some(content_type) = resolver.content_type(op_id)? {
        writer.add_import("aws.smithy.kotlin.runtime.http.HttpBody");
        writer.write(format!(
            "if (builder.body !is HttpBody.Empty) builder.headers.setMissing(\"Content-Type\", \"{}\")",
            content_type
        ));
    }
    Ok(())
}

fn render_payload_body(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    payload: &HttpBinding,
) -> Result<()> {
    let target = ctx.model.target_of(&payload.member)?;
    let access = format!("input.{}", payload.member_name);

    match target.shape_type() {
        ShapeType::Blob => {
            if target.traits().contains_key(traits::STREAMING) {
                writer.add_import("aws.smithy.kotlin.runtime.http.toHttpBody");
                writer.write(format!(
                    "if ({} != null) {{ builder.body = {}.toHttpBody() }}",
                    access, access
                ));
            } else {
                writer.add_import("aws.smithy.kotlin.runtime.http.content.ByteArrayContent");
                writer.write(format!(
                    "if ({} != null) {{ builder.body = ByteArrayContent({}) }}",
                    access, access
                ));
            }
        }
        ShapeType::String => {
            writer.add_import("aws.smithy.kotlin.runtime.http.content.ByteArrayContent");
            let bytes = if target.traits().contains_key(traits::ENUM) {
                format!("{}.value.encodeToByteArray()", access)
            } else {
                format!("{}.encodeToByteArray()", access)
            };
            writer.write(format!(
                "if ({} != null) {{ builder.body = ByteArrayContent({}) }}",
                access, bytes
            ));
        }
        ShapeType::Structure | ShapeType::Union => {
            writer.add_import("aws.smithy.kotlin.runtime.http.content.ByteArrayContent");
            let serializer_name = format!(
                "{}DocumentSerializer",
                payload.member.target.shape_name().to_upper_camel_case()
            );
            writer.with_block(&format!("if ({} != null) {{", access), "}", |w| {
                w.write("val serializer = context.serializer()");
                w.write(format!(
                    "{}({}).serialize(serializer)",
                    serializer_name, access
                ));
                w.write("builder.body = ByteArrayContent(serializer.toByteArray())");
                Ok(())
            })?;
        }
        _ => {
            return Err(CodegenError::InvalidBinding {
                member: payload.member_id.to_string(),
                reason: "httpPayload must target a blob, string, structure, union, or document"
                    .to_string(),
            })
        }
    }
    Ok(())
}

/// Render `transform/<Operation>OperationDeserializer.kt` for an operation
/// with an output structure.
pub fn render_operation_deserializer(
    ctx: &CodegenContext<'_>,
    resolver: &HttpBindingResolver<'_>,
    writer: &mut CodeWriter,
    op_id: &ShapeId,
) -> Result<()> {
    let op_name = op_id.shape_name().to_upper_camel_case();
    let (_, output, _) = ctx.model.operation_signature(op_id)?;
    let output_id = output.ok_or_else(|| {
        CodegenError::Generation(format!("{} has no output to deserialize", op_id))
    })?;
    let bindings = resolver.response_bindings(op_id)?;

    render_response_deserializer(
        ctx,
        resolver,
        writer,
        &format!("{}OperationDeserializer", op_name),
        &output_id,
        &bindings,
    )
}

/// Render `transform/<Error>Deserializer.kt` for a modeled error.
pub fn render_error_deserializer(
    ctx: &CodegenContext<'_>,
    resolver: &HttpBindingResolver<'_>,
    writer: &mut CodeWriter,
    error_id: &ShapeId,
) -> Result<()> {
    let bindings = resolver.error_bindings(error_id)?;
    render_response_deserializer(
        ctx,
        resolver,
        writer,
        &format!("{}Deserializer", error_id.shape_name().to_upper_camel_case()),
        error_id,
        &bindings,
    )
}

fn render_response_deserializer(
    ctx: &CodegenContext<'_>,
    resolver: &HttpBindingResolver<'_>,
    writer: &mut CodeWriter,
    class_name: &str,
    output_id: &ShapeId,
    bindings: &[HttpBinding],
) -> Result<()> {
    let symbol = ctx.symbols.shape_symbol(ctx.model, output_id)?;
    writer.add_import_for(&symbol);
    writer.add_import("aws.smithy.kotlin.runtime.http.operation.HttpDeserialize");
    writer.add_import("aws.smithy.kotlin.runtime.http.response.HttpResponse");
    writer.add_import("aws.smithy.kotlin.runtime.operation.ExecutionContext");
    writer.add_dependency("aws.smithy.kotlin:http");
    add_binding_conversion_imports(ctx, writer, bindings, false)?;

    let document_members = members_for(bindings, HttpLocation::Document);
    let descriptors = StructDescriptors::build(ctx.model, &document_members)?;
    if !document_members.is_empty() {
        add_conversion_imports(ctx, writer, &document_members)?;
        descriptors.render(writer)?;
        writer.write("");
    }

    writer.with_block(
        &format!(
            "internal class {} : HttpDeserialize<{}> {{",
            class_name, symbol.name
        ),
        "}",
        |w| {
            w.with_block(
                &format!(
                    "override suspend fun deserialize(context: ExecutionContext, response: HttpResponse): {} {{",
                    symbol.name
                ),
                "}",
                |w| {
                    w.write(format!("val builder = {}.Builder()", symbol.name));
                    w.write("");

                    for binding in bindings {
                        match binding.location {
                            HttpLocation::Header => {
                                render_response_header(ctx, resolver, w, binding)?
                            }
                            HttpLocation::PrefixHeaders => {
                                render_response_prefix_headers(w, binding)?
                            }
                            HttpLocation::ResponseCode => {
                                w.write(format!(
                                    "builder.{} = response.status.value",
                                    binding.member_name
                                ));
                            }
                            _ => {}
                        }
                    }

                    if let Some(payload) = HttpBindingResolver::payload_binding(bindings) {
                        render_response_payload(ctx, w, payload)?;
                    } else if !document_members.is_empty() {
                        w.write("");
                        w.write("val payload = response.body.readAll()");
                        w.with_block("if (payload != null) {", "}", |w| {
                            w.write("val deserializer = context.deserializer(payload)");
                            render_struct_deserialize_loop(
                                ctx,
                                w,
                                "builder",
                                &document_members,
                                &descriptors,
                            )
                        })?;
                    }

                    w.write("return builder.build()");
                    Ok(())
                },
            )
        },
    )
}

fn render_response_header(
    ctx: &CodegenContext<'_>,
    resolver: &HttpBindingResolver<'_>,
    writer: &mut CodeWriter,
    binding: &HttpBinding,
) -> Result<()> {
    let target = ctx.model.target_of(&binding.member)?;
    let name = &binding.location_name;
    let member = &binding.member_name;

    match target {
        Shape::List { member: element, .. } | Shape::Set { member: element, .. } => {
            let element_target = ctx.model.target_of(element)?;
            // Timestamp lists in http-date format embed commas and need
            // the format-aware splitter.
            let splitter = if element_target.shape_type() == ShapeType::Timestamp
                && resolver.timestamp_format(
                    &binding.member_id,
                    &binding.member,
                    binding.location,
                )? == TimestampFormat::HttpDate
            {
                "splitHttpDateHeaderListValues"
            } else {
                "splitHeaderListValues"
            };
            writer.add_import(&format!("aws.smithy.kotlin.runtime.http.util.{}", splitter));

            let convert = header_decode_expr(ctx, resolver, binding, element_target, "it")?;
            let mapped = if convert == "it" {
                String::new()
            } else {
                format!("?.map {{ {} }}", convert)
            };
            let to_set = if target.shape_type() == ShapeType::Set {
                "?.toSet()"
            } else {
                ""
            };
            writer.write(format!(
                "builder.{} = response.headers.getAll(\"{}\")?.flatMap(::{}){}{}",
                member, name, splitter, mapped, to_set
            ));
        }
        _ => {
            let raw = format!("response.headers[\"{}\"]", name);
            let symbol = ctx
                .symbols
                .member_symbol(ctx.model, &binding.member_id, &binding.member)?;
            let expr = if symbol.nullable {
                let convert = header_decode_expr(ctx, resolver, binding, target, "it")?;
                if convert == "it" {
                    raw
                } else {
                    format!("{}?.let {{ {} }}", raw, convert)
                }
            } else {
                // Required header: absence fails loudly instead of
                // building a half-initialized response.
                let checked = format!("checkNotNull({}) {{ \"{} is a required header\" }}", raw, name);
                let convert = header_decode_expr(ctx, resolver, binding, target, &checked)?;
                convert
            };
            writer.write(format!("builder.{} = {}", member, expr));
        }
    }
    Ok(())
}

/// Expression decoding a header string `expr` into the target type.
fn header_decode_expr(
    ctx: &CodegenContext<'_>,
    resolver: &HttpBindingResolver<'_>,
    binding: &HttpBinding,
    target: &Shape,
    expr: &str,
) -> Result<String> {
    Ok(match target.shape_type() {
        ShapeType::String => {
            if target.traits().contains_key(traits::ENUM) {
                let symbol = ctx.symbols.shape_symbol(ctx.model, &binding.member.target)?;
                format!("{}.fromValue({})", symbol.name, expr)
            } else {
                expr.to_string()
            }
        }
        ShapeType::Boolean => format!("{}.toBoolean()", expr),
        ShapeType::Byte => format!("{}.toByte()", expr),
        ShapeType::Short => format!("{}.toShort()", expr),
        ShapeType::Integer => format!("{}.toInt()", expr),
        ShapeType::Long => format!("{}.toLong()", expr),
        ShapeType::Float => format!("{}.toFloat()", expr),
        ShapeType::Double => format!("{}.toDouble()", expr),
        ShapeType::BigInteger => format!("BigInteger({})", expr),
        ShapeType::BigDecimal => format!("BigDecimal({})", expr),
        ShapeType::Blob => {
            format!("{}.decodeBase64Bytes()", expr)
        }
        ShapeType::Timestamp => {
            let format =
                resolver.timestamp_format(&binding.member_id, &binding.member, binding.location)?;
            format!("Instant.{}({})", format.parse_fn(), expr)
        }
        _ => {
            return Err(CodegenError::InvalidBinding {
                member: binding.member_id.to_string(),
                reason: "unsupported shape for an httpHeader binding".to_string(),
            })
        }
    })
}

fn render_response_prefix_headers(
    writer: &mut CodeWriter,
    binding: &HttpBinding,
) -> Result<()> {
    let member = &binding.member_name;
    let prefix = &binding.location_name;

    writer.write(format!(
        "val keysFor{} = response.headers.names().filter {{ it.startsWith(\"{}\") }}",
        binding.member_name.to_upper_camel_case(),
        prefix
    ));
    writer.with_block(
        &format!(
            "if (keysFor{}.isNotEmpty()) {{",
            binding.member_name.to_upper_camel_case()
        ),
        "}",
        |w| {
            w.write("val map = mutableMapOf<String, String>()");
            w.with_block(
                &format!(
                    "for (hdrKey in keysFor{}) {{",
                    binding.member_name.to_upper_camel_case()
                ),
                "}",
                |w| {
                    // An empty prefix keeps the full header name as the key.
                    let key_expr = if prefix.is_empty() {
                        "hdrKey".to_string()
                    } else {
                        format!("hdrKey.removePrefix(\"{}\")", prefix)
                    };
                    w.write(format!(
                        "map[{}] = checkNotNull(response.headers[hdrKey])",
                        key_expr
                    ));
                    Ok(())
                },
            )?;
            w.write(format!("builder.{} = map", member));
            Ok(())
        },
    )
}

fn render_response_payload(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    payload: &HttpBinding,
) -> Result<()> {
    let target = ctx.model.target_of(&payload.member)?;
    let member = &payload.member_name;

    writer.write("");
    match target.shape_type() {
        ShapeType::Blob => {
            if target.traits().contains_key(traits::STREAMING) {
                writer.add_import("aws.smithy.kotlin.runtime.http.toByteStream");
                writer.write(format!("builder.{} = response.body.toByteStream()", member));
            } else {
                writer.write(format!("builder.{} = response.body.readAll()", member));
            }
        }
        ShapeType::String => {
            if target.traits().contains_key(traits::ENUM) {
                let symbol = ctx.symbols.shape_symbol(ctx.model, &payload.member.target)?;
                writer.add_import_for(&symbol);
                writer.write(format!(
                    "builder.{} = response.body.readAll()?.decodeToString()?.let {{ {}.fromValue(it) }}",
                    member, symbol.name
                ));
            } else {
                writer.write(format!(
                    "builder.{} = response.body.readAll()?.decodeToString()",
                    member
                ));
            }
        }
        ShapeType::Structure | ShapeType::Union => {
            let deserializer_name = format!(
                "{}DocumentDeserializer",
                payload.member.target.shape_name().to_upper_camel_case()
            );
            writer.write("val payload = response.body.readAll()");
            writer.with_block("if (payload != null) {", "}", |w| {
                w.write("val deserializer = context.deserializer(payload)");
                w.write(format!(
                    "builder.{} = {}().deserialize(deserializer)",
                    member, deserializer_name
                ));
                Ok(())
            })?;
        }
        _ => {
            return Err(CodegenError::InvalidBinding {
                member: payload.member_id.to_string(),
                reason: "httpPayload must target a blob, string, structure, union, or document"
                    .to_string(),
            })
        }
    }
    Ok(())
}
