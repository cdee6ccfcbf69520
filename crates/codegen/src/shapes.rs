//! Model type generation
//!
//! Renders the Kotlin types under `model/`: immutable classes with DSL
//! builders for structures, sealed classes for unions, and sealed classes
//! with an `SdkUnknown` fallback for enum strings.

use heck::ToUpperCamelCase;

use kolibri_common::{CodegenError, Result};
use kolibri_model::traits::{self, EnumTrait};
use kolibri_model::{Shape, ShapeId};

use crate::context::CodegenContext;
use crate::writer::CodeWriter;

/// Render the model type for a structure or union shape.
pub fn render_shape_type(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    shape_id: &ShapeId,
) -> Result<()> {
    let shape = ctx.model.expect_shape(shape_id)?;
    match shape {
        Shape::Structure { .. } => render_structure(ctx, writer, shape_id),
        Shape::Union { .. } => render_union(ctx, writer, shape_id),
        Shape::String { traits: t } if t.contains_key(traits::ENUM) => {
            render_enum(ctx, writer, shape_id)
        }
        _ => Err(CodegenError::Generation(format!(
            "{} does not generate a model type",
            shape_id
        ))),
    }
}

fn render_kdoc(writer: &mut CodeWriter, documentation: Option<&str>) {
    if let Some(docs) = documentation {
        writer.write("/**");
        for line in docs.lines() {
            writer.write(format!(" * {}", line));
        }
        writer.write(" */");
    }
}

fn render_structure(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    shape_id: &ShapeId,
) -> Result<()> {
    let shape = ctx.model.expect_shape(shape_id)?;
    let name = shape_id.shape_name().to_upper_camel_case();
    let members = ctx.model.members_of(shape_id, shape);
    let is_error = shape.traits().contains_key(traits::ERROR);

    render_kdoc(writer, traits::documentation(shape.traits()));
    if let Some(deprecated) = shape.traits().get(traits::DEPRECATED) {
        let message = deprecated
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("This type is deprecated.");
        writer.writef("@Deprecated(#S)", &[message.into()])?;
    }

    let class_decl = if is_error {
        writer.add_import("aws.smithy.kotlin.runtime.ServiceException");
        format!(
            "class {} private constructor(builder: Builder) : ServiceException() {{",
            name
        )
    } else {
        format!("class {} private constructor(builder: Builder) {{", name)
    };

    writer.with_block(&class_decl, "}", |w| {
        for (member_name, member_id, member) in &members {
            let symbol = ctx.symbols.member_symbol(ctx.model, member_id, member)?;
            w.add_import_for(&symbol);
            render_kdoc(w, traits::documentation(&member.traits));
            if symbol.nullable {
                w.write(format!(
                    "val {}: {}? = builder.{}",
                    member_name, symbol.name, member_name
                ));
            } else if symbol.default_value.is_some() {
                w.write(format!(
                    "val {}: {} = builder.{}",
                    member_name, symbol.name, member_name
                ));
            } else {
                // Required member without a default: presence is enforced
                // when the builder is sealed.
                w.write(format!(
                    "val {}: {} = requireNotNull(builder.{}) {{ \"{} is a required field\" }}",
                    member_name, symbol.name, member_name, member_name
                ));
            }
        }

        w.write("");
        w.with_block("companion object {", "}", |w| {
            w.write(format!(
                "operator fun invoke(block: Builder.() -> Unit): {} = Builder().apply(block).build()",
                name
            ));
            Ok(())
        })?;

        w.write("");
        w.with_block("class Builder {", "}", |w| {
            for (member_name, member_id, member) in &members {
                let symbol = ctx.symbols.member_symbol(ctx.model, member_id, member)?;
                match (&symbol.default_value, symbol.nullable) {
                    (Some(default), false) => {
                        w.write(format!("var {}: {} = {}", member_name, symbol.name, default))
                    }
                    _ => w.write(format!("var {}: {}? = null", member_name, symbol.name)),
                }
            }
            w.write("");
            w.write(format!("fun build(): {} = {}(this)", name, name));
            Ok(())
        })
    })
}

fn render_union(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    shape_id: &ShapeId,
) -> Result<()> {
    let shape = ctx.model.expect_shape(shape_id)?;
    let name = shape_id.shape_name().to_upper_camel_case();
    let members = ctx.model.members_of(shape_id, shape);

    render_kdoc(writer, traits::documentation(shape.traits()));
    writer.with_block(&format!("sealed class {} {{", name), "}", |w| {
        for (member_name, _, member) in &members {
            let symbol = ctx.symbols.shape_symbol(ctx.model, &member.target)?;
            w.add_import_for(&symbol);
            render_kdoc(w, traits::documentation(&member.traits));
            w.write(format!(
                "data class {}(val value: {}) : {}()",
                member_name.to_upper_camel_case(),
                symbol.name,
                name
            ));
        }
        w.write("");
        // Forward-compatibility arm for variants added after codegen.
        w.write(format!("object SdkUnknown : {}()", name));
        Ok(())
    })
}

fn render_enum(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    shape_id: &ShapeId,
) -> Result<()> {
    let shape = ctx.model.expect_shape(shape_id)?;
    let name = shape_id.shape_name().to_upper_camel_case();
    let parsed = EnumTrait::from_traits(shape.traits(), shape_id.as_str())?.ok_or_else(|| {
        CodegenError::UnknownTrait {
            shape: shape_id.to_string(),
            trait_id: traits::ENUM.to_string(),
        }
    })?;

    // Variants keep the model's declaration order.
    let variants: Vec<(String, String, Option<String>)> = parsed
        .values
        .iter()
        .map(|def| {
            let variant = def
                .name
                .clone()
                .unwrap_or_else(|| def.value.clone())
                .to_upper_camel_case();
            (variant, def.value.clone(), def.documentation.clone())
        })
        .collect();

    render_kdoc(writer, traits::documentation(shape.traits()));
    writer.with_block(&format!("sealed class {} {{", name), "}", |w| {
        w.write("abstract val value: String");
        w.write("");

        for (variant, value, docs) in &variants {
            render_kdoc(w, docs.as_deref());
            w.with_block(&format!("object {} : {}() {{", variant, name), "}", |w| {
                w.write(format!("override val value: String = \"{}\"", value));
                Ok(())
            })?;
            w.write("");
        }

        w.write(format!(
            "data class SdkUnknown(override val value: String) : {}()",
            name
        ));
        w.write("");

        w.with_block("companion object {", "}", |w| {
            w.with_block(
                &format!("fun fromValue(str: String): {} = when (str) {{", name),
                "}",
                |w| {
                    for (variant, value, _) in &variants {
                        w.write(format!("\"{}\" -> {}", value, variant));
                    }
                    w.write("else -> SdkUnknown(str)");
                    Ok(())
                },
            )?;
            w.write("");
            let listed: Vec<String> = variants.iter().map(|(v, _, _)| v.clone()).collect();
            w.write(format!(
                "fun values(): List<{}> = listOf({})",
                name,
                listed.join(", ")
            ));
            Ok(())
        })
    })
}
