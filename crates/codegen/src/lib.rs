//! Kotlin client code generation for Smithy service models
//!
//! This crate turns a loaded shape graph into a complete Kotlin client
//! package: model types, document serializers and deserializers, HTTP
//! operation transforms, a protocol client, and build scaffolding. The
//! single entry point is [`generate`]; everything it produces flows
//! through a [`delegator::FileDelegator`] and reaches disk only when the
//! whole run succeeded.

pub mod bindings;
pub mod client;
pub mod context;
pub mod delegator;
pub mod descriptors;
pub mod deserialize;
pub mod integration;
pub mod operations;
pub mod scaffold;
pub mod serialize;
pub mod shapes;
pub mod symbol;
pub mod writer;

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use heck::ToUpperCamelCase;
use log::{debug, info};

use kolibri_common::{CodegenError, CodegenSettings, Result};
use kolibri_model::{serde_closure, traits, walk_from, Model, Shape, ShapeId};

use crate::bindings::HttpBindingResolver;
use crate::context::CodegenContext;
use crate::delegator::FileDelegator;
use crate::integration::{IntegrationPipeline, KolibriIntegration};
use crate::symbol::KotlinSymbolProvider;

/// Run the full generation pipeline and return the delegator holding
/// every artifact. Call `flush_to` on the result to write files.
pub fn generate(
    model: Model,
    settings: &CodegenSettings,
    integrations: Vec<Box<dyn KolibriIntegration>>,
) -> Result<FileDelegator> {
    let pipeline = IntegrationPipeline::new(integrations);

    // The graph is immutable once preprocessing completes.
    let model = pipeline.preprocess(model, settings)?;
    let symbols = pipeline.decorate_symbols(
        settings,
        &model,
        Box::new(KotlinSymbolProvider::new(settings)),
    );

    let service_id = ShapeId::new(settings.service.as_str());
    model.expect_service(&service_id)?;

    let ctx = CodegenContext {
        model: &model,
        settings,
        symbols: symbols.as_ref(),
        service_id: service_id.clone(),
    };
    let resolver = HttpBindingResolver::new(&model, service_id.clone());
    let mut delegator = FileDelegator::new(settings.timestamp_header);

    let operation_ids = resolver.binding_operations()?;
    info!(
        "generating {} operations for {}",
        operation_ids.len(),
        service_id
    );

    // Seed sets for the serde closures.
    let mut input_seeds = Vec::new();
    let mut output_seeds = Vec::new();
    let mut error_ids: BTreeSet<ShapeId> = BTreeSet::new();
    for op_id in &operation_ids {
        let (input, output, errors) = model.operation_signature(op_id)?;
        input_seeds.extend(input);
        output_seeds.extend(output);
        error_ids.extend(errors);
    }
    output_seeds.extend(error_ids.iter().cloned());

    render_model_types(&ctx, &pipeline, &mut delegator, &input_seeds, &output_seeds)?;

    // Standalone document serde types, one per nested shape.
    for shape_id in serde_closure(&model, &input_seeds)? {
        let name = shape_id.shape_name().to_upper_camel_case();
        let writer = delegator.writer(
            &format!("transform/{}DocumentSerializer.kt", name),
            &settings.transform_package(),
        )?;
        serialize::render_document_serializer(&ctx, writer, &shape_id)?;
    }
    for shape_id in serde_closure(&model, &output_seeds)? {
        let name = shape_id.shape_name().to_upper_camel_case();
        let writer = delegator.writer(
            &format!("transform/{}DocumentDeserializer.kt", name),
            &settings.transform_package(),
        )?;
        deserialize::render_document_deserializer(&ctx, writer, &shape_id)?;
    }

    // Operation transforms: one serializer per operation, one deserializer
    // per operation with an output.
    for op_id in &operation_ids {
        let op_name = op_id.shape_name().to_upper_camel_case();
        debug!("rendering operation {}", op_id);

        let writer = delegator.writer(
            &format!("transform/{}OperationSerializer.kt", op_name),
            &settings.transform_package(),
        )?;
        operations::render_operation_serializer(&ctx, &resolver, writer, op_id)?;

        let (_, output, _) = model.operation_signature(op_id)?;
        if output.is_some() {
            let writer = delegator.writer(
                &format!("transform/{}OperationDeserializer.kt", op_name),
                &settings.transform_package(),
            )?;
            operations::render_operation_deserializer(&ctx, &resolver, writer, op_id)?;
        }
    }

    for error_id in &error_ids {
        let name = error_id.shape_name().to_upper_camel_case();
        let writer = delegator.writer(
            &format!("transform/{}Deserializer.kt", name),
            &settings.transform_package(),
        )?;
        operations::render_error_deserializer(&ctx, &resolver, writer, error_id)?;
    }

    // Protocol client.
    let service_name = service_id.shape_name().to_upper_camel_case();
    let config_props = pipeline.config_properties(settings, &model);
    let middleware = pipeline.middleware(settings, &model, Vec::new());
    let writer = delegator.writer(
        &format!("Default{}.kt", service_name),
        &settings.package_name,
    )?;
    client::render_service_client(&ctx, &resolver, writer, &config_props, &middleware)?;

    // Build scaffolding renders last so it sees every recorded dependency.
    let dependencies = delegator.dependencies();
    for (path, content) in
        scaffold::render_scaffolding(settings, &service_name, operation_ids.len(), &dependencies)?
    {
        delegator.add_static_file(&path, content);
    }

    pipeline.write_additional_files(&ctx, &mut delegator)?;

    Ok(delegator)
}

/// Render `model/<Name>.kt` for every structure, union, and enum reachable
/// from the operations, with duplicate-symbol detection.
fn render_model_types(
    ctx: &CodegenContext<'_>,
    pipeline: &IntegrationPipeline,
    delegator: &mut FileDelegator,
    input_seeds: &[ShapeId],
    output_seeds: &[ShapeId],
) -> Result<()> {
    let mut seeds: Vec<ShapeId> = Vec::new();
    seeds.extend_from_slice(input_seeds);
    seeds.extend_from_slice(output_seeds);

    let reachable = walk_from(ctx.model, &seeds, kolibri_model::serde_edge)?;

    let mut generated: BTreeMap<String, ShapeId> = BTreeMap::new();
    for shape_id in reachable {
        if shape_id.is_prelude() {
            continue;
        }
        let shape = ctx.model.expect_shape(&shape_id)?;
        let is_model_type = match shape {
            Shape::Structure { .. } | Shape::Union { .. } => true,
            Shape::String { traits: t } => t.contains_key(traits::ENUM),
            _ => false,
        };
        if !is_model_type {
            continue;
        }

        let symbol = ctx.symbols.shape_symbol(ctx.model, &shape_id)?;
        if let Some(first) = generated.get(&symbol.full_name()) {
            return Err(CodegenError::DuplicateSymbol {
                symbol: symbol.full_name(),
                first: first.to_string(),
                second: shape_id.to_string(),
            });
        }
        generated.insert(symbol.full_name(), shape_id.clone());

        let writer = delegator.writer(
            &format!("model/{}.kt", symbol.name),
            &ctx.settings.model_package(),
        )?;
        pipeline.on_shape_writer_use(ctx.settings, ctx.model, ctx.symbols, writer, &shape_id);
        writer.declare_section("shape-definition", |w| {
            shapes::render_shape_type(ctx, w, &shape_id)
        })?;
    }
    Ok(())
}
