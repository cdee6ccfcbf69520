//! Integration extension points
//!
//! Integrations are discovered by the driver and applied in `order` (lower
//! first, ties broken by the order they were supplied in). Every hook has
//! an identity default, so an integration that overrides nothing leaves
//! the output byte-identical.

use kolibri_common::{CodegenSettings, ConfigProperty, Result};
use kolibri_model::{Model, ShapeId};

use crate::context::CodegenContext;
use crate::delegator::FileDelegator;
use crate::symbol::SymbolProvider;
use crate::writer::CodeWriter;

/// A protocol middleware installed into generated operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Middleware {
    /// Kotlin expression constructing the middleware (e.g. `RetryMiddleware()`)
    pub install_expr: String,
    /// Qualified name to import for the expression, if any
    pub import: Option<String>,
}

/// Extension hooks over one code-generation run.
#[allow(unused_variables)]
pub trait KolibriIntegration {
    /// Identifying name, for logs and stable tie-breaking diagnostics.
    fn name(&self) -> &str;

    /// Application order; lower runs first.
    fn order(&self) -> i8 {
        0
    }

    /// Mutate the model before anything else reads it. The graph is
    /// immutable once every integration has run.
    fn preprocess_model(&self, model: Model, settings: &CodegenSettings) -> Result<Model> {
        Ok(model)
    }

    /// Wrap the symbol provider. Decorators receive the previous provider
    /// and may intercept specific shapes, delegating the rest.
    fn decorate_symbol_provider(
        &self,
        settings: &CodegenSettings,
        model: &Model,
        provider: Box<dyn SymbolProvider>,
    ) -> Box<dyn SymbolProvider> {
        provider
    }

    /// Extra properties for the generated client config.
    fn additional_service_config_props(
        &self,
        settings: &CodegenSettings,
        model: &Model,
    ) -> Vec<ConfigProperty> {
        Vec::new()
    }

    /// Called before a shape definition is rendered; may register section
    /// interceptors on the writer.
    fn on_shape_writer_use(
        &self,
        settings: &CodegenSettings,
        model: &Model,
        provider: &dyn SymbolProvider,
        writer: &mut CodeWriter,
        shape_id: &ShapeId,
    ) {
    }

    /// Customize the resolved protocol middleware for generated operations.
    fn customize_middleware(
        &self,
        settings: &CodegenSettings,
        model: &Model,
        resolved: Vec<Middleware>,
    ) -> Vec<Middleware> {
        resolved
    }

    /// Emit extra files through the delegator.
    fn write_additional_files(
        &self,
        ctx: &CodegenContext<'_>,
        delegator: &mut FileDelegator,
    ) -> Result<()> {
        Ok(())
    }
}

/// Ordered application of integrations.
pub struct IntegrationPipeline {
    integrations: Vec<Box<dyn KolibriIntegration>>,
}

impl IntegrationPipeline {
    /// Sorts by `order`; the sort is stable so discovery order breaks ties.
    pub fn new(mut integrations: Vec<Box<dyn KolibriIntegration>>) -> Self {
        integrations.sort_by_key(|i| i.order());
        IntegrationPipeline { integrations }
    }

    pub fn is_empty(&self) -> bool {
        self.integrations.is_empty()
    }

    pub fn preprocess(&self, mut model: Model, settings: &CodegenSettings) -> Result<Model> {
        for integration in &self.integrations {
            model = integration.preprocess_model(model, settings)?;
        }
        Ok(model)
    }

    pub fn decorate_symbols(
        &self,
        settings: &CodegenSettings,
        model: &Model,
        mut provider: Box<dyn SymbolProvider>,
    ) -> Box<dyn SymbolProvider> {
        for integration in &self.integrations {
            provider = integration.decorate_symbol_provider(settings, model, provider);
        }
        provider
    }

    pub fn config_properties(
        &self,
        settings: &CodegenSettings,
        model: &Model,
    ) -> Vec<ConfigProperty> {
        let mut props = Vec::new();
        for integration in &self.integrations {
            props.extend(integration.additional_service_config_props(settings, model));
        }
        props
    }

    pub fn on_shape_writer_use(
        &self,
        settings: &CodegenSettings,
        model: &Model,
        provider: &dyn SymbolProvider,
        writer: &mut CodeWriter,
        shape_id: &ShapeId,
    ) {
        for integration in &self.integrations {
            integration.on_shape_writer_use(settings, model, provider, writer, shape_id);
        }
    }

    pub fn middleware(
        &self,
        settings: &CodegenSettings,
        model: &Model,
        mut resolved: Vec<Middleware>,
    ) -> Vec<Middleware> {
        for integration in &self.integrations {
            resolved = integration.customize_middleware(settings, model, resolved);
        }
        resolved
    }

    pub fn write_additional_files(
        &self,
        ctx: &CodegenContext<'_>,
        delegator: &mut FileDelegator,
    ) -> Result<()> {
        for integration in &self.integrations {
            integration.write_additional_files(ctx, delegator)?;
        }
        Ok(())
    }
}
