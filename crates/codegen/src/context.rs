//! Shared generation context
//!
//! One `CodegenContext` is threaded through every generator: the immutable
//! model, the run settings, the (possibly decorated) symbol provider, and
//! the service being generated.

use kolibri_common::CodegenSettings;
use kolibri_model::{Model, ShapeId};

use crate::symbol::SymbolProvider;

pub struct CodegenContext<'a> {
    pub model: &'a Model,
    pub settings: &'a CodegenSettings,
    pub symbols: &'a dyn SymbolProvider,
    pub service_id: ShapeId,
}
