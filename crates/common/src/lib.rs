//! Common types and utilities for the Kolibri code generator
//!
//! This crate contains the shared error taxonomy, the result alias, and the
//! settings object used across the model, codegen, and CLI components.

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod settings;

pub use settings::CodegenSettings;

/// Errors that can occur during client-library generation
#[derive(Error, Debug)]
pub enum CodegenError {
    /// Shape lookup by ID failed.
    #[error("unknown shape: {0}")]
    UnknownShape(String),

    /// A required trait was missing from a shape or member.
    #[error("shape `{shape}` is missing required trait `{trait_id}`")]
    UnknownTrait { shape: String, trait_id: String },

    /// An HTTP binding is incompatible with its target shape.
    #[error("invalid HTTP binding on `{member}`: {reason}")]
    InvalidBinding { member: String, reason: String },

    /// A timestampFormat trait value outside the three recognized formats.
    #[error("unknown timestamp format `{format}` on `{shape}`")]
    UnknownTimestampFormat { shape: String, format: String },

    /// A shape type with no serial-kind mapping.
    #[error("no serial kind mapping for shape `{0}`")]
    UnknownSerialKind(String),

    /// Two shapes would generate the same symbol.
    #[error("duplicate symbol `{symbol}` generated for `{first}` and `{second}`")]
    DuplicateSymbol {
        symbol: String,
        first: String,
        second: String,
    },

    /// A writer was finalized with unclosed blocks.
    #[error("writer for `{file}` finalized with {depth} unclosed block(s)")]
    UnbalancedEmission { file: String, depth: usize },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CodegenError {
    /// Stable short code for user-facing diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            CodegenError::UnknownShape(_) => "E_UNKNOWN_SHAPE",
            CodegenError::UnknownTrait { .. } => "E_UNKNOWN_TRAIT",
            CodegenError::InvalidBinding { .. } => "E_INVALID_BINDING",
            CodegenError::UnknownTimestampFormat { .. } => "E_UNKNOWN_TIMESTAMP_FORMAT",
            CodegenError::UnknownSerialKind(_) => "E_UNKNOWN_SERIAL_KIND",
            CodegenError::DuplicateSymbol { .. } => "E_DUPLICATE_SYMBOL",
            CodegenError::UnbalancedEmission { .. } => "E_UNBALANCED_EMISSION",
            CodegenError::Parse(_) => "E_PARSE",
            CodegenError::Generation(_) => "E_GENERATION",
            CodegenError::Io(_) => "E_IO",
            CodegenError::Json(_) => "E_JSON",
        }
    }
}

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, CodegenError>;

/// A configuration property contributed to the generated client config by an
/// integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigProperty {
    /// Property name in the generated config (camelCase)
    pub name: String,

    /// Fully qualified Kotlin type of the property
    pub kotlin_type: String,

    /// Documentation rendered above the property
    #[serde(default)]
    pub documentation: Option<String>,

    /// Default-value expression, if the property is optional
    #[serde(default)]
    pub default_value: Option<String>,
}
