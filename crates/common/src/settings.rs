//! Code-generation settings
//!
//! The settings object is deserialized from a JSON file supplied by the
//! driver and threaded through every generator component.

use serde::{Deserialize, Serialize};

use crate::{CodegenError, Result};

fn default_true() -> bool {
    true
}

/// Settings for one code-generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodegenSettings {
    /// Shape ID of the service to generate (e.g. "com.test#Example")
    pub service: String,

    /// Root Kotlin package of the generated client (e.g. "com.test.example")
    pub package_name: String,

    /// Version stamped into the generated build file
    pub package_version: String,

    /// Service identifier used in user agent and operation telemetry
    pub sdk_id: String,

    /// Emit the "Code generated by kolibri" header with a build timestamp.
    /// Disable for byte-identical regeneration checks.
    #[serde(default = "default_true")]
    pub timestamp_header: bool,
}

impl CodegenSettings {
    /// Parse settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: CodegenSettings = serde_json::from_str(json)
            .map_err(|e| CodegenError::Parse(format!("Failed to parse settings JSON: {}", e)))?;

        if settings.package_name.is_empty() {
            return Err(CodegenError::Parse(
                "settings: package_name must not be empty".to_string(),
            ));
        }

        Ok(settings)
    }

    /// Kotlin package holding generated model types.
    pub fn model_package(&self) -> String {
        format!("{}.model", self.package_name)
    }

    /// Kotlin package holding generated serde and operation transforms.
    pub fn transform_package(&self) -> String {
        format!("{}.transform", self.package_name)
    }
}
