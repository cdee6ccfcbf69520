//! Smithy trait names and typed trait views
//!
//! Trait data arrives as raw `serde_json::Value`s keyed by trait ID. This
//! module names the IDs the generator interprets and provides typed parsers
//! for the structured ones (http, enum, timestampFormat).

use kolibri_common::{CodegenError, Result};

use crate::ast::TraitMap;

pub const DOCUMENTATION: &str = "smithy.api#documentation";
pub const REQUIRED: &str = "smithy.api#required";
pub const SENSITIVE: &str = "smithy.api#sensitive";
pub const HTTP: &str = "smithy.api#http";
pub const HTTP_ERROR: &str = "smithy.api#httpError";
pub const HTTP_LABEL: &str = "smithy.api#httpLabel";
pub const HTTP_QUERY: &str = "smithy.api#httpQuery";
pub const HTTP_QUERY_PARAMS: &str = "smithy.api#httpQueryParams";
pub const HTTP_HEADER: &str = "smithy.api#httpHeader";
pub const HTTP_PREFIX_HEADERS: &str = "smithy.api#httpPrefixHeaders";
pub const HTTP_PAYLOAD: &str = "smithy.api#httpPayload";
pub const HTTP_RESPONSE_CODE: &str = "smithy.api#httpResponseCode";
pub const ENUM: &str = "smithy.api#enum";
pub const SPARSE: &str = "smithy.api#sparse";
pub const STREAMING: &str = "smithy.api#streaming";
pub const TIMESTAMP_FORMAT: &str = "smithy.api#timestampFormat";
pub const IDEMPOTENCY_TOKEN: &str = "smithy.api#idempotencyToken";
pub const MEDIA_TYPE: &str = "smithy.api#mediaType";
pub const JSON_NAME: &str = "smithy.api#jsonName";
pub const ERROR: &str = "smithy.api#error";
pub const PAGINATED: &str = "smithy.api#paginated";
pub const DEPRECATED: &str = "smithy.api#deprecated";

/// String payload of a trait, e.g. `@httpHeader("X-Foo")`.
pub fn string_value<'a>(traits: &'a TraitMap, trait_id: &str) -> Option<&'a str> {
    traits.get(trait_id).and_then(|v| v.as_str())
}

/// Documentation trait text.
pub fn documentation(traits: &TraitMap) -> Option<&str> {
    string_value(traits, DOCUMENTATION)
}

/// Serialized-name hint from `@jsonName`.
pub fn json_name(traits: &TraitMap) -> Option<&str> {
    string_value(traits, JSON_NAME)
}

/// The three recognized timestamp formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    EpochSeconds,
    DateTime,
    HttpDate,
}

impl TimestampFormat {
    /// Parse a `@timestampFormat` trait value. `shape` names the offender
    /// in the error.
    pub fn parse(value: &str, shape: &str) -> Result<Self> {
        match value {
            "epoch-seconds" => Ok(TimestampFormat::EpochSeconds),
            "date-time" => Ok(TimestampFormat::DateTime),
            "http-date" => Ok(TimestampFormat::HttpDate),
            other => Err(CodegenError::UnknownTimestampFormat {
                shape: shape.to_string(),
                format: other.to_string(),
            }),
        }
    }

    /// Format from a trait map, if the trait is present.
    pub fn from_traits(traits: &TraitMap, shape: &str) -> Result<Option<Self>> {
        match string_value(traits, TIMESTAMP_FORMAT) {
            Some(value) => Ok(Some(Self::parse(value, shape)?)),
            None => Ok(None),
        }
    }

    /// Whether the wire representation is numeric rather than a string.
    pub fn is_numeric(&self) -> bool {
        matches!(self, TimestampFormat::EpochSeconds)
    }

    /// Name of the matching `TimestampFormat` constant in the Kotlin
    /// runtime.
    pub fn runtime_name(&self) -> &'static str {
        match self {
            TimestampFormat::EpochSeconds => "EPOCH_SECONDS",
            TimestampFormat::DateTime => "ISO_8601",
            TimestampFormat::HttpDate => "RFC_5322",
        }
    }

    /// Name of the matching `Instant` parse function in the Kotlin runtime.
    pub fn parse_fn(&self) -> &'static str {
        match self {
            TimestampFormat::EpochSeconds => "fromEpochSeconds",
            TimestampFormat::DateTime => "fromIso8601",
            TimestampFormat::HttpDate => "fromRfc5322",
        }
    }
}

/// One segment of an HTTP URI template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UriSegment {
    /// Literal path text
    Literal(String),
    /// `{name}` or `{name+}` label bound to an input member
    Label { name: String, greedy: bool },
}

/// Parsed `@http` uri, split into path segments and literal query pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    pub segments: Vec<UriSegment>,
    pub query_literals: Vec<(String, String)>,
}

impl UriTemplate {
    pub fn parse(uri: &str, shape: &str) -> Result<Self> {
        let (path, query) = match uri.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (uri, None),
        };

        let mut segments = Vec::new();
        for raw in path.split('/').filter(|s| !s.is_empty()) {
            if let Some(inner) = raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                let (name, greedy) = match inner.strip_suffix('+') {
                    Some(name) => (name, true),
                    None => (inner, false),
                };
                if name.is_empty() {
                    return Err(CodegenError::Parse(format!(
                        "empty uri label in `{}` on {}",
                        uri, shape
                    )));
                }
                segments.push(UriSegment::Label {
                    name: name.to_string(),
                    greedy,
                });
            } else if raw.contains('{') || raw.contains('}') {
                return Err(CodegenError::Parse(format!(
                    "malformed uri segment `{}` in `{}` on {}",
                    raw, uri, shape
                )));
            } else {
                segments.push(UriSegment::Literal(raw.to_string()));
            }
        }

        let mut query_literals = Vec::new();
        if let Some(query) = query {
            for pair in query.split('&').filter(|s| !s.is_empty()) {
                match pair.split_once('=') {
                    Some((k, v)) => query_literals.push((k.to_string(), v.to_string())),
                    None => query_literals.push((pair.to_string(), String::new())),
                }
            }
        }

        Ok(UriTemplate {
            segments,
            query_literals,
        })
    }

    /// Names of all labels in the template.
    pub fn label_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                UriSegment::Label { name, .. } => Some(name.as_str()),
                UriSegment::Literal(_) => None,
            })
            .collect()
    }
}

/// Parsed `@http` trait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTrait {
    pub method: String,
    pub uri: UriTemplate,
    pub code: u16,
}

impl HttpTrait {
    /// Parse the `@http` trait from a shape's trait map, if present.
    pub fn from_traits(traits: &TraitMap, shape: &str) -> Result<Option<Self>> {
        let value = match traits.get(HTTP) {
            Some(value) => value,
            None => return Ok(None),
        };

        let method = value
            .get("method")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CodegenError::UnknownTrait {
                shape: shape.to_string(),
                trait_id: format!("{} (method)", HTTP),
            })?
            .to_string();

        let uri_str = value.get("uri").and_then(|v| v.as_str()).ok_or_else(|| {
            CodegenError::UnknownTrait {
                shape: shape.to_string(),
                trait_id: format!("{} (uri)", HTTP),
            }
        })?;

        let code = value
            .get("code")
            .and_then(|v| v.as_u64())
            .unwrap_or(200) as u16;

        Ok(Some(HttpTrait {
            method,
            uri: UriTemplate::parse(uri_str, shape)?,
            code,
        }))
    }
}

/// One value of an `@enum` trait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDefinition {
    pub value: String,
    pub name: Option<String>,
    pub documentation: Option<String>,
}

/// Parsed `@enum` trait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumTrait {
    pub values: Vec<EnumDefinition>,
}

impl EnumTrait {
    pub fn from_traits(traits: &TraitMap, shape: &str) -> Result<Option<Self>> {
        let value = match traits.get(ENUM) {
            Some(value) => value,
            None => return Ok(None),
        };

        let entries = value.as_array().ok_or_else(|| CodegenError::UnknownTrait {
            shape: shape.to_string(),
            trait_id: ENUM.to_string(),
        })?;

        let mut values = Vec::with_capacity(entries.len());
        for entry in entries {
            let enum_value = entry
                .get("value")
                .and_then(|v| v.as_str())
                .ok_or_else(|| CodegenError::UnknownTrait {
                    shape: shape.to_string(),
                    trait_id: format!("{} (value)", ENUM),
                })?
                .to_string();

            values.push(EnumDefinition {
                value: enum_value,
                name: entry
                    .get("name")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string()),
                documentation: entry
                    .get("documentation")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string()),
            });
        }

        Ok(Some(EnumTrait { values }))
    }
}
