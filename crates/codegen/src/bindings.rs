//! HTTP binding resolution
//!
//! Classifies each member of an operation input/output into an HTTP
//! location, validates binding targets, and resolves content types and
//! timestamp formats. Binding errors are fatal for the operation and carry
//! the offending member ID.

use log::warn;

use kolibri_common::{CodegenError, Result};
use kolibri_model::traits::{self, HttpTrait, TimestampFormat};
use kolibri_model::{MemberShape, Model, ShapeId, ShapeType};

/// HTTP location a member is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpLocation {
    Label,
    Query,
    QueryParams,
    Header,
    PrefixHeaders,
    Payload,
    Document,
    ResponseCode,
}

/// Direction a structure is bound in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingDirection {
    Request,
    Response,
}

/// One member classified into an HTTP location.
#[derive(Debug, Clone)]
pub struct HttpBinding {
    pub member_name: String,
    pub member_id: ShapeId,
    pub member: MemberShape,
    pub location: HttpLocation,
    /// Header/query/label name, or the serialized field name for document
    /// members.
    pub location_name: String,
}

/// Resolves HTTP bindings for the operations of one service.
pub struct HttpBindingResolver<'a> {
    model: &'a Model,
    service_id: ShapeId,
    /// Content type for structured document bodies.
    document_content_type: String,
}

impl<'a> HttpBindingResolver<'a> {
    pub fn new(model: &'a Model, service_id: ShapeId) -> Self {
        HttpBindingResolver {
            model,
            service_id,
            document_content_type: "application/json".to_string(),
        }
    }

    /// Operations of the service that carry an `@http` trait. Operations
    /// without one are skipped with a warning; they do not abort the run.
    pub fn binding_operations(&self) -> Result<Vec<ShapeId>> {
        let mut ops = Vec::new();
        for op_id in self.model.service_operations(&self.service_id)? {
            let op = self.model.expect_shape(&op_id)?;
            if op.traits().contains_key(traits::HTTP) {
                ops.push(op_id);
            } else {
                warn!("operation {} has no http trait; skipping", op_id);
            }
        }
        Ok(ops)
    }

    /// Parsed `@http` trait of an operation.
    pub fn http_trait(&self, op_id: &ShapeId) -> Result<HttpTrait> {
        let op = self.model.expect_shape(op_id)?;
        HttpTrait::from_traits(op.traits(), op_id.as_str())?.ok_or_else(|| {
            CodegenError::UnknownTrait {
                shape: op_id.to_string(),
                trait_id: traits::HTTP.to_string(),
            }
        })
    }

    /// Bindings for an operation's input members.
    pub fn request_bindings(&self, op_id: &ShapeId) -> Result<Vec<HttpBinding>> {
        let (input, _, _) = self.model.operation_signature(op_id)?;
        match input {
            Some(input_id) => self.struct_bindings(&input_id, BindingDirection::Request),
            None => Ok(Vec::new()),
        }
    }

    /// Bindings for an operation's output members.
    pub fn response_bindings(&self, op_id: &ShapeId) -> Result<Vec<HttpBinding>> {
        let (_, output, _) = self.model.operation_signature(op_id)?;
        match output {
            Some(output_id) => self.struct_bindings(&output_id, BindingDirection::Response),
            None => Ok(Vec::new()),
        }
    }

    /// Bindings for an error structure (always response-shaped).
    pub fn error_bindings(&self, error_id: &ShapeId) -> Result<Vec<HttpBinding>> {
        self.struct_bindings(error_id, BindingDirection::Response)
    }

    /// Classify every member of `struct_id` into a location and validate
    /// the combination.
    pub fn struct_bindings(
        &self,
        struct_id: &ShapeId,
        direction: BindingDirection,
    ) -> Result<Vec<HttpBinding>> {
        let shape = self.model.expect_shape(struct_id)?;
        let mut bindings = Vec::new();

        for (member_name, member_id, member) in self.model.members_of(struct_id, shape) {
            let binding =
                self.classify_member(&member_name, &member_id, member, direction)?;
            bindings.push(binding);
        }

        self.validate(struct_id, &bindings)?;
        Ok(bindings)
    }

    fn classify_member(
        &self,
        member_name: &str,
        member_id: &ShapeId,
        member: &MemberShape,
        direction: BindingDirection,
    ) -> Result<HttpBinding> {
        let t = &member.traits;
        let make = |location: HttpLocation, location_name: String| HttpBinding {
            member_name: member_name.to_string(),
            member_id: member_id.clone(),
            member: member.clone(),
            location,
            location_name,
        };

        let binding = if t.contains_key(traits::HTTP_LABEL) {
            if direction == BindingDirection::Response {
                return Err(self.invalid(member_id, "httpLabel is a request-only binding"));
            }
            if !t.contains_key(traits::REQUIRED) {
                return Err(self.invalid(member_id, "httpLabel members must be required"));
            }
            make(HttpLocation::Label, member_name.to_string())
        } else if let Some(name) = traits::string_value(t, traits::HTTP_QUERY) {
            make(HttpLocation::Query, name.to_string())
        } else if t.contains_key(traits::HTTP_QUERY_PARAMS) {
            let target = self.model.target_of(member)?;
            if target.shape_type() != ShapeType::Map {
                return Err(self.invalid(member_id, "httpQueryParams must target a map"));
            }
            make(HttpLocation::QueryParams, String::new())
        } else if let Some(name) = traits::string_value(t, traits::HTTP_HEADER) {
            make(HttpLocation::Header, name.to_string())
        } else if let Some(prefix) = traits::string_value(t, traits::HTTP_PREFIX_HEADERS) {
            let target = self.model.target_of(member)?;
            if target.shape_type() != ShapeType::Map {
                return Err(self.invalid(member_id, "httpPrefixHeaders must target a map"));
            }
            make(HttpLocation::PrefixHeaders, prefix.to_string())
        } else if t.contains_key(traits::HTTP_PAYLOAD) {
            make(HttpLocation::Payload, member_name.to_string())
        } else if t.contains_key(traits::HTTP_RESPONSE_CODE) {
            if direction == BindingDirection::Request {
                return Err(self.invalid(member_id, "httpResponseCode is a response-only binding"));
            }
            let target = self.model.target_of(member)?;
            if target.shape_type() != ShapeType::Integer {
                return Err(self.invalid(member_id, "httpResponseCode must target an integer"));
            }
            make(HttpLocation::ResponseCode, String::new())
        } else {
            let serial_name = traits::json_name(t).unwrap_or(member_name);
            make(HttpLocation::Document, serial_name.to_string())
        };

        Ok(binding)
    }

    fn validate(&self, struct_id: &ShapeId, bindings: &[HttpBinding]) -> Result<()> {
        let payloads: Vec<&HttpBinding> = bindings
            .iter()
            .filter(|b| b.location == HttpLocation::Payload)
            .collect();
        if payloads.len() > 1 {
            return Err(self.invalid(
                &payloads[1].member_id,
                "at most one httpPayload binding per structure",
            ));
        }

        let prefix_headers = bindings
            .iter()
            .filter(|b| b.location == HttpLocation::PrefixHeaders)
            .count();
        if prefix_headers > 1 {
            return Err(CodegenError::InvalidBinding {
                member: struct_id.to_string(),
                reason: "at most one httpPrefixHeaders binding per structure".to_string(),
            });
        }

        // httpPayload excludes implicit document bindings. Models mixing
        // the two are rejected rather than guessing a content type.
        if !payloads.is_empty() {
            if let Some(document) = bindings
                .iter()
                .find(|b| b.location == HttpLocation::Document)
            {
                return Err(self.invalid(
                    &document.member_id,
                    "document-bound member not allowed alongside httpPayload",
                ));
            }
        }

        Ok(())
    }

    fn invalid(&self, member_id: &ShapeId, reason: &str) -> CodegenError {
        CodegenError::InvalidBinding {
            member: member_id.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Document-location bindings only.
    pub fn document_bindings(bindings: &[HttpBinding]) -> Vec<&HttpBinding> {
        bindings
            .iter()
            .filter(|b| b.location == HttpLocation::Document)
            .collect()
    }

    /// The payload binding, if any.
    pub fn payload_binding(bindings: &[HttpBinding]) -> Option<&HttpBinding> {
        bindings
            .iter()
            .find(|b| b.location == HttpLocation::Payload)
    }

    /// Content type of the request body, `None` when the operation sends
    /// no body. No protocol-default fallback: `None` means no
    /// `Content-Type` header is emitted.
    pub fn content_type(&self, op_id: &ShapeId) -> Result<Option<String>> {
        let bindings = self.request_bindings(op_id)?;

        if let Some(payload) = Self::payload_binding(&bindings) {
            let target = self.model.target_of(&payload.member)?;
            let media_type = traits::string_value(target.traits(), traits::MEDIA_TYPE);
            let content_type = match target.shape_type() {
                ShapeType::Blob => media_type.unwrap_or("application/octet-stream").to_string(),
                ShapeType::String => media_type.unwrap_or("text/plain").to_string(),
                ShapeType::Structure | ShapeType::Union | ShapeType::Document => {
                    self.document_content_type.clone()
                }
                _ => {
                    return Err(self.invalid(
                        &payload.member_id,
                        "httpPayload must target a blob, string, structure, union, or document",
                    ))
                }
            };
            return Ok(Some(content_type));
        }

        if bindings
            .iter()
            .any(|b| b.location == HttpLocation::Document)
        {
            return Ok(Some(self.document_content_type.clone()));
        }

        Ok(None)
    }

    /// Resolve the timestamp format for a member in a location.
    /// Precedence: member trait, then target-shape trait, then the
    /// location default (header: http-date; label/query: date-time;
    /// document: the protocol default, epoch-seconds).
    pub fn timestamp_format(
        &self,
        member_id: &ShapeId,
        member: &MemberShape,
        location: HttpLocation,
    ) -> Result<TimestampFormat> {
        if let Some(format) = TimestampFormat::from_traits(&member.traits, member_id.as_str())? {
            return Ok(format);
        }

        let target = self.model.target_of(member)?;
        if let Some(format) =
            TimestampFormat::from_traits(target.traits(), member.target.as_str())?
        {
            return Ok(format);
        }

        Ok(match location {
            HttpLocation::Header | HttpLocation::PrefixHeaders => TimestampFormat::HttpDate,
            HttpLocation::Label | HttpLocation::Query | HttpLocation::QueryParams => {
                TimestampFormat::DateTime
            }
            _ => TimestampFormat::EpochSeconds,
        })
    }

    pub fn model(&self) -> &Model {
        self.model
    }
}

/// Timestamp format for a document-bound member: member trait, then
/// target-shape trait, then the protocol default (epoch-seconds). The
/// document emitters use this without needing a service-scoped resolver.
pub fn document_timestamp_format(
    model: &Model,
    member_id: &ShapeId,
    member: &MemberShape,
) -> Result<TimestampFormat> {
    if let Some(format) = TimestampFormat::from_traits(&member.traits, member_id.as_str())? {
        return Ok(format);
    }
    let target = model.expect_shape(&member.target)?;
    if let Some(format) = TimestampFormat::from_traits(target.traits(), member.target.as_str())? {
        return Ok(format);
    }
    Ok(TimestampFormat::EpochSeconds)
}

/// Whether a response structure carries any binding that reads the HTTP
/// body (payload or document).
pub fn has_body_bindings(bindings: &[HttpBinding]) -> bool {
    bindings.iter().any(|b| {
        matches!(
            b.location,
            HttpLocation::Payload | HttpLocation::Document
        )
    })
}
