//! Shape-to-symbol mapping
//!
//! A `Symbol` is the bridge between a shape in the graph and the Kotlin
//! type the generated code names for it: local type text, defining package,
//! nullability, default value, and any referenced symbols that need
//! importing. Two equal symbols refer to the same generated type.

use std::cell::RefCell;
use std::collections::HashMap;

use heck::ToUpperCamelCase;

use kolibri_common::{CodegenSettings, Result};
use kolibri_model::{traits, MemberShape, Model, Shape, ShapeId};

/// Runtime packages the generated code imports from.
pub mod runtime {
    pub const TIME: &str = "aws.smithy.kotlin.runtime.time";
    pub const CONTENT: &str = "aws.smithy.kotlin.runtime.content";
    pub const SMITHY: &str = "aws.smithy.kotlin.runtime.smithy";
    pub const SERDE: &str = "aws.smithy.kotlin.runtime.serde";
    pub const HTTP: &str = "aws.smithy.kotlin.runtime.http";
    pub const HTTP_OPERATION: &str = "aws.smithy.kotlin.runtime.http.operation";
    pub const HTTP_REQUEST: &str = "aws.smithy.kotlin.runtime.http.request";
    pub const HTTP_RESPONSE: &str = "aws.smithy.kotlin.runtime.http.response";
    pub const CLIENT: &str = "aws.smithy.kotlin.runtime.client";
    pub const UTIL: &str = "aws.smithy.kotlin.runtime.util";
}

/// A target-language symbol for a shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Local Kotlin type text, including generics (e.g. `List<String?>`)
    pub name: String,

    /// Defining package; empty for Kotlin builtins
    pub namespace: String,

    /// Whether a member of this type is nullable by default
    pub nullable: bool,

    /// Default-value expression for unboxed primitives
    pub default_value: Option<String>,

    /// Symbols referenced from generic parameters, for import tracking
    pub references: Vec<Symbol>,
}

impl Symbol {
    /// A Kotlin builtin needing no import.
    pub fn builtin(name: &str) -> Self {
        Symbol {
            name: name.to_string(),
            namespace: String::new(),
            nullable: true,
            default_value: None,
            references: Vec::new(),
        }
    }

    fn primitive(name: &str, default_value: &str) -> Self {
        Symbol {
            name: name.to_string(),
            namespace: String::new(),
            nullable: false,
            default_value: Some(default_value.to_string()),
            references: Vec::new(),
        }
    }

    /// A type defined in `namespace`.
    pub fn external(name: &str, namespace: &str) -> Self {
        Symbol {
            name: name.to_string(),
            namespace: namespace.to_string(),
            nullable: true,
            default_value: None,
            references: Vec::new(),
        }
    }

    fn with_references(mut self, references: Vec<Symbol>) -> Self {
        self.references = references;
        self
    }

    /// Fully qualified name, or the bare name for builtins.
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// The type text with a trailing `?` when nullable.
    pub fn decl_name(&self) -> String {
        if self.nullable {
            format!("{}?", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Maps shapes to symbols. Decorators wrap the previous provider and may
/// intercept specific shapes, delegating the rest.
pub trait SymbolProvider {
    /// Symbol for a shape.
    fn shape_symbol(&self, model: &Model, id: &ShapeId) -> Result<Symbol>;

    /// Symbol for a member, with member-level nullability applied: nullable
    /// unless the member is `@required` or targets an unboxed primitive
    /// with a default value.
    fn member_symbol(&self, model: &Model, member_id: &ShapeId, member: &MemberShape)
        -> Result<Symbol>;
}

/// Base Kotlin symbol provider. Symbols are memoized per shape ID.
pub struct KotlinSymbolProvider {
    model_package: String,
    cache: RefCell<HashMap<ShapeId, Symbol>>,
}

impl KotlinSymbolProvider {
    pub fn new(settings: &CodegenSettings) -> Self {
        KotlinSymbolProvider {
            model_package: settings.model_package(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    fn compute(&self, model: &Model, id: &ShapeId) -> Result<Symbol> {
        let shape = model.expect_shape(id)?;
        let symbol = match shape {
            Shape::Boolean { .. } => self.boxed_or(id, Symbol::primitive("Boolean", "false")),
            Shape::Byte { .. } => self.boxed_or(id, Symbol::primitive("Byte", "0")),
            Shape::Short { .. } => self.boxed_or(id, Symbol::primitive("Short", "0")),
            Shape::Integer { .. } => self.boxed_or(id, Symbol::primitive("Int", "0")),
            Shape::Long { .. } => self.boxed_or(id, Symbol::primitive("Long", "0L")),
            Shape::Float { .. } => self.boxed_or(id, Symbol::primitive("Float", "0.0f")),
            Shape::Double { .. } => self.boxed_or(id, Symbol::primitive("Double", "0.0")),
            Shape::BigInteger { .. } => Symbol::external("BigInteger", "java.math"),
            Shape::BigDecimal { .. } => Symbol::external("BigDecimal", "java.math"),
            Shape::String { traits: t } => {
                if t.contains_key(traits::ENUM) {
                    // Enum strings generate a sealed class in the model package
                    Symbol::external(&id.shape_name().to_upper_camel_case(), &self.model_package)
                } else {
                    Symbol::builtin("String")
                }
            }
            Shape::Blob { traits: t } => {
                if t.contains_key(traits::STREAMING) {
                    Symbol::external("ByteStream", runtime::CONTENT)
                } else {
                    Symbol::builtin("ByteArray")
                }
            }
            Shape::Timestamp { .. } => Symbol::external("Instant", runtime::TIME),
            Shape::Document { .. } => Symbol::external("Document", runtime::SMITHY),
            Shape::List { member, traits: t } => {
                self.collection_symbol(model, "List", member, t.contains_key(traits::SPARSE))?
            }
            Shape::Set { member, traits: t } => {
                self.collection_symbol(model, "Set", member, t.contains_key(traits::SPARSE))?
            }
            Shape::Map {
                value, traits: t, ..
            } => {
                let value_symbol = self.shape_symbol(model, &value.target)?;
                let sparse = t.contains_key(traits::SPARSE);
                let value_text = if sparse {
                    format!("{}?", value_symbol.name)
                } else {
                    value_symbol.name.clone()
                };
                Symbol::builtin(&format!("Map<String, {}>", value_text))
                    .with_references(vec![value_symbol])
            }
            Shape::Structure { .. } | Shape::Union { .. } => {
                Symbol::external(&id.shape_name().to_upper_camel_case(), &self.model_package)
            }
            Shape::Service { .. } | Shape::Operation { .. } | Shape::Resource { .. } => {
                Symbol::builtin(&id.shape_name().to_upper_camel_case())
            }
            Shape::Other => Symbol::builtin("Unit"),
        };
        Ok(symbol)
    }

    // Prelude `Primitive*` shapes keep their default values; everything
    // else is boxed (nullable, no default) when used as a member target.
    fn boxed_or(&self, id: &ShapeId, primitive: Symbol) -> Symbol {
        if id.is_prelude() && id.shape_name().starts_with("Primitive") {
            primitive
        } else {
            Symbol {
                nullable: true,
                default_value: None,
                ..primitive
            }
        }
    }

    fn collection_symbol(
        &self,
        model: &Model,
        container: &str,
        member: &MemberShape,
        sparse: bool,
    ) -> Result<Symbol> {
        let element = self.shape_symbol(model, &member.target)?;
        let element_text = if sparse {
            format!("{}?", element.name)
        } else {
            element.name.clone()
        };
        Ok(
            Symbol::builtin(&format!("{}<{}>", container, element_text))
                .with_references(vec![element]),
        )
    }
}

impl SymbolProvider for KotlinSymbolProvider {
    fn shape_symbol(&self, model: &Model, id: &ShapeId) -> Result<Symbol> {
        if let Some(symbol) = self.cache.borrow().get(id) {
            return Ok(symbol.clone());
        }
        let symbol = self.compute(model, id)?;
        self.cache
            .borrow_mut()
            .insert(id.clone(), symbol.clone());
        Ok(symbol)
    }

    fn member_symbol(
        &self,
        model: &Model,
        _member_id: &ShapeId,
        member: &MemberShape,
    ) -> Result<Symbol> {
        let mut symbol = self.shape_symbol(model, &member.target)?;
        if member.traits.contains_key(traits::REQUIRED) {
            symbol.nullable = false;
        }
        Ok(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings() -> CodegenSettings {
        CodegenSettings::from_json(
            r#"{
                "service": "com.test#Example",
                "package_name": "com.test.example",
                "package_version": "1.0.0",
                "sdk_id": "Example"
            }"#,
        )
        .unwrap()
    }

    const MODEL: &str = r#"{
        "smithy": "2.0",
        "shapes": {
            "com.test#Nested": {
                "type": "structure",
                "members": { "x": { "target": "smithy.api#Integer" } }
            },
            "com.test#IntList": {
                "type": "list",
                "member": { "target": "smithy.api#Integer" },
                "traits": { "smithy.api#sparse": {} }
            },
            "com.test#StrMap": {
                "type": "map",
                "key": { "target": "smithy.api#String" },
                "value": { "target": "smithy.api#String" }
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
    }"#;

    #[test]
    fn test_primitive_symbols_are_boxed_by_default() {
        let model = Model::from_json(MODEL).unwrap();
        let provider = KotlinSymbolProvider::new(&test_settings());

        let int = provider
            .shape_symbol(&model, &ShapeId::new("smithy.api#Integer"))
            .unwrap();
        assert_eq!(int.name, "Int");
        assert!(int.nullable);
        assert_eq!(int.default_value, None);

        let prim = provider
            .shape_symbol(&model, &ShapeId::new("smithy.api#PrimitiveInteger"))
            .unwrap();
        assert!(!prim.nullable);
        assert_eq!(prim.default_value.as_deref(), Some("0"));
    }

    #[test]
    fn test_sparse_list_element_is_nullable() {
        let model = Model::from_json(MODEL).unwrap();
        let provider = KotlinSymbolProvider::new(&test_settings());

        let list = provider
            .shape_symbol(&model, &ShapeId::new("com.test#IntList"))
            .unwrap();
        assert_eq!(list.name, "List<Int?>");
    }

    #[test]
    fn test_map_symbol() {
        let model = Model::from_json(MODEL).unwrap();
        let provider = KotlinSymbolProvider::new(&test_settings());

        let map = provider
            .shape_symbol(&model, &ShapeId::new("com.test#StrMap"))
            .unwrap();
        assert_eq!(map.name, "Map<String, String>");
    }

    #[test]
    fn test_enum_string_references_generated_type() {
        let model = Model::from_json(MODEL).unwrap();
        let provider = KotlinSymbolProvider::new(&test_settings());

        let yn = provider
            .shape_symbol(&model, &ShapeId::new("com.test#Yn"))
            .unwrap();
        assert_eq!(yn.name, "Yn");
        assert_eq!(yn.namespace, "com.test.example.model");
    }

    #[test]
    fn test_required_member_is_not_nullable() {
        let model = Model::from_json(MODEL).unwrap();
        let provider = KotlinSymbolProvider::new(&test_settings());

        let member: MemberShape = serde_json::from_str(
            r#"{ "target": "smithy.api#String", "traits": { "smithy.api#required": {} } }"#,
        )
        .unwrap();
        let symbol = provider
            .member_symbol(&model, &ShapeId::new("com.test#S$name"), &member)
            .unwrap();
        assert!(!symbol.nullable);
    }
}
