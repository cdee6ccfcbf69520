//! Synthesized `smithy.api` prelude shapes
//!
//! Models routinely target prelude shapes (`smithy.api#String`,
//! `smithy.api#PrimitiveInteger`, ...) without defining them in the
//! document. Lookups fall back to this table so traversal and symbol
//! mapping see a complete graph.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::ast::{Shape, TraitMap};

fn simple(kind: &str) -> Shape {
    // Round-trip through the tagged representation keeps this table in
    // lockstep with the serde layout of `Shape`.
    serde_json::from_value(serde_json::json!({ "type": kind }))
        .expect("prelude shape kind must deserialize")
}

/// Prelude shape for `name`, if the prelude defines one.
pub fn prelude_shape(name: &str) -> Option<&'static Shape> {
    static PRELUDE: OnceLock<BTreeMap<&'static str, Shape>> = OnceLock::new();
    let table = PRELUDE.get_or_init(|| {
        let mut table: BTreeMap<&'static str, Shape> = BTreeMap::new();
        table.insert("String", simple("string"));
        table.insert("Blob", simple("blob"));
        table.insert("Boolean", simple("boolean"));
        table.insert("Byte", simple("byte"));
        table.insert("Short", simple("short"));
        table.insert("Integer", simple("integer"));
        table.insert("Long", simple("long"));
        table.insert("Float", simple("float"));
        table.insert("Double", simple("double"));
        table.insert("BigInteger", simple("bigInteger"));
        table.insert("BigDecimal", simple("bigDecimal"));
        table.insert("Timestamp", simple("timestamp"));
        table.insert("Document", simple("document"));
        table.insert("PrimitiveBoolean", simple("boolean"));
        table.insert("PrimitiveByte", simple("byte"));
        table.insert("PrimitiveShort", simple("short"));
        table.insert("PrimitiveInteger", simple("integer"));
        table.insert("PrimitiveLong", simple("long"));
        table.insert("PrimitiveFloat", simple("float"));
        table.insert("PrimitiveDouble", simple("double"));
        table.insert("Unit", Shape::Structure {
            members: BTreeMap::new(),
            traits: TraitMap::new(),
        });
        table
    });
    table.get(name)
}
