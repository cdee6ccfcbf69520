//! Tests for the integration extension points against a real generation run

use std::rc::Rc;

use kolibri_codegen::delegator::FileDelegator;
use kolibri_codegen::generate;
use kolibri_codegen::integration::{KolibriIntegration, Middleware};
use kolibri_codegen::context::CodegenContext;
use kolibri_common::{CodegenSettings, ConfigProperty, Result};
use kolibri_model::{Model, ShapeId};

const MODEL: &str = r#"{
    "smithy": "2.0",
    "shapes": {
        "com.test#Example": {
            "type": "service",
            "version": "1.0",
            "operations": [ { "target": "com.test#Ping" } ]
        },
        "com.test#Ping": {
            "type": "operation",
            "input": { "target": "com.test#PingRequest" },
            "output": { "target": "com.test#PingResponse" },
            "traits": {
                "smithy.api#http": { "method": "POST", "uri": "/ping", "code": 200 }
            }
        },
        "com.test#PingRequest": {
            "type": "structure",
            "members": { "message": { "target": "smithy.api#String" } }
        },
        "com.test#PingResponse": {
            "type": "structure",
            "members": { "message": { "target": "smithy.api#String" } }
        }
    }
}"#;

fn settings() -> CodegenSettings {
    CodegenSettings::from_json(
        r#"{
            "service": "com.test#Example",
            "package_name": "com.test.example",
            "package_version": "1.0.0",
            "sdk_id": "Example",
            "timestamp_header": false
        }"#,
    )
    .unwrap()
}

struct RegionSupport;

impl KolibriIntegration for RegionSupport {
    fn name(&self) -> &str {
        "region-support"
    }

    fn additional_service_config_props(
        &self,
        _settings: &CodegenSettings,
        _model: &Model,
    ) -> Vec<ConfigProperty> {
        vec![ConfigProperty {
            name: "region".to_string(),
            kotlin_type: "String".to_string(),
            documentation: Some("Region to sign requests for.".to_string()),
            default_value: None,
        }]
    }

    fn customize_middleware(
        &self,
        _settings: &CodegenSettings,
        _model: &Model,
        mut resolved: Vec<Middleware>,
    ) -> Vec<Middleware> {
        resolved.push(Middleware {
            install_expr: "ResolveEndpoint(config.region)".to_string(),
            import: Some("aws.smithy.kotlin.runtime.http.middleware.ResolveEndpoint".to_string()),
        });
        resolved
    }

    fn write_additional_files(
        &self,
        _ctx: &CodegenContext<'_>,
        delegator: &mut FileDelegator,
    ) -> Result<()> {
        delegator.add_static_file("NOTICE", "generated with region support\n".to_string());
        Ok(())
    }
}

struct ShapeDocBanner;

impl KolibriIntegration for ShapeDocBanner {
    fn name(&self) -> &str {
        "shape-doc-banner"
    }

    fn on_shape_writer_use(
        &self,
        _settings: &CodegenSettings,
        _model: &Model,
        _provider: &dyn kolibri_codegen::symbol::SymbolProvider,
        writer: &mut kolibri_codegen::writer::CodeWriter,
        shape_id: &ShapeId,
    ) {
        let banner = format!("// shape: {}", shape_id);
        writer.on_section(
            "shape-definition",
            Rc::new(move |w, default| {
                w.write(banner.as_str());
                w.write(default.trim_end());
                Ok(())
            }),
        );
    }
}

#[test]
fn test_config_properties_and_middleware_flow_into_client() {
    let model = Model::from_json(MODEL).unwrap();
    let files = generate(model, &settings(), vec![Box::new(RegionSupport)])
        .unwrap()
        .finalize()
        .unwrap();

    let client = &files["DefaultExample.kt"];
    assert!(client.contains("var region: String? = null"));
    assert!(client.contains("op.install(ResolveEndpoint(config.region))"));
    assert!(client.contains("import aws.smithy.kotlin.runtime.http.middleware.ResolveEndpoint"));

    assert_eq!(files["NOTICE"], "generated with region support\n");
}

#[test]
fn test_shape_writer_section_interceptor() {
    let model = Model::from_json(MODEL).unwrap();
    let files = generate(model, &settings(), vec![Box::new(ShapeDocBanner)])
        .unwrap()
        .finalize()
        .unwrap();

    let request = &files["model/PingRequest.kt"];
    assert!(request.contains("// shape: com.test#PingRequest"));
    assert!(request.contains("class PingRequest private constructor(builder: Builder) {"));
}
