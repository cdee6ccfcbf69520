//! Protocol client generation
//!
//! Renders `Default<Service>.kt`: the service interface with its config
//! class, and the default implementation that round-trips every operation
//! through the generated serializers and deserializers.

use heck::{ToLowerCamelCase, ToUpperCamelCase};

use kolibri_common::{ConfigProperty, Result};
use kolibri_model::traits;

use crate::bindings::HttpBindingResolver;
use crate::context::CodegenContext;
use crate::integration::Middleware;
use crate::writer::CodeWriter;

/// Render the service interface and default client.
pub fn render_service_client(
    ctx: &CodegenContext<'_>,
    resolver: &HttpBindingResolver<'_>,
    writer: &mut CodeWriter,
    config_props: &[ConfigProperty],
    middleware: &[Middleware],
) -> Result<()> {
    let service = ctx.model.expect_service(&ctx.service_id)?;
    let service_name = ctx.service_id.shape_name().to_upper_camel_case();
    let client_name = format!("{}Client", service_name);
    let operations = resolver.binding_operations()?;

    writer.add_import("aws.smithy.kotlin.runtime.http.engine.HttpClientEngine");
    writer.add_import("aws.smithy.kotlin.runtime.http.operation.SdkHttpOperation");
    writer.add_import("aws.smithy.kotlin.runtime.http.operation.roundTrip");
    writer.add_import("aws.smithy.kotlin.runtime.http.sdkHttpClient");
    writer.add_dependency("aws.smithy.kotlin:http");
    for mw in middleware {
        if let Some(import) = &mw.import {
            writer.add_import(import);
        }
    }

    if let Some(docs) = traits::documentation(service.traits()) {
        writer.write("/**");
        for line in docs.lines() {
            writer.write(format!(" * {}", line));
        }
        writer.write(" */");
    }
    writer.with_block(&format!("interface {} {{", client_name), "}", |w| {
        w.with_block("class Config {", "}", |w| {
            w.write("var httpClientEngine: HttpClientEngine? = null");
            for prop in config_props {
                if let Some(docs) = &prop.documentation {
                    w.write("/**");
                    for line in docs.lines() {
                        w.write(format!(" * {}", line));
                    }
                    w.write(" */");
                }
                match &prop.default_value {
                    Some(default) => w.write(format!(
                        "var {}: {} = {}",
                        prop.name, prop.kotlin_type, default
                    )),
                    None => w.write(format!("var {}: {}? = null", prop.name, prop.kotlin_type)),
                }
            }
            Ok(())
        })?;
        w.write("");

        for op_id in &operations {
            let signature = operation_signature(ctx, op_id)?;
            render_operation_kdoc(ctx, w, op_id)?;
            w.write(format!("suspend fun {}", signature));
        }
        Ok(())
    })?;

    writer.write("");
    writer.with_block(
        &format!(
            "class Default{}(private val config: {}.Config) : {} {{",
            client_name, client_name, client_name
        ),
        "}",
        |w| {
            w.write("private val client = sdkHttpClient(config.httpClientEngine)");

            for op_id in &operations {
                let op_name = op_id.shape_name().to_upper_camel_case();
                let (input, output, _) = ctx.model.operation_signature(op_id)?;
                let signature = operation_signature(ctx, op_id)?;

                // transform types live in a sibling package
                let transform = ctx.settings.transform_package();
                w.add_import(&format!("{}.{}OperationSerializer", transform, op_name));
                if output.is_some() {
                    w.add_import(&format!("{}.{}OperationDeserializer", transform, op_name));
                } else {
                    w.add_import("aws.smithy.kotlin.runtime.http.operation.UnitDeserializer");
                }

                w.write("");
                w.with_block(&format!("override suspend fun {} {{", signature), "}", |w| {
                    w.with_block("val op = SdkHttpOperation.build {", "}", |w| {
                        w.write(format!("serializer = {}OperationSerializer()", op_name));
                        match output {
                            Some(_) => w.write(format!(
                                "deserializer = {}OperationDeserializer()",
                                op_name
                            )),
                            None => w.write("deserializer = UnitDeserializer"),
                        }
                        w.with_block("context {", "}", |w| {
                            w.write(format!("operationName = \"{}\"", op_name));
                            w.write(format!("serviceName = \"{}\"", ctx.settings.sdk_id));
                            Ok(())
                        })
                    })?;

                    for mw in middleware {
                        w.write(format!("op.install({})", mw.install_expr));
                    }

                    let call = if input.is_some() {
                        "return op.roundTrip(client, input)"
                    } else {
                        "return op.roundTrip(client, Unit)"
                    };
                    w.write(call);
                    Ok(())
                })?;
            }
            Ok(())
        },
    )
}

fn render_operation_kdoc(
    ctx: &CodegenContext<'_>,
    writer: &mut CodeWriter,
    op_id: &kolibri_model::ShapeId,
) -> Result<()> {
    let op = ctx.model.expect_shape(op_id)?;
    let docs = traits::documentation(op.traits());
    let paginated = op.traits().contains_key(traits::PAGINATED);
    if docs.is_none() && !paginated {
        return Ok(());
    }

    writer.write("/**");
    if let Some(docs) = docs {
        for line in docs.lines() {
            writer.write(format!(" * {}", line));
        }
    }
    if paginated {
        writer.write(" * This operation is paginated.");
    }
    writer.write(" */");
    Ok(())
}

/// `name(input: Req): Resp` signature text for an operation.
fn operation_signature(ctx: &CodegenContext<'_>, op_id: &kolibri_model::ShapeId) -> Result<String> {
    let fn_name = op_id.shape_name().to_lower_camel_case();
    let (input, output, _) = ctx.model.operation_signature(op_id)?;

    let params = match input {
        Some(id) => {
            let symbol = ctx.symbols.shape_symbol(ctx.model, &id)?;
            format!("input: {}", symbol.name)
        }
        None => String::new(),
    };
    let returns = match output {
        Some(id) => {
            let symbol = ctx.symbols.shape_symbol(ctx.model, &id)?;
            format!(": {}", symbol.name)
        }
        None => String::new(),
    };
    Ok(format!("{}({}){}", fn_name, params, returns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_util::test_context;
    use kolibri_model::ShapeId;

    const MODEL: &str = r#"{
        "smithy": "2.0",
        "shapes": {
            "com.test#Example": {
                "type": "service",
                "version": "1.0",
                "operations": [ { "target": "com.test#SmokeTest" } ],
                "traits": { "smithy.api#documentation": "An example service." }
            },
            "com.test#SmokeTest": {
                "type": "operation",
                "input": { "target": "com.test#SmokeTestRequest" },
                "output": { "target": "com.test#SmokeTestResponse" },
                "traits": {
                    "smithy.api#http": { "method": "POST", "uri": "/smoketest", "code": 200 }
                }
            },
            "com.test#SmokeTestRequest": {
                "type": "structure",
                "members": { "payload1": { "target": "smithy.api#String" } }
            },
            "com.test#SmokeTestResponse": {
                "type": "structure",
                "members": { "payload1": { "target": "smithy.api#String" } }
            }
        }
    }"#;

    #[test]
    fn test_client_interface_and_default_impl() {
        let (model, settings, symbols) = test_context(MODEL);
        let service_id = ShapeId::new("com.test#Example");
        let ctx = CodegenContext {
            model: &model,
            settings: &settings,
            symbols: &symbols,
            service_id: service_id.clone(),
        };
        let resolver = HttpBindingResolver::new(&model, service_id);
        let mut writer = CodeWriter::new("com.test.example", "DefaultExample.kt");

        let props = vec![ConfigProperty {
            name: "region".to_string(),
            kotlin_type: "String".to_string(),
            documentation: Some("Signing region.".to_string()),
            default_value: None,
        }];
        let middleware = vec![Middleware {
            install_expr: "RetryMiddleware()".to_string(),
            import: Some("aws.smithy.kotlin.runtime.http.middleware.RetryMiddleware".to_string()),
        }];

        render_service_client(&ctx, &resolver, &mut writer, &props, &middleware).unwrap();
        let out = writer.finalize().unwrap();

        assert!(out.contains("interface ExampleClient {"));
        assert!(out.contains("var httpClientEngine: HttpClientEngine? = null"));
        assert!(out.contains("var region: String? = null"));
        assert!(out.contains(
            "suspend fun smokeTest(input: SmokeTestRequest): SmokeTestResponse"
        ));
        assert!(out.contains(
            "class DefaultExampleClient(private val config: ExampleClient.Config) : ExampleClient {"
        ));
        assert!(out.contains("serializer = SmokeTestOperationSerializer()"));
        assert!(out.contains("deserializer = SmokeTestOperationDeserializer()"));
        assert!(out.contains("operationName = \"SmokeTest\""));
        assert!(out.contains("op.install(RetryMiddleware())"));
        assert!(out.contains("return op.roundTrip(client, input)"));
        assert!(out.contains("import com.test.example.transform.SmokeTestOperationSerializer"));
        assert!(out.contains("import aws.smithy.kotlin.runtime.http.middleware.RetryMiddleware"));
    }
}
