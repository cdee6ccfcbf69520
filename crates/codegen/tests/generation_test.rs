//! End-to-end generation tests over a small HTTP service model

use std::collections::BTreeMap;

use kolibri_codegen::generate;
use kolibri_codegen::integration::KolibriIntegration;
use kolibri_common::CodegenSettings;
use kolibri_model::Model;

const SMOKE_TEST_MODEL: &str = r#"{
    "smithy": "2.0",
    "shapes": {
        "com.test#Example": {
            "type": "service",
            "version": "1.0",
            "operations": [
                { "target": "com.test#SmokeTest" },
                { "target": "com.test#GetMeta" }
            ]
        },
        "com.test#SmokeTest": {
            "type": "operation",
            "input": { "target": "com.test#SmokeTestRequest" },
            "output": { "target": "com.test#SmokeTestResponse" },
            "errors": [ { "target": "com.test#NotFound" } ],
            "traits": {
                "smithy.api#http": { "method": "POST", "uri": "/smoketest/{label1}/foo", "code": 200 }
            }
        },
        "com.test#GetMeta": {
            "type": "operation",
            "output": { "target": "com.test#GetMetaResponse" },
            "traits": {
                "smithy.api#http": { "method": "GET", "uri": "/meta", "code": 200 }
            }
        },
        "com.test#SmokeTestRequest": {
            "type": "structure",
            "members": {
                "label1": {
                    "target": "smithy.api#String",
                    "traits": { "smithy.api#httpLabel": {}, "smithy.api#required": {} }
                },
                "query1": {
                    "target": "smithy.api#String",
                    "traits": { "smithy.api#httpQuery": "Query1" }
                },
                "header1": {
                    "target": "smithy.api#String",
                    "traits": { "smithy.api#httpHeader": "X-Header1" }
                },
                "payload1": { "target": "smithy.api#String" },
                "payload2": { "target": "smithy.api#Integer" },
                "payload3": { "target": "com.test#Nested" },
                "choice": { "target": "com.test#Yn" }
            }
        },
        "com.test#SmokeTestResponse": {
            "type": "structure",
            "members": {
                "payload1": { "target": "smithy.api#String" }
            }
        },
        "com.test#GetMetaResponse": {
            "type": "structure",
            "members": {
                "meta": {
                    "target": "com.test#MetaMap",
                    "traits": { "smithy.api#httpPrefixHeaders": "X-Foo-" }
                }
            }
        },
        "com.test#MetaMap": {
            "type": "map",
            "key": { "target": "smithy.api#String" },
            "value": { "target": "smithy.api#String" }
        },
        "com.test#Nested": {
            "type": "structure",
            "members": {
                "nestedField1": { "target": "smithy.api#String" }
            }
        },
        "com.test#NotFound": {
            "type": "structure",
            "members": {
                "message": { "target": "smithy.api#String" }
            },
            "traits": { "smithy.api#error": "client" }
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

fn run_generation(integrations: Vec<Box<dyn KolibriIntegration>>) -> BTreeMap<String, String> {
    let model = Model::from_json(SMOKE_TEST_MODEL).unwrap();
    generate(model, &settings(), integrations)
        .unwrap()
        .finalize()
        .unwrap()
}

#[test]
fn test_expected_files_are_emitted() {
    let files = run_generation(Vec::new());
    let paths: Vec<&str> = files.keys().map(|s| s.as_str()).collect();

    assert!(paths.contains(&"model/SmokeTestRequest.kt"));
    assert!(paths.contains(&"model/SmokeTestResponse.kt"));
    assert!(paths.contains(&"model/GetMetaResponse.kt"));
    assert!(paths.contains(&"model/Nested.kt"));
    assert!(paths.contains(&"model/NotFound.kt"));
    assert!(paths.contains(&"model/Yn.kt"));
    assert!(paths.contains(&"transform/SmokeTestOperationSerializer.kt"));
    assert!(paths.contains(&"transform/SmokeTestOperationDeserializer.kt"));
    assert!(paths.contains(&"transform/GetMetaOperationSerializer.kt"));
    assert!(paths.contains(&"transform/GetMetaOperationDeserializer.kt"));
    assert!(paths.contains(&"transform/NotFoundDeserializer.kt"));
    assert!(paths.contains(&"DefaultExample.kt"));
    assert!(paths.contains(&"build.gradle.kts"));
    assert!(paths.contains(&"README.md"));

    // Nested is reachable from the input only, so it gets a serializer
    // but no deserializer.
    assert!(paths.contains(&"transform/NestedDocumentSerializer.kt"));
    assert!(!paths.contains(&"transform/NestedDocumentDeserializer.kt"));
}

#[test]
fn test_smoke_test_serializer_fragments() {
    let files = run_generation(Vec::new());
    let serializer = &files["transform/SmokeTestOperationSerializer.kt"];

    assert!(serializer.contains("builder.method = HttpMethod.POST"));
    assert!(serializer.contains("path = \"/smoketest/${input.label1}/foo\""));
    assert!(serializer.contains("if (input.query1 != null) append(\"Query1\", input.query1)"));
    assert!(serializer
        .contains("if (input.header1?.isNotEmpty() == true) append(\"X-Header1\", input.header1)"));
    assert!(serializer.contains(
        "input.payload3?.let { field(PAYLOAD3_DESCRIPTOR, NestedDocumentSerializer(it)) }"
    ));

    // descriptor list is alphabetical: choice, payload1, payload2, payload3
    let c = serializer.find("field(CHOICE_DESCRIPTOR)").unwrap();
    let p1 = serializer.find("field(PAYLOAD1_DESCRIPTOR)").unwrap();
    let p2 = serializer.find("field(PAYLOAD2_DESCRIPTOR)").unwrap();
    let p3 = serializer.find("field(PAYLOAD3_DESCRIPTOR)").unwrap();
    assert!(c < p1 && p1 < p2 && p2 < p3);
}

#[test]
fn test_enum_type_has_sdk_unknown_and_from_value() {
    let files = run_generation(Vec::new());
    let enum_file = &files["model/Yn.kt"];

    assert!(enum_file.contains("sealed class Yn {"));
    assert!(enum_file.contains("data class SdkUnknown(override val value: String) : Yn()"));
    assert!(enum_file.contains("fun fromValue(str: String): Yn = when (str) {"));
    assert!(enum_file.contains("else -> SdkUnknown(str)"));
}

#[test]
fn test_prefix_headers_response() {
    let files = run_generation(Vec::new());
    let deserializer = &files["transform/GetMetaOperationDeserializer.kt"];

    assert!(deserializer.contains(
        "val keysForMeta = response.headers.names().filter { it.startsWith(\"X-Foo-\") }"
    ));
    assert!(deserializer.contains("hdrKey.removePrefix(\"X-Foo-\")"));
    assert!(deserializer.contains("builder.meta = map"));
}

#[test]
fn test_error_deserializer_builds_exception_type() {
    let files = run_generation(Vec::new());
    let error_file = &files["model/NotFound.kt"];
    let deserializer = &files["transform/NotFoundDeserializer.kt"];

    assert!(error_file.contains(": ServiceException() {"));
    assert!(deserializer.contains("internal class NotFoundDeserializer : HttpDeserialize<NotFound> {"));
    assert!(deserializer.contains("val builder = NotFound.Builder()"));
}

#[test]
fn test_required_member_is_unguarded_and_optional_guarded() {
    let files = run_generation(Vec::new());
    let request = &files["model/SmokeTestRequest.kt"];

    assert!(request.contains("val label1: String = requireNotNull(builder.label1)"));
    assert!(request.contains("val query1: String? = builder.query1"));
}

#[test]
fn test_rerun_is_byte_identical() {
    let first = run_generation(Vec::new());
    let second = run_generation(Vec::new());
    assert_eq!(first, second);
}

#[test]
fn test_identity_integration_is_idempotent() {
    struct Identity;
    impl KolibriIntegration for Identity {
        fn name(&self) -> &str {
            "identity"
        }
    }

    let baseline = run_generation(Vec::new());
    let once = run_generation(vec![Box::new(Identity)]);
    let twice = run_generation(vec![Box::new(Identity), Box::new(Identity)]);

    assert_eq!(baseline, once);
    assert_eq!(once, twice);
}

#[test]
fn test_build_file_collects_runtime_dependencies() {
    let files = run_generation(Vec::new());
    let build_file = &files["build.gradle.kts"];

    assert!(build_file.contains("implementation(\"aws.smithy.kotlin:http:"));
    assert!(build_file.contains("implementation(\"aws.smithy.kotlin:serde:"));
}

#[test]
fn test_flush_to_disk() {
    let model = Model::from_json(SMOKE_TEST_MODEL).unwrap();
    let delegator = generate(model, &settings(), Vec::new()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let written = delegator.flush_to(dir.path()).unwrap();
    assert!(!written.is_empty());
    assert!(dir.path().join("transform/SmokeTestOperationSerializer.kt").exists());
    assert!(dir.path().join("DefaultExample.kt").exists());

    let client = std::fs::read_to_string(dir.path().join("DefaultExample.kt")).unwrap();
    assert!(client.starts_with("// Code generated by kolibri. DO NOT EDIT."));
}
