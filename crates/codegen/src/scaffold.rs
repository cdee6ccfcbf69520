//! Static scaffolding for the generated package
//!
//! Everything line-oriented goes through the `CodeWriter`; the
//! file-shaped, mostly-static artifacts (`build.gradle.kts`, `README.md`)
//! render through tera templates instead.

use std::collections::BTreeSet;

use tera::Tera;

use kolibri_common::{CodegenError, CodegenSettings, Result};

/// Version of the Kotlin runtime the generated build file pins.
const RUNTIME_VERSION: &str = "1.0.11";

/// Load the scaffolding templates.
fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    tera.add_raw_template(
        "build.gradle.kts",
        include_str!("../templates/build.gradle.kts.tera"),
    )
    .map_err(|e| {
        CodegenError::Generation(format!("Failed to load build.gradle.kts template: {}", e))
    })?;

    tera.add_raw_template("README.md", include_str!("../templates/README.md.tera"))
        .map_err(|e| {
            CodegenError::Generation(format!("Failed to load README.md template: {}", e))
        })?;

    Ok(tera)
}

/// Render the generated package's build file and README.
///
/// `dependencies` are the Gradle coordinates recorded by the code writers
/// during generation; each is pinned to the runtime version.
pub fn render_scaffolding(
    settings: &CodegenSettings,
    service_name: &str,
    operation_count: usize,
    dependencies: &BTreeSet<String>,
) -> Result<Vec<(String, String)>> {
    let tera = load_templates()?;

    let mut context = tera::Context::new();
    context.insert("package_name", &settings.package_name);
    context.insert("package_version", &settings.package_version);
    context.insert("sdk_id", &settings.sdk_id);
    context.insert("service_name", service_name);
    context.insert("operation_count", &operation_count);
    context.insert(
        "dependencies",
        &dependencies.iter().collect::<Vec<&String>>(),
    );
    context.insert("runtime_version", RUNTIME_VERSION);

    let build_file = tera
        .render("build.gradle.kts", &context)
        .map_err(|e| CodegenError::Generation(format!("Template error: {}", e)))?;
    let readme = tera
        .render("README.md", &context)
        .map_err(|e| CodegenError::Generation(format!("Template error: {}", e)))?;

    Ok(vec![
        ("build.gradle.kts".to_string(), build_file),
        ("README.md".to_string(), readme),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CodegenSettings {
        CodegenSettings::from_json(
            r#"{
                "service": "com.test#Example",
                "package_name": "com.test.example",
                "package_version": "1.2.3",
                "sdk_id": "Example"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_build_file_pins_recorded_dependencies() {
        let mut deps = BTreeSet::new();
        deps.insert("aws.smithy.kotlin:http".to_string());
        deps.insert("aws.smithy.kotlin:serde".to_string());

        let rendered = render_scaffolding(&settings(), "Example", 3, &deps).unwrap();
        let build_file = &rendered[0].1;

        assert!(build_file.contains("group = \"com.test.example\""));
        assert!(build_file.contains("version = \"1.2.3\""));
        assert!(build_file
            .contains(&format!("implementation(\"aws.smithy.kotlin:http:{}\")", RUNTIME_VERSION)));
        assert!(build_file
            .contains(&format!("implementation(\"aws.smithy.kotlin:serde:{}\")", RUNTIME_VERSION)));
    }

    #[test]
    fn test_readme_mentions_client_entry_point() {
        let rendered = render_scaffolding(&settings(), "Example", 3, &BTreeSet::new()).unwrap();
        let readme = &rendered[1].1;

        assert!(readme.contains("# Example client"));
        assert!(readme.contains("DefaultExampleClient"));
        assert!(readme.contains("Operations: 3"));
    }
}
