//! Kolibri CLI
//!
//! Command-line driver for generating Kotlin client packages from Smithy
//! service models.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;

use kolibri_codegen::bindings::HttpBindingResolver;
use kolibri_common::CodegenSettings;
use kolibri_model::{serde_closure, Model, ShapeId};

#[derive(Parser)]
#[command(name = "kolibri")]
#[command(version, about = "Generate Kotlin clients from Smithy service models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a Kotlin client package from a Smithy JSON AST model
    #[command(after_help = "EXAMPLES:\n  \
        kolibri generate \\\n    \
        --model service.json \\\n    \
        --settings settings.json \\\n    \
        --output ./generated")]
    Generate {
        /// Path to the Smithy JSON AST model
        #[arg(short, long)]
        model: PathBuf,

        /// Path to the codegen settings JSON
        #[arg(short, long)]
        settings: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "./generated")]
        output: PathBuf,
    },

    /// Parse a model and report what would be generated
    #[command(after_help = "EXAMPLES:\n  \
        # Use the only service in the model\n  \
        kolibri inspect --model service.json\n\n  \
        # Pick a service explicitly\n  \
        kolibri inspect --model service.json --service com.example#MyService")]
    Inspect {
        /// Path to the Smithy JSON AST model
        #[arg(short, long)]
        model: PathBuf,

        /// Service shape ID (auto-detected if the model has exactly one)
        #[arg(long)]
        service: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match cli.command {
        Commands::Generate {
            model,
            settings,
            output,
        } => generate_command(model.as_path(), settings.as_path(), output.as_path()),
        Commands::Inspect { model, service } => {
            inspect_command(model.as_path(), service.as_deref())
        }
    }
}

fn generate_command(model_path: &Path, settings_path: &Path, output: &Path) -> Result<()> {
    let settings_json = fs::read_to_string(settings_path)
        .with_context(|| format!("failed to read settings {}", settings_path.display()))?;
    let settings = CodegenSettings::from_json(&settings_json)
        .with_context(|| format!("failed to parse settings {}", settings_path.display()))?;

    let model = Model::from_file(model_path)
        .with_context(|| format!("failed to load model {}", model_path.display()))?;

    println!(
        "{} Generating {} ({})",
        "→".cyan(),
        settings.sdk_id.bold(),
        settings.package_name
    );

    let delegator = kolibri_codegen::generate(model, &settings, Vec::new())
        .context("code generation failed")?;
    let written = delegator
        .flush_to(output)
        .context("failed to write generated files")?;

    println!(
        "{} Wrote {} files to {}",
        "✓".green(),
        written.len(),
        output.display()
    );
    Ok(())
}

fn inspect_command(model_path: &Path, service: Option<&str>) -> Result<()> {
    let model = Model::from_file(model_path)
        .with_context(|| format!("failed to load model {}", model_path.display()))?;

    let service_id = match service {
        Some(id) => ShapeId::new(id),
        None => {
            let (id, _) = model
                .find_service()
                .context("model contains no service shape")?;
            id.clone()
        }
    };

    let resolver = HttpBindingResolver::new(&model, service_id.clone());
    let operations = resolver.binding_operations()?;

    let mut input_seeds = Vec::new();
    let mut output_seeds = Vec::new();
    for op_id in &operations {
        let (input, output, errors) = model.operation_signature(op_id)?;
        input_seeds.extend(input);
        output_seeds.extend(output);
        output_seeds.extend(errors);
    }
    let ser_closure = serde_closure(&model, &input_seeds)?;
    let de_closure = serde_closure(&model, &output_seeds)?;

    println!("{} {}", "Service:".bold(), service_id);
    println!("  Smithy version: {}", model.smithy_version());
    println!("  Shapes: {}", model.shapes().len());
    println!("  HTTP operations: {}", operations.len());
    for op_id in &operations {
        let http = resolver.http_trait(op_id)?;
        println!(
            "    {} {} {}",
            op_id.shape_name().bold(),
            http.method.green(),
            uri_to_string(&http)
        );
    }
    println!("  Document serializers: {}", ser_closure.len());
    println!("  Document deserializers: {}", de_closure.len());

    Ok(())
}

fn uri_to_string(http: &kolibri_model::traits::HttpTrait) -> String {
    let mut path = String::new();
    for segment in &http.uri.segments {
        path.push('/');
        match segment {
            kolibri_model::traits::UriSegment::Literal(text) => path.push_str(text),
            kolibri_model::traits::UriSegment::Label { name, greedy } => {
                path.push('{');
                path.push_str(name);
                if *greedy {
                    path.push('+');
                }
                path.push('}');
            }
        }
    }
    if path.is_empty() {
        path.push('/');
    }
    path
}
