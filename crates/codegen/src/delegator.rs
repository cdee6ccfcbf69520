//! File delegation and output flushing
//!
//! The delegator owns one writer per output path for the duration of a
//! run. Nothing reaches disk until every writer finalizes cleanly; a
//! failed file discards its buffer rather than flushing a partial
//! artifact.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::debug;

use kolibri_common::{CodegenError, Result};

use crate::writer::CodeWriter;

enum Artifact {
    Code(CodeWriter),
    Static(String),
}

/// Collects generated artifacts keyed by repository-relative path.
pub struct FileDelegator {
    timestamp_header: bool,
    artifacts: BTreeMap<String, Artifact>,
}

impl FileDelegator {
    pub fn new(timestamp_header: bool) -> Self {
        FileDelegator {
            timestamp_header,
            artifacts: BTreeMap::new(),
        }
    }

    /// Writer for `path`, created on first use with `package`.
    pub fn writer(&mut self, path: &str, package: &str) -> Result<&mut CodeWriter> {
        let entry = self
            .artifacts
            .entry(path.to_string())
            .or_insert_with(|| Artifact::Code(CodeWriter::new(package, path)));
        match entry {
            Artifact::Code(writer) => Ok(writer),
            Artifact::Static(_) => Err(CodegenError::Generation(format!(
                "{} was already written as a static file",
                path
            ))),
        }
    }

    /// Add a fully rendered file (templated scaffolding).
    pub fn add_static_file(&mut self, path: &str, content: String) {
        self.artifacts
            .insert(path.to_string(), Artifact::Static(content));
    }

    /// Build dependencies recorded by all writers.
    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut deps = BTreeSet::new();
        for artifact in self.artifacts.values() {
            if let Artifact::Code(writer) = artifact {
                deps.extend(writer.dependencies().iter().cloned());
            }
        }
        deps
    }

    fn header(&self) -> String {
        let mut header = String::from("// Code generated by kolibri. DO NOT EDIT.\n");
        if self.timestamp_header {
            header.push_str(&format!(
                "// Generated at {}\n",
                Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
            ));
        }
        header.push('\n');
        header
    }

    /// Finalize every artifact into its text. Any failure discards the
    /// whole batch.
    pub fn finalize(self) -> Result<BTreeMap<String, String>> {
        let header = self.header();
        let mut out = BTreeMap::new();
        for (path, artifact) in self.artifacts {
            let content = match artifact {
                Artifact::Code(writer) => format!("{}{}", header, writer.finalize()?),
                Artifact::Static(content) => content,
            };
            out.insert(path, content);
        }
        Ok(out)
    }

    /// Finalize and write everything under `out_dir`. Files are only
    /// written after every artifact finalized successfully.
    pub fn flush_to(self, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let finalized = self.finalize()?;

        let mut written = Vec::with_capacity(finalized.len());
        for (rel_path, content) in finalized {
            let path = out_dir.join(&rel_path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    CodegenError::Generation(format!(
                        "Failed to create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
            fs::write(&path, content).map_err(|e| {
                CodegenError::Generation(format!("Failed to write {}: {}", path.display(), e))
            })?;
            debug!("wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}
