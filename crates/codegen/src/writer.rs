//! Buffered line-oriented code writer
//!
//! Collects generated Kotlin text for one output file: indented blocks,
//! an import side-table deduplicated on emission, named format
//! substitution, and named sections that integrations may intercept.
//! Nothing reaches disk until `finalize` succeeds; an unbalanced block
//! stack at that point is a codegen error and the buffer is discarded.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::rc::Rc;

use kolibri_common::{CodegenError, Result};

use crate::symbol::Symbol;

const INDENT: &str = "    ";

/// Argument to `writef` format substitution.
pub enum FmtArg<'a> {
    /// Rendered verbatim by `#L`, quote-escaped by `#S`
    Str(Cow<'a, str>),
    /// Rendered by `#T`: local name plus a tracked import
    Symbol(&'a Symbol),
}

impl<'a> From<&'a str> for FmtArg<'a> {
    fn from(s: &'a str) -> Self {
        FmtArg::Str(Cow::Borrowed(s))
    }
}

impl<'a> From<String> for FmtArg<'a> {
    fn from(s: String) -> Self {
        FmtArg::Str(Cow::Owned(s))
    }
}

impl<'a> From<&'a String> for FmtArg<'a> {
    fn from(s: &'a String) -> Self {
        FmtArg::Str(Cow::Borrowed(s))
    }
}

impl<'a> From<&'a Symbol> for FmtArg<'a> {
    fn from(s: &'a Symbol) -> Self {
        FmtArg::Symbol(s)
    }
}

/// Section interceptor: receives the default body text and writes the
/// replacement (or the default, decorated) into the writer.
pub type SectionHandler = Rc<dyn Fn(&mut CodeWriter, &str) -> Result<()>>;

/// Buffered emitter for one generated Kotlin file.
pub struct CodeWriter {
    file_name: String,
    package: String,
    buf: String,
    indent: usize,
    open_blocks: usize,
    imports: BTreeMap<String, Option<String>>,
    dependencies: BTreeSet<String>,
    interceptors: HashMap<String, Vec<SectionHandler>>,
}

impl CodeWriter {
    pub fn new(package: &str, file_name: &str) -> Self {
        CodeWriter {
            file_name: file_name.to_string(),
            package: package.to_string(),
            buf: String::new(),
            indent: 0,
            open_blocks: 0,
            imports: BTreeMap::new(),
            dependencies: BTreeSet::new(),
            interceptors: HashMap::new(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Append one or more lines at the current indentation.
    pub fn write(&mut self, text: impl AsRef<str>) {
        for line in text.as_ref().split('\n') {
            if line.is_empty() {
                self.buf.push('\n');
            } else {
                for _ in 0..self.indent {
                    self.buf.push_str(INDENT);
                }
                self.buf.push_str(line);
                self.buf.push('\n');
            }
        }
    }

    /// Append a line with format substitution. `#L` renders the next
    /// argument verbatim, `#S` as a quoted Kotlin string, `#T` as a type
    /// name (tracking its import), and `##` escapes a literal `#`.
    pub fn writef(&mut self, fmt: &str, args: &[FmtArg<'_>]) -> Result<()> {
        let mut out = String::with_capacity(fmt.len());
        let mut chars = fmt.chars().peekable();
        let mut next_arg = 0;

        while let Some(ch) = chars.next() {
            if ch != '#' {
                out.push(ch);
                continue;
            }
            match chars.next() {
                Some('#') => out.push('#'),
                Some('L') => match take_arg(args, &mut next_arg, fmt)? {
                    FmtArg::Str(s) => out.push_str(s),
                    FmtArg::Symbol(symbol) => out.push_str(&symbol.name),
                },
                Some('S') => match take_arg(args, &mut next_arg, fmt)? {
                    FmtArg::Str(s) => {
                        out.push('"');
                        out.push_str(&escape_kotlin_string(s));
                        out.push('"');
                    }
                    FmtArg::Symbol(_) => {
                        return Err(CodegenError::Generation(format!(
                            "#S cannot render a symbol in `{}`",
                            fmt
                        )))
                    }
                },
                Some('T') => match take_arg(args, &mut next_arg, fmt)? {
                    FmtArg::Symbol(symbol) => {
                        self.add_import_for(symbol);
                        out.push_str(&symbol.name);
                    }
                    FmtArg::Str(_) => {
                        return Err(CodegenError::Generation(format!(
                            "#T expects a symbol in `{}`",
                            fmt
                        )))
                    }
                },
                other => {
                    return Err(CodegenError::Generation(format!(
                        "unknown format directive `#{}` in `{}`",
                        other.map(String::from).unwrap_or_default(),
                        fmt
                    )))
                }
            }
        }

        self.write(out);
        Ok(())
    }

    /// Open an indented block: write `prefix`, push indentation.
    pub fn open_block(&mut self, prefix: impl AsRef<str>) {
        self.write(prefix);
        self.indent += 1;
        self.open_blocks += 1;
    }

    /// Close the innermost block: pop indentation, write `suffix`.
    pub fn close_block(&mut self, suffix: impl AsRef<str>) {
        debug_assert!(self.open_blocks > 0, "close_block without open_block");
        self.indent = self.indent.saturating_sub(1);
        self.open_blocks = self.open_blocks.saturating_sub(1);
        self.write(suffix);
    }

    /// Run `body` inside an indented block. The block is closed on every
    /// exit path, error included, so the writer stays balanced.
    pub fn with_block<F>(&mut self, open: &str, close: &str, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.open_block(open);
        let result = body(self);
        self.close_block(close);
        result
    }

    /// Track an import for `symbol` and any symbols it references.
    pub fn add_import_for(&mut self, symbol: &Symbol) {
        if !symbol.namespace.is_empty() {
            // Generic type text is not importable; import the base name.
            let base = symbol.name.split('<').next().unwrap_or(&symbol.name);
            let base = base.trim_end_matches('?');
            self.add_import(&format!("{}.{}", symbol.namespace, base));
        }
        for reference in &symbol.references {
            self.add_import_for(reference);
        }
    }

    /// Track an import by qualified name. Duplicates collapse on emission.
    pub fn add_import(&mut self, qualified: &str) {
        self.imports.entry(qualified.to_string()).or_insert(None);
    }

    /// Track an aliased import (`import a.b.C as Alias`).
    pub fn add_import_alias(&mut self, qualified: &str, alias: &str) {
        self.imports
            .insert(qualified.to_string(), Some(alias.to_string()));
    }

    /// Record a build dependency of the generated artifact (Gradle
    /// coordinates), aggregated by the delegator into the scaffolded
    /// build file.
    pub fn add_dependency(&mut self, coordinates: &str) {
        self.dependencies.insert(coordinates.to_string());
    }

    pub fn dependencies(&self) -> &BTreeSet<String> {
        &self.dependencies
    }

    /// Register an interceptor for a named section. Last registered wins;
    /// each registration is consumed by one section render.
    pub fn on_section(&mut self, name: &str, handler: SectionHandler) {
        self.interceptors
            .entry(name.to_string())
            .or_default()
            .push(handler);
    }

    /// Render a named section: the default body is produced first, then
    /// handed to the innermost registered interceptor (if any), which
    /// writes the span in its place.
    pub fn declare_section<F>(&mut self, name: &str, default_body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let mut sub = CodeWriter::new(&self.package, &self.file_name);
        sub.indent = self.indent;
        default_body(&mut sub)?;

        // Merge whatever the default body pulled in.
        for (qualified, alias) in sub.imports {
            match alias {
                Some(alias) => self.add_import_alias(&qualified, &alias),
                None => self.add_import(&qualified),
            }
        }
        for dep in sub.dependencies {
            self.dependencies.insert(dep);
        }

        let default_text = sub.buf;
        let handler = self
            .interceptors
            .get_mut(name)
            .and_then(|handlers| handlers.pop());

        match handler {
            Some(handler) => handler(self, &default_text),
            None => {
                self.buf.push_str(&default_text);
                Ok(())
            }
        }
    }

    /// Finalize into file text: package declaration, deduplicated imports,
    /// body. Fails with `UnbalancedEmission` if blocks are still open.
    pub fn finalize(self) -> Result<String> {
        if self.open_blocks != 0 {
            return Err(CodegenError::UnbalancedEmission {
                file: self.file_name,
                depth: self.open_blocks,
            });
        }

        let mut out = String::new();
        out.push_str(&format!("package {}\n\n", self.package));

        let mut wrote_import = false;
        for (qualified, alias) in &self.imports {
            // Same-package types need no import.
            if qualified
                .rsplit_once('.')
                .is_some_and(|(pkg, _)| pkg == self.package)
            {
                continue;
            }
            match alias {
                Some(alias) => out.push_str(&format!("import {} as {}\n", qualified, alias)),
                None => out.push_str(&format!("import {}\n", qualified)),
            }
            wrote_import = true;
        }
        if wrote_import {
            out.push('\n');
        }

        out.push_str(&self.buf);
        Ok(out)
    }
}

fn take_arg<'x, 'a>(args: &'x [FmtArg<'a>], next: &mut usize, fmt: &str) -> Result<&'x FmtArg<'a>> {
    let arg = args.get(*next).ok_or_else(|| {
        CodegenError::Generation(format!(
            "format string `{}` expects more than {} argument(s)",
            fmt,
            args.len()
        ))
    })?;
    *next += 1;
    Ok(arg)
}

fn escape_kotlin_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_and_blocks() {
        let mut w = CodeWriter::new("com.test.example", "Foo.kt");
        w.with_block("class Foo {", "}", |w| {
            w.write("val x: Int = 0");
            Ok(())
        })
        .unwrap();

        let out = w.finalize().unwrap();
        assert_eq!(
            out,
            "package com.test.example\n\nclass Foo {\n    val x: Int = 0\n}\n"
        );
    }

    #[test]
    fn test_unbalanced_block_is_an_error() {
        let mut w = CodeWriter::new("com.test", "Foo.kt");
        w.open_block("class Foo {");
        let err = w.finalize().unwrap_err();
        assert_eq!(err.code(), "E_UNBALANCED_EMISSION");
    }

    #[test]
    fn test_block_closed_on_error_path() {
        let mut w = CodeWriter::new("com.test", "Foo.kt");
        let result = w.with_block("fun f() {", "}", |_| {
            Err(CodegenError::Generation("boom".to_string()))
        });
        assert!(result.is_err());
        // Block was still closed, so the writer finalizes cleanly.
        assert!(w.finalize().is_ok());
    }

    #[test]
    fn test_format_substitution() {
        let instant = Symbol::external("Instant", "aws.smithy.kotlin.runtime.time");
        let mut w = CodeWriter::new("com.test", "Foo.kt");
        w.writef(
            "val ts: #T = #T.fromEpochSeconds(#L)",
            &[(&instant).into(), (&instant).into(), "0".into()],
        )
        .unwrap();
        w.writef("val s = #S", &["he said \"hi\" for $1".into()])
            .unwrap();

        let out = w.finalize().unwrap();
        assert!(out.contains("import aws.smithy.kotlin.runtime.time.Instant\n"));
        assert!(out.contains("val ts: Instant = Instant.fromEpochSeconds(0)"));
        assert!(out.contains("val s = \"he said \\\"hi\\\" for \\$1\""));
    }

    #[test]
    fn test_imports_deduplicated_and_sorted() {
        let mut w = CodeWriter::new("com.test", "Foo.kt");
        w.add_import("z.last.Thing");
        w.add_import("a.first.Thing");
        w.add_import("a.first.Thing");
        w.add_import("com.test.Local");
        w.write("val x = 1");

        let out = w.finalize().unwrap();
        let import_block: Vec<&str> = out
            .lines()
            .filter(|l| l.starts_with("import "))
            .collect();
        assert_eq!(
            import_block,
            vec!["import a.first.Thing", "import z.last.Thing"]
        );
    }

    #[test]
    fn test_section_interceptor_last_registered_wins() {
        let mut w = CodeWriter::new("com.test", "Foo.kt");
        w.on_section(
            "config",
            Rc::new(|w, _default| {
                w.write("// first");
                Ok(())
            }),
        );
        w.on_section(
            "config",
            Rc::new(|w, default| {
                w.write("// second");
                w.write(default.trim_end());
                Ok(())
            }),
        );

        w.declare_section("config", |w| {
            w.write("val default = true");
            Ok(())
        })
        .unwrap();

        let out = w.finalize().unwrap();
        assert!(out.contains("// second"));
        assert!(out.contains("val default = true"));
        assert!(!out.contains("// first"));
    }

    #[test]
    fn test_section_without_interceptor_renders_default() {
        let mut w = CodeWriter::new("com.test", "Foo.kt");
        w.declare_section("config", |w| {
            w.write("val default = true");
            Ok(())
        })
        .unwrap();
        let out = w.finalize().unwrap();
        assert!(out.contains("val default = true"));
    }
}
