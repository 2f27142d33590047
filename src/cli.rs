//! Minimal CLI: schema JSON or YAML → (typescript | check | ir)
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, info};

use verger::schema::{ConstructorStyle, MapRepr, OptionalRepr};
use verger::{generate, load_spec, Ir};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile node schemas into TypeScript types with navigation and dispatch helpers
#[derive(Parser, Debug)]
#[command(name = "verger", version)]
pub struct CommandLineInterface {
    /// log pipeline stages to stderr (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// generate TypeScript for each schema
    Generate(GenerateOut),
    /// load and assemble each schema, reporting one status line per input
    Check(CheckOut),
    /// print the assembled IR as JSON
    Ir(IrOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select the schema inside each document (e.g. /verger/schema)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is one schema
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs (.json, .yaml or .yml). May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

/// Replace individual keys of each schema's `options` block.
#[derive(Args, Debug, Clone, Default)]
struct OptionOverrides {
    /// name of the discriminant field
    #[arg(long)]
    tag_name: Option<String>,

    /// representation of optional fields
    #[arg(long, value_enum)]
    optional: Option<OptionalRepr>,

    /// representation of map fields
    #[arg(long, value_enum)]
    maps: Option<MapRepr>,

    /// constructor function style
    #[arg(long, value_enum)]
    constructor: Option<ConstructorStyle>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    overrides: OptionOverrides,

    /// output .ts file (stdout if omitted)
    #[arg(short, long, conflicts_with = "out_dir")]
    out: Option<PathBuf>,

    /// write one .ts file per schema into this directory
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    overrides: OptionOverrides,
}

#[derive(clap::Parser, Debug)]
struct IrOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    overrides: OptionOverrides,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One schema value and where it came from.
#[derive(Debug, Clone)]
struct Document {
    path: PathBuf,
    /// Position among the jq outputs of `path`, when there were several.
    index: Option<usize>,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Document {
    fn label(&self) -> String {
        match self.index {
            Some(i) => format!("{}#{i}", self.path.display()),
            None => self.path.display().to_string(),
        }
    }

    fn output_name(&self, extension: &str) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "schema".to_string());
        match self.index {
            Some(i) => PathBuf::from(format!("{stem}-{i}.{extension}")),
            None => PathBuf::from(format!("{stem}.{extension}")),
        }
    }
}

impl InputSettings {
    fn load_documents(&self, overrides: &OptionOverrides) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut documents = Vec::new();
        for path in source_paths {
            let label = path.display().to_string();
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read source file {label}"))?;
            let mut value = parse_source(&path, &source)?;
            if let Some(pointer) = self.json_pointer.as_ref() {
                value = value
                    .pointer(pointer)
                    .cloned()
                    .ok_or_else(|| anyhow!("JSON pointer {pointer} selects nothing in {label}"))?;
            }
            let values = match self.jq_expr.as_ref() {
                None => vec![value],
                Some(jq_expr) => crate::jq_exec::run_jaq(jq_expr, &value).with_context(|| {
                    format!("failed to apply jq expression to source file {label}")
                })?,
            };
            let several = values.len() > 1;
            for (i, mut value) in values.into_iter().enumerate() {
                overrides.apply(&mut value);
                documents.push(Document {
                    path: path.clone(),
                    index: several.then_some(i),
                    value,
                });
            }
        }
        debug!(documents = documents.len(), "loaded inputs");
        Ok(documents)
    }
}

impl OptionOverrides {
    fn is_empty(&self) -> bool {
        self.tag_name.is_none()
            && self.optional.is_none()
            && self.maps.is_none()
            && self.constructor.is_none()
    }

    /// Rewrite the `options` block. Documents of the wrong shape are left
    /// alone for the loader to report.
    fn apply(&self, value: &mut Value) {
        if self.is_empty() {
            return;
        }
        let Some(root) = value.as_object_mut() else {
            return;
        };
        let options = root
            .entry("options")
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        let Some(options) = options.as_object_mut() else {
            return;
        };
        if let Some(tag_name) = &self.tag_name {
            options.insert("tagName".into(), Value::String(tag_name.clone()));
        }
        if let Some(optional) = self.optional {
            options.insert("optional".into(), enum_value(optional));
        }
        if let Some(maps) = self.maps {
            options.insert("maps".into(), enum_value(maps));
        }
        if let Some(constructor) = self.constructor {
            options.insert("constructor".into(), enum_value(constructor));
        }
    }
}

fn enum_value<T: serde::Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn verbose(&self) -> bool {
        self.verbose
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                let documents = target.input_settings.load_documents(&target.overrides)?;
                if let Some(out_dir) = target.out_dir.as_ref() {
                    let paths = output_paths(&documents, out_dir)?;
                    // independent inputs: generate in parallel, write afterwards
                    let sources = documents.par_iter().map(compile).collect::<Result<Vec<_>>>()?;
                    let outputs = paths.into_iter().zip(sources);
                    std::fs::create_dir_all(out_dir)
                        .with_context(|| format!("failed to create {}", out_dir.display()))?;
                    for (path, src) in outputs {
                        write_file(&path, &src)?;
                        info!(path = %path.display(), "wrote");
                    }
                    return Ok(());
                }
                if target.out.is_some() && documents.len() > 1 {
                    bail!("--out takes exactly one schema, got {}; use --out-dir", documents.len());
                }
                for doc in &documents {
                    let src = compile(doc)?;
                    match target.out.as_ref() {
                        Some(out) => write_file(out, &src)?,
                        None => println!("{src}"),
                    }
                }
                Ok(())
            }
            Command::Check(target) => {
                let documents = target.input_settings.load_documents(&target.overrides)?;
                let mut failed = 0;
                for doc in &documents {
                    match assemble(doc) {
                        Ok(ir) => println!("{} {} ({} declarations)", "✓".green(), doc.label(), ir.nodes.len()),
                        Err(error) => {
                            failed += 1;
                            println!("{} {}: {error:#}", "✗".red(), doc.label());
                        }
                    }
                }
                if failed > 0 {
                    bail!("{failed} of {} schemas failed", documents.len());
                }
                Ok(())
            }
            Command::Ir(target) => {
                let documents = target.input_settings.load_documents(&target.overrides)?;
                let views = documents
                    .iter()
                    .map(|doc| assemble(doc).and_then(|ir| Ok(serde_json::to_value(&ir)?)))
                    .collect::<Result<Vec<_>>>()?;
                let view = match <[Value; 1]>::try_from(views) {
                    Ok([single]) => single,
                    Err(views) => Value::Array(views),
                };
                let src = serde_json::to_string_pretty(&view)?;
                match target.out.as_ref() {
                    Some(out) => write_file(out, &src),
                    None => {
                        println!("{src}");
                        Ok(())
                    }
                }
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn assemble(doc: &Document) -> Result<Ir> {
    let label = doc.label();
    let schema = load_spec(&doc.value).with_context(|| format!("invalid schema {label}"))?;
    let ir = Ir::build(&schema).with_context(|| format!("invalid schema {label}"))?;
    Ok(ir)
}

fn compile(doc: &Document) -> Result<String> {
    let label = doc.label();
    let schema = load_spec(&doc.value).with_context(|| format!("invalid schema {label}"))?;
    let src = generate(&schema).with_context(|| format!("failed to generate {label}"))?;
    debug!(input = %label, bytes = src.len(), "compiled");
    Ok(src)
}

fn parse_source(path: &Path, source: &str) -> Result<Value> {
    let label = path.display();
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str::<Value>(source)
            .with_context(|| format!("failed to parse YAML source file {label}")),
        _ => serde_json::from_str::<Value>(source)
            .with_context(|| format!("failed to parse JSON source file {label}")),
    }
}

/// One output file per document; two documents may not share one.
fn output_paths(documents: &[Document], out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut seen = IndexMap::<PathBuf, String>::new();
    for doc in documents {
        let path = out_dir.join(doc.output_name("ts"));
        if let Some(first) = seen.get(&path) {
            bail!("{} and {} would both be written to {}", first, doc.label(), path.display());
        }
        seen.insert(path, doc.label());
    }
    Ok(seen.into_keys().collect())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
