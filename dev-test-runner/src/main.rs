//! Runs every bundled sample schema under every option combination and checks
//! structural properties of the generated TypeScript.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

static CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^export class (\w+) \{$").unwrap());
static UNION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^export type (\w+) = ").unwrap());
static OMITTABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^    \w+\?: ").unwrap());
static IMPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?m)^import \{ [\w, ]+ \} from "([^"]+)";$"#).unwrap());

const OPTIONALS: &[&str] = &["omittable-key", "nullable", "monadic-wrapper"];
const MAPS: &[&str] = &["plain-record", "associative-container"];
const CONSTRUCTORS: &[&str] = &["positional-args", "single-parameter-object"];

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Expectation {
    sample: String,
    unions: Vec<String>,
    leaves: Vec<String>,
    imports: Vec<String>,
    has_optional: bool,
}

fn samples_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("samples")
}

fn load_expectations(dir: &Path) -> Result<Vec<Expectation>, String> {
    let source = std::fs::read_to_string(dir.join("expectations.json"))
        .map_err(|e| format!("reading expectations: {e}"))?;
    let de = &mut serde_json::Deserializer::from_str(&source);
    serde_path_to_error::deserialize(de).map_err(|e| format!("expectations at {}: {}", e.path(), e.inner()))
}

fn with_options(schema: &Value, optional: &str, maps: &str, constructor: &str) -> Value {
    let mut schema = schema.clone();
    if let Some(root) = schema.as_object_mut() {
        let options = root.entry("options").or_insert_with(|| json!({}));
        if let Some(options) = options.as_object_mut() {
            options.insert("optional".into(), json!(optional));
            options.insert("maps".into(), json!(maps));
            options.insert("constructor".into(), json!(constructor));
        }
    }
    schema
}

fn check(expect: &Expectation, src: &str, optional: &str, maps: &str) -> Vec<String> {
    let mut problems = Vec::new();

    let classes = CLASS.captures_iter(src).map(|c| c[1].to_string()).collect::<Vec<_>>();
    if classes != expect.leaves {
        problems.push(format!("leaf classes {classes:?}, expected {:?}", expect.leaves));
    }
    for leaf in &expect.leaves {
        if !src.contains(&format!("export interface {leaf} ")) {
            problems.push(format!("missing interface for {leaf}"));
        }
        if !src.contains(&format!("): {leaf} {{")) {
            problems.push(format!("missing constructor for {leaf}"));
        }
    }

    let unions = UNION.captures_iter(src).map(|c| c[1].to_string()).collect::<Vec<_>>();
    if unions != expect.unions {
        problems.push(format!("unions {unions:?}, expected {:?}", expect.unions));
    }
    for union in &expect.unions {
        if !src.contains(&format!("export namespace {union} {{")) {
            problems.push(format!("missing namespace for {union}"));
        }
    }
    for helper in ["anyIs", "children", "map", "partialMap", "match", "partialMatch"] {
        let count = src.matches(&format!("    export const {helper} = ")).count();
        if count != expect.unions.len() {
            problems.push(format!("{count} `{helper}` helpers for {} unions", expect.unions.len()));
        }
    }

    let mut expected_imports = expect.imports.clone();
    if optional == "monadic-wrapper" && expect.has_optional {
        expected_imports.push("purify-ts/Maybe".to_string());
    }
    let imports = IMPORT.captures_iter(src).map(|c| c[1].to_string()).collect::<Vec<_>>();
    if imports != expected_imports {
        problems.push(format!("imports {imports:?}, expected {expected_imports:?}"));
    }

    if maps == "associative-container" && src.contains("Record<string, ") {
        problems.push("plain record emitted under associative-container".to_string());
    }
    if expect.has_optional && (optional == "omittable-key") != OMITTABLE.is_match(src) {
        problems.push("omittable keys must appear exactly in omittable-key mode".to_string());
    }
    if optional != "monadic-wrapper" && src.contains("Maybe<") {
        problems.push("wrapped optional emitted outside monadic-wrapper mode".to_string());
    }
    problems
}

fn main() -> ExitCode {
    let dir = samples_dir();
    let expectations = match load_expectations(&dir) {
        Ok(x) => x,
        Err(error) => {
            eprintln!("❌ {error}");
            return ExitCode::FAILURE;
        }
    };

    let mut failures = 0;
    let mut runs = 0;
    for expect in &expectations {
        let path = dir.join(&expect.sample);
        let schema = match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|s| serde_json::from_str::<Value>(&s).map_err(|e| e.to_string()))
        {
            Ok(x) => x,
            Err(error) => {
                eprintln!("❌ {}: {error}", path.display());
                failures += 1;
                continue;
            }
        };
        for optional in OPTIONALS {
            for maps in MAPS {
                for constructor in CONSTRUCTORS {
                    runs += 1;
                    let label = format!("{} [{optional}, {maps}, {constructor}]", expect.sample);
                    let value = with_options(&schema, optional, maps, constructor);
                    let generated = verger::load_spec(&value)
                        .map_err(|e| e.to_string())
                        .and_then(|loaded| {
                            let first = verger::generate(&loaded).map_err(|e| e.to_string())?;
                            let second = verger::generate(&loaded).map_err(|e| e.to_string())?;
                            if first != second {
                                return Err("output differs between two runs".to_string());
                            }
                            Ok(first)
                        });
                    let problems = match generated {
                        Ok(src) => check(expect, &src, optional, maps),
                        Err(error) => vec![error],
                    };
                    if problems.is_empty() {
                        eprintln!("✅ {label}");
                    } else {
                        failures += 1;
                        eprintln!("❌ {label}");
                        for problem in problems {
                            eprintln!("    {problem}");
                        }
                    }
                }
            }
        }
    }

    eprintln!("—— {runs} runs, {failures} failed ——");
    if failures == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
