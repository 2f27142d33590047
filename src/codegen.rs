//! TypeScript generation from the assembled [`Ir`].
//!
//! Output order: header, imports, base interfaces, leaves (interface, helper
//! class, constructor), unions (sum type plus dispatch namespace). Every
//! section iterates the IR in declaration order, so generation is
//! deterministic.
mod decls;
mod imports;
mod leaf;
mod props;
mod union;

use indexmap::IndexSet;
use tracing::debug;

use crate::error::GenerationError;
use crate::ir::Ir;
use crate::schema::Schema;

const HEADER: &[&str] = &[
    "DO NOT EDIT",
    "",
    "This file was generated by verger from a node schema. Change the schema",
    "and regenerate instead.",
];

/// Words that cannot name a function or parameter in generated code.
const RESERVED: &[&str] = &[
    "any", "as", "async", "await", "bigint", "boolean", "break", "case", "catch", "class",
    "const", "continue", "debugger", "declare", "default", "delete", "do", "else", "enum",
    "export", "extends", "false", "finally", "for", "from", "function", "get", "if",
    "implements", "import", "in", "infer", "instanceof", "interface", "is", "keyof", "let",
    "module", "namespace", "never", "new", "null", "number", "object", "of", "package",
    "private", "protected", "public", "readonly", "require", "return", "set", "static",
    "string", "super", "switch", "symbol", "this", "throw", "true", "try", "type", "typeof",
    "undefined", "unique", "unknown", "var", "void", "while", "with", "yield",
];

pub fn is_reserved(word: &str) -> bool {
    RESERVED.contains(&word)
}

pub struct Codegen<'a> {
    ir: &'a Ir,
    out: String,
    /// Function names handed out so far, seeded with every declared name.
    taken: IndexSet<String>,
}

impl<'a> Codegen<'a> {
    pub fn new(ir: &'a Ir) -> Self {
        Self {
            ir,
            out: String::new(),
            taken: ir.nodes.keys().cloned().collect(),
        }
    }

    pub fn emit(&mut self) -> Result<(), GenerationError> {
        let ir = self.ir;
        self.push(&comment(HEADER));
        let imports = imports::render(ir);
        if !imports.is_empty() {
            self.push(&imports);
        }
        for base in ir.bases() {
            self.push(&decls::render_base(ir, base));
        }
        for node in ir.leaves() {
            let ctor = self.claim(leaf::constructor_name(&node.name));
            let code = leaf::render(ir, node, &ctor)?;
            self.push(&code);
        }
        for node in ir.unions() {
            let code = union::render(ir, node)?;
            self.push(&code);
        }
        debug!(bytes = self.out.len(), "generated TypeScript");
        Ok(())
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn push(&mut self, section: &str) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.out.push_str(section);
        if !section.ends_with('\n') {
            self.out.push('\n');
        }
    }

    /// Escape `name` until it is neither reserved nor already taken.
    fn claim(&mut self, mut name: String) -> String {
        while is_reserved(&name) || self.taken.contains(&name) {
            name.push('_');
        }
        self.taken.insert(name.clone());
        name
    }
}

/// One-call form: assemble the IR and render it.
pub fn generate(schema: &Schema) -> Result<String, GenerationError> {
    let ir = Ir::build(schema)?;
    let mut codegen = Codegen::new(&ir);
    codegen.emit()?;
    Ok(codegen.into_string())
}

// ------------------------------- Helpers --------------------------------- //

pub(crate) fn lines<S: AsRef<str>>(parts: &[S]) -> String {
    parts.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("\n")
}

/// A `/** ... **/` block comment at column zero.
pub(crate) fn comment<S: AsRef<str>>(text: &[S]) -> String {
    indented_comment("", text)
}

pub(crate) fn indented_comment<S: AsRef<str>>(indent: &str, text: &[S]) -> String {
    let mut out = vec![format!("{indent}/**")];
    for line in text {
        let line = line.as_ref();
        if line.is_empty() {
            out.push(format!("{indent} *"));
        } else {
            out.push(format!("{indent} * {line}"));
        }
    }
    out.push(format!("{indent} **/"));
    lines(&out)
}

/// Double-quoted JavaScript string literal.
pub(crate) fn js_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
