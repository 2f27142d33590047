//! Field-descriptor mini-language.
//!
//! ```text
//! descriptor := core "?"        Optional
//!             | core "[]"       Array
//!             | core "{}"       Map
//!             | "<" core ">"    Set
//!             | core            Scalar
//! core       := part ("|" part)*
//! part       := builtin | "." literal | TypeName
//! ```
//!
//! All parts of one core must agree on their kind.
use serde::Serialize;

use super::{is_valid_identifier, NameTable};
use crate::error::SchemaError;

/// Built-in scalar type names, emitted as-is.
pub const BUILTINS: &[&str] = &["string", "number", "boolean", "bigint", "null", "unknown"];

/// Leading marker of an enum literal part.
pub const LITERAL_MARKER: char = '.';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Structure {
    Scalar,
    Array,
    Optional,
    Map,
    Set,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ValueKind {
    Builtin { types: Vec<String> },
    Enum { tags: Vec<String> },
    Node { types: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub structure: Structure,
    pub kind: ValueKind,
}

impl FieldDescriptor {
    pub fn is_node(&self) -> bool {
        matches!(self.kind, ValueKind::Node { .. })
    }
    /// `true` for `Node` fields naming `ty` among their alternatives.
    pub fn references(&self, ty: &str) -> bool {
        match &self.kind {
            ValueKind::Node { types } => types.iter().any(|t| t == ty),
            _ => false,
        }
    }
    /// A list of literal strings given in place of a descriptor string.
    pub fn enum_literals(tags: Vec<String>) -> Self {
        Self {
            structure: Structure::Scalar,
            kind: ValueKind::Enum { tags },
        }
    }
}

/// Parse one descriptor string. `path` and `field` only feed diagnostics.
pub fn parse_field(
    path: &str,
    field: &str,
    text: &str,
    names: &NameTable,
) -> Result<FieldDescriptor, SchemaError> {
    let unrecognized = || SchemaError::UnrecognizedFieldSyntax {
        path: path.to_string(),
        field: field.to_string(),
        text: text.to_string(),
    };

    let (structure, core) = split_structure(text);
    let mut parts: Vec<&str> = Vec::new();
    for part in core.split('|').map(str::trim) {
        if part.is_empty() {
            return Err(unrecognized());
        }
        if !parts.contains(&part) {
            parts.push(part);
        }
    }

    let kind = if parts.iter().all(|p| BUILTINS.contains(p)) {
        ValueKind::Builtin {
            types: parts.iter().map(|p| p.to_string()).collect(),
        }
    } else if parts.iter().all(|p| p.starts_with(LITERAL_MARKER)) {
        let tags = parts
            .iter()
            .map(|p| &p[LITERAL_MARKER.len_utf8()..])
            .collect::<Vec<_>>();
        if tags.iter().any(|t| t.is_empty()) {
            return Err(unrecognized());
        }
        ValueKind::Enum {
            tags: tags.into_iter().map(str::to_string).collect(),
        }
    } else if parts.iter().all(|p| is_valid_identifier(p)) {
        // a builtin mixed with node types is not a valid combination
        if parts.iter().any(|p| BUILTINS.contains(p)) {
            return Err(unrecognized());
        }
        if let Some(unknown) = parts.iter().find(|p| !names.contains(p)) {
            return Err(SchemaError::UnknownType {
                path: path.to_string(),
                field: field.to_string(),
                ty: unknown.to_string(),
            });
        }
        ValueKind::Node {
            types: parts.iter().map(|p| p.to_string()).collect(),
        }
    } else {
        return Err(unrecognized());
    };

    Ok(FieldDescriptor { structure, kind })
}

/// Strip the outer wrapper. Priority: `?`, `[]`, `{}`, `<...>`.
fn split_structure(text: &str) -> (Structure, &str) {
    let text = text.trim();
    if let Some(core) = text.strip_suffix('?') {
        (Structure::Optional, core.trim())
    } else if let Some(core) = text.strip_suffix("[]") {
        (Structure::Array, core.trim())
    } else if let Some(core) = text.strip_suffix("{}") {
        (Structure::Map, core.trim())
    } else if let Some(core) = text.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        (Structure::Set, core.trim())
    } else {
        (Structure::Scalar, text)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::DeclKind;

    fn names() -> NameTable {
        let mut names = NameTable::default();
        names.declare("Expr", DeclKind::Union);
        names.declare("Stmt", DeclKind::Union);
        names.declare("Span", DeclKind::External);
        names
    }

    fn parse(text: &str) -> Result<FieldDescriptor, SchemaError> {
        parse_field("nodes.Expr.Lit[0].x", "x", text, &names())
    }

    #[test]
    fn wrappers_select_structure() {
        assert_eq!(parse("number").unwrap().structure, Structure::Scalar);
        assert_eq!(parse("Expr?").unwrap().structure, Structure::Optional);
        assert_eq!(parse("Expr[]").unwrap().structure, Structure::Array);
        assert_eq!(parse("Expr{}").unwrap().structure, Structure::Map);
        assert_eq!(parse("<Expr>").unwrap().structure, Structure::Set);
        assert_eq!(parse("  string[] ").unwrap().structure, Structure::Array);
    }

    #[test]
    fn builtin_unions_stay_builtin() {
        let field = parse("string | number").unwrap();
        assert_eq!(
            field.kind,
            ValueKind::Builtin { types: vec!["string".into(), "number".into()] }
        );
    }

    #[test]
    fn literal_marker_builds_enum() {
        let field = parse(".add|.sub|.mul").unwrap();
        assert_eq!(
            field.kind,
            ValueKind::Enum { tags: vec!["add".into(), "sub".into(), "mul".into()] }
        );
    }

    #[test]
    fn declared_names_build_node_refs() {
        let field = parse("Expr|Stmt[]").unwrap();
        assert_eq!(field.structure, Structure::Array);
        assert!(field.references("Stmt"));
        assert!(parse("Span?").unwrap().references("Span"));
    }

    #[test]
    fn unknown_type_names_the_type() {
        let err = parse("Expr|Missing").unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownType {
                path: "nodes.Expr.Lit[0].x".into(),
                field: "x".into(),
                ty: "Missing".into(),
            }
        );
        assert_eq!(err.kind(), ErrorKind::Reference);
    }

    #[test]
    fn mixed_or_malformed_parts_are_syntax_errors() {
        for text in ["string|Expr", ".a|b", "Expr[]?", "Expr||Stmt", "", ".", "Expr<"] {
            let err = parse(text).unwrap_err();
            assert!(
                matches!(err, SchemaError::UnrecognizedFieldSyntax { .. }),
                "{text}: {err}"
            );
            assert_eq!(err.kind(), ErrorKind::Syntax);
        }
    }
}
