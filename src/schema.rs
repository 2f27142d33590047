//! Schema model and loader.
//!
//! A schema is read from an already-deserialized `serde_json::Value` tree:
//!
//! ```json
//! {
//!   "options": { "tagName": "tag", "optional": "omittable-key" },
//!   "externs": [{ "symbol": "Span", "source": "locations" }],
//!   "bases": { "Named": [{ "name": "string" }] },
//!   "nodes": {
//!     "Expr": {
//!       "Lit": [{ "value": "number" }],
//!       "Add": [{ "left": "Expr" }, { "right": "Expr" }],
//!       "Var": [{ "extends": "Named" }]
//!     }
//!   }
//! }
//! ```
//!
//! Loading runs in two passes (see [`walk`]): names first, then structure, so
//! references may point forward in the document.
pub mod fields;
pub mod options;
pub mod walk;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::SchemaError;

pub use fields::{parse_field, FieldDescriptor, Structure, ValueKind};
pub use options::{ConstructorStyle, MapRepr, OptionalRepr, Options};

// ------------------------------- Names ----------------------------------- //

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[$A-Za-z_][0-9A-Za-z_$]*$").expect("identifier pattern is valid")
});

/// Conservative identifier check. Some legal TypeScript identifiers (unicode)
/// fail this test, but everything that passes is legal.
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Base,
    Leaf,
    Union,
    External,
}

impl DeclKind {
    /// `"leaf type"`, `"union type"`, ...
    pub fn describe(self) -> &'static str {
        match self {
            Self::Base => "base type",
            Self::Leaf => "leaf type",
            Self::Union => "union type",
            Self::External => "external type",
        }
    }
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Leaf => "leaf",
            Self::Union => "union",
            Self::External => "external",
        }
    }
}

/// Every declared name with the kinds it was declared as.
///
/// A name normally carries exactly one kind. Two different kinds are kept so
/// union resolution and IR assembly can report them precisely.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NameTable {
    entries: IndexMap<String, Vec<DeclKind>>,
}

impl NameTable {
    /// Returns `false` when `name` is already declared with the same kind.
    pub fn declare(&mut self, name: &str, kind: DeclKind) -> bool {
        let kinds = self.entries.entry(name.to_string()).or_default();
        if kinds.contains(&kind) {
            return false;
        }
        kinds.push(kind);
        true
    }
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
    pub fn has_kind(&self, name: &str, kind: DeclKind) -> bool {
        self.entries
            .get(name)
            .is_some_and(|kinds| kinds.contains(&kind))
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------- Declarations ------------------------------- //

/// A reusable mixin of fields. Never emitted as a discriminated variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseNode {
    pub name: String,
    pub bases: Vec<String>,
    pub fields: IndexMap<String, FieldDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeafNode {
    pub name: String,
    /// Runtime discriminant value.
    pub tag: String,
    pub bases: Vec<String>,
    pub fields: IndexMap<String, FieldDescriptor>,
    /// Immediately containing union, `None` for a leaf declared at the top level.
    pub enclosing_union: Option<String>,
    /// Outermost union the leaf was declared under; types the `is` predicate.
    pub root_union: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnionNode {
    pub name: String,
    /// Members emitted in the sum type, in declaration order.
    pub members: Vec<String>,
    /// Members declared with the `~` marker: validated, never emitted here.
    pub excluded: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalNode {
    pub symbol: String,
    pub source: String,
}

/// The validated declarations of one schema document.
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    pub options: Options,
    pub names: NameTable,
    pub bases: IndexMap<String, BaseNode>,
    pub leaves: IndexMap<String, LeafNode>,
    pub unions: IndexMap<String, UnionNode>,
    pub externs: IndexMap<String, ExternalNode>,
}

/// Load and validate a schema from a generic value tree.
pub fn load_spec(value: &Value) -> Result<Schema, SchemaError> {
    walk::load(value)
}

// ------------------------------- Tests ------------------------------------ //
