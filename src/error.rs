//! Error types for loading schemas and generating code.
//!
//! Every variant names the schema element at fault. Paths are rendered the
//! way they appear in the document, e.g. `nodes.Expr.Add[1].left`.

use thiserror::Error;

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed descriptor object, unrecognized descriptor grammar, bad identifier.
    Syntax,
    /// Unknown base, unknown referenced type, unresolvable or ambiguous union member.
    Reference,
    /// Duplicate names, duplicate fields, reserved discriminant collisions.
    Uniqueness,
    /// Unknown option key or value outside its enumerated set.
    Option,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("schema root must be an object")]
    RootNotObject,
    #[error("missing `nodes` field")]
    MissingNodes,
    #[error("unrecognized top-level key `{0}`")]
    UnknownTopLevelKey(String),
    #[error("at {path}: expected {expected}")]
    UnexpectedShape { path: String, expected: &'static str },
    #[error("at {path}: invalid name `{name}`")]
    InvalidIdentifier { path: String, name: String },
    #[error("at {path}: name `{name}` defined multiple times")]
    DuplicateName { path: String, name: String },
    #[error("at {path}: unexpected field type specification {item} (expected an object with exactly one key)")]
    MalformedField { path: String, item: String },
    #[error("at {path}: field `{field}` has unrecognized field syntax `{text}`")]
    UnrecognizedFieldSyntax { path: String, field: String, text: String },
    #[error("at {path}: field `{field}` refers to unknown type `{ty}`")]
    UnknownType { path: String, field: String, ty: String },
    #[error("at {path}: type `{node}` cannot extend from unknown base type `{base}`")]
    UnknownBase { path: String, node: String, base: String },
    #[error("at {path}: field `{field}` collides with the discriminant field name")]
    ReservedFieldName { path: String, field: String },
    #[error("at {path}: field `{field}` declared twice in `{node}`")]
    DuplicateField { path: String, node: String, field: String },
    #[error("at {path}: `{node}` extends `{base}` more than once")]
    DuplicateBase { path: String, node: String, base: String },
    #[error("at {path}: tag override on `{node}` must be a non-empty string")]
    InvalidTag { path: String, node: String },
    #[error("at {path}: {message}")]
    InvalidOption { path: String, message: String },
    #[error("at {path}: {message}")]
    InvalidExtern { path: String, message: String },
}

impl SchemaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RootNotObject
            | Self::MissingNodes
            | Self::UnexpectedShape { .. }
            | Self::InvalidIdentifier { .. }
            | Self::MalformedField { .. }
            | Self::UnrecognizedFieldSyntax { .. }
            | Self::InvalidTag { .. }
            | Self::InvalidExtern { .. } => ErrorKind::Syntax,
            Self::UnknownType { .. } | Self::UnknownBase { .. } => ErrorKind::Reference,
            Self::DuplicateName { .. }
            | Self::ReservedFieldName { .. }
            | Self::DuplicateField { .. }
            | Self::DuplicateBase { .. } => ErrorKind::Uniqueness,
            Self::UnknownTopLevelKey(_) | Self::InvalidOption { .. } => ErrorKind::Option,
        }
    }
}

/// Failures while flattening inheritance chains or union membership.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unknown base type `{base}` of `{node}`")]
    UnknownBase { node: String, base: String },
    #[error("field `{field}` of `{node}` is not unique (already inherited or declared)")]
    DuplicateField { node: String, field: String },
    #[error("inheritance cycle through `{0}`")]
    CyclicInheritance(String),
    #[error("unable to find member `{member}` of union `{union}`")]
    UnknownMember { union: String, member: String },
    #[error("member `{member}` of union `{union}` is both a union and a leaf")]
    AmbiguousMember { union: String, member: String },
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownBase { .. }
            | Self::CyclicInheritance(_)
            | Self::UnknownMember { .. }
            | Self::AmbiguousMember { .. } => ErrorKind::Reference,
            Self::DuplicateField { .. } => ErrorKind::Uniqueness,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("{kind} named {name} was already defined as a(n) {existing}")]
    AlreadyDefined {
        name: String,
        kind: &'static str,
        existing: &'static str,
    },
    #[error("leaves `{first}` and `{second}` of union `{union}` share the tag \"{tag}\"")]
    DuplicateTag {
        union: String,
        tag: String,
        first: String,
        second: String,
    },
    #[error("union `{0}` has no members")]
    EmptyUnion(String),
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Resolve(error) => error.kind(),
            Self::AlreadyDefined { .. } | Self::DuplicateTag { .. } => ErrorKind::Uniqueness,
            Self::EmptyUnion(_) => ErrorKind::Syntax,
        }
    }
}
