//! Two-pass schema walk.
//!
//! Pass 1 only fills the [`NameTable`]. Pass 2 builds declarations and
//! resolves every reference against that table, which is what lets an
//! `extends` or a field name a type declared further down the document.
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::fields::{parse_field, FieldDescriptor, BUILTINS};
use super::{
    is_valid_identifier, BaseNode, DeclKind, ExternalNode, LeafNode, NameTable, Options, Schema,
    UnionNode,
};
use crate::codegen::is_reserved;
use crate::error::SchemaError;
use crate::path_de::from_value_with_path;

const TOP_LEVEL_KEYS: &[&str] = &["nodes", "bases", "externs", "options"];

/// Field keys that append base names instead of declaring a field.
const EXTENDS_KEYS: &[&str] = &["extends", "^"];

/// Field key overriding a leaf's discriminant value.
const TAG_KEY: &str = "@tag";

/// Prefix of a union member declared but left out of the emitted sum type.
pub const EXCLUDE_MARKER: char = '~';

// ------------------------------- Paths ----------------------------------- //

#[derive(Debug, Clone)]
struct SchemaPath(String);

impl SchemaPath {
    fn root(name: &str) -> Self {
        Self(name.to_string())
    }
    fn key(&self, key: &str) -> Self {
        Self(format!("{}.{key}", self.0))
    }
    fn index(&self, index: usize) -> Self {
        Self(format!("{}[{index}]", self.0))
    }
    fn render(&self) -> String {
        self.0.clone()
    }
}

// ------------------------------ Front API -------------------------------- //

pub(crate) fn load(value: &Value) -> Result<Schema, SchemaError> {
    let root = value.as_object().ok_or(SchemaError::RootNotObject)?;
    if let Some(key) = root.keys().find(|k| !TOP_LEVEL_KEYS.contains(&k.as_str())) {
        return Err(SchemaError::UnknownTopLevelKey(key.clone()));
    }
    let nodes = root.get("nodes").ok_or(SchemaError::MissingNodes)?;
    let nodes = nodes.as_object().ok_or_else(|| SchemaError::UnexpectedShape {
        path: "nodes".into(),
        expected: "an object mapping names to unions and leaves",
    })?;

    // options come first: the discriminant name is checked while walking fields
    let options = match root.get("options") {
        Some(value) => Options::from_value(value, "options")?,
        None => Options::default(),
    };
    let externs = match root.get("externs") {
        Some(value) => read_externs(value)?,
        None => Vec::new(),
    };
    let empty = Map::new();
    let bases = match root.get("bases") {
        Some(value) => value.as_object().ok_or_else(|| SchemaError::UnexpectedShape {
            path: "bases".into(),
            expected: "an object mapping names to field lists",
        })?,
        None => &empty,
    };

    let names = collect_names(bases, &externs, nodes)?;
    debug!(names = names.len(), "collected declared names");

    let mut builder = Builder::new(names, options);
    for external in externs {
        builder.externs.insert(external.symbol.clone(), external);
    }
    let bases_path = SchemaPath::root("bases");
    for (name, content) in bases {
        builder.walk_base(name, content, bases_path.key(name))?;
    }
    let nodes_path = SchemaPath::root("nodes");
    for (name, content) in nodes {
        builder.walk_node(name, content, nodes_path.key(name), None, name)?;
    }
    let schema = builder.finish();
    debug!(
        bases = schema.bases.len(),
        leaves = schema.leaves.len(),
        unions = schema.unions.len(),
        externs = schema.externs.len(),
        "loaded schema"
    );
    Ok(schema)
}

fn read_externs(value: &Value) -> Result<Vec<ExternalNode>, SchemaError> {
    from_value_with_path::<Vec<ExternalNode>>(value).map_err(|err| SchemaError::InvalidExtern {
        path: err.path_under("externs"),
        message: err.message,
    })
}

/// Split the exclusion marker off a union member key.
fn member_name(key: &str) -> (bool, &str) {
    match key.strip_prefix(EXCLUDE_MARKER) {
        Some(name) => (true, name),
        None => (false, key),
    }
}

// ------------------------------- Pass 1 ---------------------------------- //

fn collect_names(
    bases: &Map<String, Value>,
    externs: &[ExternalNode],
    nodes: &Map<String, Value>,
) -> Result<NameTable, SchemaError> {
    let mut names = NameTable::default();
    let bases_path = SchemaPath::root("bases");
    for name in bases.keys() {
        declare(&mut names, name, DeclKind::Base, &bases_path.key(name))?;
    }
    let externs_path = SchemaPath::root("externs");
    for (i, external) in externs.iter().enumerate() {
        let path = externs_path.index(i).key("symbol");
        declare(&mut names, &external.symbol, DeclKind::External, &path)?;
    }
    let nodes_path = SchemaPath::root("nodes");
    for (name, content) in nodes {
        collect_node_names(&mut names, name, content, &nodes_path.key(name))?;
    }
    Ok(names)
}

fn collect_node_names(
    names: &mut NameTable,
    name: &str,
    content: &Value,
    path: &SchemaPath,
) -> Result<(), SchemaError> {
    match content {
        Value::Array(_) => declare(names, name, DeclKind::Leaf, path),
        Value::Object(members) => {
            declare(names, name, DeclKind::Union, path)?;
            for (key, child) in members {
                let (_, member) = member_name(key);
                collect_node_names(names, member, child, &path.key(key))?;
            }
            Ok(())
        }
        _ => Err(SchemaError::UnexpectedShape {
            path: path.render(),
            expected: "an object (union) or an array of fields (leaf)",
        }),
    }
}

fn declare(
    names: &mut NameTable,
    name: &str,
    kind: DeclKind,
    path: &SchemaPath,
) -> Result<(), SchemaError> {
    // a builtin or keyword could be declared but never referenced or emitted
    if !is_valid_identifier(name) || BUILTINS.contains(&name) || is_reserved(name) {
        return Err(SchemaError::InvalidIdentifier { path: path.render(), name: name.to_string() });
    }
    if !names.declare(name, kind) {
        return Err(SchemaError::DuplicateName { path: path.render(), name: name.to_string() });
    }
    Ok(())
}

// ------------------------------- Pass 2 ---------------------------------- //

/// Accumulates declarations during pass 2.
struct Builder {
    names: NameTable,
    options: Options,
    bases: IndexMap<String, BaseNode>,
    leaves: IndexMap<String, LeafNode>,
    unions: IndexMap<String, UnionNode>,
    externs: IndexMap<String, ExternalNode>,
}

/// What a list of field entries declares.
#[derive(Default)]
struct FieldList {
    bases: Vec<String>,
    fields: IndexMap<String, FieldDescriptor>,
    tag: Option<String>,
}

impl Builder {
    fn new(names: NameTable, options: Options) -> Self {
        Self {
            names,
            options,
            bases: IndexMap::new(),
            leaves: IndexMap::new(),
            unions: IndexMap::new(),
            externs: IndexMap::new(),
        }
    }

    fn finish(self) -> Schema {
        Schema {
            options: self.options,
            names: self.names,
            bases: self.bases,
            leaves: self.leaves,
            unions: self.unions,
            externs: self.externs,
        }
    }

    fn walk_base(&mut self, name: &str, content: &Value, path: SchemaPath) -> Result<(), SchemaError> {
        let items = content.as_array().ok_or_else(|| SchemaError::UnexpectedShape {
            path: path.render(),
            expected: "an array of fields",
        })?;
        let list = self.walk_fields(name, items, &path, false)?;
        trace!(base = name, fields = list.fields.len(), "base");
        self.bases.insert(
            name.to_string(),
            BaseNode { name: name.to_string(), bases: list.bases, fields: list.fields },
        );
        Ok(())
    }

    fn walk_node(
        &mut self,
        name: &str,
        content: &Value,
        path: SchemaPath,
        enclosing: Option<&str>,
        root: &str,
    ) -> Result<(), SchemaError> {
        match content {
            Value::Array(items) => {
                let list = self.walk_fields(name, items, &path, true)?;
                trace!(leaf = name, root, fields = list.fields.len(), "leaf");
                let leaf = LeafNode {
                    name: name.to_string(),
                    tag: list.tag.unwrap_or_else(|| name.to_lowercase()),
                    bases: list.bases,
                    fields: list.fields,
                    enclosing_union: enclosing.map(str::to_string),
                    root_union: root.to_string(),
                };
                self.leaves.insert(name.to_string(), leaf);
            }
            Value::Object(entries) => {
                let mut union = UnionNode {
                    name: name.to_string(),
                    members: Vec::new(),
                    excluded: Vec::new(),
                };
                // claim the slot before the members: unions stay in pre-order
                self.unions.insert(name.to_string(), union.clone());
                for (key, child) in entries {
                    let (excluded, member) = member_name(key);
                    // an excluded subtree is rooted at the excluded member
                    let child_root = if excluded { member } else { root };
                    self.walk_node(member, child, path.key(key), Some(name), child_root)?;
                    if excluded {
                        union.excluded.push(member.to_string());
                    } else {
                        union.members.push(member.to_string());
                    }
                }
                trace!(union = name, members = union.members.len(), "union");
                self.unions.insert(name.to_string(), union);
            }
            _ => {
                return Err(SchemaError::UnexpectedShape {
                    path: path.render(),
                    expected: "an object (union) or an array of fields (leaf)",
                });
            }
        }
        Ok(())
    }

    fn walk_fields(
        &self,
        owner: &str,
        items: &[Value],
        path: &SchemaPath,
        is_leaf: bool,
    ) -> Result<FieldList, SchemaError> {
        let mut list = FieldList::default();
        for (i, item) in items.iter().enumerate() {
            let item_path = path.index(i);
            let single = item
                .as_object()
                .filter(|entry| entry.len() == 1)
                .and_then(|entry| entry.iter().next());
            let Some((key, value)) = single else {
                return Err(SchemaError::MalformedField {
                    path: item_path.render(),
                    item: item.to_string(),
                });
            };

            if EXTENDS_KEYS.contains(&key.as_str()) {
                for base in self.base_names(value, &item_path)? {
                    if !self.names.has_kind(&base, DeclKind::Base) {
                        return Err(SchemaError::UnknownBase {
                            path: item_path.render(),
                            node: owner.to_string(),
                            base,
                        });
                    }
                    if list.bases.contains(&base) {
                        return Err(SchemaError::DuplicateBase {
                            path: item_path.render(),
                            node: owner.to_string(),
                            base,
                        });
                    }
                    list.bases.push(base);
                }
                continue;
            }

            if key == TAG_KEY {
                match value.as_str() {
                    Some(tag) if is_leaf && !tag.is_empty() => list.tag = Some(tag.to_string()),
                    _ => {
                        return Err(SchemaError::InvalidTag {
                            path: item_path.render(),
                            node: owner.to_string(),
                        });
                    }
                }
                continue;
            }

            let field_path = item_path.key(key);
            if !is_valid_identifier(key) {
                return Err(SchemaError::InvalidIdentifier {
                    path: field_path.render(),
                    name: key.clone(),
                });
            }
            if *key == self.options.tag_name {
                return Err(SchemaError::ReservedFieldName {
                    path: field_path.render(),
                    field: key.clone(),
                });
            }
            if list.fields.contains_key(key) {
                return Err(SchemaError::DuplicateField {
                    path: field_path.render(),
                    node: owner.to_string(),
                    field: key.clone(),
                });
            }
            let descriptor = match value {
                Value::String(text) => parse_field(&field_path.render(), key, text, &self.names)?,
                Value::Array(tags) if !tags.is_empty() => {
                    let tags = tags
                        .iter()
                        .map(|t| t.as_str().map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| SchemaError::MalformedField {
                            path: field_path.render(),
                            item: item.to_string(),
                        })?;
                    FieldDescriptor::enum_literals(tags)
                }
                _ => {
                    return Err(SchemaError::MalformedField {
                        path: field_path.render(),
                        item: item.to_string(),
                    });
                }
            };
            list.fields.insert(key.clone(), descriptor);
        }
        Ok(list)
    }

    /// `"Named"` or `["Named", "Located"]`.
    fn base_names(&self, value: &Value, path: &SchemaPath) -> Result<Vec<String>, SchemaError> {
        let malformed = || SchemaError::MalformedField {
            path: path.render(),
            item: value.to_string(),
        };
        match value {
            Value::String(name) => Ok(vec![name.clone()]),
            Value::Array(names) => names
                .iter()
                .map(|n| n.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(malformed),
            _ => Err(malformed()),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
