//! Inheritance and union flattening.
//!
//! Both [`Schema`] and [`crate::ir::Ir`] implement [`Declarations`], so the
//! same resolution runs during IR assembly and during code generation.
use indexmap::{IndexMap, IndexSet};

use crate::error::ResolveError;
use crate::schema::{BaseNode, FieldDescriptor, LeafNode, Schema, Structure, UnionNode};

/// Name-indexed lookup of declarations.
pub trait Declarations {
    fn base(&self, name: &str) -> Option<&BaseNode>;
    fn leaf(&self, name: &str) -> Option<&LeafNode>;
    fn union(&self, name: &str) -> Option<&UnionNode>;
}

/// A declaration carrying fields and a base list.
pub trait Inherits {
    fn name(&self) -> &str;
    fn base_names(&self) -> &[String];
    fn own_fields(&self) -> &IndexMap<String, FieldDescriptor>;
}

impl Inherits for BaseNode {
    fn name(&self) -> &str {
        &self.name
    }
    fn base_names(&self) -> &[String] {
        &self.bases
    }
    fn own_fields(&self) -> &IndexMap<String, FieldDescriptor> {
        &self.fields
    }
}

impl Inherits for LeafNode {
    fn name(&self) -> &str {
        &self.name
    }
    fn base_names(&self) -> &[String] {
        &self.bases
    }
    fn own_fields(&self) -> &IndexMap<String, FieldDescriptor> {
        &self.fields
    }
}

impl Declarations for Schema {
    fn base(&self, name: &str) -> Option<&BaseNode> {
        self.bases.get(name)
    }
    fn leaf(&self, name: &str) -> Option<&LeafNode> {
        self.leaves.get(name)
    }
    fn union(&self, name: &str) -> Option<&UnionNode> {
        self.unions.get(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedField<'a> {
    pub name: &'a str,
    pub descriptor: &'a FieldDescriptor,
    /// Declaration that owns the field (the node itself or one of its bases).
    pub declared_in: &'a str,
}

// ------------------------------- Fields ---------------------------------- //

/// All fields of `node`: inherited ones first, depth-first in base order,
/// then its own. No field name may appear twice.
pub fn resolve_fields<'a, D>(
    decls: &'a D,
    node: &'a dyn Inherits,
) -> Result<Vec<ResolvedField<'a>>, ResolveError>
where
    D: Declarations + ?Sized,
{
    let mut out = Vec::new();
    let mut visiting = Vec::new();
    collect_fields(decls, node, &mut visiting, &mut out)?;
    Ok(out)
}

fn collect_fields<'a, D>(
    decls: &'a D,
    node: &'a dyn Inherits,
    visiting: &mut Vec<&'a str>,
    out: &mut Vec<ResolvedField<'a>>,
) -> Result<(), ResolveError>
where
    D: Declarations + ?Sized,
{
    for base_name in node.base_names() {
        let base = decls.base(base_name).ok_or_else(|| ResolveError::UnknownBase {
            node: node.name().to_string(),
            base: base_name.clone(),
        })?;
        // only bases go on the stack; a leaf may share a name with nothing it inherits
        if visiting.contains(&base_name.as_str()) {
            return Err(ResolveError::CyclicInheritance(base_name.clone()));
        }
        visiting.push(base_name);
        collect_fields(decls, base, visiting, out)?;
        visiting.pop();
    }
    for (name, descriptor) in node.own_fields() {
        if out.iter().any(|f| f.name == name) {
            return Err(ResolveError::DuplicateField {
                node: node.name().to_string(),
                field: name.clone(),
            });
        }
        out.push(ResolvedField { name, descriptor, declared_in: node.name() });
    }
    Ok(())
}

/// The node-valued resolved fields, Scalar ones first. The sort is stable.
pub fn resolve_child_fields<'a, D>(
    decls: &'a D,
    node: &'a dyn Inherits,
) -> Result<Vec<ResolvedField<'a>>, ResolveError>
where
    D: Declarations + ?Sized,
{
    let mut children = resolve_fields(decls, node)?
        .into_iter()
        .filter(|f| f.descriptor.is_node())
        .collect::<Vec<_>>();
    children.sort_by_key(|f| f.descriptor.structure != Structure::Scalar);
    Ok(children)
}

// ------------------------------- Unions ---------------------------------- //

/// Every leaf reachable from `union` through nested unions, each once, in
/// order of first appearance. Excluded members are not followed.
pub fn resolve_union_leaves<'a, D>(
    decls: &'a D,
    union: &'a UnionNode,
) -> Result<Vec<&'a LeafNode>, ResolveError>
where
    D: Declarations + ?Sized,
{
    let mut leaves = IndexMap::new();
    let mut seen = IndexSet::new();
    expand_union(decls, union, &mut seen, &mut leaves)?;
    Ok(leaves.into_values().collect())
}

fn expand_union<'a, D>(
    decls: &'a D,
    union: &'a UnionNode,
    seen: &mut IndexSet<&'a str>,
    leaves: &mut IndexMap<&'a str, &'a LeafNode>,
) -> Result<(), ResolveError>
where
    D: Declarations + ?Sized,
{
    if !seen.insert(union.name.as_str()) {
        return Ok(());
    }
    for member in &union.members {
        match (decls.union(member), decls.leaf(member)) {
            (Some(_), Some(_)) => {
                return Err(ResolveError::AmbiguousMember {
                    union: union.name.clone(),
                    member: member.clone(),
                });
            }
            (Some(nested), None) => expand_union(decls, nested, seen, leaves)?,
            (None, Some(leaf)) => {
                leaves.entry(leaf.name.as_str()).or_insert(leaf);
            }
            (None, None) => {
                return Err(ResolveError::UnknownMember {
                    union: union.name.clone(),
                    member: member.clone(),
                });
            }
        }
    }
    Ok(())
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::{load_spec, DeclKind, NameTable, Options, ValueKind};
    use proptest::prelude::*;
    use serde_json::json;

    fn names(fields: &[ResolvedField<'_>]) -> Vec<String> {
        fields.iter().map(|f| f.name.to_string()).collect()
    }

    #[test]
    fn base_fields_are_inherited_without_duplication() {
        let schema = load_spec(&json!({
            "bases": { "Named": [{ "name": "string" }] },
            "nodes": { "Expr": { "Var": [{ "extends": "Named" }], "Lit": [{ "value": "number" }] } }
        }))
        .unwrap();
        let fields = resolve_fields(&schema, &schema.leaves["Var"]).unwrap();
        assert_eq!(names(&fields), vec!["name"]);
        assert_eq!(fields[0].declared_in, "Named");
    }

    #[test]
    fn inherited_fields_come_first_in_base_order() {
        let schema = load_spec(&json!({
            "bases": {
                "Spanned": [{ "line": "number" }],
                "Located": [{ "extends": "Spanned" }, { "file": "string" }],
                "Named": [{ "name": "string" }],
            },
            "nodes": { "Decl": [{ "extends": ["Located", "Named"] }, { "init": "number" }] }
        }))
        .unwrap();
        let fields = resolve_fields(&schema, &schema.leaves["Decl"]).unwrap();
        assert_eq!(names(&fields), vec!["line", "file", "name", "init"]);
    }

    #[test]
    fn own_field_may_not_shadow_an_inherited_one() {
        let schema = load_spec(&json!({
            "bases": { "Named": [{ "name": "string" }] },
            "nodes": { "Var": [{ "extends": "Named" }, { "name": "string" }] }
        }))
        .unwrap();
        let err = resolve_fields(&schema, &schema.leaves["Var"]).unwrap_err();
        assert_eq!(err, ResolveError::DuplicateField { node: "Var".into(), field: "name".into() });
        assert_eq!(err.kind(), ErrorKind::Uniqueness);
    }

    #[test]
    fn two_bases_may_not_contribute_the_same_field() {
        let schema = load_spec(&json!({
            "bases": { "A": [{ "id": "number" }], "B": [{ "id": "string" }] },
            "nodes": { "C": [{ "extends": ["A", "B"] }] }
        }))
        .unwrap();
        let err = resolve_fields(&schema, &schema.leaves["C"]).unwrap_err();
        assert_eq!(err, ResolveError::DuplicateField { node: "B".into(), field: "id".into() });
    }

    #[test]
    fn inheritance_cycles_are_reported() {
        let schema = load_spec(&json!({
            "bases": { "A": [{ "extends": "B" }], "B": [{ "extends": "A" }] },
            "nodes": { "C": [{ "extends": "A" }] }
        }))
        .unwrap();
        let err = resolve_fields(&schema, &schema.leaves["C"]).unwrap_err();
        assert_eq!(err, ResolveError::CyclicInheritance("A".into()));
        assert_eq!(err.kind(), ErrorKind::Reference);
    }

    #[test]
    fn child_fields_put_scalars_first() {
        let schema = load_spec(&json!({
            "nodes": {
                "Expr": {
                    "Call": [
                        { "args": "Expr[]" },
                        { "name": "string" },
                        { "callee": "Expr" },
                        { "named": "Expr{}" },
                        { "receiver": "Expr" },
                    ]
                }
            }
        }))
        .unwrap();
        let children = resolve_child_fields(&schema, &schema.leaves["Call"]).unwrap();
        assert_eq!(names(&children), vec!["callee", "receiver", "args", "named"]);
    }

    #[test]
    fn nested_unions_flatten_in_first_appearance_order() {
        let schema = load_spec(&json!({
            "nodes": {
                "Expr": {
                    "Lit": [],
                    "Binary": { "Add": [], "Sub": [] },
                    "Var": [],
                }
            }
        }))
        .unwrap();
        let leaves = resolve_union_leaves(&schema, &schema.unions["Expr"]).unwrap();
        let leaves = leaves.iter().map(|l| l.name.as_str()).collect::<Vec<_>>();
        assert_eq!(leaves, vec!["Lit", "Add", "Sub", "Var"]);
    }

    #[test]
    fn member_declared_as_union_and_leaf_is_ambiguous() {
        let schema = load_spec(&json!({
            "nodes": {
                "Expr": { "Lit": [{ "value": "number" }] },
                "Stmt": { "Lit": { "Inner": [] } },
            }
        }))
        .unwrap();
        let err = resolve_union_leaves(&schema, &schema.unions["Expr"]).unwrap_err();
        assert_eq!(err, ResolveError::AmbiguousMember { union: "Expr".into(), member: "Lit".into() });
        assert_eq!(err.kind(), ErrorKind::Reference);
    }

    #[test]
    fn member_that_is_neither_is_unknown() {
        let union = UnionNode { name: "Expr".into(), members: vec!["Ghost".into()], excluded: vec![] };
        let schema = load_spec(&json!({ "nodes": {} })).unwrap();
        let err = resolve_union_leaves(&schema, &union).unwrap_err();
        assert_eq!(err, ResolveError::UnknownMember { union: "Expr".into(), member: "Ghost".into() });
    }

    // ---------------------------- Properties ------------------------------ //

    fn number_field() -> FieldDescriptor {
        FieldDescriptor {
            structure: Structure::Scalar,
            kind: ValueKind::Builtin { types: vec!["number".into()] },
        }
    }

    fn empty_schema() -> Schema {
        Schema {
            options: Options::default(),
            names: NameTable::default(),
            bases: IndexMap::new(),
            leaves: IndexMap::new(),
            unions: IndexMap::new(),
            externs: IndexMap::new(),
        }
    }

    proptest! {
        /// A chain `Leaf -> B0 -> B1 -> ...`: resolution succeeds exactly when
        /// no field name repeats, and then yields the deepest base first.
        #[test]
        fn resolved_fields_never_repeat(chain in prop::collection::vec(
            prop::collection::btree_set("[a-f]", 0..3), 1..5,
        )) {
            let mut schema = empty_schema();
            for (i, fields) in chain.iter().enumerate() {
                let bases = if i + 1 < chain.len() { vec![format!("B{}", i + 1)] } else { vec![] };
                let base = BaseNode {
                    name: format!("B{i}"),
                    bases,
                    fields: fields.iter().map(|f| (f.clone(), number_field())).collect(),
                };
                schema.names.declare(&base.name, DeclKind::Base);
                schema.bases.insert(base.name.clone(), base);
            }
            let leaf = LeafNode {
                name: "Leaf".into(),
                tag: "leaf".into(),
                bases: vec!["B0".into()],
                fields: IndexMap::new(),
                enclosing_union: None,
                root_union: "Leaf".into(),
            };

            let total: usize = chain.iter().map(|f| f.len()).sum();
            let distinct = chain.iter().flatten().collect::<IndexSet<_>>().len();
            match resolve_fields(&schema, &leaf) {
                Ok(fields) => {
                    prop_assert_eq!(total, distinct);
                    let expected = chain.iter().rev().flatten().cloned().collect::<Vec<_>>();
                    prop_assert_eq!(names(&fields), expected);
                }
                Err(err) => {
                    prop_assert!(total != distinct);
                    let is_duplicate = matches!(err, ResolveError::DuplicateField { .. });
                    prop_assert!(is_duplicate);
                }
            }
        }

        /// Unions `U0..Un` over leaves `L0..L4`, each union naming only
        /// higher-numbered unions. Flattening lists each reachable leaf once.
        #[test]
        fn flattened_unions_list_reachable_leaves_once(members in prop::collection::vec(
            prop::collection::vec((any::<bool>(), 0usize..5), 1..6), 1..5,
        )) {
            let count = members.len();
            let mut schema = empty_schema();
            for i in 0..5 {
                let leaf = LeafNode {
                    name: format!("L{i}"),
                    tag: format!("l{i}"),
                    bases: vec![],
                    fields: IndexMap::new(),
                    enclosing_union: None,
                    root_union: format!("L{i}"),
                };
                schema.leaves.insert(leaf.name.clone(), leaf);
            }
            for (i, picks) in members.iter().enumerate() {
                let members = picks
                    .iter()
                    .map(|&(nested, n)| {
                        let target = i + 1 + n;
                        if nested && target < count { format!("U{target}") } else { format!("L{n}") }
                    })
                    .collect();
                let union = UnionNode { name: format!("U{i}"), members, excluded: vec![] };
                schema.unions.insert(union.name.clone(), union);
            }

            // reachable set, computed independently
            let mut reachable = IndexSet::new();
            let mut stack = vec!["U0".to_string()];
            let mut visited = IndexSet::new();
            while let Some(name) = stack.pop() {
                if !visited.insert(name.clone()) {
                    continue;
                }
                for member in &schema.unions[&name].members {
                    if member.starts_with('U') {
                        stack.push(member.clone());
                    } else {
                        reachable.insert(member.clone());
                    }
                }
            }

            let leaves = resolve_union_leaves(&schema, &schema.unions["U0"]).unwrap();
            let found = leaves.iter().map(|l| l.name.clone()).collect::<IndexSet<_>>();
            prop_assert_eq!(found.len(), leaves.len());
            prop_assert_eq!(
                found.iter().cloned().collect::<std::collections::BTreeSet<_>>(),
                reachable.into_iter().collect::<std::collections::BTreeSet<_>>()
            );
        }
    }
}
