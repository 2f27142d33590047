// Flat, name-indexed IR handed to the code generator.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::error::GenerationError;
use crate::resolve::{resolve_fields, resolve_union_leaves, Declarations};
use crate::schema::{BaseNode, DeclKind, ExternalNode, LeafNode, Options, Schema, UnionNode};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IrNode {
    Base(BaseNode),
    Leaf(LeafNode),
    Union(UnionIr),
    External(ExternalNode),
}

impl IrNode {
    pub fn kind(&self) -> DeclKind {
        match self {
            Self::Base(_) => DeclKind::Base,
            Self::Leaf(_) => DeclKind::Leaf,
            Self::Union(_) => DeclKind::Union,
            Self::External(_) => DeclKind::External,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnionIr {
    #[serde(flatten)]
    pub decl: UnionNode,
    /// Flattened leaf names, in first-appearance order.
    pub leaves: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Ir {
    pub options: Options,
    /// Externals, unions, bases, leaves, each in declaration order.
    pub nodes: IndexMap<String, IrNode>,
}

impl Ir {
    pub fn build(schema: &Schema) -> Result<Self, GenerationError> {
        // 1) flatten unions; this is also the dispatch completeness check
        let mut unions = Vec::with_capacity(schema.unions.len());
        for union in schema.unions.values() {
            let leaves = resolve_union_leaves(schema, union)?;
            if union.members.is_empty() {
                return Err(GenerationError::EmptyUnion(union.name.clone()));
            }
            let mut tags: IndexMap<&str, &str> = IndexMap::new();
            for leaf in &leaves {
                if let Some(first) = tags.insert(&leaf.tag, &leaf.name) {
                    return Err(GenerationError::DuplicateTag {
                        union: union.name.clone(),
                        tag: leaf.tag.clone(),
                        first: first.to_string(),
                        second: leaf.name.clone(),
                    });
                }
            }
            unions.push(UnionIr {
                decl: union.clone(),
                leaves: leaves.iter().map(|l| l.name.clone()).collect(),
            });
        }

        // 2) inheritance chains
        for base in schema.bases.values() {
            resolve_fields(schema, base)?;
        }
        for leaf in schema.leaves.values() {
            resolve_fields(schema, leaf)?;
        }

        // 3) one namespace for all declarations
        let mut ir = Ir { options: schema.options.clone(), nodes: IndexMap::new() };
        let declarations = schema
            .externs
            .values()
            .cloned()
            .map(IrNode::External)
            .chain(unions.into_iter().map(IrNode::Union))
            .chain(schema.bases.values().cloned().map(IrNode::Base))
            .chain(schema.leaves.values().cloned().map(IrNode::Leaf));
        for node in declarations {
            ir.insert(node)?;
        }
        debug!(nodes = ir.nodes.len(), "assembled IR");
        Ok(ir)
    }

    fn insert(&mut self, node: IrNode) -> Result<(), GenerationError> {
        let name = match &node {
            IrNode::Base(b) => b.name.clone(),
            IrNode::Leaf(l) => l.name.clone(),
            IrNode::Union(u) => u.decl.name.clone(),
            IrNode::External(e) => e.symbol.clone(),
        };
        if let Some(existing) = self.nodes.get(&name) {
            return Err(GenerationError::AlreadyDefined {
                name,
                kind: node.kind().describe(),
                existing: existing.kind().as_str(),
            });
        }
        self.nodes.insert(name, node);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&IrNode> {
        self.nodes.get(name)
    }

    pub fn bases(&self) -> impl Iterator<Item = &BaseNode> {
        self.nodes.values().filter_map(|n| match n {
            IrNode::Base(b) => Some(b),
            _ => None,
        })
    }

    pub fn leaves(&self) -> impl Iterator<Item = &LeafNode> {
        self.nodes.values().filter_map(|n| match n {
            IrNode::Leaf(l) => Some(l),
            _ => None,
        })
    }

    pub fn unions(&self) -> impl Iterator<Item = &UnionIr> {
        self.nodes.values().filter_map(|n| match n {
            IrNode::Union(u) => Some(u),
            _ => None,
        })
    }

    pub fn externals(&self) -> impl Iterator<Item = &ExternalNode> {
        self.nodes.values().filter_map(|n| match n {
            IrNode::External(e) => Some(e),
            _ => None,
        })
    }
}

impl Declarations for Ir {
    fn base(&self, name: &str) -> Option<&BaseNode> {
        match self.nodes.get(name) {
            Some(IrNode::Base(b)) => Some(b),
            _ => None,
        }
    }
    fn leaf(&self, name: &str) -> Option<&LeafNode> {
        match self.nodes.get(name) {
            Some(IrNode::Leaf(l)) => Some(l),
            _ => None,
        }
    }
    fn union(&self, name: &str) -> Option<&UnionNode> {
        match self.nodes.get(name) {
            Some(IrNode::Union(u)) => Some(&u.decl),
            _ => None,
        }
    }
}
