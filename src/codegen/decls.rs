//! Interface declarations for bases and leaves.
use crate::ir::Ir;
use crate::resolve::Inherits;
use crate::schema::BaseNode;

use super::props::{field_key, field_type, Position};
use super::{comment, js_string, lines};

pub(super) fn render_base(ir: &Ir, base: &BaseNode) -> String {
    interface(ir, base, None)
}

/// `export interface Name extends A, B { ... }` with own fields only. A leaf
/// passes its tag, which becomes the first property.
pub(super) fn interface(ir: &Ir, node: &dyn Inherits, tag: Option<&str>) -> String {
    let what = if tag.is_some() { "leaf" } else { "interface" };
    let mut out = vec![comment(&[
        "This code implements the types and functions associated with".to_string(),
        format!("the {what} type {}.", node.name()),
    ])];

    let extends = match node.base_names() {
        [] => String::new(),
        bases => format!(" extends {}", bases.join(", ")),
    };
    out.push(format!("export interface {}{extends} {{", node.name()));
    if let Some(tag) = tag {
        out.push(format!("    {}: {};", ir.options.tag_name, js_string(tag)));
    }
    for (name, field) in node.own_fields() {
        out.push(format!(
            "    {}: {};",
            field_key(name, field, &ir.options),
            field_type(field, &ir.options, Position::Property)
        ));
    }
    out.push("}".to_string());
    lines(&out)
}
