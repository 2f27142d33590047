//! Leaf helpers: interface, static helper class, constructor function.
use indexmap::IndexSet;

use crate::error::GenerationError;
use crate::ir::Ir;
use crate::resolve::{resolve_child_fields, resolve_fields, ResolvedField};
use crate::schema::{ConstructorStyle, LeafNode};

use super::props::{child_expr, field_type, is_omittable, Position};
use super::{decls, indented_comment, is_reserved, js_string, lines};

pub(super) fn render(ir: &Ir, leaf: &LeafNode, ctor: &str) -> Result<String, GenerationError> {
    let fields = resolve_fields(ir, leaf)?;
    let children = resolve_child_fields(ir, leaf)?;
    let parts = [
        decls::interface(ir, leaf, Some(leaf.tag.as_str())),
        String::new(),
        helper_class(ir, leaf, &fields, &children),
        String::new(),
        constructor(ir, leaf, &fields, ctor),
    ];
    Ok(lines(&parts))
}

fn helper_class(
    ir: &Ir,
    leaf: &LeafNode,
    fields: &[ResolvedField<'_>],
    children: &[ResolvedField<'_>],
) -> String {
    let name = &leaf.name;
    let tag_name = &ir.options.tag_name;
    let tag = js_string(&leaf.tag);

    let mut out = vec![format!("export class {name} {{")];

    out.push(indented_comment("    ", &[format!(
        "A predicate function that takes an instance of `any` and determines if it is an instance of {name}"
    )]));
    out.push(format!("    static anyIs = (x: any, allowExtra: boolean = false): x is {name} => {{"));
    out.push("        if (x === null || x === undefined) return false;".to_string());
    out.push("        if (typeof x !== \"object\") return false;".to_string());
    out.push("        const keys = Object.keys(x);".to_string());
    for field in fields.iter().filter(|f| !is_omittable(f.descriptor, &ir.options)) {
        out.push(format!("        if (!keys.includes({})) return false;", js_string(field.name)));
    }
    out.push(format!("        if (!keys.includes({})) return false;", js_string(tag_name)));
    let allowed = std::iter::once(tag_name.as_str())
        .chain(fields.iter().map(|f| f.name))
        .map(js_string)
        .collect::<Vec<_>>()
        .join(", ");
    out.push(format!(
        "        if (!allowExtra && keys.some((k) => ![{allowed}].includes(k))) return false;"
    ));
    out.push(format!("        return x.{tag_name} === {tag};"));
    out.push("    };".to_string());

    out.push(indented_comment("    ", &[format!(
        "A predicate function that takes an instance of type {} and determines if it is an instance of {name}",
        leaf.root_union
    )]));
    out.push(format!(
        "    static is = (x: {}): x is {name} => {{ return x.{tag_name} === {tag}; }};",
        leaf.root_union
    ));

    out.push(indented_comment("    ", &[format!(
        "Given an instance of {name}, determine all children that are instances of {}",
        leaf.root_union
    )]));
    let exprs = children
        .iter()
        .map(|f| child_expr("x", f.name, f.descriptor, &ir.options))
        .collect::<Vec<_>>()
        .join(", ");
    out.push(format!("    static children = (x: {name}) => {{ return [{exprs}] as const; }};"));

    out.push(indented_comment("    ", &[format!(
        "Although generally not necessary, this tag can be used to identify instances of {name}"
    )]));
    out.push(format!("    static tag = {tag} as const;"));
    out.push("}".to_string());
    lines(&out)
}

fn constructor(ir: &Ir, leaf: &LeafNode, fields: &[ResolvedField<'_>], ctor: &str) -> String {
    let name = &leaf.name;
    let tag_name = &ir.options.tag_name;
    let tag = js_string(&leaf.tag);
    let doc = indented_comment("", &[format!("This function can be invoked to create a new instance of {name}")]);
    let code = match ir.options.constructor {
        ConstructorStyle::SingleParameterObject => [
            format!("export function {ctor}(fields: Omit<{name}, {}>): {name} {{", js_string(tag_name)),
            format!("    return {{ {tag_name}: {tag}, ...fields }};"),
            "}".to_string(),
        ],
        ConstructorStyle::PositionalArgs => {
            let mut params = Vec::with_capacity(fields.len());
            let mut entries = vec![format!("{tag_name}: {tag}")];
            let mut taken = fields.iter().map(|f| f.name.to_string()).collect::<IndexSet<_>>();
            for field in fields {
                let param = param_name(field.name, &mut taken);
                params.push(format!(
                    "{param}: {}",
                    field_type(field.descriptor, &ir.options, Position::Argument)
                ));
                if param == field.name {
                    entries.push(param);
                } else {
                    entries.push(format!("{}: {param}", field.name));
                }
            }
            [
                format!("export function {ctor}({}): {name} {{", params.join(", ")),
                format!("    return {{ {} }};", entries.join(", ")),
                "}".to_string(),
            ]
        }
    };
    lines(&[doc, lines(&code)])
}

/// A reserved field name is escaped past every name already in `taken`,
/// which starts out holding all field names of the constructor.
fn param_name(field: &str, taken: &mut IndexSet<String>) -> String {
    if !is_reserved(field) {
        return field.to_string();
    }
    let mut name = field.to_string();
    while is_reserved(&name) || taken.contains(&name) {
        name.push('_');
    }
    taken.insert(name.clone());
    name
}

/// Lower-camel form of a type name: the leading run of capitals is
/// lowered except for its last letter, which starts the next word.
/// `Lit` -> `lit`, `ASTNode` -> `astNode`, `IO` -> `io`.
pub(super) fn constructor_name(type_name: &str) -> String {
    let upper = type_name.chars().take_while(char::is_ascii_uppercase).count();
    let total = type_name.chars().count();
    let lowered = if upper == total { total } else { upper.saturating_sub(1).max(1) };
    type_name
        .chars()
        .enumerate()
        .map(|(i, c)| if i < lowered { c.to_ascii_lowercase() } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::tests::render;
    use serde_json::json;

    fn scenario_a() -> serde_json::Value {
        json!({
            "nodes": {
                "Expr": {
                    "Lit": [{ "value": "number" }],
                    "Add": [{ "left": "Expr" }, { "right": "Expr" }],
                }
            }
        })
    }

    #[test]
    fn lower_camel_constructor_names() {
        assert_eq!(constructor_name("Lit"), "lit");
        assert_eq!(constructor_name("ASTNode"), "astNode");
        assert_eq!(constructor_name("IO"), "io");
        assert_eq!(constructor_name("X"), "x");
        assert_eq!(constructor_name("_Private"), "_Private");
        assert_eq!(constructor_name("already"), "already");
    }

    #[test]
    fn children_report_node_fields_in_order() {
        let out = render(scenario_a());
        assert!(out.contains("    static children = (x: Add) => { return [x.left, x.right] as const; };"), "{out}");
        assert!(out.contains("    static children = (x: Lit) => { return [] as const; };"));
        assert!(out.contains("    static is = (x: Expr): x is Add => { return x.tag === \"add\"; };"));
        assert!(out.contains("    static tag = \"lit\" as const;"));
    }

    #[test]
    fn shape_predicate_checks_keys_and_discriminant() {
        let out = render(json!({
            "bases": { "Named": [{ "name": "string" }] },
            "nodes": { "Expr": { "Var": [{ "extends": "Named" }, { "init": "Expr?" }] } },
        }));
        assert!(out.contains("        if (!keys.includes(\"name\")) return false;"), "{out}");
        // omittable optionals are not required
        assert!(!out.contains("keys.includes(\"init\")"));
        assert!(out.contains("![\"tag\", \"name\", \"init\"].includes(k)"));
        assert!(out.contains("        return x.tag === \"var\";"));
    }

    #[test]
    fn optional_fields_are_required_unless_omittable() {
        for (mode, required) in [("omittable-key", false), ("nullable", true), ("monadic-wrapper", true)] {
            let out = render(json!({
                "options": { "optional": mode },
                "nodes": { "Expr": { "Let": [{ "init": "Expr?" }] } },
            }));
            assert_eq!(out.contains("if (!keys.includes(\"init\")) return false;"), required, "{mode}");
        }
    }

    #[test]
    fn optional_boundary_in_constructor_signatures() {
        let cases = [
            ("omittable-key", "export function let_(init: Expr | undefined): Let {", "init?: Expr;"),
            ("nullable", "export function let_(init: Expr | null): Let {", "init: Expr | null;"),
            ("monadic-wrapper", "export function let_(init: Maybe<Expr>): Let {", "init: Maybe<Expr>;"),
        ];
        for (mode, signature, property) in cases {
            let out = render(json!({
                "options": { "optional": mode },
                "nodes": { "Expr": { "Let": [{ "init": "Expr?" }], "Lit": [] } },
            }));
            assert!(out.contains(signature), "{mode}: {out}");
            assert!(out.contains(property), "{mode}");
        }
    }

    #[test]
    fn positional_constructor_injects_tag() {
        let out = render(scenario_a());
        assert!(out.contains("export function add(left: Expr, right: Expr): Add {\n    return { tag: \"add\", left, right };\n}"), "{out}");
        assert!(out.contains("export function lit(value: number): Lit {"));
    }

    #[test]
    fn reserved_parameter_names_are_escaped() {
        let out = render(json!({ "nodes": { "Node": { "Decl": [{ "class": "string" }, { "in": "number" }] } } }));
        assert!(out.contains("export function decl(class_: string, in_: number): Decl {"), "{out}");
        assert!(out.contains("return { tag: \"decl\", class: class_, in: in_ };"));
    }

    #[test]
    fn escaped_parameters_do_not_shadow_other_fields() {
        let out = render(json!({ "nodes": { "Node": { "Decl": [{ "in": "string" }, { "in_": "number" }] } } }));
        assert!(out.contains("export function decl(in__: string, in_: number): Decl {"), "{out}");
        assert!(out.contains("return { tag: \"decl\", in: in__, in_ };"));

        let mut taken: IndexSet<String> = ["class", "class_", "class__"].map(String::from).into_iter().collect();
        assert_eq!(param_name("class", &mut taken), "class___");
        assert_eq!(param_name("class_", &mut taken), "class_");
    }

    #[test]
    fn object_constructor_takes_fields_without_tag() {
        let out = render(json!({
            "options": { "constructor": "single-parameter-object", "tagName": "kind" },
            "nodes": { "Expr": { "Lit": [{ "value": "number" }] } },
        }));
        assert!(out.contains("export function lit(fields: Omit<Lit, \"kind\">): Lit {\n    return { kind: \"lit\", ...fields };\n}"), "{out}");
    }
}
