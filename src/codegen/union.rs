//! Sum types and their dispatch namespaces.
use crate::error::GenerationError;
use crate::ir::{Ir, UnionIr};
use crate::resolve::resolve_union_leaves;
use crate::schema::LeafNode;

use super::{comment, indented_comment, js_string, lines};

pub(super) fn render(ir: &Ir, union: &UnionIr) -> Result<String, GenerationError> {
    let name = &union.decl.name;
    let leaves = resolve_union_leaves(ir, &union.decl)?;
    let tag_name = &ir.options.tag_name;

    let mut out = vec![
        comment(&[
            "This code implements the types and functions associated with".to_string(),
            format!("the union type {name}."),
        ]),
        format!("export type {name} = {};", union.decl.members.join(" | ")),
        String::new(),
        format!("export namespace {name} {{"),
    ];

    out.push(doc(&[format!(
        "Given an instance of `any` determine if it is an instance of any of the leaf types of {name}"
    )]));
    out.push(format!("    export const anyIs = (n: any): n is {name} => {{"));
    for leaf in &leaves {
        out.push(format!("        if ({}.anyIs(n)) return true;", leaf.name));
    }
    out.push("        return false;".to_string());
    out.push("    };".to_string());

    out.push(doc(&[format!("Given an instance of {name}, return a list of all children")]));
    out.push(format!("    export const children = (n: {name}): readonly {name}[] => map(n, {{"));
    for leaf in &leaves {
        out.push(format!(
            "        {0}: (c): readonly {name}[] => {0}.children(c).map((x) => x as any).filter(anyIs),",
            leaf.name
        ));
    }
    out.push("    });".to_string());

    out.push(doc(&[
        format!("Given an instance of type {name}, map that value depending on the"),
        "specific underlying node type".to_string(),
    ]));
    out.push(format!("    export const map = <R>(n: {name}, f: {}): R => {{", handlers(&leaves, "R")));
    out.push(exhaustive_switch(name, tag_name, &leaves));
    out.push("    };".to_string());

    out.push(doc(&[
        format!("Given an instance of type {name}, map that value for certain subtypes"),
        "and for all others, simply return the `orElse` argument".to_string(),
    ]));
    out.push(format!(
        "    export const partialMap = <R>(n: {name}, f: Partial<{}>, orElse: R): R => {{",
        handlers(&leaves, "R")
    ));
    out.push(partial_checks(tag_name, &leaves));
    out.push("        return orElse;".to_string());
    out.push("    };".to_string());

    out.push(doc(&[
        format!("Given an instance of type {name}, take action depending on the"),
        "specific underlying node type".to_string(),
    ]));
    out.push(format!("    export const match = (n: {name}, f: {}): void => {{", handlers(&leaves, "void")));
    out.push(exhaustive_switch(name, tag_name, &leaves));
    out.push("    };".to_string());

    out.push(doc(&[
        format!("Given an instance of type {name}, take action for certain subtypes"),
        "and for all others, invoke the optional `orElse` callback".to_string(),
    ]));
    out.push(format!(
        "    export const partialMatch = (n: {name}, f: Partial<{}>, orElse?: (n: {name}) => void): void => {{",
        handlers(&leaves, "void")
    ));
    out.push(partial_checks(tag_name, &leaves));
    out.push("        if (orElse) return orElse(n);".to_string());
    out.push("    };".to_string());
    out.push("}".to_string());
    Ok(lines(&out))
}

fn doc(text: &[String]) -> String {
    indented_comment("    ", text)
}

/// `{ Lit: (n: Lit) => R, Add: (n: Add) => R }`, one handler per leaf.
fn handlers(leaves: &[&LeafNode], ret: &str) -> String {
    let entries = leaves
        .iter()
        .map(|l| format!("{0}: (n: {0}) => {ret}", l.name))
        .collect::<Vec<_>>()
        .join("; ");
    format!("{{ {entries} }}")
}

fn exhaustive_switch(union: &str, tag_name: &str, leaves: &[&LeafNode]) -> String {
    let mut out = vec![format!("        switch (n.{tag_name}) {{")];
    for leaf in leaves {
        out.push(format!("            case {}: return f.{}(n);", js_string(&leaf.tag), leaf.name));
    }
    out.push("            default: {".to_string());
    out.push("                const x: never = n;".to_string());
    out.push(format!(
        "                throw new Error({} + (x as any).{tag_name});",
        js_string(&format!("impossible variant of {union}, unexpected {tag_name}: "))
    ));
    out.push("            }".to_string());
    out.push("        }".to_string());
    lines(&out)
}

fn partial_checks(tag_name: &str, leaves: &[&LeafNode]) -> String {
    let checks = leaves
        .iter()
        .map(|l| {
            format!(
                "        if (n.{tag_name} === {} && f.{1}) return f.{1}(n);",
                js_string(&l.tag),
                l.name
            )
        })
        .collect::<Vec<_>>();
    lines(&checks)
}
