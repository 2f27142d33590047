//! Field type rendering.
use crate::schema::{FieldDescriptor, MapRepr, OptionalRepr, Options, Structure, ValueKind};

use super::js_string;

/// Where a field type is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Position {
    /// Property of an interface.
    Property,
    /// Positional constructor parameter.
    Argument,
}

/// The value type without its structure: `number`, `A | B`, `"add" | "sub"`.
pub(super) fn type_name(kind: &ValueKind) -> String {
    match kind {
        ValueKind::Builtin { types } | ValueKind::Node { types } => types.join(" | "),
        ValueKind::Enum { tags } => tags.iter().map(|t| js_string(t)).collect::<Vec<_>>().join(" | "),
    }
}

fn part_count(kind: &ValueKind) -> usize {
    match kind {
        ValueKind::Builtin { types } | ValueKind::Node { types } => types.len(),
        ValueKind::Enum { tags } => tags.len(),
    }
}

pub(super) fn field_type(field: &FieldDescriptor, options: &Options, position: Position) -> String {
    let name = type_name(&field.kind);
    match field.structure {
        Structure::Scalar => name,
        Structure::Array if part_count(&field.kind) > 1 => format!("({name})[]"),
        Structure::Array => format!("{name}[]"),
        Structure::Set => format!("Set<{name}>"),
        Structure::Map => match options.maps {
            MapRepr::PlainRecord => format!("Record<string, {name}>"),
            MapRepr::AssociativeContainer => format!("Map<string, {name}>"),
        },
        Structure::Optional => match (options.optional, position) {
            (OptionalRepr::OmittableKey, Position::Property) => name,
            (OptionalRepr::OmittableKey, Position::Argument) => format!("{name} | undefined"),
            (OptionalRepr::Nullable, _) => format!("{name} | null"),
            (OptionalRepr::MonadicWrapper, _) => format!("Maybe<{name}>"),
        },
    }
}

/// Property key as declared: `name?` for an omittable optional.
pub(super) fn field_key(name: &str, field: &FieldDescriptor, options: &Options) -> String {
    if is_omittable(field, options) {
        format!("{name}?")
    } else {
        name.to_string()
    }
}

/// May the key be absent from a valid value?
pub(super) fn is_omittable(field: &FieldDescriptor, options: &Options) -> bool {
    field.structure == Structure::Optional && options.optional == OptionalRepr::OmittableKey
}

/// Expression spreading or passing the children held by `x.{name}`.
pub(super) fn child_expr(var: &str, name: &str, field: &FieldDescriptor, options: &Options) -> String {
    match field.structure {
        Structure::Scalar => format!("{var}.{name}"),
        Structure::Array | Structure::Set => format!("...{var}.{name}"),
        Structure::Map => match options.maps {
            MapRepr::PlainRecord => format!("...Object.values({var}.{name})"),
            MapRepr::AssociativeContainer => format!("...{var}.{name}.values()"),
        },
        Structure::Optional => match options.optional {
            OptionalRepr::OmittableKey | OptionalRepr::Nullable => {
                format!("...({var}.{name} ? [{var}.{name}] : [])")
            }
            OptionalRepr::MonadicWrapper => format!("...{var}.{name}.map((v) => [v]).orDefault([])"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ConstructorStyle, Structure};

    fn options(optional: OptionalRepr, maps: MapRepr) -> Options {
        Options { tag_name: "tag".into(), optional, maps, constructor: ConstructorStyle::default() }
    }

    fn node(structure: Structure, types: &[&str]) -> FieldDescriptor {
        FieldDescriptor {
            structure,
            kind: ValueKind::Node { types: types.iter().map(|t| t.to_string()).collect() },
        }
    }

    #[test]
    fn structures_wrap_the_value_type() {
        let o = options(OptionalRepr::OmittableKey, MapRepr::PlainRecord);
        assert_eq!(field_type(&node(Structure::Scalar, &["Expr"]), &o, Position::Property), "Expr");
        assert_eq!(field_type(&node(Structure::Array, &["Expr"]), &o, Position::Property), "Expr[]");
        assert_eq!(field_type(&node(Structure::Array, &["A", "B"]), &o, Position::Property), "(A | B)[]");
        assert_eq!(field_type(&node(Structure::Set, &["A", "B"]), &o, Position::Property), "Set<A | B>");
        assert_eq!(field_type(&node(Structure::Map, &["Expr"]), &o, Position::Property), "Record<string, Expr>");
        let m = options(OptionalRepr::OmittableKey, MapRepr::AssociativeContainer);
        assert_eq!(field_type(&node(Structure::Map, &["Expr"]), &m, Position::Property), "Map<string, Expr>");
    }

    #[test]
    fn optional_representation_selects_key_and_type() {
        let field = node(Structure::Optional, &["Expr"]);
        let omit = options(OptionalRepr::OmittableKey, MapRepr::PlainRecord);
        assert_eq!(field_key("init", &field, &omit), "init?");
        assert_eq!(field_type(&field, &omit, Position::Property), "Expr");
        assert_eq!(field_type(&field, &omit, Position::Argument), "Expr | undefined");

        let null = options(OptionalRepr::Nullable, MapRepr::PlainRecord);
        assert_eq!(field_key("init", &field, &null), "init");
        assert_eq!(field_type(&field, &null, Position::Property), "Expr | null");

        let wrap = options(OptionalRepr::MonadicWrapper, MapRepr::PlainRecord);
        assert_eq!(field_key("init", &field, &wrap), "init");
        assert_eq!(field_type(&field, &wrap, Position::Argument), "Maybe<Expr>");
    }

    #[test]
    fn enum_literals_are_quoted() {
        let field = FieldDescriptor::enum_literals(vec!["+".into(), "say \"hi\"".into()]);
        assert_eq!(type_name(&field.kind), "\"+\" | \"say \\\"hi\\\"\"");
    }

    #[test]
    fn children_expressions_follow_structure() {
        let o = options(OptionalRepr::OmittableKey, MapRepr::PlainRecord);
        assert_eq!(child_expr("x", "f", &node(Structure::Scalar, &["E"]), &o), "x.f");
        assert_eq!(child_expr("x", "f", &node(Structure::Set, &["E"]), &o), "...x.f");
        assert_eq!(child_expr("x", "f", &node(Structure::Map, &["E"]), &o), "...Object.values(x.f)");
        assert_eq!(child_expr("x", "f", &node(Structure::Optional, &["E"]), &o), "...(x.f ? [x.f] : [])");
        let w = options(OptionalRepr::MonadicWrapper, MapRepr::AssociativeContainer);
        assert_eq!(child_expr("x", "f", &node(Structure::Map, &["E"]), &w), "...x.f.values()");
        assert_eq!(
            child_expr("x", "f", &node(Structure::Optional, &["E"]), &w),
            "...x.f.map((v) => [v]).orDefault([])"
        );
    }
}
