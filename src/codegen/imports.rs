//! One `import` statement per external source.
use indexmap::{IndexMap, IndexSet};

use crate::ir::Ir;
use crate::resolve::Inherits;
use crate::schema::{OptionalRepr, Structure};

const MAYBE_SYMBOL: &str = "Maybe";
const MAYBE_SOURCE: &str = "purify-ts/Maybe";

pub(super) fn render(ir: &Ir) -> String {
    let declarations = ir
        .bases()
        .map(|b| b as &dyn Inherits)
        .chain(ir.leaves().map(|l| l as &dyn Inherits))
        .collect::<Vec<_>>();

    let referenced = |symbol: &str| {
        declarations
            .iter()
            .flat_map(|d| d.own_fields().values())
            .any(|f| f.references(symbol))
    };

    // sources and symbols keep extern declaration order
    let mut groups: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
    for external in ir.externals().filter(|e| referenced(&e.symbol)) {
        groups.entry(&external.source).or_default().insert(&external.symbol);
    }

    let wants_maybe = ir.options.optional == OptionalRepr::MonadicWrapper
        && declarations
            .iter()
            .flat_map(|d| d.own_fields().values())
            .any(|f| f.structure == Structure::Optional);
    if wants_maybe {
        groups.entry(MAYBE_SOURCE).or_default().insert(MAYBE_SYMBOL);
    }

    groups
        .iter()
        .map(|(source, symbols)| {
            let symbols = symbols.iter().copied().collect::<Vec<_>>().join(", ");
            format!("import {{ {symbols} }} from {};", super::js_string(source))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
