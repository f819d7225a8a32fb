//! Free variables of a subtree.

use indexmap::IndexMap;
use tagless_syntax::{NodeRef, Variable};
use tagless_utils::span::Location;

/// Names referenced but not bound inside `node`, in order of first occurrence,
/// each with the location of that occurrence.
pub fn free_variables(node: NodeRef<'_>) -> IndexMap<&str, &Location> {
    let mut out = IndexMap::new();
    collect(node, &mut Vec::new(), &mut out);
    out
}

fn collect<'a>(
    node: NodeRef<'a>, bound: &mut Vec<&'a str>, out: &mut IndexMap<&'a str, &'a Location>,
) {
    let binders = |vars: &'a [Variable]| vars.iter().map(|var| var.name.as_str());
    let mark = bound.len();
    match node {
        | NodeRef::Variable(var) => {
            if !bound.contains(&var.name.as_str()) {
                out.entry(var.name.as_str()).or_insert(&var.loc);
            }
        }
        | NodeRef::LocalDefinition(local) => {
            for binding in &local.bindings {
                collect(NodeRef::Variables(&binding.rhs.freevars), bound, out);
            }
            bound.extend(local.bindings.iter().map(|b| b.lhs.name.as_str()));
            collect(local.body.as_ref().into(), bound, out);
        }
        | NodeRef::LocalRecursion(local) => {
            bound.extend(local.bindings.iter().map(|b| b.lhs.name.as_str()));
            for binding in &local.bindings {
                collect(NodeRef::Variables(&binding.rhs.freevars), bound, out);
            }
            collect(local.body.as_ref().into(), bound, out);
        }
        | NodeRef::BindingAlt(alt) => {
            bound.push(&alt.var.name);
            collect((&alt.body).into(), bound, out);
        }
        | NodeRef::AlgebraicAlt(alt) => {
            bound.extend(binders(&alt.vars.elems));
            collect((&alt.body).into(), bound, out);
        }
        // a lambda only sees its captures from the outside
        | NodeRef::Lambda(lambda) => collect(NodeRef::Variables(&lambda.freevars), bound, out),
        | NodeRef::Binding(binding) => collect(NodeRef::Lambda(&binding.rhs), bound, out),
        | _ => {
            for child in node.children() {
                collect(child, bound, out);
            }
        }
    }
    bound.truncate(mark);
}
