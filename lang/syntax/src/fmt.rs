//! The formatter traits, and the structural s-expression dump of the tree.

use crate::{node::NodeRef, syntax::LitValue};

#[impl_tools::autoimpl(for<T: trait + ?Sized> &T, &mut T, Box<T>, std::rc::Rc<T>, std::sync::Arc<T>)]
pub trait Ugly<'a, Fmter> {
    fn ugly(&self, f: &'a Fmter) -> String;
}

use pretty::RcDoc;

#[impl_tools::autoimpl(for<T: trait + ?Sized> &T, &mut T, Box<T>, std::rc::Rc<T>, std::sync::Arc<T>)]
pub trait Pretty<'a, Fmter> {
    fn pretty(&self, f: &'a Fmter) -> RcDoc<'a>;
}

/// Formatter for the concrete syntax.
pub struct Formatter {
    pub indent: isize,
    pub width: usize,
}

impl Default for Formatter {
    fn default() -> Self {
        Formatter { indent: 2, width: 80 }
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self::default()
    }
    /// Lay out a document at the configured width.
    pub fn render<'a>(&self, doc: RcDoc<'a>) -> String {
        doc.pretty(self.width).to_string()
    }
}

/// A literal as written in source, e.g. `5#` or `2.5#`.
pub fn literal(value: &LitValue) -> String {
    match value {
        | LitValue::Int(i) => format!("{i}#"),
        | LitValue::Double(d) => format!("{d:?}#"),
    }
}

const INDENT: &str = "  ";

impl NodeRef<'_> {
    /// Render the subtree as a parenthesized s-expression, indented by `depth`.
    pub fn format(&self, depth: usize) -> String {
        let mut s = INDENT.repeat(depth);
        s += "(";
        s += self.tag();
        s += " ";
        s += &self.loc().to_string();
        for scalar in self.scalars() {
            s += " ";
            s += &scalar;
        }
        for child in self.children() {
            s += "\n";
            s += &child.format(depth + 1);
        }
        s += ")";
        s
    }
}
