//! Uniform access to the syntax tree.
//!
//! [`NodeRef`] is the single place that knows the parts of every node kind;
//! the formatter, the walker and every analysis over the tree go through
//! [`NodeRef::children`].

use crate::syntax::*;
use derive_more::From;
use tagless_utils::span::Location;

#[derive(From, Clone, Copy, Debug)]
pub enum NodeRef<'a> {
    Variable(&'a Variable),
    Constructor(&'a Constructor),
    Literal(&'a Literal),
    PrimOp(&'a PrimOp),
    #[from(skip)]
    LocalDefinition(&'a LocalBindings),
    #[from(skip)]
    LocalRecursion(&'a LocalBindings),
    Case(&'a Case),
    Construct(&'a Construct),
    Apply(&'a Apply),
    PrimApply(&'a PrimApply),
    LitExpr(&'a LitExpr),
    DefaultAlt(&'a DefaultAlt),
    BindingAlt(&'a BindingAlt),
    AlgebraicAlt(&'a AlgebraicAlt),
    PrimAlt(&'a PrimAlt),
    Lambda(&'a Lambda),
    Binding(&'a Binding),
    Variables(&'a Sequence<Variable>),
    Atoms(&'a Sequence<Atom>),
    Bindings(&'a Sequence<Binding>),
    Alternatives(&'a Sequence<Alternative>),
}

impl<'a> From<&'a Atom> for NodeRef<'a> {
    fn from(atom: &'a Atom) -> Self {
        match atom {
            | Atom::Var(var) => NodeRef::Variable(var),
            | Atom::Lit(lit) => NodeRef::Literal(lit),
        }
    }
}

impl<'a> From<&'a Expr> for NodeRef<'a> {
    fn from(expr: &'a Expr) -> Self {
        match expr {
            | Expr::LocalDefinition(e) => NodeRef::LocalDefinition(e),
            | Expr::LocalRecursion(e) => NodeRef::LocalRecursion(e),
            | Expr::Case(e) => NodeRef::Case(e),
            | Expr::Construct(e) => NodeRef::Construct(e),
            | Expr::Apply(e) => NodeRef::Apply(e),
            | Expr::PrimApply(e) => NodeRef::PrimApply(e),
            | Expr::LitExpr(e) => NodeRef::LitExpr(e),
        }
    }
}

impl<'a> From<&'a Alternative> for NodeRef<'a> {
    fn from(alt: &'a Alternative) -> Self {
        match alt {
            | Alternative::Default(alt) => NodeRef::DefaultAlt(alt),
            | Alternative::Binding(alt) => NodeRef::BindingAlt(alt),
            | Alternative::Algebraic(alt) => NodeRef::AlgebraicAlt(alt),
            | Alternative::Prim(alt) => NodeRef::PrimAlt(alt),
        }
    }
}

fn seq<'a, T>(seq: &'a Sequence<T>) -> Vec<NodeRef<'a>>
where
    &'a T: Into<NodeRef<'a>>,
{
    seq.elems.iter().map(Into::into).collect()
}

impl<'a> NodeRef<'a> {
    pub fn tag(&self) -> &'static str {
        match self {
            | NodeRef::Variable(_) => "variable",
            | NodeRef::Constructor(_) => "constructor",
            | NodeRef::Literal(_) => "literal",
            | NodeRef::PrimOp(_) => "primop",
            | NodeRef::LocalDefinition(_) => "local_definition",
            | NodeRef::LocalRecursion(_) => "local_recursion",
            | NodeRef::Case(_) => "case_",
            | NodeRef::Construct(_) => "construct",
            | NodeRef::Apply(_) => "apply",
            | NodeRef::PrimApply(_) => "prim_apply",
            | NodeRef::LitExpr(_) => "lit_expr",
            | NodeRef::DefaultAlt(_) => "default_alt",
            | NodeRef::BindingAlt(_) => "binding_alt",
            | NodeRef::AlgebraicAlt(_) => "algebraic_alt",
            | NodeRef::PrimAlt(_) => "prim_alt",
            | NodeRef::Lambda(_) => "lambda",
            | NodeRef::Binding(_) => "binding",
            | NodeRef::Variables(_)
            | NodeRef::Atoms(_)
            | NodeRef::Bindings(_)
            | NodeRef::Alternatives(_) => "sequence",
        }
    }

    pub fn loc(&self) -> &'a Location {
        match *self {
            | NodeRef::Variable(n) => &n.loc,
            | NodeRef::Constructor(n) => &n.loc,
            | NodeRef::Literal(n) => &n.loc,
            | NodeRef::PrimOp(n) => &n.loc,
            | NodeRef::LocalDefinition(n) | NodeRef::LocalRecursion(n) => &n.loc,
            | NodeRef::Case(n) => &n.loc,
            | NodeRef::Construct(n) => &n.loc,
            | NodeRef::Apply(n) => &n.loc,
            | NodeRef::PrimApply(n) => &n.loc,
            | NodeRef::LitExpr(n) => &n.loc,
            | NodeRef::DefaultAlt(n) => &n.loc,
            | NodeRef::BindingAlt(n) => &n.loc,
            | NodeRef::AlgebraicAlt(n) => &n.loc,
            | NodeRef::PrimAlt(n) => &n.loc,
            | NodeRef::Lambda(n) => &n.loc,
            | NodeRef::Binding(n) => &n.loc,
            | NodeRef::Variables(n) => &n.loc,
            | NodeRef::Atoms(n) => &n.loc,
            | NodeRef::Bindings(n) => &n.loc,
            | NodeRef::Alternatives(n) => &n.loc,
        }
    }

    /// The immediate owned sub-nodes, in declaration order.
    pub fn children(&self) -> Vec<NodeRef<'a>> {
        match *self {
            | NodeRef::Variable(_)
            | NodeRef::Constructor(_)
            | NodeRef::Literal(_)
            | NodeRef::PrimOp(_) => vec![],
            | NodeRef::LocalDefinition(n) | NodeRef::LocalRecursion(n) => {
                vec![(&n.bindings).into(), n.body.as_ref().into()]
            }
            | NodeRef::Case(n) => vec![n.scrutinee.as_ref().into(), (&n.alts).into()],
            | NodeRef::Construct(n) => vec![(&n.con).into(), (&n.args).into()],
            | NodeRef::Apply(n) => vec![(&n.var).into(), (&n.args).into()],
            | NodeRef::PrimApply(n) => vec![(&n.op).into(), (&n.args).into()],
            | NodeRef::LitExpr(n) => vec![(&n.lit).into()],
            | NodeRef::DefaultAlt(n) => vec![(&n.body).into()],
            | NodeRef::BindingAlt(n) => vec![(&n.var).into(), (&n.body).into()],
            | NodeRef::AlgebraicAlt(n) => {
                vec![(&n.con).into(), (&n.vars).into(), (&n.body).into()]
            }
            | NodeRef::PrimAlt(n) => vec![(&n.lit).into(), (&n.body).into()],
            | NodeRef::Lambda(n) => {
                vec![(&n.freevars).into(), (&n.args).into(), (&n.body).into()]
            }
            | NodeRef::Binding(n) => vec![(&n.lhs).into(), (&n.rhs).into()],
            | NodeRef::Variables(n) => seq(n),
            | NodeRef::Atoms(n) => seq(n),
            | NodeRef::Bindings(n) => seq(n),
            | NodeRef::Alternatives(n) => seq(n),
        }
    }

    /// Payload that is not a node: names, values, symbols and flags.
    pub fn scalars(&self) -> Vec<String> {
        match *self {
            | NodeRef::Variable(n) => vec![n.name.clone()],
            | NodeRef::Constructor(n) => vec![n.name.clone()],
            | NodeRef::Literal(n) => vec![crate::fmt::literal(&n.value)],
            | NodeRef::PrimOp(n) => vec![n.opcode.symbol().to_string()],
            | NodeRef::Lambda(n) => vec![format!("update={}", n.update)],
            | _ => vec![],
        }
    }

    /// Pre-order walk over the subtree rooted here.
    pub fn walk(&self, f: &mut impl FnMut(NodeRef<'a>)) {
        f(*self);
        for child in self.children() {
            child.walk(f);
        }
    }
}

/// Implemented by every syntax node.
pub trait Node {
    fn as_node(&self) -> NodeRef<'_>;
    fn loc(&self) -> &Location {
        self.as_node().loc()
    }
    fn children(&self) -> Vec<NodeRef<'_>> {
        self.as_node().children()
    }
    fn format(&self, depth: usize) -> String {
        self.as_node().format(depth)
    }
}

macro_rules! impl_node {
    ($($ty:ty)*) => {
        $(
            impl Node for $ty {
                fn as_node(&self) -> NodeRef<'_> {
                    self.into()
                }
            }
        )*
    };
}

impl_node! {
    Variable
    Constructor
    Literal
    PrimOp
    Case
    Construct
    Apply
    PrimApply
    LitExpr
    DefaultAlt
    BindingAlt
    AlgebraicAlt
    PrimAlt
    Lambda
    Binding
    Atom
    Expr
    Alternative
    Sequence<Variable>
    Sequence<Atom>
    Sequence<Binding>
    Sequence<Alternative>
}
