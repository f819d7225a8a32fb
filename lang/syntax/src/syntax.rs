use crate::prim::PrimOpcode;
use derive_more::From;
use tagless_utils::span::Location;

/* -------------------------------- Sequence -------------------------------- */

/// An ordered list of nodes; order is significant and empty lists are valid.
#[derive(Clone, Debug, PartialEq)]
pub struct Sequence<T> {
    pub loc: Location,
    pub elems: Vec<T>,
}

impl<T> Sequence<T> {
    pub fn new(loc: Location, elems: Vec<T>) -> Self {
        Sequence { loc, elems }
    }
    pub fn len(&self) -> usize {
        self.elems.len()
    }
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elems.iter()
    }
}

impl<'a, T> IntoIterator for &'a Sequence<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.elems.iter()
    }
}

/* ---------------------------------- Names --------------------------------- */

/// A reference to a name.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub loc: Location,
    pub name: String,
}

impl Variable {
    pub fn new(loc: Location, name: impl Into<String>) -> Self {
        Variable { loc, name: name.into() }
    }
}

/// A data constructor name; labels a construction or a pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct Constructor {
    pub loc: Location,
    pub name: String,
}

impl Constructor {
    pub fn new(loc: Location, name: impl Into<String>) -> Self {
        Constructor { loc, name: name.into() }
    }
}

/* -------------------------------- Literals -------------------------------- */

#[derive(From, Clone, Copy, Debug, PartialEq)]
pub enum LitValue {
    Int(i64),
    Double(f64),
}

/// An unboxed immediate value.
#[derive(Clone, Debug, PartialEq)]
pub struct Literal {
    pub loc: Location,
    pub value: LitValue,
}

impl Literal {
    pub fn new(loc: Location, value: impl Into<LitValue>) -> Self {
        Literal { loc, value: value.into() }
    }
}

/// The only legal shape of an argument.
#[derive(From, Clone, Debug, PartialEq)]
pub enum Atom {
    Var(Variable),
    Lit(Literal),
}

impl Atom {
    pub fn loc(&self) -> &Location {
        match self {
            | Atom::Var(var) => &var.loc,
            | Atom::Lit(lit) => &lit.loc,
        }
    }
}

/* ------------------------------- Primitives ------------------------------- */

#[derive(Clone, Debug, PartialEq)]
pub struct PrimOp {
    pub loc: Location,
    pub opcode: PrimOpcode,
}

impl PrimOp {
    pub fn new(loc: Location, opcode: PrimOpcode) -> Self {
        PrimOp { loc, opcode }
    }
    pub fn arity(&self) -> usize {
        self.opcode.arity()
    }
}

/* ------------------------------- Expressions ------------------------------ */

/// `let { .. } in ..` or `letrec { .. } in ..`, told apart by the [`Expr`] variant.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalBindings {
    pub loc: Location,
    pub bindings: Sequence<Binding>,
    pub body: Box<Expr>,
}

/// `case e of { alts }`
#[derive(Clone, Debug, PartialEq)]
pub struct Case {
    pub loc: Location,
    pub scrutinee: Box<Expr>,
    pub alts: Sequence<Alternative>,
}

/// `C a_1 .. a_n`
#[derive(Clone, Debug, PartialEq)]
pub struct Construct {
    pub loc: Location,
    pub con: Constructor,
    pub args: Sequence<Atom>,
}

/// `f a_1 .. a_n`
#[derive(Clone, Debug, PartialEq)]
pub struct Apply {
    pub loc: Location,
    pub var: Variable,
    pub args: Sequence<Atom>,
}

/// `op# a_1 .. a_n`; well-formed only when `args.len() == op.arity()`.
#[derive(Clone, Debug, PartialEq)]
pub struct PrimApply {
    pub loc: Location,
    pub op: PrimOp,
    pub args: Sequence<Atom>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LitExpr {
    pub loc: Location,
    pub lit: Literal,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// bindings see only the enclosing scope
    LocalDefinition(LocalBindings),
    /// bindings see each other and themselves
    LocalRecursion(LocalBindings),
    Case(Case),
    Construct(Construct),
    Apply(Apply),
    PrimApply(PrimApply),
    LitExpr(LitExpr),
}

impl Expr {
    pub fn loc(&self) -> &Location {
        match self {
            | Expr::LocalDefinition(e) | Expr::LocalRecursion(e) => &e.loc,
            | Expr::Case(e) => &e.loc,
            | Expr::Construct(e) => &e.loc,
            | Expr::Apply(e) => &e.loc,
            | Expr::PrimApply(e) => &e.loc,
            | Expr::LitExpr(e) => &e.loc,
        }
    }
}

/* ------------------------------ Alternatives ------------------------------ */

/// `default -> body`
#[derive(Clone, Debug, PartialEq)]
pub struct DefaultAlt {
    pub loc: Location,
    pub body: Expr,
}

/// `x -> body`, binding the scrutinee to `x`
#[derive(Clone, Debug, PartialEq)]
pub struct BindingAlt {
    pub loc: Location,
    pub var: Variable,
    pub body: Expr,
}

/// `C x_1 .. x_n -> body`
#[derive(Clone, Debug, PartialEq)]
pub struct AlgebraicAlt {
    pub loc: Location,
    pub con: Constructor,
    pub vars: Sequence<Variable>,
    pub body: Expr,
}

/// `3# -> body`
#[derive(Clone, Debug, PartialEq)]
pub struct PrimAlt {
    pub loc: Location,
    pub lit: Literal,
    pub body: Expr,
}

#[derive(From, Clone, Debug, PartialEq)]
pub enum Alternative {
    Default(DefaultAlt),
    Binding(BindingAlt),
    Algebraic(AlgebraicAlt),
    Prim(PrimAlt),
}

impl Alternative {
    pub fn loc(&self) -> &Location {
        match self {
            | Alternative::Default(alt) => &alt.loc,
            | Alternative::Binding(alt) => &alt.loc,
            | Alternative::Algebraic(alt) => &alt.loc,
            | Alternative::Prim(alt) => &alt.loc,
        }
    }
    pub fn body(&self) -> &Expr {
        match self {
            | Alternative::Default(alt) => &alt.body,
            | Alternative::Binding(alt) => &alt.body,
            | Alternative::Algebraic(alt) => &alt.body,
            | Alternative::Prim(alt) => &alt.body,
        }
    }
    /// Matches unconditionally.
    pub fn is_catch_all(&self) -> bool {
        matches!(self, Alternative::Default(_) | Alternative::Binding(_))
    }
}

/* --------------------------------- Lambdas -------------------------------- */

/// `\{freevars} u|n {args} -> body`
#[derive(Clone, Debug, PartialEq)]
pub struct Lambda {
    pub loc: Location,
    pub freevars: Sequence<Variable>,
    pub update: bool,
    pub args: Sequence<Variable>,
    pub body: Expr,
}

impl Lambda {
    /// A zero-argument closure that overwrites itself with its value.
    pub fn is_updatable_thunk(&self) -> bool {
        self.update && self.args.is_empty()
    }
}

/// `lhs = rhs`
#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    pub loc: Location,
    pub lhs: Variable,
    pub rhs: Lambda,
}

/// A whole program: the top-level bindings in declaration order.
pub type Program = Sequence<Binding>;
