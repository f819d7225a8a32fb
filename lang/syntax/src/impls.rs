//! Concrete-syntax printing; the output is accepted by the parser.

use crate::{fmt::*, syntax::*};
use pretty::RcDoc;

/* ---------------------------------- Ugly ---------------------------------- */

impl<'a> Ugly<'a, Formatter> for Variable {
    fn ugly(&self, _f: &'a Formatter) -> String {
        self.name.clone()
    }
}

impl<'a> Ugly<'a, Formatter> for Constructor {
    fn ugly(&self, _f: &'a Formatter) -> String {
        self.name.clone()
    }
}

impl<'a> Ugly<'a, Formatter> for Literal {
    fn ugly(&self, _f: &'a Formatter) -> String {
        literal(&self.value)
    }
}

impl<'a> Ugly<'a, Formatter> for Atom {
    fn ugly(&self, f: &'a Formatter) -> String {
        match self {
            | Atom::Var(var) => var.ugly(f),
            | Atom::Lit(lit) => lit.ugly(f),
        }
    }
}

impl<'a> Ugly<'a, Formatter> for Sequence<Variable> {
    fn ugly(&self, f: &'a Formatter) -> String {
        let vars: Vec<_> = self.iter().map(|var| var.ugly(f)).collect();
        format!("{{{}}}", vars.join(", "))
    }
}

/* --------------------------------- Pretty --------------------------------- */

/// `head a_1 .. a_n`
fn spine<'a>(head: String, args: &Sequence<Atom>, f: &'a Formatter) -> RcDoc<'a> {
    let mut s = head;
    for arg in args {
        s += " ";
        s += &arg.ugly(f);
    }
    RcDoc::text(s)
}

/// `opener` items separated by `;` `closer`, flat when it fits.
fn block<'a>(
    opener: &'static str, items: Vec<RcDoc<'a>>, closer: &'static str, f: &'a Formatter,
) -> RcDoc<'a> {
    RcDoc::concat([
        RcDoc::text(opener),
        RcDoc::concat([
            RcDoc::line(),
            RcDoc::intersperse(items, RcDoc::concat([RcDoc::text(";"), RcDoc::line()])),
        ])
        .nest(f.indent),
        RcDoc::line(),
        RcDoc::text(closer),
    ])
    .group()
}

/// `head ->` followed by `body`, indented when it breaks.
fn arrow<'a>(head: String, body: &Expr, f: &'a Formatter) -> RcDoc<'a> {
    RcDoc::concat([
        RcDoc::text(head),
        RcDoc::text(" ->"),
        RcDoc::concat([RcDoc::line(), body.pretty(f)]).nest(f.indent).group(),
    ])
}

impl<'a> Pretty<'a, Formatter> for Program {
    fn pretty(&self, f: &'a Formatter) -> RcDoc<'a> {
        RcDoc::concat(self.iter().map(|binding| {
            RcDoc::concat([binding.pretty(f), RcDoc::text(";"), RcDoc::hardline()])
        }))
    }
}

impl<'a> Pretty<'a, Formatter> for Binding {
    fn pretty(&self, f: &'a Formatter) -> RcDoc<'a> {
        RcDoc::concat([RcDoc::text(self.lhs.ugly(f)), RcDoc::text(" = "), self.rhs.pretty(f)])
    }
}

impl<'a> Pretty<'a, Formatter> for Lambda {
    fn pretty(&self, f: &'a Formatter) -> RcDoc<'a> {
        let Lambda { freevars, update, args, body, .. } = self;
        let flag = if *update { "u" } else { "n" };
        let head = format!("\\{} {flag} {}", freevars.ugly(f), args.ugly(f));
        arrow(head, body, f)
    }
}

impl<'a> Pretty<'a, Formatter> for Expr {
    fn pretty(&self, f: &'a Formatter) -> RcDoc<'a> {
        match self {
            | Expr::LocalDefinition(LocalBindings { bindings, body, .. })
            | Expr::LocalRecursion(LocalBindings { bindings, body, .. }) => {
                let kw = if matches!(self, Expr::LocalRecursion(_)) { "letrec {" } else { "let {" };
                let items = bindings.iter().map(|b| b.pretty(f)).collect();
                RcDoc::concat([
                    block(kw, items, "} in", f),
                    RcDoc::line(),
                    body.pretty(f),
                ])
                .group()
            }
            | Expr::Case(Case { scrutinee, alts, .. }) => {
                let items = alts.iter().map(|alt| alt.pretty(f)).collect();
                RcDoc::concat([
                    RcDoc::text("case "),
                    scrutinee.pretty(f),
                    RcDoc::text(" of "),
                    block("{", items, "}", f),
                ])
            }
            | Expr::Construct(Construct { con, args, .. }) => spine(con.ugly(f), args, f),
            | Expr::Apply(Apply { var, args, .. }) => spine(var.ugly(f), args, f),
            | Expr::PrimApply(PrimApply { op, args, .. }) => {
                spine(op.opcode.symbol().to_string(), args, f)
            }
            | Expr::LitExpr(LitExpr { lit, .. }) => RcDoc::text(lit.ugly(f)),
        }
    }
}

impl<'a> Pretty<'a, Formatter> for Alternative {
    fn pretty(&self, f: &'a Formatter) -> RcDoc<'a> {
        match self {
            | Alternative::Default(DefaultAlt { body, .. }) => arrow("default".into(), body, f),
            | Alternative::Binding(BindingAlt { var, body, .. }) => arrow(var.ugly(f), body, f),
            | Alternative::Algebraic(AlgebraicAlt { con, vars, body, .. }) => {
                let mut head = con.ugly(f);
                for var in vars {
                    head += " ";
                    head += &var.ugly(f);
                }
                arrow(head, body, f)
            }
            | Alternative::Prim(PrimAlt { lit, body, .. }) => arrow(lit.ugly(f), body, f),
        }
    }
}
