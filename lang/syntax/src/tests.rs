use crate::*;
use pretty_assertions::assert_eq;
use unindent::unindent;

fn dummy() -> Location {
    Location::dummy()
}

fn var(name: &str) -> Variable {
    Variable::new(dummy(), name)
}

fn int(i: i64) -> Literal {
    Literal::new(dummy(), i)
}

fn seq<T>(elems: Vec<T>) -> Sequence<T> {
    Sequence::new(dummy(), elems)
}

fn apply(name: &str, args: Vec<Atom>) -> Expr {
    Expr::Apply(Apply { loc: dummy(), var: var(name), args: seq(args) })
}

/// `f = \{} n {n} -> case n of { 0# -> 1#; default -> n };`
fn example() -> Binding {
    let case = Case {
        loc: dummy(),
        scrutinee: Box::new(apply("n", vec![])),
        alts: seq(vec![
            PrimAlt {
                loc: dummy(),
                lit: int(0),
                body: Expr::LitExpr(LitExpr { loc: dummy(), lit: int(1) }),
            }
            .into(),
            DefaultAlt { loc: dummy(), body: apply("n", vec![]) }.into(),
        ]),
    };
    Binding {
        loc: dummy(),
        lhs: var("f"),
        rhs: Lambda {
            loc: dummy(),
            freevars: seq(vec![]),
            update: false,
            args: seq(vec![var("n")]),
            body: Expr::Case(case),
        },
    }
}

#[test]
fn prim_table_is_a_bijection() {
    for op in PrimOpcode::ALL {
        assert_eq!(PrimOpcode::from_symbol(op.symbol()), Some(op));
    }
    let mut symbols: Vec<_> = PrimOpcode::ALL.iter().map(|op| op.symbol()).collect();
    symbols.sort();
    symbols.dedup();
    assert_eq!(symbols.len(), PrimOpcode::ALL.len());
}

#[test]
fn unknown_symbols_are_none() {
    for text in ["", "+", "#", "++#", "**", "~", "plus#", "=#", " +#"] {
        assert_eq!(PrimOpcode::from_symbol(text), None, "{text:?}");
    }
}

#[test]
fn arity_derivation() {
    assert_eq!(PrimOp::new(dummy(), PrimOpcode::Invert).arity(), 1);
    assert_eq!(PrimOp::new(dummy(), PrimOpcode::Negate).arity(), 1);
    for op in PrimOpcode::ALL {
        if !matches!(op, PrimOpcode::Invert | PrimOpcode::Negate) {
            assert_eq!(PrimOp::new(dummy(), op).arity(), 2, "{op}");
        }
    }
}

#[test]
fn comparisons() {
    let comparisons: Vec<_> =
        PrimOpcode::ALL.into_iter().filter(|op| op.is_comparison()).map(PrimOpcode::symbol).collect();
    assert_eq!(comparisons, vec!["<#", "<=#", "==#", "/=#", ">=#", ">#"]);
}

#[test]
fn format_is_deterministic() {
    let binding = example();
    assert_eq!(binding.format(0), binding.format(0));
    assert_eq!(binding.format(0), binding.clone().format(0));
}

#[test]
fn format_leaves() {
    assert_eq!(var("x").format(0), "(variable <internal> x)");
    assert_eq!(int(-3).format(1), "  (literal <internal> -3#)");
    assert_eq!(Literal::new(dummy(), 2.5).format(0), "(literal <internal> 2.5#)");
    assert_eq!(
        PrimOp::new(dummy(), PrimOpcode::Negate).format(0),
        "(primop <internal> ~-#)"
    );
    assert_eq!(seq::<Atom>(vec![]).format(0), "(sequence <internal>)");
}

#[test]
fn format_example() {
    let expected = unindent(
        r#"
        (binding <internal>
          (variable <internal> f)
          (lambda <internal> update=false
            (sequence <internal>)
            (sequence <internal>
              (variable <internal> n))
            (case_ <internal>
              (apply <internal>
                (variable <internal> n)
                (sequence <internal>))
              (sequence <internal>
                (prim_alt <internal>
                  (literal <internal> 0#)
                  (lit_expr <internal>
                    (literal <internal> 1#)))
                (default_alt <internal>
                  (apply <internal>
                    (variable <internal> n)
                    (sequence <internal>)))))))"#,
    );
    assert_eq!(example().format(0), expected);
}

#[test]
fn case_children() {
    let binding = example();
    let Expr::Case(case) = &binding.rhs.body else { unreachable!() };
    let children = case.children();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].tag(), "apply");
    assert_eq!(children[0].children()[0].scalars(), vec!["n".to_string()]);
    let alts = children[1].children();
    let tags: Vec<_> = alts.iter().map(|alt| alt.tag()).collect();
    assert_eq!(tags, vec!["prim_alt", "default_alt"]);
}

#[test]
fn children_follow_declaration_order() {
    let alt: Alternative = AlgebraicAlt {
        loc: dummy(),
        con: Constructor::new(dummy(), "Cons"),
        vars: seq(vec![var("x"), var("xs")]),
        body: apply("x", vec![]),
    }
    .into();
    let tags: Vec<_> = alt.children().iter().map(|c| c.tag()).collect();
    assert_eq!(tags, vec!["constructor", "sequence", "apply"]);

    let prim = Expr::PrimApply(PrimApply {
        loc: dummy(),
        op: PrimOp::new(dummy(), PrimOpcode::Add),
        args: seq(vec![var("a").into(), int(1).into()]),
    });
    let tags: Vec<_> = prim.children().iter().map(|c| c.tag()).collect();
    assert_eq!(tags, vec!["primop", "sequence"]);

    let letrec = Expr::LocalRecursion(LocalBindings {
        loc: dummy(),
        bindings: seq(vec![example()]),
        body: Box::new(apply("f", vec![int(3).into()])),
    });
    let tags: Vec<_> = letrec.children().iter().map(|c| c.tag()).collect();
    assert_eq!(tags, vec!["sequence", "apply"]);
    assert_eq!(letrec.as_node().tag(), "local_recursion");

    let binding = example();
    let lambda = &binding.rhs;
    let tags: Vec<_> = lambda.children().iter().map(|c| c.tag()).collect();
    assert_eq!(tags, vec!["sequence", "sequence", "case_"]);
}

#[test]
fn walk_visits_every_node_in_pre_order() {
    let binding = example();
    let mut tags = Vec::new();
    binding.as_node().walk(&mut |node| tags.push(node.tag()));
    assert_eq!(tags.first(), Some(&"binding"));
    assert_eq!(tags.iter().filter(|t| **t == "variable").count(), 4);
    assert_eq!(tags.iter().filter(|t| **t == "literal").count(), 2);
    assert_eq!(tags.len(), 19);
}

#[test]
fn pretty_example() {
    let program = seq(vec![example()]);
    let fmt = Formatter::new();
    assert_eq!(
        fmt.render(program.pretty(&fmt)),
        "f = \\{} n {n} -> case n of { 0# -> 1#; default -> n };\n"
    );
}

#[test]
fn pretty_breaks_long_lines() {
    let mut binding = example();
    binding.rhs.freevars = seq(vec![
        var("a_rather_long_free_variable"),
        var("another_rather_long_free_variable"),
    ]);
    let program = seq(vec![binding]);
    let fmt = Formatter::new();
    let expected = unindent(
        r#"
        f = \{a_rather_long_free_variable, another_rather_long_free_variable} n {n} ->
          case n of { 0# -> 1#; default -> n };
        "#,
    );
    assert_eq!(fmt.render(program.pretty(&fmt)), expected);
}
