use crate::{c::CType, lir::*, *};
use pretty_assertions::assert_eq;
use tagless_syntax::{NodeRef, PrimOpcode, Program};
use tagless_utils::span::Location;
use unindent::unindent;

fn parse(src: &str) -> Program {
    tagless_surface::parse(src, Some("t.stg".into())).unwrap()
}

fn lower(src: &str) -> Result<(Lowered, String)> {
    let program = parse(src);
    let mut ctx = Context::new(CBackend::new(false), &program)?;
    let lowered = ctx.lower(&program)?;
    Ok((lowered, ctx.into_backend().to_string()))
}

fn lower_err(src: &str) -> CompileError {
    match lower(src) {
        | Ok(_) => panic!("expected a compile error"),
        | Err(err) => err,
    }
}

/* ---------------------------------- Scope --------------------------------- */

fn table() -> ScopedMap<String, i32> {
    ScopedMap::new([("g".to_string(), 0)].into_iter().collect())
}

#[test]
fn scope_push_bind_lookup_pop() {
    let mut scope = table();
    assert_eq!(scope.bind("x".to_string(), 1), Err(ScopeError::NoFrame));
    scope.push();
    scope.bind("x".to_string(), 1).unwrap();
    scope.push();
    scope.bind("x".to_string(), 2).unwrap();
    assert_eq!(scope.lookup("x"), Ok(&2));
    scope.pop().unwrap();
    assert_eq!(scope.lookup("x"), Ok(&1));
    assert_eq!(scope.lookup("g"), Ok(&0));
    scope.pop().unwrap();
    assert_eq!(scope.lookup("x"), Err(ScopeError::Unbound));
    assert_eq!(scope.pop(), Err(ScopeError::Underflow));
}

#[test]
fn scope_lookup_searches_outer_frames() {
    let mut scope = table();
    scope.push();
    scope.bind("y".to_string(), 1).unwrap();
    scope.push();
    scope.bind("x".to_string(), 2).unwrap();
    assert_eq!(scope.lookup("y"), Ok(&1));
    assert_eq!(scope.lookup("x"), Ok(&2));
    assert_eq!(scope.depth(), 2);
}

#[test]
fn scope_rejects_duplicates_without_change() {
    let mut scope = table();
    scope.push();
    scope.bind("x".to_string(), 1).unwrap();
    assert_eq!(scope.bind("x".to_string(), 2), Err(ScopeError::Duplicate));
    assert_eq!(scope.lookup("x"), Ok(&1));
    assert_eq!(scope.depth(), 1);
}

#[test]
fn scope_globals_win_over_locals() {
    let mut scope = table();
    scope.push();
    scope.bind("g".to_string(), 7).unwrap();
    assert_eq!(scope.lookup("g"), Ok(&0));
}

#[test]
fn scope_fork_shares_globals_only() {
    let mut scope = table();
    scope.push();
    scope.bind("x".to_string(), 1).unwrap();
    let fork = scope.fork();
    assert_eq!(fork.depth(), 0);
    assert!(fork.is_global("g"));
    assert_eq!(fork.lookup("x"), Err(ScopeError::Unbound));
}

/* --------------------------------- Symbols -------------------------------- */

#[test]
fn mangling() {
    assert_eq!(mangle("map"), "map");
    assert_eq!(mangle("go_1"), "go__1");
    assert_eq!(mangle("x'"), "x_q");
    assert_eq!(mangle("a.b"), "a_x2eb");
    assert_eq!(Symbol::global("x'").info().to_string(), "g_x_q_info");
    assert_eq!(Symbol::constructor("Cons", 2).entry().to_string(), "con_Cons_2_entry");
    assert_eq!(Symbol::global("f").nested(3, "g").to_string(), "g_f_l3_g");
    assert_eq!(Symbol::global("f").continuation(0).update().to_string(), "g_f_k0_update");
}

#[test]
fn free_variables_in_order() {
    let program = parse(&unindent(
        r"
        f = \{} n {x} ->
          let { a = \{x, y} u {} -> y } in
          case a of { Cons p q -> g p z; w -> w };
        ",
    ));
    let free = free_variables(NodeRef::Binding(&program.elems[0]));
    assert_eq!(free.keys().copied().collect::<Vec<_>>(), Vec::<&str>::new());
    let body = &program.elems[0].rhs.body;
    let free = free_variables(body.into());
    assert_eq!(free.keys().copied().collect::<Vec<_>>(), vec!["x", "y", "g", "z"]);
}

#[test]
fn free_variables_of_letrec_exclude_binders() {
    let program = parse(r"f = \{} n {} -> letrec { xs = \{xs, k} u {} -> Cons k xs } in xs;");
    let free = free_variables((&program.elems[0].rhs.body).into());
    assert_eq!(free.keys().copied().collect::<Vec<_>>(), vec!["k"]);
}

/* -------------------------------- Lowering -------------------------------- */

#[test]
fn factorial_end_to_end() {
    let (lowered, c) = lower(&unindent(
        r"
        f = \{} n {n} -> case n of { 0# -> 1#; default -> n };
        main = \{} u {} -> f 5#;
        ",
    ))
    .unwrap();
    let names: Vec<_> = lowered.templates.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["f", "main"]);
    assert_eq!(lowered.templates[0].arity, 1);
    assert!(!lowered.templates[0].updatable);
    assert!(lowered.templates[1].updatable);
    assert_eq!(lowered.entry, Some(Symbol::export(ENTRY_SYMBOL)));
    assert!(c.contains("static struct info_table g_f_info = {"), "{c}");
    assert!(c.contains("void tagless_entry(void) {"), "{c}");
    assert!(c.contains("rt_partial_application(1)"), "{c}");
    assert!(c.contains("g_main_update"), "{c}");
}

#[test]
fn single_template() {
    let (lowered, _) = lower(r"f = \{} n {n} -> case n of { 0# -> 1#; default -> n };").unwrap();
    assert_eq!(lowered.templates.len(), 1);
    assert_eq!(lowered.templates[0].info, Symbol::global("f").info());
    assert_eq!(lowered.entry, None);
}

#[test]
fn mutual_recursion_resolves_globals() {
    let (lowered, c) = lower(&unindent(
        r"
        even = \{} n {n} -> case n of { 0# -> 1#; default -> odd n };
        odd = \{} n {n} -> case n of { 0# -> 0#; default -> even n };
        ",
    ))
    .unwrap();
    assert_eq!(lowered.templates.len(), 2);
    assert!(c.contains("&g_odd"), "{c}");
    assert!(c.contains("&g_even"), "{c}");
}

#[test]
fn globals_are_registered_before_lowering() {
    let program = parse(&unindent(
        r"
        even = \{} n {n} -> case n of { 0# -> 1#; default -> odd n };
        odd = \{} n {n} -> case n of { 0# -> 0#; default -> even n };
        ",
    ));
    let ctx = Context::new(CBackend::new(false), &program).unwrap();
    assert_eq!(ctx.symbols().lookup("even"), Ok(&Operand::Global(Symbol::global("even"))));
    assert_eq!(ctx.symbols().lookup("odd"), Ok(&Operand::Global(Symbol::global("odd"))));
    assert_eq!(ctx.symbols().depth(), 0);
}

#[test]
fn constructors_collected_once() {
    let (lowered, c) = lower(&unindent(
        r"
        nil = \{} n {} -> Nil;
        len = \{} n {xs} -> case xs of { Nil -> 0#; Cons y ys -> 1# };
        one = \{} n {x} -> Cons x nil;
        ",
    ))
    .unwrap();
    assert_eq!(lowered.constructors, vec![("Nil".to_string(), 0), ("Cons".to_string(), 2)]);
    assert!(c.contains("con_Cons_2_info"), "{c}");
}

#[test]
fn nested_lambdas_and_continuations_are_named_after_their_template() {
    let (lowered, c) = lower(&unindent(
        r"
        map = \{} n {f, xs} ->
          case xs of {
            Nil -> Nil;
            Cons y ys ->
              let {
                fy = \{f, y} u {} -> f y;
                rest = \{f, ys} u {} -> map f ys
              } in Cons fy rest
          };
        ",
    ))
    .unwrap();
    let infos: Vec<_> = lowered.templates.iter().map(|t| t.info.to_string()).collect();
    assert_eq!(infos, vec!["g_map_l1_fy_info", "g_map_l2_rest_info", "g_map_info"]);
    assert!(c.contains("g_map_k0(void)"), "{c}");
}

#[test]
fn letrec_fills_slots_after_allocation() {
    let (_, c) = lower(r"main = \{} u {} -> letrec { ones = \{ones} u {} -> Cons 1# ones } in ones;")
        .unwrap();
    assert!(c.contains("g_main_l0_ones_info"), "{c}");
    assert!(c.contains("g_main_l0_ones_update"), "{c}");
}

#[test]
fn literal_arguments_are_boxed() {
    let (_, c) = lower(r"f = \{} n {x} -> g 1#; g = \{} n {y} -> y;").unwrap();
    assert!(c.contains("= &stg_literal_info;"), "{c}");
}

#[test]
fn comparisons_produce_words() {
    let (_, c) = lower(r"f = \{} n {x} -> <# x 1#; g = \{} n {x} -> +# x 1#;").unwrap();
    assert!(c.contains("t2 = (word) (t1 < ((word) 1));"), "{c}");
    assert!(c.contains("t2 = (t1 + ((word) 1));"), "{c}");
}

#[test]
fn builtins_are_always_defined() {
    let (lowered, c) = lower("").unwrap();
    assert!(lowered.templates.is_empty());
    for builtin in ["stg_literal_info", "stg_blackhole_info", "stg_indirection_info"] {
        assert!(c.contains(&format!("static struct info_table {builtin} =")), "{c}");
    }
}

#[test]
fn slots_reserve_room_for_updates() {
    let program = parse(r"a = \{} u {} -> 1#; b = \{} n {} -> 1#; c = \{a, b} n {x} -> x;");
    let slots: Vec<_> = program.iter().map(|b| slots_of(&b.rhs)).collect();
    assert_eq!(slots, vec![1, 0, 2]);
}

#[test]
fn entry_can_be_renamed() {
    let program = parse(r"start = \{} u {} -> 0#;");
    let mut ctx = Context::new(CBackend::new(false), &program).unwrap();
    ctx.set_entry("start");
    let lowered = ctx.lower(&program).unwrap();
    assert_eq!(lowered.entry, Some(Symbol::export(ENTRY_SYMBOL)));
}

#[test]
fn line_directives() {
    let program = parse(r"f = \{} n {x} -> x;");
    let mut ctx = Context::new(CBackend::new(true), &program).unwrap();
    ctx.lower(&program).unwrap();
    let c = ctx.into_backend().to_string();
    assert!(c.contains("#line 1 \"t.stg\""), "{c}");
}

#[test]
fn backend_by_reference() {
    let mut backend = CBackend::new(false);
    let types = Types::new(&mut &mut backend);
    assert_eq!(types.closure_ptr.spelling(), "struct closure *");
    assert_eq!(types.continuation.spelling(), "void (*)(void)");
    assert_eq!(types.freevars.ty.declare("freevars"), "struct closure *freevars[]");
}

#[test]
fn arity_is_unsigned() {
    let (_, c) = lower("").unwrap();
    let types = Types::new(&mut CBackend::new(false));
    assert_eq!(types.arity.ty, CType::UWord);
    assert_eq!(types.arity.ty.declare("arity"), "uword arity");
    assert!(c.contains("typedef uintptr_t uword;"), "{c}");
    assert!(c.contains("uword arity;"), "{c}");
}

/* --------------------------------- Errors --------------------------------- */

#[test]
fn duplicate_top_level_binding() {
    let err = lower_err(r"f = \{} n {} -> 1#; f = \{} n {} -> 2#;");
    assert_eq!(err, CompileError::DuplicateBinding { name: "f".into(), loc: err.loc().clone() });
    assert_eq!(err.loc().begin.column, 21);
}

#[test]
fn duplicate_argument() {
    let err = lower_err(r"f = \{} n {x, x} -> x;");
    assert!(matches!(err, CompileError::DuplicateBinding { ref name, .. } if name == "x"));
}

#[test]
fn undeclared_capture() {
    let err = lower_err(r"f = \{y} n {x} -> x;");
    assert!(matches!(err, CompileError::UnboundName { ref name, .. } if name == "y"));
    assert!(err.to_string().starts_with("t.stg:1:7-1:8: unbound name `y`"), "{err}");
}

#[test]
fn unbound_variable() {
    let err = lower_err(r"f = \{} n {x} -> y x;");
    assert!(matches!(err, CompileError::UnboundName { ref name, .. } if name == "y"));
}

#[test]
fn prim_arity_mismatch() {
    let err = lower_err(r"f = \{} n {x} -> +# x;");
    assert!(matches!(
        err,
        CompileError::ArityMismatch { op: PrimOpcode::Add, expected: 2, found: 1, .. }
    ));
}

#[test]
fn double_prim_operand() {
    let err = lower_err(r"f = \{} n {x} -> +# x 1.5#;");
    assert!(matches!(err, CompileError::UnsupportedOperand { op: PrimOpcode::Add, .. }));
}

#[test]
fn multiple_defaults() {
    let err = lower_err(r"f = \{} n {x} -> case x of { default -> 1#; y -> 2# };");
    assert!(matches!(err, CompileError::MultipleDefaults { .. }));
    assert_eq!(err.loc().begin.column, 45);
}

#[test]
fn default_not_last() {
    let err = lower_err(r"f = \{} n {x} -> case x of { default -> 1#; 0# -> 2# };");
    assert!(matches!(err, CompileError::DefaultNotLast { .. }));
    assert_eq!(err.loc().begin.column, 30);
}

#[test]
fn local_shadows_global() {
    let err = lower_err(r"g = \{} n {} -> 0#; f = \{} n {g} -> g;");
    assert!(matches!(err, CompileError::ShadowsGlobal { ref name, .. } if name == "g"));
}

/// Drop ANSI colour sequences from rendered reports.
fn plain(rendered: &[u8]) -> String {
    let text = String::from_utf8_lossy(rendered);
    let mut out = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[test]
fn compile_error_report_labels_the_source() {
    let src = r"f = \{} n {x} -> y x;";
    let err = lower_err(src);
    let mut buf = Vec::new();
    err.to_report()
        .write(ariadne::sources([("t.stg".to_string(), src.to_string())]), &mut buf)
        .unwrap();
    let text = plain(&buf);
    assert!(text.contains("Unbound name"), "{text}");
    assert!(text.contains(src), "{text}");
    assert!(text.contains("`y` is not defined"), "{text}");
}

#[test]
fn internal_error_report_needs_no_source() {
    let err = CompileError::FrameUnderflow { loc: Location::dummy() };
    let mut buf = Vec::new();
    err.to_report().write(ariadne::sources(Vec::<(String, String)>::new()), &mut buf).unwrap();
    let text = plain(&buf);
    assert!(text.contains("Local frame underflow"), "{text}");
}

#[test]
fn errors_stop_lowering() {
    let program = parse(r"a = \{} n {} -> b; b = \{} n {} -> c; d = \{} n {} -> 0#;");
    let mut ctx = Context::new(CBackend::new(false), &program).unwrap();
    let err = ctx.lower(&program).unwrap_err();
    assert!(matches!(err, CompileError::UnboundName { ref name, .. } if name == "c"));
}
