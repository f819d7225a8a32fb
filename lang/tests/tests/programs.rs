use tagless_tests::{compile_stg, reject_stg};

compile_stg!(factorial, "factorial", "g_fact_info", "g_main_update", "tagless_entry");
compile_stg!(lists, "lists", "con_Cons_2_info", "con_Nil_0_info", "g_main_l", "g_take_k");
compile_stg!(parity, "parity", "&g_odd", "&g_even");
compile_stg!(prims, "prims", "rt_pow(", "(word) (", "(-");

reject_stg!(unbound, "unbound", "unbound name `missing`");
reject_stg!(default_not_last, "default_not_last", "a catch-all alternative must come last");
reject_stg!(duplicate, "duplicate", "is bound more than once");
reject_stg!(syntax_error, "syntax_error", "expected update flag");

#[test]
fn factorial_templates() {
    let artifact = tagless_tests::utils::compile("factorial");
    let names: Vec<_> = artifact.lowered.templates.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["fact", "main"]);
    assert_eq!(artifact.lowered.templates[0].arity, 1);
}

#[test]
fn lists_templates_are_nested_first() {
    let artifact = tagless_tests::utils::compile("lists");
    let names: Vec<_> = artifact.lowered.templates.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["nil", "fy", "rest", "map", "rest", "take", "double", "ones", "doubled", "main"]
    );
}
