//! Compile → match → edit pipeline integration tests.
//!
//! End-to-end scenarios across the full stack: the tokenizer, parser,
//! validator, match engine, scanner, and edit driver working together.

#[cfg(test)]
mod pipeline_tests {
    use serde_json::json;
    use tendril::{
        compile, edit_all, find, match_solutions, matches, replace_all, value_from_json,
        EditPlan, Program, Solution, Value,
    };

    fn program(source: &str) -> Program {
        compile(source).expect("compile failed")
    }

    fn v(json: serde_json::Value) -> Value {
        value_from_json(json)
    }

    fn all(source: &str, input: &Value) -> Vec<Solution> {
        match_solutions(&program(source), input).collect()
    }

    // =========================================================================
    // Seed scenarios
    // =========================================================================

    #[test]
    fn test_sequence_unification() {
        let sols = all("[$x $x]", &v(json!([1, 1])));
        assert_eq!(sols.len(), 1);
        assert_eq!(sols[0].get("x"), Some(&v(json!(1))));

        assert!(all("[$x $x]", &v(json!([1, 2]))).is_empty());
    }

    #[test]
    fn test_residual_binding() {
        let input = v(json!({"a": 1, "b": 2, "c": 3}));
        let sols = all("{a:1, (% as %rest)}", &input);
        assert_eq!(sols.len(), 1);
        assert_eq!(sols[0].get("rest"), Some(&v(json!({"b": 2, "c": 3}))));
        // The input is untouched by matching.
        assert_eq!(input, v(json!({"a": 1, "b": 2, "c": 3})));
    }

    #[test]
    fn test_each_with_prioritized_flows() {
        let input = v(json!({"a": 1, "b": 1, "c": 2}));
        let sols = all("{each $k: (1 -> %ones else 2 -> %twos)}", &input);
        assert_eq!(sols.len(), 1);
        assert_eq!(sols[0].get("ones"), Some(&v(json!({"a": 1, "b": 1}))));
        assert_eq!(sols[0].get("twos"), Some(&v(json!({"c": 2}))));
    }

    #[test]
    fn test_greedy_flow_no_ghost_entries() {
        let input = v(json!([1, 1, 1, 2]));
        let sols = all("[(1 as $x)* (1 -> @last) 2]", &input);
        assert_eq!(sols.len(), 1);
        assert_eq!(sols[0].get("x"), Some(&v(json!(1))));
        assert_eq!(sols[0].get("last"), Some(&v(json!([1]))));
    }

    #[test]
    fn test_captured_key_must_match_pattern() {
        // $x is captured as "xyz" by the first assertion; the second
        // requires $x to also match /abc/, which it does not.
        let input = v(json!({"a": "xyz", "xyz": "found"}));
        assert!(all("{a:$x, $x=(/abc/):$y}", &input).is_empty());
    }

    #[test]
    fn test_deep_path_find_and_edit() {
        let prog = program("{..password: $p}");
        let input = v(json!({
            "top": "t",
            "user": {"password": "p", "profile": {"password": "d"}}
        }));

        // Every admissible depth at every scan position that can reach
        // a password: two from the root, two from .user, one from
        // .user.profile.
        let located: Vec<_> = find(&prog, &input).collect();
        assert_eq!(located.len(), 5);

        let edited = edit_all(&prog, &input, |_solution| {
            let mut plan = EditPlan::new();
            plan.insert("p".to_string(), v(json!("X")));
            plan
        })
        .expect("edit failed");

        assert_eq!(
            edited,
            v(json!({
                "top": "t",
                "user": {"password": "X", "profile": {"password": "X"}}
            }))
        );
        // The original tree is unchanged.
        assert_eq!(
            input,
            v(json!({
                "top": "t",
                "user": {"password": "p", "profile": {"password": "d"}}
            }))
        );
    }

    // =========================================================================
    // General properties
    // =========================================================================

    #[test]
    fn test_determinism() {
        let prog = program("{$k: _number}");
        let input = v(json!({"a": 1, "b": 2, "c": 3}));
        let first_run: Vec<_> = match_solutions(&prog, &input).collect();
        let second_run: Vec<_> = match_solutions(&prog, &input).collect();
        assert_eq!(first_run, second_run);
    }

    #[test]
    fn test_edit_purity() {
        let prog = program("{a: $x}");
        let input = v(json!({"a": 1, "b": 2}));

        let before: Vec<_> = match_solutions(&prog, &input).collect();
        let edited = replace_all(&prog, &input, |_| v(json!("replaced"))).expect("edit");
        let after: Vec<_> = match_solutions(&prog, &input).collect();

        assert_eq!(before, after, "editing must not disturb the original");
        assert_eq!(edited, v(json!("replaced")), "whole-match replacement at the root");
    }

    #[test]
    fn test_alternation_vs_else() {
        let input = v(json!(1));
        // (A|B) emits A-solutions then B-solutions.
        assert_eq!(all("(_number | 1)", &input).len(), 2);
        // (A else B) emits only A-solutions when A has any.
        assert_eq!(all("(_number else 1)", &input).len(), 1);
        // ...and B-solutions otherwise.
        let sols = all("($x=(_string) else $x=(_number))", &input);
        assert_eq!(sols.len(), 1);
        assert_eq!(sols[0].get("x"), Some(&v(json!(1))));
    }

    #[test]
    fn test_lookahead_zero_width() {
        // A positive lookahead consumes nothing and leaks bindings.
        let sols = all("[(? $x=(_number)) 1 2]", &v(json!([1, 2])));
        assert_eq!(sols.len(), 1);
        assert_eq!(sols[0].get("x"), Some(&v(json!(1))));

        // A negative lookahead leaks neither position nor bindings.
        let sols = all("[(! $y=(9)) 1 2]", &v(json!([1, 2])));
        assert_eq!(sols.len(), 1);
        assert!(sols[0].get("y").is_none());
    }

    #[test]
    fn test_scanner_completeness() {
        let prog = program("{a: $x}");
        let input = v(json!({"a": 1, "b": {"a": 2}}));
        let located: Vec<_> = find(&prog, &input).collect();
        assert_eq!(located.len(), 2);
        assert_eq!(located[0].path, vec![]);
        assert_eq!(located[0].solution.get("x"), Some(&v(json!(1))));
        assert_eq!(located[1].solution.get("x"), Some(&v(json!(2))));
    }

    #[test]
    fn test_matches_and_first() {
        let prog = program("{a: _number}");
        assert!(matches(&prog, &v(json!({"a": 1}))));
        assert!(!matches(&prog, &v(json!({"a": "x"}))));

        let found = tendril::first(&prog, &v(json!({"outer": {"a": 7}})));
        let located = found.expect("expected a match");
        assert_eq!(located.path, vec![tendril::PathStep::Key("outer".to_string())]);
    }

    // =========================================================================
    // Editing
    // =========================================================================

    #[test]
    fn test_slice_splice() {
        let prog = program("[1 (2* as @mid) 3]");
        let input = v(json!([1, 2, 2, 3]));
        let edited = edit_all(&prog, &input, |_| {
            let mut plan = EditPlan::new();
            plan.insert("mid".to_string(), v(json!([9, 9, 9])));
            plan
        })
        .expect("edit");
        assert_eq!(edited, v(json!([1, 9, 9, 9, 3])));
    }

    #[test]
    fn test_simultaneous_splices_use_original_offsets() {
        // Two slices in one array: a grows, b shrinks. Later splices
        // must not be shifted by earlier ones.
        let prog = program("[(1* as @a) 5 (2* as @b)]");
        let input = v(json!([1, 5, 2]));
        let edited = edit_all(&prog, &input, |_| {
            let mut plan = EditPlan::new();
            plan.insert("a".to_string(), v(json!([9, 9, 9])));
            plan.insert("b".to_string(), v(json!([])));
            plan
        })
        .expect("edit");
        assert_eq!(edited, v(json!([9, 9, 9, 5])));
    }

    #[test]
    fn test_residual_keys_splice() {
        let prog = program("{a: 1, (% as %rest)}");
        let input = v(json!({"a": 1, "b": 2, "c": 3}));
        let edited = edit_all(&prog, &input, |_| {
            let mut plan = EditPlan::new();
            plan.insert("rest".to_string(), v(json!({"z": 9})));
            plan
        })
        .expect("edit");
        assert_eq!(edited, v(json!({"a": 1, "z": 9})));
    }

    #[test]
    fn test_marker_mode_replaces_only_marked_subject() {
        let prog = program("{a: >>$x<<, b: $y}");
        let input = v(json!({"a": 1, "b": 2}));
        let edited = replace_all(&prog, &input, |_| v(json!(42))).expect("edit");
        assert_eq!(edited, v(json!({"a": 42, "b": 2})));
    }

    #[test]
    fn test_key_marker_renames() {
        let prog = program("{>>a<<: 1}");
        let input = v(json!({"a": 1, "b": 2}));
        let edited = replace_all(&prog, &input, |_| v(json!("renamed"))).expect("edit");
        assert_eq!(edited, v(json!({"renamed": 1, "b": 2})));
    }

    #[test]
    fn test_scalar_substitution_at_every_occurrence() {
        let prog = program("[$x $x]");
        let input = v(json!([5, 5]));
        let edited = edit_all(&prog, &input, |_| {
            let mut plan = EditPlan::new();
            plan.insert("x".to_string(), v(json!(0)));
            plan
        })
        .expect("edit");
        assert_eq!(edited, v(json!([0, 0])));
    }
}
