use crate::context::{EvalContext, FixedClock, SeededRandom};
use crate::{
    classads_from_json, evaluate_in, external_refs, flatten, flatten_attr, from_json,
    internal_refs, parse_classad, parse_classads, parse_expr, parse_old_classad,
    parse_old_classads, quote, unquote, BinaryOp, ClassAd, ClassAdError, ClassAdReader,
    EvalOptions, Evaluator, Expr, MatchClassAd, OldClassAdReader, Scope, Value,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

// ── Shared fixture runners ──────────────────────────────────────────

/// Embed fixture files at compile time.
const EVAL_FIXTURES: &str = include_str!("../test-data/fixtures/eval.json");
const BUILTIN_FIXTURES: &str = include_str!("../test-data/fixtures/builtins.json");
const PARSE_ERROR_FIXTURES: &str = include_str!("../test-data/fixtures/parse-errors.json");
const ROUNDTRIP_FIXTURES: &str = include_str!("../test-data/fixtures/roundtrip.json");

/// An evaluator whose clock and random source are pinned.
fn pinned_evaluator() -> Evaluator {
    Evaluator::with_context(EvalContext::new(
        FixedClock::utc(1_700_000_000),
        SeededRandom::new(7),
    ))
}

fn ad(source: &str) -> ClassAd {
    parse_classad(source).unwrap()
}

fn expr(source: &str) -> Expr {
    parse_expr(source).unwrap()
}

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Run a fixture file of `{name, ad?, expr, expected}` entries, comparing
/// the rendered value.
fn run_eval_fixtures(source: &str) {
    let fixtures: Vec<serde_json::Value> = serde_json::from_str(source).unwrap();

    for fixture in &fixtures {
        let name = fixture["name"].as_str().unwrap();
        let scope = match fixture.get("ad").and_then(|v| v.as_str()) {
            Some(text) => parse_classad(text)
                .unwrap_or_else(|e| panic!("Fixture '{}': bad record: {}", name, e)),
            None => ClassAd::new(),
        };
        let text = fixture["expr"].as_str().unwrap();
        let parsed =
            parse_expr(text).unwrap_or_else(|e| panic!("Fixture '{}': bad expr: {}", name, e));
        let expected = fixture["expected"].as_str().unwrap();

        let value = pinned_evaluator().eval(&parsed, &scope);
        assert_eq!(
            value.to_string(),
            expected,
            "Fixture '{}': {} evaluated wrong",
            name,
            text
        );
    }
}

#[test]
fn test_fixture_eval() {
    run_eval_fixtures(EVAL_FIXTURES);
}

#[test]
fn test_fixture_builtins() {
    run_eval_fixtures(BUILTIN_FIXTURES);
}

#[test]
fn test_fixture_parse_errors() {
    let fixtures: Vec<serde_json::Value> = serde_json::from_str(PARSE_ERROR_FIXTURES).unwrap();

    for fixture in &fixtures {
        let name = fixture["name"].as_str().unwrap();
        let input = fixture["input"].as_str().unwrap();
        match parse_classad(input) {
            Ok(ad) => panic!("Fixture '{}': expected a parse error, got {}", name, ad),
            Err(err) => {
                assert!(
                    err.begin.offset <= err.end.offset,
                    "Fixture '{}': inverted span {:?}",
                    name,
                    err
                );
                assert!(
                    err.end.offset <= input.len(),
                    "Fixture '{}': span past the input {:?}",
                    name,
                    err
                );
            }
        }
    }
}

#[test]
fn test_fixture_roundtrip() {
    let fixtures: Vec<String> = serde_json::from_str(ROUNDTRIP_FIXTURES).unwrap();

    for source in &fixtures {
        let original = parse_classad(source)
            .unwrap_or_else(|e| panic!("Fixture '{}': bad record: {}", source, e));

        let new_format = parse_classad(&original.to_string()).unwrap();
        assert_eq!(new_format, original, "Fixture '{}': new format", source);

        let old_format = parse_old_classad(&original.to_old_format()).unwrap();
        assert_eq!(old_format, original, "Fixture '{}': old format", source);

        let json = from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(json, original, "Fixture '{}': JSON", source);

        let pretty = from_json(&original.to_json_pretty().unwrap()).unwrap();
        assert_eq!(pretty, original, "Fixture '{}': pretty JSON", source);
    }
}

// ── Evaluation ─────────────────────────────────────────────────────

#[test]
fn test_attribute_values() {
    let machine = ad(r#"[Cpus = 4; Memory = 8192; Arch = "X86_64"; Load = 0.25; Flags = {1, 2}]"#);
    assert_eq!(machine.evaluate_attr_int("cpus"), Some(4));
    assert_eq!(machine.evaluate_attr_real("Load"), Some(0.25));
    assert_eq!(machine.evaluate_attr_number("Memory"), Some(8192.0));
    assert_eq!(machine.evaluate_attr_string("ARCH"), Some("X86_64".to_string()));
    assert_eq!(machine.evaluate_attr_bool("Cpus"), None);
    assert_eq!(
        machine.evaluate_attr_list("Flags"),
        Some(vec![Value::Integer(1), Value::Integer(2)])
    );
    assert_eq!(machine.evaluate_attr("Missing"), Value::Undefined);
}

#[test]
fn test_evaluate_in() {
    let job = ad("[RequestCpus = 2]");
    assert_eq!(evaluate_in(&job, "RequestCpus * 3").unwrap(), Value::Integer(6));
    assert!(evaluate_in(&job, "RequestCpus *").is_err());
}

#[test]
fn test_insert_replaces_case_insensitively() {
    let record = ClassAd::new();
    record.insert_int("Memory", 1);
    record.insert_int("MEMORY", 2);
    assert_eq!(record.len(), 1);
    assert_eq!(record.evaluate_attr_int("memory"), Some(2));
    assert!(record.delete("memory"));
    assert!(record.is_empty());
}

#[test]
fn test_record_value_aliases_nested_record() {
    let outer = ad("[inner = [x = 1]]");
    let value = outer.evaluate_attr("inner");
    let nested = value.as_record().unwrap().clone();
    nested.insert_int("x", 5);

    let again = outer.evaluate_attr("inner");
    assert_eq!(again.as_record().unwrap().evaluate_attr_int("x"), Some(5));
}

#[test]
fn test_target_scope() {
    let job = ad("[Want = TARGET.Memory]");
    let machine = ad("[Memory = Base * 2; Base = 1024]");
    job.set_target(Some(&machine));
    assert_eq!(job.evaluate_attr("Want"), Value::Integer(2048));
    job.set_target(None);
    assert_eq!(job.evaluate_attr("Want"), Value::Undefined);
}

#[test]
fn test_bare_name_does_not_climb_to_parent() {
    let outer = ad("[x = 1; inner = [y = x]]");
    assert_eq!(evaluate_in(&outer, "inner.y").unwrap(), Value::Undefined);
}

#[test]
fn test_depth_limit_yields_error() {
    let record = ad("[a = b; b = a]");
    assert_eq!(record.evaluate_attr("a"), Value::Error);

    let chain = ad("[a = b; b = c; c = d; d = 1]");
    let mut shallow = Evaluator::new(EvalOptions { max_depth: 3 }, EvalContext::default());
    assert_eq!(shallow.eval(&expr("a"), &chain), Value::Error);
    assert_eq!(shallow.eval(&expr("b"), &chain), Value::Integer(1));
    assert_eq!(
        shallow.eval(&expr("1 + (2 + (3 + (4 + 5)))"), &ClassAd::new()),
        Value::Integer(15),
        "operators do not count toward the limit"
    );
    assert_eq!(chain.evaluate_attr("a"), Value::Integer(1));
}

#[test]
fn test_long_operator_chains_evaluate() {
    let sum = vec!["1"; 600].join(" + ");
    assert_eq!(
        evaluate_in(&ClassAd::new(), &sum).unwrap(),
        Value::Integer(600)
    );
    let conjunction = vec!["true"; 700].join(" && ");
    assert_eq!(
        evaluate_in(&ClassAd::new(), &conjunction).unwrap(),
        Value::Boolean(true)
    );
    let record = parse_classad(&format!("[total = {}; twice = total * 2]", sum)).unwrap();
    assert_eq!(record.evaluate_attr("twice"), Value::Integer(1200));
}

#[test]
fn test_random_uses_the_context() {
    let scope = ClassAd::new();
    let mut evaluator = pinned_evaluator();
    for _ in 0..20 {
        match evaluator.eval(&expr("random(10)"), &scope) {
            Value::Integer(i) => assert!((0..10).contains(&i)),
            other => panic!("random(10) gave {}", other),
        }
        match evaluator.eval(&expr("random()"), &scope) {
            Value::Real(r) => assert!((0.0..1.0).contains(&r)),
            other => panic!("random() gave {}", other),
        }
    }
    assert_eq!(evaluator.eval(&expr("random(0)"), &scope), Value::Error);

    let first = pinned_evaluator().eval(&expr("random(1000000)"), &scope);
    let second = pinned_evaluator().eval(&expr("random(1000000)"), &scope);
    assert_eq!(first, second);
}

#[test]
fn test_builtin_table_direct_calls() {
    use crate::builtins::call;
    assert_eq!(
        call("strcat", &[Value::string("a"), Value::Integer(1)]),
        Value::string("a1")
    );
    assert_eq!(call("size", &[Value::Error]), Value::Error);
    assert_eq!(call("isError", &[Value::Error]), Value::Boolean(true));
    assert_eq!(
        call("sum", &[Value::list(vec![Value::Integer(2), Value::Real(0.5)])]),
        Value::Real(2.5)
    );
    assert_eq!(call("time", &[]), Value::Integer(1_700_000_000));
    assert_eq!(call("noSuchBuiltin", &[]), Value::Error);
    assert!(crate::builtins::lookup("STRINGLISTMEMBER").is_some());
}

#[test]
fn test_nan_ordering_is_error() {
    let scope = ClassAd::new();
    scope.insert_real("n", f64::NAN);
    assert_eq!(evaluate_in(&scope, "n < 1").unwrap(), Value::Error);
    assert_eq!(evaluate_in(&scope, "n == n").unwrap(), Value::Boolean(false));
    assert_eq!(evaluate_in(&scope, "n is n").unwrap(), Value::Boolean(true));
}

// ── Flatten ─────────────────────────────────────────────────────────

#[test]
fn test_flatten_partial_evaluation() {
    let machine = ad("[Cpus = 4; Memory = 8192]");
    let cases = [
        ("Cpus * 1000 + Memory / 1024 + Unknown", "(4008 + Unknown)"),
        ("false && (1/0)", "false"),
        ("true && (Unknown > 0)", "(Unknown > 0)"),
        ("false && (Unknown > 0)", "false"),
        ("Unknown || true", "true"),
        ("Unknown && true", "Unknown"),
        ("Cpus > 2 ? Unknown : 1/0", "Unknown"),
        ("ifThenElse(Cpus < 2, 1/0, Unknown + Cpus)", "(Unknown + 4)"),
        ("undefined ?: Cpus", "4"),
        ("Unknown ?: Cpus", "(Unknown ?: 4)"),
        ("{Cpus, Unknown}", "{4, Unknown}"),
        ("Cpus * 2", "8"),
        ("strcat(\"x\", Cpus)", "\"x4\""),
    ];
    for (source, expected) in cases {
        assert_eq!(
            flatten(&machine, &expr(source)).to_string(),
            expected,
            "flatten {}",
            source
        );
    }
}

#[test]
fn test_flatten_differs_from_strict_evaluation() {
    let scope = ClassAd::new();
    let short_circuit = expr("false && (1/0)");
    assert_eq!(evaluate_in(&scope, "false && (1/0)").unwrap(), Value::Error);
    assert_eq!(flatten(&scope, &short_circuit), Expr::Boolean(false));
}

#[test]
fn test_flatten_keeps_impure_calls() {
    let record = ad("[Now = time(); Later = Now + 60]");
    assert_eq!(flatten(&record, &expr("random() + 0")).to_string(), "(random() + 0)");
    assert_eq!(flatten(&record, &expr("Now + 1")).to_string(), "(Now + 1)");
    assert_eq!(flatten_attr(&record, "Later").unwrap().to_string(), "(Now + 60)");
    assert_eq!(flatten_attr(&record, "Missing"), None);
}

#[test]
fn test_flatten_is_idempotent() {
    let machine = ad("[Cpus = 4; Memory = 8192; Name = \"slot1\"]");
    for source in [
        "Cpus * 1000 + Memory / 1024 + Unknown",
        "Unknown ?: Cpus > 2 && Other",
        "Name == TARGET.Name || Cpus < Limit",
        "x ? Cpus : {Memory, y}",
        "member(Cpus, Allowed) && random() > 0.5",
    ] {
        let once = flatten(&machine, &expr(source));
        let twice = flatten(&machine, &once);
        assert_eq!(twice, once, "flatten twice {}", source);
    }
}

// ── References ─────────────────────────────────────────────────────

#[test]
fn test_refs_follow_definitions() {
    let record = ad("[A = B + 1; B = TARGET.C; D = 4]");
    let e = expr("A + E + MY.D + PARENT.F");
    assert_eq!(external_refs(&record, &e), names(&["C", "E", "F"]));
    assert_eq!(internal_refs(&record, &e), names(&["A", "B", "D"]));
}

#[test]
fn test_refs_use_record_spelling() {
    let record = ad("[Memory = 1]");
    let e = expr("memory + MEMORY + other + OTHER");
    assert_eq!(internal_refs(&record, &e), names(&["Memory"]));
    assert_eq!(external_refs(&record, &e).len(), 1);
}

#[test]
fn test_refs_report_names_local_to_nested_records_as_external() {
    let e = expr("[x = 1; y = x + z].y");
    let scope = ClassAd::new();
    assert_eq!(external_refs(&scope, &e), names(&["x", "z"]));
    assert_eq!(internal_refs(&scope, &e), names(&[]));

    let e = expr("[a = 1; b = a].b");
    assert_eq!(external_refs(&scope, &e), names(&["a"]));
    assert!(internal_refs(&scope, &e).is_empty());
}

#[test]
fn test_refs_terminate_on_cycles() {
    let record = ad("[a = b; b = a + c]");
    let e = expr("a");
    assert_eq!(internal_refs(&record, &e), names(&["a", "b"]));
    assert_eq!(external_refs(&record, &e), names(&["c"]));
}

#[test]
fn test_refs_partition_dependencies() {
    let record = ad("[Cpus = 4; Memory = Cpus * 1024; Arch = \"x86\"]");
    let e = expr("Memory > TARGET.Need && Arch == Wanted && size(Cpus) > 0");
    let external = external_refs(&record, &e);
    let internal = internal_refs(&record, &e);
    assert!(external.is_disjoint(&internal));
    let all: BTreeSet<String> = external.union(&internal).cloned().collect();
    assert_eq!(all, names(&["Arch", "Cpus", "Memory", "Need", "Wanted"]));
    for name in &internal {
        assert!(record.contains(name), "{} is defined", name);
    }

    let outer = ad("[x = 1; inner = [y = PARENT.x + z; w = 2; v = w]]");
    let inner = outer.evaluate_attr("inner").as_record().unwrap().clone();
    let e = expr("PARENT.x + v + y");
    let external = external_refs(&inner, &e);
    let internal = internal_refs(&inner, &e);
    assert!(external.is_disjoint(&internal));
    assert_eq!(external, names(&["x", "z"]));
    assert_eq!(internal, names(&["v", "w", "y"]));
}

// ── Equality ──────────────────────────────────────────────────────

#[test]
fn test_expr_equality() {
    assert_eq!(expr("a + 1"), expr("A+1"));
    assert_eq!(expr("strcat(x)"), expr("STRCAT(X)"));
    assert_eq!(Expr::Real(1.0), Expr::Real(1.0 + 1e-12));
    assert_eq!(Expr::Real(f64::NAN), Expr::Real(f64::NAN));
    assert_ne!(Expr::Real(f64::INFINITY), Expr::Real(f64::NEG_INFINITY));
    assert_ne!(Expr::Integer(1), Expr::Real(1.0));
    assert_ne!(expr("{1, 2}"), expr("{2, 1}"));
    assert_ne!(expr("\"a\""), expr("\"A\""));
    assert_ne!(expr("a - b"), expr("b - a"));
    assert!(crate::exprs_equal(None, None));
    assert!(!crate::exprs_equal(Some(&Expr::Undefined), None));
}

#[test]
fn test_classad_equality_ignores_order() {
    assert_eq!(ad("[a = 1; b = 2]"), ad("[B = 2; a = 1]"));
    assert_ne!(ad("[a = 1; b = 2]"), ad("[a = 1]"));
    assert_ne!(ad("[a = 1]"), ad("[a = 2]"));
    assert_eq!(ad("[n = [x = 1; y = 2]]"), ad("[n = [y = 2; x = 1]]"));
}

// ── Matchmaking ──────────────────────────────────────────────────────

fn job_and_machine() -> (ClassAd, ClassAd) {
    let job = ad(
        "[RequestCpus = 2; RequestMemory = 2048; \
          Requirements = TARGET.Cpus >= RequestCpus && TARGET.Memory >= RequestMemory; \
          Rank = TARGET.Memory]",
    );
    let machine = ad(
        "[Cpus = 4; Memory = 8192; \
          Requirements = TARGET.RequestCpus <= Cpus; Rank = 1]",
    );
    (job, machine)
}

#[test]
fn test_match_pair() {
    let (job, machine) = job_and_machine();
    let pair = MatchClassAd::pair(&job, &machine);
    assert!(pair.matches());
    assert_eq!(pair.evaluate_rank_left(), Some(8192.0));
    assert_eq!(pair.evaluate_rank_right(), Some(1.0));
    assert!(job.target().unwrap().ptr_eq(&machine));
    assert!(machine.target().unwrap().ptr_eq(&job));
}

#[test]
fn test_match_flips_when_machine_is_replaced() {
    let (job, machine) = job_and_machine();
    let mut pair = MatchClassAd::pair(&job, &machine);
    assert!(pair.matches());

    let small = ad("[Cpus = 1; Memory = 8192; Requirements = true]");
    let old = pair.replace_right(Some(small.clone())).unwrap();
    assert!(old.ptr_eq(&machine));
    assert!(machine.target().is_none());
    assert!(!pair.matches());
    assert_eq!(job.to_string(), job_and_machine().0.to_string());

    pair.replace_right(Some(machine.clone()));
    assert!(pair.matches());

    pair.replace_right(None);
    assert!(!pair.matches());
    assert!(job.target().is_none());
    assert_eq!(pair.evaluate_right("Requirements"), Value::Undefined);
    assert_eq!(job.evaluate_attr("Requirements"), Value::Undefined);
}

#[test]
fn test_match_needs_both_sides_true() {
    let job = ad("[Requirements = TARGET.Missing > 1]");
    let machine = ad("[Requirements = true; Rank = \"high\"]");
    let pair = MatchClassAd::pair(&job, &machine);
    assert!(!pair.matches());
    assert_eq!(pair.evaluate_left("Requirements"), Value::Undefined);
    assert_eq!(pair.evaluate_rank_right(), None);
    assert!(!pair.symmetry("Rank", "Requirements"));

    let custom = MatchClassAd::pair(&ad("[Ok = true]"), &ad("[Fine = 1 < 2]"));
    assert!(custom.symmetry("Ok", "Fine"));
    assert!(!MatchClassAd::default().matches());
}

// ── Parser ──────────────────────────────────────────────────────────

#[test]
fn test_parse_precedence_rendering() {
    let cases = [
        ("1 + 2 * 3", "(1 + (2 * 3))"),
        ("a || b && c", "(a || (b && c))"),
        ("a ?: b ?: c", "(a ?: (b ?: c))"),
        ("a ? b : c ? d : e", "(a ? b : (c ? d : e))"),
        ("1 - 2 - 3", "((1 - 2) - 3)"),
        ("a == b < c", "(a == (b < c))"),
        ("-5", "-5"),
        ("- 2.5", "-2.5"),
        ("-x", "(-x)"),
        ("!a && b", "((!a) && b)"),
        ("a =?= b", "(a is b)"),
        ("a =!= b", "(a isnt b)"),
        ("a isnt b", "(a isnt b)"),
        ("x.y[2].z", "x.y[2].z"),
        ("TARGET.Memory", "TARGET.Memory"),
        ("0x1F", "31"),
        ("1e3", "1000.0"),
        ("'odd name' + 1", "('odd name' + 1)"),
        ("[a = 1; b = {}]", "[a = 1; b = {}]"),
    ];
    for (source, expected) in cases {
        assert_eq!(expr(source).to_string(), expected, "render {}", source);
    }
}

#[test]
fn test_parse_scoped_attribute() {
    assert_eq!(
        expr("target.Memory"),
        Expr::scoped_attr(Scope::Target, "Memory")
    );
    assert_eq!(expr("MY.x"), Expr::scoped_attr(Scope::My, "x"));
    assert_eq!(
        expr("a + b"),
        Expr::binary(BinaryOp::Add, Expr::attr("a"), Expr::attr("b"))
    );
    assert_eq!(expr("TRUE"), Expr::Boolean(true));
    assert_eq!(expr("Undefined"), Expr::Undefined);
}

#[test]
fn test_parse_comments_and_sequences() {
    let record = ad("[ // leading\n a = 1; /* inline */ b = 2; ]");
    assert_eq!(record.len(), 2);

    let ads = parse_classads("[a = 1][b = 2]\n// between\n[c = 3]").unwrap();
    assert_eq!(ads.len(), 3);
    assert_eq!(ads[2].evaluate_attr_int("c"), Some(3));
    assert_eq!(parse_classads("  ").unwrap().len(), 0);
}

#[test]
fn test_parse_nested_record_has_parent() {
    let outer = ad("[inner = [x = 1]]");
    let inner = outer.evaluate_attr("inner");
    let parent = inner.as_record().unwrap().parent().unwrap();
    assert!(parent.ptr_eq(&outer));
}

#[test]
fn test_parse_old_format() {
    let record = parse_old_classad("# comment\nA = 1\n// other\n\nB = \"x\"\r\n").unwrap();
    assert_eq!(record.len(), 2);
    assert_eq!(record.evaluate_attr_string("b"), Some("x".to_string()));

    let ads = parse_old_classads("A = 1\nB = 2\n\n\nC = 3\n").unwrap();
    assert_eq!(ads.len(), 2);
    assert_eq!(ads[0].len(), 2);
    assert_eq!(ads[1].evaluate_attr_int("C"), Some(3));
}

#[test]
fn test_quote_and_unquote() {
    let text = "a\"b\\c\nd\te\u{1}";
    let quoted = quote(text);
    assert_eq!(quoted, "\"a\\\"b\\\\c\\nd\\te\\001\"");
    assert_eq!(unquote(&quoted).unwrap(), text);
    assert_eq!(unquote("\"\\101\\u0042\\/\"").unwrap(), "AB/");
    assert!(unquote("\"open").is_err());
    assert!(unquote("\"a\" extra").is_err());
}

#[test]
fn test_nesting_limit() {
    let deep = format!("{}1{}", "(".repeat(5000), ")".repeat(5000));
    let err = parse_expr(&deep).unwrap_err();
    assert_eq!(err.message, "Expression nested too deeply");

    let shallow = format!("{}1{}", "(".repeat(500), ")".repeat(500));
    assert_eq!(parse_expr(&shallow).unwrap(), Expr::Integer(1));
}

#[test]
fn test_operator_chain_limit() {
    let huge = vec!["1"; 200_000].join(" + ");
    let err = parse_expr(&huge).unwrap_err();
    assert_eq!(err.message, "Expression nested too deeply");

    let selects = format!("a{}", ".b".repeat(5000));
    let err = parse_expr(&selects).unwrap_err();
    assert_eq!(err.message, "Expression nested too deeply");

    let err = parse_classad(&format!("[a = {}]", huge)).unwrap_err();
    assert_eq!(err.message, "Expression nested too deeply");
}

#[test]
fn test_deep_chains_render_and_compare() {
    let source = vec!["x"; 900].join(" - ");
    let parsed = expr(&source);
    let rendered = parsed.to_string();
    assert_eq!(expr(&rendered), parsed);
    let record = ad("[x = 2]");
    assert_eq!(
        flatten(&record, &parsed),
        Expr::Integer(2 - 2 * 899)
    );
    drop(parsed);
}

// ── Error positions ─────────────────────────────────────────────────

#[test]
fn test_error_unclosed_bracket() {
    let err = parse_classad("[a = 1").unwrap_err();
    assert_eq!(err.begin.line, 0);
    assert!(err.begin.offset <= err.end.offset);
}

#[test]
fn test_error_span_unclosed_string() {
    let err = parse_classad("[a = \"open]").unwrap_err();
    assert_eq!(err.message, "Unterminated string");
    assert_eq!(err.begin.line, 0);
    assert_eq!(err.end.line, 0);
    assert!(err.begin.offset < err.end.offset);
}

#[test]
fn test_error_on_second_line() {
    let err = parse_classad("[a = 1;\n b = ]").unwrap_err();
    assert_eq!(err.begin.line, 1);
    assert!(err.begin.column > 0);
}

#[test]
fn test_error_on_old_format_line() {
    let err = parse_old_classad("A = 1\nB = (").unwrap_err();
    assert_eq!(err.begin.line, 1);
    assert!(err.begin.offset >= "A = 1\n".len());

    let err = parse_old_classads("A = 1\n\nB 2\n").unwrap_err();
    assert_eq!(err.begin.line, 2);
}

#[test]
fn test_error_trailing_input() {
    let err = parse_expr("1 + 2 )").unwrap_err();
    assert_eq!(err.message, "Unexpected trailing ')'");
    assert_eq!(err.begin.column, 6);
}

// ── Streaming readers ──────────────────────────────────────────────

#[test]
fn test_reader_yields_records() {
    let input = "[a = 1]\n// comment\n[b = \"]\"; c = 'x]'] \n\n[d = [e = 1]]\n";
    let ads: Vec<ClassAd> = ClassAdReader::new(input.as_bytes())
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(ads.len(), 3);
    assert_eq!(ads[1].evaluate_attr_string("b"), Some("]".to_string()));
    assert_eq!(ads[2].len(), 1);
}

#[test]
fn test_reader_stops_after_error() {
    let input = "[a = 1]\n[b = ]\n[c = 3]\n";
    let mut reader = ClassAdReader::new(input.as_bytes());
    assert!(reader.next().unwrap().is_ok());
    match reader.next().unwrap() {
        Err(ClassAdError::Parse(err)) => assert_eq!(err.begin.line, 1),
        other => panic!("expected a parse error, got {:?}", other),
    }
    assert!(reader.next().is_none());
}

#[test]
fn test_reader_truncated_record() {
    let mut reader = ClassAdReader::new("[a = 1".as_bytes());
    assert!(matches!(reader.next(), Some(Err(ClassAdError::Parse(_)))));
    assert!(reader.next().is_none());
}

#[test]
fn test_old_reader() {
    let input = "A = 1\n\n# comment only\n\nB = 2\nC = 3\n";
    let ads: Vec<ClassAd> = OldClassAdReader::new(input.as_bytes())
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(ads.len(), 2);
    assert_eq!(ads[1].len(), 2);

    let mut reader = OldClassAdReader::new("A = 1\nB = \n".as_bytes());
    match reader.next().unwrap() {
        Err(ClassAdError::Parse(err)) => assert_eq!(err.begin.line, 1),
        other => panic!("expected a parse error, got {:?}", other),
    }
    assert!(reader.next().is_none());
}

// ── JSON ─────────────────────────────────────────────────────────────

#[test]
fn test_json_literals() {
    let record = ad(
        "[a = 1; b = \"x\"; c = undefined; d = x + 1; e = {1, 2}; f = [g = true]; h = 2.5; i = error]",
    );
    let json: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
    assert_eq!(json["a"], 1);
    assert_eq!(json["b"], "x");
    assert!(json["c"].is_null());
    assert_eq!(json["d"], "/Expr((x + 1))/");
    assert_eq!(json["e"], serde_json::json!([1, 2]));
    assert_eq!(json["f"]["g"], true);
    assert_eq!(json["h"], 2.5);
    assert_eq!(json["i"], "/Expr(error)/");
}

#[test]
fn test_json_keeps_attribute_order() {
    let record = ad("[z = 1; a = 2; m = 3]");
    assert_eq!(record.to_json().unwrap(), r#"{"z":1,"a":2,"m":3}"#);
    assert!(record.to_json_pretty().unwrap().contains("\n  \"a\": 2"));
}

#[test]
fn test_json_decodes_expressions() {
    let record = from_json(r#"{"d": "\/Expr(x + 1)\/", "r": 1.0, "n": null}"#).unwrap();
    assert_eq!(*record.lookup("d").unwrap(), expr("x + 1"));
    assert_eq!(*record.lookup("r").unwrap(), Expr::Real(1.0));
    assert_eq!(*record.lookup("n").unwrap(), Expr::Undefined);
}

#[test]
fn test_json_non_finite_reals() {
    let record = ClassAd::new();
    record.insert_real("n", f64::NAN);
    record.insert_real("i", f64::INFINITY);
    let back = from_json(&record.to_json().unwrap()).unwrap();
    assert!(matches!(back.evaluate_attr("n"), Value::Real(r) if r.is_nan()));
    assert_eq!(back.evaluate_attr("i"), Value::Real(f64::INFINITY));
}

#[test]
fn test_json_errors() {
    assert!(matches!(from_json("[1]"), Err(ClassAdError::Shape(_))));
    assert!(matches!(from_json("{"), Err(ClassAdError::Json(_))));
    assert!(matches!(
        from_json(r#"{"a": "/Expr(1 +)/"}"#),
        Err(ClassAdError::Parse(_))
    ));
}

#[test]
fn test_json_arrays_and_serde() {
    let ads = classads_from_json(r#"[{"a": 1}, {"b": [true, "x"]}]"#).unwrap();
    assert_eq!(ads.len(), 2);
    assert_eq!(classads_from_json(r#"{"a": 1}"#).unwrap().len(), 1);

    let record: ClassAd = serde_json::from_str(r#"{"Cpus": 4}"#).unwrap();
    assert_eq!(record.evaluate_attr_int("cpus"), Some(4));
    assert_eq!(serde_json::to_value(&record).unwrap(), serde_json::json!({"Cpus": 4}));

    let text = crate::classads_to_json(&ads, crate::JsonStyle::Compact).unwrap();
    assert_eq!(text, r#"[{"a":1},{"b":[true,"x"]}]"#);
}
