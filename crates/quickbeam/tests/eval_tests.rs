//! Expression and statement evaluation through the public API

use pretty_assertions::assert_eq;
use quickbeam::*;

fn run(src: &str) -> Interpreter {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    interp.evaluate(src).expect("script failed");
    interp
}

fn var(interp: &Interpreter, name: &str) -> Value {
    interp.resolve_variable(name).expect("unbound").get()
}

fn expr(src: &str) -> Value {
    Interpreter::new(Privilege::UNRESTRICTED)
        .eval_expression(src)
        .expect("expression failed")
}

// ═══════════════════════════════════════════════════════════════════════
// Arithmetic
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_precedence() {
    assert_eq!(expr("1 + 2 * 3"), Value::Int(7));
    assert_eq!(expr("(1 + 2) * 3"), Value::Int(9));
    assert_eq!(expr("10 - 4 - 3"), Value::Int(3));
    assert_eq!(expr("7 % 4 + 1"), Value::Int(4));
}

#[test]
fn test_numeric_promotion() {
    assert_eq!(expr("1 + 0.5"), Value::Float(1.5));
    assert_eq!(expr("0.5 * 4"), Value::Float(2.0));
    assert_eq!(expr("7 / 2"), Value::Int(3));
    assert_eq!(expr("7.0 / 2"), Value::Float(3.5));
}

#[test]
fn test_addition_commutes() {
    for (a, b) in [("2", "3.5"), ("-4", "9"), ("1.25", "0.75")] {
        assert_eq!(
            expr(&format!("{a} + {b}")),
            expr(&format!("{b} + {a}"))
        );
        assert_eq!(
            expr(&format!("{a} * {b}")),
            expr(&format!("{b} * {a}"))
        );
    }
}

#[test]
fn test_unary_minus() {
    assert_eq!(expr("-3 + 1"), Value::Int(-2));
    let interp = run("var x = 4;\nvar y = -x;");
    assert_eq!(var(&interp, "y"), Value::Int(-4));
}

#[test]
fn test_string_concatenation_promotes() {
    assert_eq!(expr(r#""a" + "b""#), Value::from("ab"));
    assert_eq!(expr(r#""n=" + 5"#), Value::from("n=5"));
}

#[test]
fn test_division_by_zero() {
    let err = Interpreter::new(Privilege::UNRESTRICTED)
        .eval_expression("1 / 0")
        .unwrap_err();
    assert!(matches!(
        err,
        ScriptError::Eval {
            source: EvalError::Value(ValueError::DivisionByZero),
            ..
        }
    ));
}

#[test]
fn test_comparisons_and_logic() {
    assert_eq!(expr("1 < 2"), Value::Int(1));
    assert_eq!(expr("2 <= 1"), Value::Int(0));
    assert_eq!(expr("1 == 1.0"), Value::Int(0));
    assert_eq!(expr(r#""1" == 1"#), Value::Int(0));
    assert_eq!(expr("1 && 0"), Value::Int(0));
    assert_eq!(expr("0 || 3"), Value::Int(1));
    assert_eq!(expr("!0"), Value::Int(1));
    assert_eq!(expr("true && !false"), Value::Int(1));
}

#[test]
fn test_equality_is_kind_sensitive() {
    let pairs = [
        "1, \"1\"",
        "null, 0",
        "1, 1.0",
        "1, vec3(1, 1, 1)",
        "list(1), array(1)",
        "\"\", null",
        "0.0, vec3(0, 0, 0)",
    ];
    for pair in pairs {
        let (lhs, rhs) = pair.split_once(", ").unwrap();
        assert_eq!(expr(&format!("{lhs} == {rhs}")), Value::Int(0), "{pair}");
        assert_eq!(expr(&format!("{lhs} != {rhs}")), Value::Int(1), "{pair}");
        assert_eq!(expr(&format!("{rhs} == {lhs}")), Value::Int(0), "{pair}");
    }

    // A homogeneous literal is a typed array, the same kind `array` builds.
    assert_eq!(expr("[1] == array(1)"), Value::Int(1));
    assert_eq!(expr("[1] != array(1)"), Value::Int(0));
    assert_eq!(expr("null == null"), Value::Int(1));
    assert_eq!(expr("1.0 == 1.0"), Value::Int(1));
}

// ═══════════════════════════════════════════════════════════════════════
// Variables and assignment
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_var_without_initializer_is_null() {
    let interp = run("var x;");
    assert!(var(&interp, "x").is_null());
}

#[test]
fn test_assignment_writes_through() {
    let interp = run("var x = 1;\nx = x + 10;");
    assert_eq!(var(&interp, "x"), Value::Int(11));
}

#[test]
fn test_assignment_copies_value() {
    let interp = run("var a = [1, \"x\"];\nvar b = 0;\nb = a;\nb += 3;");
    assert_eq!(var(&interp, "a").len(), Some(2));
    assert_eq!(var(&interp, "b").len(), Some(3));
}

#[test]
fn test_compound_assignment() {
    let interp = run(
        "var a = 10;\na += 5;\na -= 3;\na *= 2;\na /= 4;\nvar s = \"ab\";\ns += 1;",
    );
    assert_eq!(var(&interp, "a"), Value::Int(6));
    assert_eq!(var(&interp, "s"), Value::from("ab1"));
}

#[test]
fn test_increment_forms() {
    let interp = run("var i = 5;\nvar post = i++;\nvar pre = ++i;\n--i;");
    assert_eq!(var(&interp, "post"), Value::Int(5));
    assert_eq!(var(&interp, "pre"), Value::Int(7));
    assert_eq!(var(&interp, "i"), Value::Int(6));
}

#[test]
fn test_unknown_identifier_reports_line() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    let err = interp.evaluate("var a = 1;\n\nvar b = c + 1;").unwrap_err();
    assert_eq!(err.line(), Some(3));
    assert!(matches!(
        err,
        ScriptError::Eval {
            source: EvalError::UnknownIdentifier { .. },
            ..
        }
    ));
    assert_eq!(err.to_string(), "Error at line 3: unknown identifier `c`");
}

// ═══════════════════════════════════════════════════════════════════════
// Collections
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_list_literal_kinds() {
    assert_eq!(expr("[1, 2, 3]").type_of(), Type::Array);
    assert_eq!(expr("[1, \"two\"]").type_of(), Type::List);
}

#[test]
fn test_list_index_assignment() {
    let interp = run("var l = [1, \"two\", 3.0];\nl[0] = 10;");
    assert_eq!(
        var(&interp, "l"),
        Value::from(vec![Value::Int(10), Value::from("two"), Value::Float(3.0)])
    );
}

#[test]
fn test_array_index_yields_copy() {
    let interp = run("var a = [1, 2];\na[0] = 9;\nvar first = a[0];");
    assert_eq!(var(&interp, "first"), Value::Int(1));
}

#[test]
fn test_index_out_of_bounds() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    let err = interp.evaluate("var a = [1, 2];\nvar b = a[2];").unwrap_err();
    assert!(matches!(
        err,
        ScriptError::Eval {
            line: 2,
            source: EvalError::Value(ValueError::IndexOutOfBounds { index: 2, len: 2 }),
        }
    ));
}

#[test]
fn test_dictionary_get_or_insert() {
    let interp = run(
        "var d = dictionary();\nd[\"a\"] = 1;\nd.b = 2;\nvar total = d[\"a\"] + d.b;\nvar n = length(d);",
    );
    assert_eq!(var(&interp, "total"), Value::Int(3));
    assert_eq!(var(&interp, "n"), Value::Int(2));
}

#[test]
fn test_member_call_on_non_class_passes_receiver() {
    let interp = run("var l = [3, 1, 2];\nvar n = l.length();\nvar r = \"abc\".reverse();");
    assert_eq!(var(&interp, "n"), Value::Int(3));
    assert_eq!(var(&interp, "r"), Value::from("cba"));
}

// ═══════════════════════════════════════════════════════════════════════
// Functions
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_recursive_function() {
    let interp = run(
        "fn fib(n) {\n  if (n < 2) { return n; }\n  return fib(n - 1) + fib(n - 2);\n}\nvar f = fib(15);",
    );
    assert_eq!(var(&interp, "f"), Value::Int(610));
}

#[test]
fn test_function_without_return_yields_null() {
    let interp = run("fn nothing() { var x = 1; }\nvar r = nothing();");
    assert!(var(&interp, "r").is_null());
}

#[test]
fn test_arguments_are_copies() {
    let interp = run("fn bump(x) { x += 1; return x; }\nvar a = 1;\nvar b = bump(a);");
    assert_eq!(var(&interp, "a"), Value::Int(1));
    assert_eq!(var(&interp, "b"), Value::Int(2));
}

#[test]
fn test_arity_mismatch() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    let err = interp
        .evaluate("fn pair(a, b) { return a; }\npair(1);")
        .unwrap_err();
    assert!(matches!(
        err,
        ScriptError::Eval {
            source: EvalError::ArityMismatch {
                expected: 2,
                got: 1,
                ..
            },
            ..
        }
    ));
}

#[test]
fn test_functions_are_values() {
    let interp = run(
        "fn add(a, b) { return a + b; }\nvar f = add;\nvar r = f(2, 3);\nvar t = typeof(f);",
    );
    assert_eq!(var(&interp, "r"), Value::Int(5));
    assert_eq!(var(&interp, "t"), Value::from("function"));
}

#[test]
fn test_calling_a_non_function() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    let err = interp.evaluate("var x = 3;\nx();").unwrap_err();
    assert!(matches!(
        err,
        ScriptError::Eval {
            source: EvalError::NotCallable(Type::Int),
            ..
        }
    ));
}

#[test]
fn test_host_calls_script_function() {
    let interp = run("fn greet(name) { return \"hi \" + name; }");
    assert_eq!(
        interp.call("greet", vec![Value::from("bob")]).unwrap(),
        Value::from("hi bob")
    );
    assert!(matches!(
        interp.call("missing", vec![]),
        Err(EvalError::UnknownIdentifier { .. })
    ));
}

#[test]
fn test_evaluate_in_scope() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    let sandbox = Scope::new_scope(interp.global(), "sandbox");
    interp.evaluate_in("var local = 1;", &sandbox).unwrap();
    assert!(interp.global().variable("local").is_none());
    assert_eq!(sandbox.variable("local").unwrap().get(), Value::Int(1));
}
