//! Tests for scope chains and concurrent registration

use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use quickbeam::*;

fn var(interp: &Interpreter, name: &str) -> Value {
    interp.resolve_variable(name).expect("unbound").get()
}

#[test]
fn test_concurrent_insertion() {
    let global = Scope::global("global");

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let scope = Arc::clone(&global);
            thread::spawn(move || {
                for i in 0..100 {
                    scope.insert_variable(format!("v{t}_{i}"), ValueRef::new(Value::Int(i)));
                }
                scope.insert_function(Function::native(format!("f{t}"), |_| {
                    Ok(ValueRef::null())
                }));
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(global.variable_names().len(), 800);
    assert_eq!(global.functions().len(), 8);
    assert_eq!(global.variable("v7_99").unwrap().get(), Value::Int(99));
}

#[test]
fn test_host_threads_register_for_scripts() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    let global = interp.global().clone();

    thread::scope(|s| {
        for t in 0..4i64 {
            let global = &global;
            s.spawn(move || {
                global.insert_variable(format!("part{t}"), ValueRef::new(Value::Int(t + 1)));
            });
        }
    });

    interp
        .evaluate("var total = part0 + part1 + part2 + part3;")
        .unwrap();
    assert_eq!(var(&interp, "total"), Value::Int(10));
}

#[test]
fn test_ancestors_visible_descendants_hidden() {
    let global = Scope::global("global");
    let outer = Scope::new_scope(&global, "outer");
    let inner = Scope::new_scope(&outer, "inner");
    let sibling = Scope::new_scope(&global, "sibling");

    global.insert_variable("g", Value::Int(1).into());
    outer.insert_variable("o", Value::Int(2).into());
    inner.insert_variable("i", Value::Int(3).into());

    assert!(inner.resolve_variable("g").is_some());
    assert!(inner.resolve_variable("o").is_some());
    assert!(outer.resolve_variable("i").is_none());
    assert!(sibling.resolve_variable("o").is_none());
    assert!(global.resolve_scope("outer").is_some());
    assert!(sibling.resolve_scope("inner").is_none());
}

#[test]
fn test_nearest_binding_shadows() {
    let global = Scope::global("global");
    let child = Scope::child(&global, "child");
    global.insert_variable("x", Value::Int(1).into());
    child.insert_variable("x", Value::Int(2).into());

    assert_eq!(child.resolve_variable("x").unwrap().get(), Value::Int(2));
    assert_eq!(global.resolve_variable("x").unwrap().get(), Value::Int(1));
}

#[test]
fn test_block_variables_do_not_leak() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    interp
        .evaluate("var seen = 0;\n{\n    var hidden = 4;\n    seen = hidden;\n}")
        .unwrap();
    assert_eq!(var(&interp, "seen"), Value::Int(4));
    assert!(matches!(
        interp.resolve_variable("hidden"),
        Err(EvalError::UnknownIdentifier { .. })
    ));
}

#[test]
fn test_functions_resolve_names_when_called() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    interp
        .evaluate("fn get() { return later; }\nvar later = 5;\nvar r = get();\nlater = 6;\nvar s = get();")
        .unwrap();
    assert_eq!(var(&interp, "r"), Value::Int(5));
    assert_eq!(var(&interp, "s"), Value::Int(6));
}

#[test]
fn test_variable_holding_function_is_callable() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    interp
        .evaluate("fn twice(x) { return x * 2; }\nvar f = twice;\nvar r = f(4);")
        .unwrap();
    assert_eq!(var(&interp, "r"), Value::Int(8));
}

#[test]
fn test_sandbox_shadows_global() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    interp.evaluate("var base = 1;").unwrap();

    let sandbox = Scope::child(interp.global(), "sandbox");
    interp
        .evaluate_in("var base = 10;\nvar seen = base;", &sandbox)
        .unwrap();

    assert_eq!(sandbox.variable("seen").unwrap().get(), Value::Int(10));
    assert_eq!(var(&interp, "base"), Value::Int(1));
    assert!(interp.resolve_variable("seen").is_err());
}
