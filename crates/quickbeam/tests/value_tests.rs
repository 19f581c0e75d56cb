//! Tests for the value model as seen by hosts

use pretty_assertions::assert_eq;
use quickbeam::*;

#[test]
fn test_type_order() {
    assert!(Type::Null < Type::Int);
    assert!(Type::Int < Type::Float);
    assert!(Type::Float < Type::Vec3);
    assert!(Type::Vec3 < Type::String);
    assert!(Type::String < Type::Array);
    assert!(Type::List < Type::Dictionary);
    assert!(Type::Dictionary < Type::Class);
}

#[test]
fn test_array_rejects_other_kinds() {
    let mut array = Array::Int(vec![1, 2]);
    let err = array.push(Value::String("x".into())).unwrap_err();
    assert!(matches!(
        err,
        ValueError::ArrayTypeMismatch {
            expected: Type::Int,
            got: Type::String,
        }
    ));
    assert_eq!(array, Array::Int(vec![1, 2]));
}

#[test]
fn test_script_pushback_ignores_mismatch() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    interp
        .evaluate("var a = [1, 2];\npushback(a, \"x\");\npushback(a, 3);")
        .unwrap();
    assert_eq!(
        interp.resolve_variable("a").unwrap().get(),
        Value::Array(Array::Int(vec![1, 2, 3]))
    );
}

#[test]
fn test_slots_alias_until_copied() {
    let slot = ValueRef::new(Value::Int(1));
    let alias = slot.clone();
    let copy = ValueRef::new(slot.get());

    alias.set(Value::Int(2));
    assert_eq!(slot.get(), Value::Int(2));
    assert_eq!(copy.get(), Value::Int(1));
    assert!(slot.ptr_eq(&alias));
    assert!(!slot.ptr_eq(&copy));
}

#[test]
fn test_dictionary_keys_by_kind() {
    let mut dict = Dictionary::new();
    dict.insert(Value::Int(1), Value::from("int").into()).unwrap();
    dict.insert(Value::Float(1.0), Value::from("float").into()).unwrap();
    dict.insert(Value::from("1"), Value::from("string").into()).unwrap();

    assert_eq!(dict.len(), 3);
    assert_eq!(
        dict.get(&Value::Float(1.0)).unwrap().unwrap().get(),
        Value::from("float")
    );
    assert!(matches!(
        dict.insert(Value::from(vec![Value::Int(1)]), ValueRef::null()),
        Err(ValueError::Unhashable(Type::List))
    ));
}

#[test]
fn test_dictionary_from_script() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    interp
        .evaluate("var d = dictionary();\nd[\"b\"] = 2;\nd[\"a\"] = 1;\nd[\"b\"] += 10;")
        .unwrap();
    let d = interp.resolve_variable("d").unwrap().get();
    assert_eq!(d.to_string(), "`b: 12`, `a: 1`");
}

#[test]
fn test_printed_forms() {
    assert_eq!(Value::Float(2.0).to_string(), "2.0");
    assert_eq!(Value::Vec3(Vec3::new(1.0, 0.5, 0.0)).to_string(), "1, 0.5, 0");
    assert_eq!(
        Value::from(vec![Value::Int(1), Value::from("two"), Value::Null]).to_string(),
        "1, two, null"
    );
}

#[test]
fn test_user_pointer_identity() {
    let handle = UserPointer::new(String::from("window"));
    let same = Value::UserPointer(handle.clone());
    let other = Value::UserPointer(UserPointer::new(String::from("window")));

    assert_eq!(same, Value::UserPointer(handle.clone()));
    assert_ne!(same, other);
    assert_eq!(
        handle.downcast_ref::<String>().map(String::as_str),
        Some("window")
    );
    assert!(handle.downcast_ref::<i64>().is_none());
}

#[test]
fn test_user_pointer_passes_through_scripts() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    let handle = UserPointer::new(42u32);
    interp.new_variable(
        &interp.global().clone(),
        "handle",
        Value::UserPointer(handle.clone()),
    );
    interp
        .evaluate("fn pass(h) { return h; }\nvar back = pass(handle);\nvar kind = typeof(back);")
        .unwrap();

    assert_eq!(
        interp.resolve_variable("back").unwrap().get(),
        Value::UserPointer(handle)
    );
    assert_eq!(
        interp.resolve_variable("kind").unwrap().get(),
        Value::from("userpointer")
    );
}

#[test]
fn test_class_instances_alias_on_assignment() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    interp
        .evaluate("class Box {\n    var v = 1;\n}\nvar a = Box();\nvar b = a;\nb.v = 5;\nvar c = copy(a);\nc.v = 9;")
        .unwrap();
    let member = |name: &str| match interp.resolve_variable(name).unwrap().get() {
        Value::Class(instance) => instance.variable("v").unwrap().get(),
        other => panic!("expected an instance, got {other:?}"),
    };
    assert_eq!(member("a"), Value::Int(5));
    assert_eq!(member("c"), Value::Int(9));
}

#[test]
fn test_self_holding_dictionary() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    interp
        .evaluate(
            "var d = dictionary();\nd[\"k\"] = d;\nvar s = string(d);\nvar c = copy(d);\n\
             var same = d == c;\nc[\"x\"] = 1;\nvar sizes = [length(d), length(c[\"k\"])];",
        )
        .unwrap();
    let get = |name: &str| interp.resolve_variable(name).unwrap().get();
    assert_eq!(get("s"), Value::from("`k: <cycle>`"));
    assert_eq!(get("same"), Value::Int(1));
    assert_eq!(get("sizes"), Value::Array(Array::Int(vec![1, 2])));
}
