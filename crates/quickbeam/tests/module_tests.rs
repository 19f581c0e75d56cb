//! Tests for modules, privileges, imports and script files

use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use quickbeam::*;

fn var(interp: &Interpreter, name: &str) -> Value {
    interp.resolve_variable(name).expect("unbound").get()
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("quickbeam-{}-{name}", std::process::id()))
}

const FILE_ACCESS: Privilege = Privilege::FILE_SYSTEM_READ.union(Privilege::FILE_SYSTEM_WRITE);

// ═══════════════════════════════════════════════════════════════════════
// Privileges
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_privilege_composition() {
    let granted = Privilege::LOCAL_FOLDER_READ | Privilege::INTERNET;
    assert!(granted.allows(Privilege::INTERNET));
    assert!(granted.allows(Privilege::UNRESTRICTED));
    assert!(!granted.allows(Privilege::INTERNET | Privilege::EXPERIMENTAL));
    assert_eq!(granted & Privilege::INTERNET, Privilege::INTERNET);
    assert_eq!(granted ^ Privilege::INTERNET, Privilege::LOCAL_FOLDER_READ);
}

#[test]
fn test_unrestricted_interpreter_has_no_optional_modules() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    let err = interp.evaluate("import file").unwrap_err();
    assert!(matches!(
        err,
        ScriptError::Eval {
            source: EvalError::UnknownModule(ref name),
            ..
        } if name == "file"
    ));
}

#[test]
fn test_import_denied_without_privileges() {
    let mut interp = Interpreter::new(Privilege::INTERNET);
    let err = interp.evaluate("import file").unwrap_err();
    assert!(matches!(
        err,
        ScriptError::Eval {
            source: EvalError::Privilege { .. },
            ..
        }
    ));
    assert!(err
        .to_string()
        .contains("Cannot import restricted module: file"));
}

#[test]
fn test_restricted_name_reports_privilege_error() {
    let mut interp = Interpreter::new(Privilege::FILE_SYSTEM_READ);
    let err = interp.evaluate("var t = readFile(\"x\");").unwrap_err();
    assert!(matches!(
        err,
        ScriptError::Eval {
            source: EvalError::Privilege { .. },
            ..
        }
    ));
}

#[test]
fn test_module_names_need_import() {
    let mut interp = Interpreter::new(FILE_ACCESS);
    let err = interp.evaluate("var e = fileExists(\"x\");").unwrap_err();
    assert!(matches!(
        err,
        ScriptError::Eval {
            source: EvalError::NotImported { ref module, .. },
            ..
        } if module == "file"
    ));
}

#[test]
fn test_file_module_round_trip() {
    let path = temp_path("roundtrip.txt");
    let mut interp = Interpreter::new(FILE_ACCESS);
    let script = format!(
        "import file\nsaveFile(\"line one\", \"{p}\");\nvar text = readFile(\"{p}\");\nvar there = fileExists(\"{p}\");",
        p = path.display()
    );
    interp.evaluate(&script).unwrap();
    assert_eq!(var(&interp, "text"), Value::from("line one"));
    assert_eq!(var(&interp, "there"), Value::Int(1));
    fs::remove_file(&path).unwrap();
}

#[test]
fn test_import_is_idempotent() {
    let mut interp = Interpreter::new(FILE_ACCESS);
    interp.import_module("file").unwrap();
    interp.import_module("file").unwrap();
    let installed = interp
        .modules()
        .iter()
        .filter(|module| module.name() == "file")
        .count();
    assert_eq!(installed, 1);
}

// ═══════════════════════════════════════════════════════════════════════
// Host modules
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_unrestricted_module_is_installed_at_once() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    interp.new_module(
        Module::new("consts", Privilege::UNRESTRICTED)
            .variable("answer", Value::Int(42))
            .function("half", |args| {
                let n = args.first().map(ValueRef::get).unwrap_or_default();
                Ok(ValueRef::new(n.try_div(&Value::Int(2))?))
            }),
    );
    interp.evaluate("var h = half(answer);").unwrap();
    assert_eq!(var(&interp, "h"), Value::Int(21));
    // Module bindings are not copied into the global scope
    assert!(interp.global().variable("answer").is_none());
}

#[test]
fn test_scope_chain_shadows_modules() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    interp.evaluate("fn length(x) { return -1; }\nvar n = length([1, 2]);").unwrap();
    assert_eq!(var(&interp, "n"), Value::Int(-1));
}

#[test]
fn test_new_module_replaces_same_name() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    interp.new_module(Module::new("m", Privilege::UNRESTRICTED).variable("v", Value::Int(1)));
    interp.new_module(Module::new("m", Privilege::UNRESTRICTED).variable("v", Value::Int(2)));
    assert_eq!(var(&interp, "v"), Value::Int(2));
    assert_eq!(interp.modules().len(), 2);
}

#[test]
fn test_scoped_module_function_sees_interpreter() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    interp.new_module(Module::new("reflect", Privilege::UNRESTRICTED).scoped_function(
        "defined",
        |interp, scope, args| {
            let name = args.first().map(ValueRef::get).unwrap_or_default();
            let found = match name.as_str() {
                Some(name) => interp.resolve_in(name, &Frame::new(scope.clone())).is_ok(),
                None => false,
            };
            Ok(ValueRef::new(Value::from(found)))
        },
    ));
    interp
        .evaluate("var yes = defined(\"print\");\nvar no = defined(\"nope\");")
        .unwrap();
    assert_eq!(var(&interp, "yes"), Value::Int(1));
    assert_eq!(var(&interp, "no"), Value::Int(0));
}

// ═══════════════════════════════════════════════════════════════════════
// Script files
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_evaluate_file_skips_shebang() {
    let path = temp_path("script.qb");
    fs::write(&path, "#!/usr/bin/env quickbeam\nvar loaded = 1;\n").unwrap();
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    interp.evaluate_file(&path).unwrap();
    assert_eq!(var(&interp, "loaded"), Value::Int(1));
    fs::remove_file(&path).unwrap();
}

#[test]
fn test_evaluate_missing_file() {
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    let err = interp
        .evaluate_file(temp_path("does-not-exist.qb"))
        .unwrap_err();
    assert!(matches!(err, ScriptError::Io { .. }));
    assert_eq!(err.line(), None);
}

#[test]
fn test_import_script_file() {
    let path = temp_path("lib.qb");
    fs::write(&path, "fn triple(x) {\n    return x * 3;\n}\n").unwrap();
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    let script = format!(
        "var before = 1;\nimport \"{}\"\nvar t = triple(before + 1);",
        path.display()
    );
    interp.evaluate(&script).unwrap();
    assert_eq!(var(&interp, "t"), Value::Int(6));
    fs::remove_file(&path).unwrap();
}

#[test]
fn test_error_in_imported_file_reports_its_line() {
    let path = temp_path("broken.qb");
    fs::write(&path, "var ok = 1;\nvar bad = nowhere;\n").unwrap();
    let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
    let err = interp
        .evaluate(&format!("import \"{}\"", path.display()))
        .unwrap_err();
    assert_eq!(err.line(), Some(2));
    assert!(interp.is_idle());
    fs::remove_file(&path).unwrap();
}
