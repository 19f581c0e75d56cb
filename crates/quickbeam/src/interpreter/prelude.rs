//! Standard library with built-in functions and operators
//!
//! Operators are ordinary functions here: the expression parser looks every
//! operator token up in this module and builds calls to the result. Most
//! library functions answer `null` when an argument is missing or of the
//! wrong kind instead of failing; operators fail.

use std::cmp::Ordering;
use std::io::BufRead;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{EvalError, ValueError};
use crate::eval::{call_function, Frame};
use crate::interpreter::Interpreter;
use crate::module::{Module, Privilege};
use crate::scope::ScopeRef;
use crate::value::{
    promote_strict, Array, Dictionary, FunctionRef, NativeResult, Type, Value, ValueRef, Vec3,
};

/// Name the standard library is registered under.
pub const STANDARD_LIB: &str = "StandardLib";

/// Build the standard library module.
pub(crate) fn standard_library() -> Module {
    Module::new(STANDARD_LIB, Privilege::UNRESTRICTED)
        // Assignment
        .function("=", builtin_assign)
        .function("+=", builtin_add_assign)
        .function("-=", builtin_sub_assign)
        .function("*=", builtin_mul_assign)
        .function("/=", builtin_div_assign)
        // Arithmetic
        .function("+", builtin_add)
        .function("-", builtin_sub)
        .function("*", builtin_mul)
        .function("/", builtin_div)
        .function("%", builtin_rem)
        .function("++", builtin_increment)
        .function("--", builtin_decrement)
        // Comparison and logic
        .function("==", builtin_eq)
        .function("!=", builtin_ne)
        .function("<", builtin_lt)
        .function(">", builtin_gt)
        .function("<=", builtin_le)
        .function(">=", builtin_ge)
        .function("&&", builtin_and)
        .function("||", builtin_or)
        .function("!", builtin_not)
        // Core
        .function("identity", builtin_identity)
        .function("copy", builtin_copy)
        .function("listindex", builtin_listindex)
        .function("[]", builtin_make_list)
        .function("typeof", builtin_typeof)
        .function("inspect", builtin_inspect)
        // Conversions
        .function("bool", builtin_bool)
        .function("int", |args| convert(args, Type::Int))
        .function("float", |args| convert(args, Type::Float))
        .function("string", |args| convert(args, Type::String))
        .function("vec3", builtin_vec3)
        .function("array", builtin_array)
        .function("list", builtin_list)
        .function("dictionary", builtin_dictionary)
        .function("toarray", |args| convert(args, Type::Array))
        .function("tolist", |args| convert(args, Type::List))
        // Math
        .function("sqrt", |args| float_fn(args, f64::sqrt))
        .function("sin", |args| float_fn(args, f64::sin))
        .function("cos", |args| float_fn(args, f64::cos))
        .function("tan", |args| float_fn(args, f64::tan))
        .function("pow", builtin_pow)
        .function("abs", builtin_abs)
        .function("min", |args| extreme(args, "min", Ordering::Less))
        .function("max", |args| extreme(args, "max", Ordering::Greater))
        .function("swap", builtin_swap)
        // I/O
        .function("print", builtin_print)
        .function("getline", builtin_getline)
        // Higher-order
        .scoped_function("map", builtin_map)
        .scoped_function("fold", builtin_fold)
        .scoped_function("applyfunction", builtin_applyfunction)
        // Time
        .function("clock", builtin_clock)
        .function("getduration", builtin_getduration)
        .function("timesince", builtin_timesince)
        // Collections
        .function("length", builtin_length)
        .function("find", builtin_find)
        .function("erase", builtin_erase)
        .function("pushback", builtin_pushback)
        .function("popback", builtin_popback)
        .function("popfront", builtin_popfront)
        .function("front", builtin_front)
        .function("back", builtin_back)
        .function("reverse", builtin_reverse)
        .function("range", builtin_range)
        .function("sort", builtin_sort)
        .function("contains", builtin_contains)
        // Strings
        .function("replace", builtin_replace)
        .function("startswith", builtin_startswith)
        .function("endswith", builtin_endswith)
        .function("split", builtin_split)
}

// ═══════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════

fn slot(value: impl Into<Value>) -> NativeResult {
    Ok(ValueRef::new(value.into()))
}

fn null() -> NativeResult {
    Ok(ValueRef::null())
}

/// Copy of argument `index`, `null` when absent.
fn arg(args: &[ValueRef], index: usize) -> Value {
    args.get(index).map(ValueRef::get).unwrap_or_default()
}

fn operands<'a>(name: &str, args: &'a [ValueRef]) -> Result<(&'a ValueRef, &'a ValueRef), EvalError> {
    match args {
        [lhs, rhs] => Ok((lhs, rhs)),
        _ => Err(EvalError::native(
            name,
            format!("expects 2 operands, got {}", args.len()),
        )),
    }
}

fn binary(
    name: &str,
    args: &[ValueRef],
    op: fn(&Value, &Value) -> Result<Value, ValueError>,
) -> NativeResult {
    let (lhs, rhs) = operands(name, args)?;
    let (lhs, rhs) = (lhs.get(), rhs.get());
    slot(op(&lhs, &rhs)?)
}

fn compound(
    name: &str,
    args: &[ValueRef],
    op: fn(&ValueRef, &Value) -> Result<(), ValueError>,
) -> NativeResult {
    let (target, rhs) = operands(name, args)?;
    let rhs = rhs.get();
    op(target, &rhs)?;
    Ok(target.clone())
}

fn ordering(name: &'static str, args: &[ValueRef], accept: fn(Ordering) -> bool) -> NativeResult {
    let (lhs, rhs) = operands(name, args)?;
    let order = lhs.get().compare(&rhs.get(), name)?;
    slot(order.is_some_and(accept))
}

/// Index argument checked against `len`.
fn checked_index(index: &Value, len: usize) -> Result<usize, EvalError> {
    let i = match index.hardconvert(Type::Int)? {
        Value::Int(i) => i,
        _ => 0,
    };
    usize::try_from(i)
        .ok()
        .filter(|&i| i < len)
        .ok_or(EvalError::Value(ValueError::IndexOutOfBounds { index: i, len }))
}

/// Integer argument, `None` unless it is an Int.
fn int_arg(args: &[ValueRef], index: usize) -> Option<i64> {
    arg(args, index).as_int()
}

/// A function value, or the function named by a string.
fn callable(interp: &Interpreter, scope: &ScopeRef, target: &Value) -> Result<FunctionRef, EvalError> {
    match target {
        Value::Function(func) => Ok(func.clone()),
        Value::String(name) => interp.resolve_callable_in(name, &Frame::new(scope.clone())),
        other => Err(EvalError::NotCallable(other.type_of())),
    }
}

fn now_nanos() -> Result<i64, EvalError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| EvalError::native("clock", e.to_string()))?;
    Ok(i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX))
}

// ═══════════════════════════════════════════════════════════════════════
// Operators
// ═══════════════════════════════════════════════════════════════════════

fn builtin_assign(args: &[ValueRef]) -> NativeResult {
    let (target, value) = operands("=", args)?;
    let value = value.get();
    target.set(value);
    Ok(target.clone())
}

fn builtin_add_assign(args: &[ValueRef]) -> NativeResult {
    compound("+=", args, ValueRef::add_assign)
}

fn builtin_sub_assign(args: &[ValueRef]) -> NativeResult {
    compound("-=", args, ValueRef::sub_assign)
}

fn builtin_mul_assign(args: &[ValueRef]) -> NativeResult {
    compound("*=", args, ValueRef::mul_assign)
}

fn builtin_div_assign(args: &[ValueRef]) -> NativeResult {
    compound("/=", args, ValueRef::div_assign)
}

fn builtin_add(args: &[ValueRef]) -> NativeResult {
    binary("+", args, Value::try_add)
}

fn builtin_sub(args: &[ValueRef]) -> NativeResult {
    // Unary minus
    if let [operand] = args {
        return slot(operand.get().try_neg()?);
    }
    binary("-", args, Value::try_sub)
}

fn builtin_mul(args: &[ValueRef]) -> NativeResult {
    binary("*", args, Value::try_mul)
}

fn builtin_div(args: &[ValueRef]) -> NativeResult {
    binary("/", args, Value::try_div)
}

fn builtin_rem(args: &[ValueRef]) -> NativeResult {
    binary("%", args, Value::try_rem)
}

/// Postfix `x++` gets one argument and yields the old value; prefix `++x`
/// gets a leading `null` and yields the updated slot.
fn step(name: &str, args: &[ValueRef], apply: fn(&ValueRef) -> Result<Value, ValueError>) -> NativeResult {
    match args {
        [target] => slot(apply(target)?),
        [_, target] => {
            apply(target)?;
            Ok(target.clone())
        }
        _ => Err(EvalError::native(
            name,
            format!("expects 1 operand, got {}", args.len()),
        )),
    }
}

fn builtin_increment(args: &[ValueRef]) -> NativeResult {
    step("++", args, ValueRef::increment)
}

fn builtin_decrement(args: &[ValueRef]) -> NativeResult {
    step("--", args, ValueRef::decrement)
}

fn builtin_eq(args: &[ValueRef]) -> NativeResult {
    let (lhs, rhs) = operands("==", args)?;
    slot(lhs.get() == rhs.get())
}

fn builtin_ne(args: &[ValueRef]) -> NativeResult {
    let (lhs, rhs) = operands("!=", args)?;
    slot(lhs.get() != rhs.get())
}

fn builtin_lt(args: &[ValueRef]) -> NativeResult {
    ordering("<", args, Ordering::is_lt)
}

fn builtin_gt(args: &[ValueRef]) -> NativeResult {
    ordering(">", args, Ordering::is_gt)
}

fn builtin_le(args: &[ValueRef]) -> NativeResult {
    ordering("<=", args, Ordering::is_le)
}

fn builtin_ge(args: &[ValueRef]) -> NativeResult {
    ordering(">=", args, Ordering::is_ge)
}

fn builtin_and(args: &[ValueRef]) -> NativeResult {
    let (lhs, rhs) = operands("&&", args)?;
    slot(lhs.truthy() && rhs.truthy())
}

fn builtin_or(args: &[ValueRef]) -> NativeResult {
    let (lhs, rhs) = operands("||", args)?;
    slot(lhs.truthy() || rhs.truthy())
}

fn builtin_not(args: &[ValueRef]) -> NativeResult {
    match args {
        [operand] => slot(operand.get().logical_not()),
        _ => Err(EvalError::native(
            "!",
            format!("expects 1 operand, got {}", args.len()),
        )),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Core
// ═══════════════════════════════════════════════════════════════════════

fn builtin_identity(args: &[ValueRef]) -> NativeResult {
    Ok(args.first().cloned().unwrap_or_default())
}

fn builtin_copy(args: &[ValueRef]) -> NativeResult {
    slot(arg(args, 0).deep_copy())
}

/// `container[index]`.
///
/// Lists, class members and dictionary entries yield their slot so the
/// result can be assigned through. Array elements and string characters are
/// copies.
fn builtin_listindex(args: &[ValueRef]) -> NativeResult {
    let (container, index) = operands("listindex", args)?;
    let index = index.get();
    let container = container.get();
    match &container {
        Value::Array(array) => {
            let i = checked_index(&index, array.len())?;
            slot(array.get(i).unwrap_or_default())
        }
        Value::String(s) => {
            let i = checked_index(&index, s.chars().count())?;
            slot(s.chars().nth(i).map(String::from).unwrap_or_default())
        }
        Value::List(list) => {
            let i = checked_index(&index, list.len())?;
            Ok(list[i].clone())
        }
        Value::Class(instance) => {
            let name = index.to_string();
            instance.variable(&name).ok_or_else(|| EvalError::UnknownMember {
                class: instance.name().to_string(),
                name,
            })
        }
        Value::Dictionary(dict) => Ok(dict.write().entry(index)?),
        other => Err(EvalError::type_error(format!(
            "cannot index a `{}`",
            other.type_of()
        ))),
    }
}

/// `[a, b, c]`: an Array when every element shares one scalar kind.
fn builtin_make_list(args: &[ValueRef]) -> NativeResult {
    let values: Vec<Value> = args.iter().map(ValueRef::get).collect();
    match Array::homogeneous(&values) {
        Some(array) => slot(array),
        None => slot(values),
    }
}

fn builtin_typeof(args: &[ValueRef]) -> NativeResult {
    match args.first() {
        Some(value) => slot(value.type_of().name()),
        None => null(),
    }
}

fn builtin_inspect(args: &[ValueRef]) -> NativeResult {
    match args.first() {
        Some(value) => slot(format!("{value:?}")),
        None => null(),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Conversions
// ═══════════════════════════════════════════════════════════════════════

fn convert(args: &[ValueRef], target: Type) -> NativeResult {
    match args.first() {
        Some(value) => slot(value.get().hardconvert(target)?),
        None => slot(Value::Null.upconvert(target).unwrap_or_default()),
    }
}

fn builtin_bool(args: &[ValueRef]) -> NativeResult {
    slot(args.first().is_some_and(ValueRef::truthy))
}

fn builtin_vec3(args: &[ValueRef]) -> NativeResult {
    let component = |index: usize| -> Result<f32, EvalError> {
        match arg(args, index).hardconvert(Type::Float)? {
            Value::Float(f) => Ok(f as f32),
            _ => Ok(0.0),
        }
    };
    match args.len() {
        0 => slot(Vec3::default()),
        1 | 2 => match args[0].get() {
            Value::Int(_) | Value::Float(_) => slot(Vec3::splat(component(0)?)),
            other => slot(other.hardconvert(Type::Vec3)?),
        },
        _ => slot(Vec3::new(component(0)?, component(1)?, component(2)?)),
    }
}

/// `array(a, b, ...)` packs its arguments; a single collection is converted.
fn builtin_array(args: &[ValueRef]) -> NativeResult {
    match args {
        [] => slot(Array::new()),
        [single] if single.type_of() >= Type::String => {
            slot(single.get().hardconvert(Type::Array)?)
        }
        _ => slot(Array::from_values_lossy(args.iter().map(ValueRef::get))?),
    }
}

fn builtin_list(args: &[ValueRef]) -> NativeResult {
    slot(args.iter().map(ValueRef::get).collect::<Vec<_>>())
}

/// `dictionary(x)` converts; `dictionary(a, b, ...)` merges the conversions.
fn builtin_dictionary(args: &[ValueRef]) -> NativeResult {
    match args {
        [] => slot(Dictionary::new().into_ref()),
        [single] => slot(single.get().hardconvert(Type::Dictionary)?),
        _ => {
            let mut merged = Dictionary::new();
            for value in args {
                if let Value::Dictionary(dict) = value.get().hardconvert(Type::Dictionary)? {
                    let dict = dict.read();
                    merged.merge(&dict);
                }
            }
            slot(merged.into_ref())
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Math
// ═══════════════════════════════════════════════════════════════════════

fn float_fn(args: &[ValueRef], f: fn(f64) -> f64) -> NativeResult {
    match arg(args, 0).as_float() {
        Some(x) => slot(f(x)),
        None => null(),
    }
}

fn builtin_pow(args: &[ValueRef]) -> NativeResult {
    match (arg(args, 0).as_float(), arg(args, 1).as_float()) {
        (Some(base), Some(exp)) => slot(base.powf(exp)),
        _ => slot(0.0),
    }
}

fn builtin_abs(args: &[ValueRef]) -> NativeResult {
    match arg(args, 0) {
        Value::Int(i) => slot(i.wrapping_abs()),
        Value::Float(f) => slot(f.abs()),
        _ => null(),
    }
}

fn extreme(args: &[ValueRef], name: &'static str, keep: Ordering) -> NativeResult {
    let (a, b) = match args {
        [a, b, ..] => (a.get(), b.get()),
        _ => return null(),
    };
    let (a, b) = promote_strict(&a, &b)?;
    match b.compare(&a, name)? {
        Some(order) if order == keep => slot(b),
        _ => slot(a),
    }
}

fn builtin_swap(args: &[ValueRef]) -> NativeResult {
    if let [a, b, ..] = args {
        let (first, second) = (a.get(), b.get());
        a.set(second);
        b.set(first);
    }
    null()
}

// ═══════════════════════════════════════════════════════════════════════
// I/O
// ═══════════════════════════════════════════════════════════════════════

fn builtin_print(args: &[ValueRef]) -> NativeResult {
    let line: String = args.iter().map(|value| value.get().to_string()).collect();
    println!("{line}");
    null()
}

/// Read one line from stdin; also stored into the first argument if given.
fn builtin_getline(args: &[ValueRef]) -> NativeResult {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| EvalError::native("getline", e.to_string()))?;
    let line = line.trim_end_matches(['\n', '\r']).to_string();
    if let Some(target) = args.first() {
        target.set(Value::String(line.clone()));
    }
    slot(line)
}

// ═══════════════════════════════════════════════════════════════════════
// Higher-order
// ═══════════════════════════════════════════════════════════════════════

/// `map(collection, f)` to a List of results.
fn builtin_map(interp: &Interpreter, scope: &ScopeRef, args: &[ValueRef]) -> NativeResult {
    let (collection, func) = match args {
        [collection, func, ..] => (collection.get(), func.get()),
        _ => return null(),
    };
    let Value::Function(func) = func else {
        return null();
    };
    let mut results = Vec::new();
    for element in collection.elements() {
        let result = call_function(interp, &func, scope, &[ValueRef::new(element)], None)?;
        results.push(result);
    }
    slot(Value::List(results))
}

/// `fold(collection, f, init)`: `acc = f(acc, element)` for each element.
fn builtin_fold(interp: &Interpreter, scope: &ScopeRef, args: &[ValueRef]) -> NativeResult {
    let (collection, func, init) = match args {
        [collection, func, init, ..] => (collection.get(), func.get(), init.clone()),
        _ => return null(),
    };
    let Value::Function(func) = func else {
        return null();
    };
    let mut acc = init;
    for element in collection.elements() {
        acc = call_function(interp, &func, scope, &[acc, ValueRef::new(element)], None)?;
    }
    Ok(acc)
}

/// `applyfunction(f, args...)` where `f` is a function or its name.
fn builtin_applyfunction(interp: &Interpreter, scope: &ScopeRef, args: &[ValueRef]) -> NativeResult {
    let Some((target, rest)) = args.split_first() else {
        return Err(EvalError::native(
            "applyfunction",
            "Cannot call non existent function: null",
        ));
    };
    let func = callable(interp, scope, &target.get())?;
    call_function(interp, &func, scope, rest, None)
}

// ═══════════════════════════════════════════════════════════════════════
// Time
// ═══════════════════════════════════════════════════════════════════════

fn builtin_clock(_args: &[ValueRef]) -> NativeResult {
    slot(now_nanos()?)
}

/// Seconds between two `clock()` readings.
fn builtin_getduration(args: &[ValueRef]) -> NativeResult {
    match (int_arg(args, 0), int_arg(args, 1)) {
        (Some(start), Some(end)) => slot(end.wrapping_sub(start) as f64 / 1e9),
        _ => null(),
    }
}

/// Seconds since a `clock()` reading.
fn builtin_timesince(args: &[ValueRef]) -> NativeResult {
    match int_arg(args, 0) {
        Some(start) => slot(now_nanos()?.wrapping_sub(start) as f64 / 1e9),
        None => null(),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Collections
// ═══════════════════════════════════════════════════════════════════════

fn builtin_length(args: &[ValueRef]) -> NativeResult {
    let len = arg(args, 0).len().unwrap_or(0);
    slot(len as i64)
}

/// Index of the first match, or `null`.
fn builtin_find(args: &[ValueRef]) -> NativeResult {
    let (haystack, needle) = (arg(args, 0), arg(args, 1));
    let found = match (&haystack, &needle) {
        (Value::String(s), Value::String(sub)) => s
            .find(sub.as_str())
            .map(|byte| s[..byte].chars().count()),
        (Value::Array(array), _) => array.position(&needle),
        (Value::List(list), _) => list.iter().position(|slot| slot.get() == needle),
        _ => None,
    };
    match found {
        Some(index) => slot(index as i64),
        None => null(),
    }
}

/// Remove the element at an index (or a dictionary key) in place.
fn builtin_erase(args: &[ValueRef]) -> NativeResult {
    let (Some(target), key) = (args.first(), arg(args, 1)) else {
        return null();
    };
    let mut held = target.write();
    match (&mut *held, key) {
        (Value::Array(array), Value::Int(i)) => {
            if let Ok(i) = usize::try_from(i) {
                array.remove(i);
            }
        }
        (Value::List(list), Value::Int(i)) => {
            if let Some(i) = usize::try_from(i).ok().filter(|&i| i < list.len()) {
                list.remove(i);
            }
        }
        (Value::String(s), Value::Int(i)) => {
            if let Some((byte, _)) = usize::try_from(i).ok().and_then(|i| s.char_indices().nth(i)) {
                s.remove(byte);
            }
        }
        (Value::Dictionary(dict), key) => {
            dict.write().remove(&key)?;
        }
        _ => {}
    }
    null()
}

/// Append in place. Arrays ignore elements of another kind.
fn builtin_pushback(args: &[ValueRef]) -> NativeResult {
    let (Some(target), Some(value)) = (args.first(), args.get(1)) else {
        return null();
    };
    let item = value.get();
    match &mut *target.write() {
        Value::Array(array) if array.is_empty() || array.element_type() == item.type_of() => {
            array.push(item)?;
        }
        Value::List(list) => list.push(ValueRef::new(item)),
        Value::String(s) => s.push_str(&item.to_string()),
        _ => {}
    }
    null()
}

fn builtin_popback(args: &[ValueRef]) -> NativeResult {
    if let Some(target) = args.first() {
        match &mut *target.write() {
            Value::Array(array) => {
                array.pop();
            }
            Value::List(list) => {
                list.pop();
            }
            Value::String(s) => {
                s.pop();
            }
            _ => {}
        }
    }
    null()
}

fn builtin_popfront(args: &[ValueRef]) -> NativeResult {
    if let Some(target) = args.first() {
        match &mut *target.write() {
            Value::Array(array) => {
                array.remove(0);
            }
            Value::List(list) if !list.is_empty() => {
                list.remove(0);
            }
            Value::String(s) if !s.is_empty() => {
                s.remove(0);
            }
            _ => {}
        }
    }
    null()
}

fn end_element(args: &[ValueRef], last: bool) -> NativeResult {
    match arg(args, 0) {
        Value::Array(array) if !array.is_empty() => {
            let index = if last { array.len() - 1 } else { 0 };
            slot(array.get(index).unwrap_or_default())
        }
        Value::List(list) => {
            let found = if last { list.last() } else { list.first() };
            Ok(found.cloned().unwrap_or_default())
        }
        Value::String(s) => {
            let found = if last { s.chars().last() } else { s.chars().next() };
            found.map_or_else(null, |c| slot(String::from(c)))
        }
        _ => null(),
    }
}

fn builtin_front(args: &[ValueRef]) -> NativeResult {
    end_element(args, false)
}

fn builtin_back(args: &[ValueRef]) -> NativeResult {
    end_element(args, true)
}

/// Reversed copy.
fn builtin_reverse(args: &[ValueRef]) -> NativeResult {
    match arg(args, 0) {
        Value::String(s) => slot(s.chars().rev().collect::<String>()),
        Value::Array(mut array) => {
            array.reverse();
            slot(array)
        }
        Value::List(mut list) => {
            list.reverse();
            slot(Value::List(list))
        }
        _ => null(),
    }
}

/// Most elements a counting `range` may produce.
const MAX_RANGE_LEN: u64 = 1 << 24;

fn range_too_large(start: impl ToString, end: impl ToString) -> EvalError {
    ValueError::RangeTooLarge {
        start: start.to_string(),
        end: end.to_string(),
        max: MAX_RANGE_LEN,
    }
    .into()
}

/// `range(a, b)` counts from `a` to `b` inclusive, in either direction;
/// `range(collection, start, end)` copies the elements in `start..end`.
fn builtin_range(args: &[ValueRef]) -> NativeResult {
    match args {
        [a, b] => match (a.get(), b.get()) {
            (Value::Int(a), Value::Int(b)) => {
                if a.abs_diff(b) >= MAX_RANGE_LEN {
                    return Err(range_too_large(a, b));
                }
                let items: Vec<i64> = if a <= b {
                    (a..=b).collect()
                } else {
                    (b..=a).rev().collect()
                };
                slot(Array::Int(items))
            }
            (Value::Float(a), Value::Float(b)) => {
                let span = (b - a).abs().floor();
                if span.is_nan() || span >= MAX_RANGE_LEN as f64 {
                    return Err(range_too_large(a, b));
                }
                let count = span as usize;
                let sign = if b >= a { 1.0 } else { -1.0 };
                slot(Array::Float(
                    (0..=count).map(|i| a + sign * i as f64).collect(),
                ))
            }
            _ => null(),
        },
        [collection, start, end, ..] => {
            let bound = |value: &ValueRef| -> Result<usize, EvalError> {
                match value.get().hardconvert(Type::Int)? {
                    Value::Int(i) => Ok(usize::try_from(i).unwrap_or(0)),
                    _ => Ok(0),
                }
            };
            let (start, end) = (bound(start)?, bound(end)?);
            match collection.get() {
                Value::String(s) => slot(
                    s.chars()
                        .skip(start)
                        .take(end.saturating_sub(start))
                        .collect::<String>(),
                ),
                Value::Array(array) => slot(array.slice(start, end)),
                Value::List(list) => {
                    let end = end.min(list.len());
                    let start = start.min(end);
                    slot(Value::List(list[start..end].to_vec()))
                }
                _ => null(),
            }
        }
        _ => null(),
    }
}

/// Sort in place and return the same slot.
fn builtin_sort(args: &[ValueRef]) -> NativeResult {
    let Some(target) = args.first() else {
        return null();
    };
    let current = target.get();
    match current {
        Value::Array(mut array) => {
            array.sort();
            target.set(Value::Array(array));
        }
        Value::List(mut list) => {
            let mut keyed: Vec<(Value, ValueRef)> =
                list.drain(..).map(|slot| (slot.get(), slot)).collect();
            keyed.sort_by(|(a, _), (b, _)| {
                a.compare(b, "<").ok().flatten().unwrap_or(Ordering::Equal)
            });
            target.set(Value::List(keyed.into_iter().map(|(_, slot)| slot).collect()));
        }
        _ => return null(),
    }
    Ok(target.clone())
}

/// 1 if the collection holds the value (or the string the substring), else 0.
fn builtin_contains(args: &[ValueRef]) -> NativeResult {
    let (haystack, needle) = (arg(args, 0), arg(args, 1));
    let found = match &haystack {
        Value::String(s) => s.contains(&needle.to_string()),
        Value::Array(array) => needle
            .hardconvert(array.element_type())
            .ok()
            .is_some_and(|item| array.position(&item).is_some()),
        Value::List(list) => list.iter().any(|slot| slot.get() == needle),
        Value::Dictionary(dict) => dict.read().contains_key(&needle).unwrap_or(false),
        _ => false,
    };
    slot(found)
}

// ═══════════════════════════════════════════════════════════════════════
// Strings
// ═══════════════════════════════════════════════════════════════════════

fn builtin_replace(args: &[ValueRef]) -> NativeResult {
    match (arg(args, 0), arg(args, 1), arg(args, 2)) {
        (Value::String(input), Value::String(from), Value::String(to)) if !from.is_empty() => {
            slot(input.replace(&from, &to))
        }
        (Value::String(input), Value::String(_), Value::String(_)) => slot(input),
        _ => null(),
    }
}

fn builtin_startswith(args: &[ValueRef]) -> NativeResult {
    match (arg(args, 0), arg(args, 1)) {
        (Value::String(s), Value::String(prefix)) => slot(s.starts_with(&prefix)),
        _ => null(),
    }
}

fn builtin_endswith(args: &[ValueRef]) -> NativeResult {
    match (arg(args, 0), arg(args, 1)) {
        (Value::String(s), Value::String(suffix)) => slot(s.ends_with(&suffix)),
        _ => null(),
    }
}

/// Split on the printed form of the separator, or into characters.
fn builtin_split(args: &[ValueRef]) -> NativeResult {
    let Value::String(s) = arg(args, 0) else {
        return null();
    };
    let parts: Vec<String> = match args.get(1) {
        Some(separator) => {
            let separator = separator.get().to_string();
            if separator.is_empty() {
                s.chars().map(String::from).collect()
            } else {
                s.split(separator.as_str()).map(String::from).collect()
            }
        }
        None => s.chars().map(String::from).collect(),
    };
    slot(Array::String(parts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> NativeResult {
        let stdlib = standard_library();
        let func = stdlib.scope().function(name).unwrap();
        let args: Vec<ValueRef> = args.iter().cloned().map(ValueRef::new).collect();
        let interp = Interpreter::new(Privilege::UNRESTRICTED);
        call_function(&interp, &func, interp.global(), &args, None)
    }

    fn value(name: &str, args: &[Value]) -> Value {
        call(name, args).unwrap().get()
    }

    #[test]
    fn test_operator_table_is_complete() {
        let stdlib = standard_library();
        for op in ["=", "+", "-", "*", "/", "%", "==", "<", "&&", "++", "+=", "!"] {
            assert!(stdlib.scope().function(op).is_some(), "missing {op}");
        }
    }

    #[test]
    fn test_assign_writes_through() {
        let target = ValueRef::new(Value::Int(1));
        let result = builtin_assign(&[target.clone(), ValueRef::new(Value::Int(9))]).unwrap();
        assert!(result.ptr_eq(&target));
        assert_eq!(target.get(), Value::Int(9));
    }

    #[test]
    fn test_prefix_and_postfix_increment() {
        let target = ValueRef::new(Value::Int(1));
        let old = builtin_increment(&[target.clone()]).unwrap();
        assert_eq!(old.get(), Value::Int(1));
        let new = builtin_increment(&[ValueRef::null(), target.clone()]).unwrap();
        assert!(new.ptr_eq(&target));
        assert_eq!(target.get(), Value::Int(3));
    }

    #[test]
    fn test_equality_requires_same_kind() {
        assert_eq!(value("==", &[Value::Int(1), Value::Float(1.0)]), Value::Int(0));
        assert_eq!(value("!=", &[Value::Int(1), Value::Float(1.0)]), Value::Int(1));
        assert_eq!(value("==", &[Value::Float(1.0), Value::Float(1.0)]), Value::Int(1));
        assert_eq!(
            value("==", &[Value::Int(1), Value::Vec3(Vec3::new(1.0, 1.0, 1.0))]),
            Value::Int(0)
        );
        assert_eq!(value("==", &[Value::Int(1), Value::from("1")]), Value::Int(0));
        assert_eq!(value("!=", &[Value::Int(1), Value::Int(2)]), Value::Int(1));
        assert_eq!(value("==", &[Value::Null, Value::Int(0)]), Value::Int(0));
        assert_eq!(value("==", &[Value::Null, Value::Null]), Value::Int(1));
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(value("-", &[Value::Float(2.5)]), Value::Float(-2.5));
    }

    #[test]
    fn test_listindex() {
        let list = Value::from(vec![Value::Int(1), Value::from("a")]);
        assert_eq!(value("listindex", &[list, Value::Int(1)]), Value::from("a"));

        let err = call("listindex", &[Value::from("ab"), Value::Int(5)]).unwrap_err();
        assert_eq!(err.to_string(), "Out of bounds array access index 5, array length 2");
    }

    #[test]
    fn test_make_list_picks_array_when_homogeneous() {
        assert_eq!(
            value("[]", &[Value::Int(1), Value::Int(2)]).type_of(),
            Type::Array
        );
        assert_eq!(
            value("[]", &[Value::Int(1), Value::from("x")]).type_of(),
            Type::List
        );
        assert_eq!(value("[]", &[]).type_of(), Type::List);
    }

    #[test]
    fn test_range_is_inclusive_both_ways() {
        assert_eq!(
            value("range", &[Value::Int(1), Value::Int(3)]),
            Value::Array(Array::Int(vec![1, 2, 3]))
        );
        assert_eq!(
            value("range", &[Value::Int(3), Value::Int(1)]),
            Value::Array(Array::Int(vec![3, 2, 1]))
        );
        assert_eq!(
            value("range", &[Value::from("hello"), Value::Int(1), Value::Int(3)]),
            Value::from("el")
        );
    }

    #[test]
    fn test_range_refuses_huge_spans() {
        let err = call("range", &[Value::Int(0), Value::Int(i64::MAX)]).unwrap_err();
        assert!(matches!(err, EvalError::Value(ValueError::RangeTooLarge { .. })));
        let err = call("range", &[Value::Int(i64::MIN), Value::Int(i64::MAX)]).unwrap_err();
        assert!(matches!(err, EvalError::Value(ValueError::RangeTooLarge { .. })));
        let err = call("range", &[Value::Float(0.0), Value::Float(1e300)]).unwrap_err();
        assert!(matches!(err, EvalError::Value(ValueError::RangeTooLarge { .. })));
        let err = call("range", &[Value::Float(0.0), Value::Float(f64::NAN)]).unwrap_err();
        assert!(matches!(err, EvalError::Value(ValueError::RangeTooLarge { .. })));

        let floats = value("range", &[Value::Float(0.5), Value::Float(2.5)]);
        assert_eq!(floats, Value::Array(Array::Float(vec![0.5, 1.5, 2.5])));
    }

    #[test]
    fn test_find_and_contains() {
        let array = Value::Array(Array::Int(vec![4, 5, 6]));
        assert_eq!(value("find", &[array.clone(), Value::Int(6)]), Value::Int(2));
        assert!(value("find", &[array.clone(), Value::Int(7)]).is_null());
        assert_eq!(value("contains", &[array, Value::Float(5.0)]), Value::Int(1));
        assert_eq!(value("contains", &[Value::from("abc"), Value::from("bc")]), Value::Int(1));
        assert_eq!(value("contains", &[Value::Null, Value::Int(1)]), Value::Int(0));
    }

    #[test]
    fn test_pushback_mutates_in_place() {
        let target = ValueRef::new(Value::Array(Array::Int(vec![1])));
        builtin_pushback(&[target.clone(), ValueRef::new(Value::Int(2))]).unwrap();
        builtin_pushback(&[target.clone(), ValueRef::new(Value::from("x"))]).unwrap();
        assert_eq!(target.get(), Value::Array(Array::Int(vec![1, 2])));
    }

    #[test]
    fn test_sort_list_in_place() {
        let target = ValueRef::new(Value::from(vec![Value::Int(3), Value::Int(1), Value::Int(2)]));
        let result = builtin_sort(&[target.clone()]).unwrap();
        assert!(result.ptr_eq(&target));
        assert_eq!(
            target.get(),
            Value::from(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn test_missing_arguments_yield_null() {
        assert!(value("sqrt", &[]).is_null());
        assert!(value("startswith", &[Value::from("a")]).is_null());
        assert!(value("abs", &[Value::from("a")]).is_null());
    }

    #[test]
    fn test_min_max_promote() {
        assert_eq!(value("max", &[Value::Int(2), Value::Float(2.5)]), Value::Float(2.5));
        assert_eq!(value("min", &[Value::Int(2), Value::Int(-1)]), Value::Int(-1));
    }

    #[test]
    fn test_split_and_replace() {
        assert_eq!(
            value("split", &[Value::from("a,b"), Value::from(",")]),
            Value::Array(Array::String(vec!["a".into(), "b".into()]))
        );
        assert_eq!(
            value("replace", &[Value::from("aaa"), Value::from("a"), Value::from("bb")]),
            Value::from("bbbbbb")
        );
    }

    #[test]
    fn test_getduration() {
        assert_eq!(
            value("getduration", &[Value::Int(0), Value::Int(1_500_000_000)]),
            Value::Float(1.5)
        );
    }
}
