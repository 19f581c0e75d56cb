//! Loop evaluation

use crate::expression::Expression;
use crate::interpreter::Interpreter;
use crate::value::{Value, ValueRef};
use crate::EvalError;

use super::{eval_block, Evaluate, Frame};

// ═══════════════════════════════════════════════════════════════════════
// for / while
// ═══════════════════════════════════════════════════════════════════════

/// Evaluate a `for`/`while` loop.
///
/// `init` runs once in the loop's own scope, so a variable it defines is
/// visible to the test, the body and the iterate clause but not after the
/// loop. Each pass runs the body in a fresh child of that scope. A missing
/// test loops until a `return`, an interrupt or the statement budget stops it.
pub fn eval_loop(
    init: Option<&Expression>,
    test: Option<&Expression>,
    iterate: Option<&Expression>,
    body: &[Expression],
    interp: &Interpreter,
    frame: &Frame,
) -> Result<ValueRef, EvalError> {
    let frame = frame.child("loop");
    if let Some(init) = init {
        init.eval(interp, &frame)?;
    }

    loop {
        interp.tick()?;

        if let Some(test) = test {
            if !test.eval(interp, &frame)?.truthy() {
                break;
            }
        }

        eval_block(body, interp, &frame.child("body"))?;

        if let Some(iterate) = iterate {
            iterate.eval(interp, &frame)?;
        }
    }

    Ok(ValueRef::null())
}

// ═══════════════════════════════════════════════════════════════════════
// foreach
// ═══════════════════════════════════════════════════════════════════════

/// Evaluate `foreach (name; iterable)`.
///
/// The iterable is evaluated once. List elements and dictionary values are
/// bound as their own slots, so assigning to `name` writes into the
/// collection; array elements and string characters are bound as copies.
pub fn eval_foreach(
    name: &str,
    iterable: &Expression,
    body: &[Expression],
    interp: &Interpreter,
    frame: &Frame,
) -> Result<ValueRef, EvalError> {
    let collection = iterable.eval(interp, frame)?.get();
    let items: Vec<ValueRef> = match &collection {
        Value::Array(array) => array.iter().map(ValueRef::new).collect(),
        Value::List(list) => list.clone(),
        Value::Dictionary(dict) => dict.read().values().cloned().collect(),
        Value::String(text) => text
            .chars()
            .map(|c| ValueRef::new(Value::String(c.to_string())))
            .collect(),
        other => {
            return Err(EvalError::type_error(format!(
                "cannot iterate over a `{}`",
                other.type_of()
            )))
        }
    };

    for item in items {
        interp.tick()?;
        let iteration = frame.child("foreach");
        iteration.scope.insert_variable(name, item);
        eval_block(body, interp, &iteration)?;
    }

    Ok(ValueRef::null())
}
