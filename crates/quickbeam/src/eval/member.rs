//! Member access and method call evaluation

use crate::expression::Expression;
use crate::interpreter::Interpreter;
use crate::value::{ClassRef, FunctionRef, Value, ValueRef};
use crate::EvalError;

use super::{call_function, eval_args, Evaluate, Frame};

/// Evaluate `object.name(args)`.
///
/// A class instance that defines `name` as a method (or holds a function in a
/// member of that name) receives the call with itself as class context. Any
/// other receiver is passed as the first argument to the function `name`
/// resolved from the calling frame, so `list.length()` is `length(list)`.
pub fn eval_member_call(
    object: &Expression,
    name: &str,
    args: &[Expression],
    interp: &Interpreter,
    frame: &Frame,
) -> Result<ValueRef, EvalError> {
    let receiver = object.eval(interp, frame)?;
    let instance = receiver.read().as_class().cloned();

    if let Some(instance) = instance {
        if let Some(method) = find_method(&instance, name) {
            let args = eval_args(args, interp, frame)?;
            return call_function(interp, &method, &frame.scope, &args, Some(&instance));
        }
    }

    let func = interp.resolve_callable_in(name, frame)?;
    let mut call_args = Vec::with_capacity(args.len() + 1);
    call_args.push(receiver);
    for arg in args {
        call_args.push(arg.eval(interp, frame)?);
    }
    call_function(interp, &func, &frame.scope, &call_args, frame.class.as_ref())
}

fn find_method(instance: &ClassRef, name: &str) -> Option<FunctionRef> {
    instance.function_scope().function(name).or_else(|| {
        instance
            .variable(name)
            .and_then(|slot| slot.read().as_function().cloned())
    })
}

/// Evaluate `object.name`.
///
/// Class instances yield the member slot; dictionaries yield the slot keyed
/// by the string `name`, inserting `null` if it is missing.
pub fn eval_member_variable(
    object: &Expression,
    name: &str,
    interp: &Interpreter,
    frame: &Frame,
) -> Result<ValueRef, EvalError> {
    let receiver = object.eval(interp, frame)?;
    let receiver = receiver.get();
    match &receiver {
        Value::Class(instance) => {
            instance
                .variable(name)
                .ok_or_else(|| EvalError::UnknownMember {
                    class: instance.name().to_string(),
                    name: name.to_string(),
                })
        }
        Value::Dictionary(dict) => Ok(dict.write().entry(Value::String(name.to_string()))?),
        other => Err(EvalError::type_error(format!(
            "cannot access member `{}` of a `{}`",
            name,
            other.type_of()
        ))),
    }
}
