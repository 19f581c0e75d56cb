//! Function call evaluation

use crate::eval::control::ControlFlow;
use crate::expression::{Callee, Expression};
use crate::interpreter::Interpreter;
use crate::scope::{Scope, ScopeRef};
use crate::value::{Class, ClassRef, FunctionBody, FunctionRef, FunctionType, Value, ValueRef};
use crate::EvalError;

use super::{eval_args, eval_block, Evaluate, Frame};

/// Evaluate a call node.
pub fn eval_call(
    callee: &Callee,
    args: &[Expression],
    interp: &Interpreter,
    frame: &Frame,
) -> Result<ValueRef, EvalError> {
    let func = match callee {
        Callee::Function(func) => func.clone(),
        Callee::Named(name) => interp.resolve_callable_in(name, frame)?,
        Callee::Expression(expr) => {
            let target = expr.eval(interp, frame)?;
            let target = target.read();
            match &*target {
                Value::Function(func) => func.clone(),
                other => return Err(EvalError::NotCallable(other.type_of())),
            }
        }
    };

    let args = eval_args(args, interp, frame)?;

    // Methods called by bare name from inside a method keep the receiver
    let class = match func.kind() {
        FunctionType::Member => frame.class.as_ref(),
        _ => None,
    };
    call_function(interp, &func, &frame.scope, &args, class)
}

/// Call a function with already evaluated arguments.
///
/// `scope` is the calling scope: native callbacks see it, and script bodies
/// fall back to it when their defining scope no longer exists. `class` is
/// the receiving instance for member functions.
///
/// # Errors
///
/// Returns `ArityMismatch` if a script function gets the wrong number of
/// arguments, `StackOverflow` past the configured call depth, and whatever
/// the body itself raises.
pub fn call_function(
    interp: &Interpreter,
    func: &FunctionRef,
    scope: &ScopeRef,
    args: &[ValueRef],
    class: Option<&ClassRef>,
) -> Result<ValueRef, EvalError> {
    if interp.context().trace {
        tracing::trace!(function = func.name(), args = args.len(), "call");
    }

    match func.kind() {
        FunctionType::Constructor => construct(interp, func, scope, args),
        FunctionType::Member => invoke(interp, func, scope, args, class),
        FunctionType::Free => invoke(interp, func, scope, args, None),
    }
}

/// Build an instance from the constructor's class scope, then run the
/// constructor against it.
fn construct(
    interp: &Interpreter,
    func: &FunctionRef,
    scope: &ScopeRef,
    args: &[ValueRef],
) -> Result<ValueRef, EvalError> {
    let class_scope = func
        .scope()
        .filter(|s| s.is_class_scope())
        .ok_or_else(|| {
            EvalError::type_error(format!("constructor `{}` has no class scope", func.name()))
        })?;

    let instance = Class::from_scope(&class_scope);
    invoke(interp, func, scope, args, Some(&instance))?;
    Ok(ValueRef::new(Value::Class(instance)))
}

fn invoke(
    interp: &Interpreter,
    func: &FunctionRef,
    scope: &ScopeRef,
    args: &[ValueRef],
    class: Option<&ClassRef>,
) -> Result<ValueRef, EvalError> {
    match func.body() {
        FunctionBody::Native(callback) => callback(args),
        FunctionBody::Scoped(callback) => callback(interp, scope, args),
        FunctionBody::Class(callback) => callback(interp, class, scope, args),
        FunctionBody::Script(body) => call_script(interp, func, body, scope, args, class),
    }
}

/// Call a script function.
fn call_script(
    interp: &Interpreter,
    func: &FunctionRef,
    body: &[Expression],
    caller: &ScopeRef,
    args: &[ValueRef],
    class: Option<&ClassRef>,
) -> Result<ValueRef, EvalError> {
    // Check arity
    let params = func.arg_names();
    if args.len() != params.len() {
        return Err(EvalError::ArityMismatch {
            name: func.name().to_string(),
            expected: params.len(),
            got: args.len(),
        });
    }

    // Track call depth (stack overflow protection)
    interp.enter_call()?;

    // The body runs in a child of the defining scope; a host-created class
    // scope or a closed block may have gone away, so use the caller instead
    let parent = func.scope().unwrap_or_else(|| caller.clone());
    let frame = Frame::with_class(Scope::child(&parent, func.name()), class.cloned());

    // Bind parameters to copies of the arguments
    for (param, arg) in params.iter().zip(args) {
        frame.scope.insert_variable(param.as_str(), ValueRef::new(arg.get()));
    }

    let result = eval_block(body, interp, &frame);

    interp.exit_call();

    // Handle return control flow
    match result {
        Ok(_) => Ok(ValueRef::null()),
        Err(EvalError::ControlFlow(cf)) => Ok(cf.into_value()),
        Err(e) => Err(e),
    }
}
