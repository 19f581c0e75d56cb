//! Variable and function definition evaluation

use std::sync::Arc;

use crate::expression::Expression;
use crate::interpreter::Interpreter;
use crate::value::{Function, FunctionType, Value, ValueRef};
use crate::EvalError;

use super::{Evaluate, Frame};

/// Evaluate `var name [= init]`.
///
/// The variable always gets a fresh slot in the frame's innermost scope,
/// replacing any binding of the same name there and shadowing outer ones.
pub fn eval_define_var(
    name: &str,
    init: Option<&Expression>,
    interp: &Interpreter,
    frame: &Frame,
) -> Result<ValueRef, EvalError> {
    let value = match init {
        Some(expr) => expr.eval(interp, frame)?.get(),
        None => Value::Null,
    };
    Ok(frame.scope.insert_variable(name, ValueRef::new(value)))
}

/// Evaluate a function definition, registering the function.
///
/// The function closes over the frame's scope. Constructors are defined
/// while a class scope is current and are registered next to the class
/// scope, in its parent, so the class name is callable from outside.
pub fn eval_function_def(
    name: &str,
    arg_names: &[String],
    kind: FunctionType,
    body: &Arc<Vec<Expression>>,
    frame: &Frame,
) -> Result<ValueRef, EvalError> {
    let func = Function::script(name, kind, arg_names.to_vec(), body.clone(), &frame.scope);

    let target = match kind {
        FunctionType::Constructor => frame.scope.parent().unwrap_or_else(|| frame.scope.clone()),
        FunctionType::Free | FunctionType::Member => frame.scope.clone(),
    };
    target.insert_function(func.clone());

    Ok(ValueRef::new(Value::Function(func)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;
    use crate::Privilege;

    #[test]
    fn test_define_var_shadows_outer() {
        let interp = Interpreter::new(Privilege::UNRESTRICTED);
        let outer = interp.global().clone();
        let outer_slot = outer.insert_variable("x", Value::Int(1).into());
        let frame = Frame::new(outer).child("inner");

        eval_define_var("x", Some(&Expression::literal(2i64)), &interp, &frame).unwrap();
        assert_eq!(frame.scope.variable("x").unwrap().get(), Value::Int(2));
        assert_eq!(outer_slot.get(), Value::Int(1));
    }

    #[test]
    fn test_define_var_without_init_is_null() {
        let interp = Interpreter::new(Privilege::UNRESTRICTED);
        let frame = Frame::new(interp.global().clone());
        let slot = eval_define_var("x", None, &interp, &frame).unwrap();
        assert!(slot.get().is_null());
    }

    #[test]
    fn test_constructor_registers_in_parent() {
        let interp = Interpreter::new(Privilege::UNRESTRICTED);
        let class_scope = Scope::new_class_scope(interp.global(), "Point");
        let frame = Frame::new(class_scope.clone());

        eval_function_def(
            "Point",
            &[],
            FunctionType::Constructor,
            &Arc::new(vec![]),
            &frame,
        )
        .unwrap();
        assert!(interp.global().function("Point").is_some());
        assert!(class_scope.function("Point").is_none());
    }
}
