//! Return expression evaluation

use crate::eval::control::ControlFlow;
use crate::expression::Expression;
use crate::interpreter::Interpreter;
use crate::value::ValueRef;
use crate::EvalError;

use super::{Evaluate, Frame};

/// Evaluate `return [value]`.
///
/// The value is copied into a fresh slot so the caller never aliases a local
/// of the returning function.
pub fn eval_return(
    value: Option<&Expression>,
    interp: &Interpreter,
    frame: &Frame,
) -> Result<ValueRef, EvalError> {
    let value = match value {
        Some(expr) => ValueRef::new(expr.eval(interp, frame)?.get()),
        None => ValueRef::null(),
    };

    // Return is implemented as a control flow error
    Err(EvalError::ControlFlow(ControlFlow::Return { value }))
}
