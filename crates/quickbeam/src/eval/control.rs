//! Control flow mechanism for `return`

use crate::value::ValueRef;

/// Control flow signal for non-local jumps.
///
/// When `return` is evaluated it does not produce a normal
/// `Result<ValueRef, EvalError>`. Instead it produces an
/// `Err(EvalError::ControlFlow(...))` that propagates through enclosing
/// blocks, branches and loops until the function call boundary catches it.
#[derive(Debug, Clone)]
pub enum ControlFlow {
    /// Return from a function with a value.
    Return {
        /// Value to return from the function
        value: ValueRef,
    },
}

impl ControlFlow {
    /// Create a return.
    pub fn return_value(value: ValueRef) -> Self {
        ControlFlow::Return { value }
    }

    /// The carried value.
    pub fn into_value(self) -> ValueRef {
        match self {
            ControlFlow::Return { value } => value,
        }
    }
}

impl PartialEq for ControlFlow {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ControlFlow::Return { value: v1 }, ControlFlow::Return { value: v2 }) => v1 == v2,
        }
    }
}
