//! Expression evaluation

pub mod call;
pub mod control;
pub mod if_expr;
pub mod loops;
pub mod member;
pub mod return_expr;
pub mod var;

use crate::expression::Expression;
use crate::interpreter::Interpreter;
use crate::scope::{Scope, ScopeRef};
use crate::value::{ClassRef, ValueRef};
use crate::EvalError;

/// Where an expression is evaluated: a scope, and the class instance whose
/// members shadow that scope's chain when running a method or constructor.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Innermost scope
    pub scope: ScopeRef,
    /// Receiving instance, if any
    pub class: Option<ClassRef>,
}

impl Frame {
    /// Frame over a scope with no class context.
    pub fn new(scope: ScopeRef) -> Self {
        Frame { scope, class: None }
    }

    /// Frame over a scope with an optional class context.
    pub fn with_class(scope: ScopeRef, class: Option<ClassRef>) -> Self {
        Frame { scope, class }
    }

    /// Frame over a fresh child scope, keeping the class context.
    pub fn child(&self, name: &str) -> Self {
        Frame {
            scope: Scope::child(&self.scope, name),
            class: self.class.clone(),
        }
    }
}

/// Trait for evaluating expression nodes to value slots.
///
/// This is the core abstraction for the tree-walking interpreter. Results are
/// slots rather than plain values so that assignment operators can write
/// through variables, list elements and members.
pub trait Evaluate {
    /// Evaluate this node in the given frame.
    fn eval(&self, interp: &Interpreter, frame: &Frame) -> Result<ValueRef, EvalError>;
}

// ═══════════════════════════════════════════════════════════════════════
// Main Expression Dispatcher
// ═══════════════════════════════════════════════════════════════════════

impl Evaluate for Expression {
    fn eval(&self, interp: &Interpreter, frame: &Frame) -> Result<ValueRef, EvalError> {
        match self {
            // Each evaluation of a literal yields its own slot
            Expression::Value(value) => Ok(ValueRef::new(value.clone())),

            Expression::ResolveVar(name) => interp.resolve_in(name, frame),
            Expression::DefineVar { name, init } => {
                var::eval_define_var(name, init.as_deref(), interp, frame)
            }
            Expression::FunctionDef {
                name,
                arg_names,
                kind,
                body,
            } => var::eval_function_def(name, arg_names, *kind, body, frame),

            Expression::FunctionCall { callee, args } => {
                call::eval_call(callee, args, interp, frame)
            }
            Expression::MemberFunctionCall { object, name, args } => {
                member::eval_member_call(object, name, args, interp, frame)
            }
            Expression::MemberVariable { object, name } => {
                member::eval_member_variable(object, name, interp, frame)
            }

            Expression::Return(value) => {
                return_expr::eval_return(value.as_deref(), interp, frame)
            }
            Expression::Loop {
                init,
                test,
                iterate,
                body,
            } => loops::eval_loop(
                init.as_deref(),
                test.as_deref(),
                iterate.as_deref(),
                body,
                interp,
                frame,
            ),
            Expression::ForEach {
                name,
                iterable,
                body,
            } => loops::eval_foreach(name, iterable, body, interp, frame),
            Expression::IfElse { branches } => if_expr::eval_if(branches, interp, frame),
        }
    }
}

/// Evaluate statements in order, returning the slot of the last one.
///
/// Every statement counts against the interrupt flag and statement budget.
pub fn eval_block(
    body: &[Expression],
    interp: &Interpreter,
    frame: &Frame,
) -> Result<ValueRef, EvalError> {
    let mut last = ValueRef::null();
    for statement in body {
        interp.tick()?;
        last = statement.eval(interp, frame)?;
    }
    Ok(last)
}

/// Evaluate call arguments to slots, left to right.
pub(crate) fn eval_args(
    args: &[Expression],
    interp: &Interpreter,
    frame: &Frame,
) -> Result<Vec<ValueRef>, EvalError> {
    args.iter().map(|arg| arg.eval(interp, frame)).collect()
}

// Re-export for use by other modules
pub use call::call_function;
pub use control::ControlFlow;
