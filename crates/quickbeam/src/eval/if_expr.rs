//! If expression evaluation

use crate::expression::IfBranch;
use crate::interpreter::Interpreter;
use crate::value::ValueRef;
use crate::EvalError;

use super::{eval_block, Evaluate, Frame};

/// Evaluate an if-chain.
///
/// Branches are tried in order; the first whose test is truthy, or the first
/// unconditional one, runs in a fresh child scope. If none runs the result is
/// `null`.
pub fn eval_if(
    branches: &[IfBranch],
    interp: &Interpreter,
    frame: &Frame,
) -> Result<ValueRef, EvalError> {
    for branch in branches {
        let taken = match &branch.test {
            Some(test) => test.eval(interp, frame)?.truthy(),
            None => true,
        };
        if taken {
            return eval_block(&branch.body, interp, &frame.child("if"));
        }
    }
    Ok(ValueRef::null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Expression;
    use crate::value::Value;
    use crate::Privilege;

    fn chain(test: i64) -> Expression {
        Expression::IfElse {
            branches: vec![
                IfBranch {
                    test: Some(Expression::literal(test)),
                    body: vec![Expression::literal("then")],
                },
                IfBranch {
                    test: None,
                    body: vec![Expression::literal("else")],
                },
            ],
        }
    }

    #[test]
    fn test_if_true_takes_first_branch() {
        let interp = Interpreter::new(Privilege::UNRESTRICTED);
        let frame = Frame::new(interp.global().clone());
        let result = chain(1).eval(&interp, &frame).unwrap();
        assert_eq!(result.get(), Value::from("then"));
    }

    #[test]
    fn test_if_false_takes_else() {
        let interp = Interpreter::new(Privilege::UNRESTRICTED);
        let frame = Frame::new(interp.global().clone());
        let result = chain(0).eval(&interp, &frame).unwrap();
        assert_eq!(result.get(), Value::from("else"));
    }

    #[test]
    fn test_branch_scope_is_discarded() {
        let interp = Interpreter::new(Privilege::UNRESTRICTED);
        let frame = Frame::new(interp.global().clone());
        let expr = Expression::block(vec![Expression::DefineVar {
            name: "inner".into(),
            init: None,
        }]);
        expr.eval(&interp, &frame).unwrap();
        assert!(frame.scope.resolve_variable("inner").is_none());
    }
}
