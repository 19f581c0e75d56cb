//! Precedence-climbing expression parser
//!
//! Operators are not hard-coded: each operator token is looked up in the
//! standard library scope, and the resulting function's precedence drives
//! the climb. The parsed tree calls those functions directly.

use crate::error::ParseError;
use crate::expression::{Callee, Expression};
use crate::scope::ScopeRef;
use crate::value::{FunctionRef, Precedence, Value};

use super::lexer::Token;

/// Parse a complete token slice as one expression.
///
/// # Errors
///
/// Fails on malformed input, on tokens left over after the expression, on
/// operators the standard library does not define, and when nesting exceeds
/// `max_depth`.
pub fn parse_expression(
    tokens: &[Token],
    operators: &ScopeRef,
    max_depth: usize,
) -> Result<Expression, ParseError> {
    let mut parser = ExprParser {
        tokens,
        pos: 0,
        depth: 0,
        max_depth,
        operators,
    };
    let expr = parser.parse_expr(Precedence::Assign)?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(ParseError::UnexpectedToken {
            token: token.to_string(),
        }),
    }
}

struct ExprParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    max_depth: usize,
    operators: &'a ScopeRef,
}

impl<'a> ExprParser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_punct(&mut self, c: char) -> Result<(), ParseError> {
        match self.next() {
            Some(token) if token.is_punct(c) => Ok(()),
            Some(token) => Err(ParseError::UnexpectedToken {
                token: token.to_string(),
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn operator(&self, name: &str) -> Result<FunctionRef, ParseError> {
        self.operators
            .function(name)
            .ok_or_else(|| ParseError::UnknownOperator(name.to_string()))
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::TooDeep {
                max: self.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // ═══════════════════════════════════════════════════════════════════
    // Binary operators
    // ═══════════════════════════════════════════════════════════════════

    /// Each operator applied in the loop nests `lhs` one level deeper, so it
    /// counts against the depth limit until the whole chain is done.
    fn parse_expr(&mut self, min: Precedence) -> Result<Expression, ParseError> {
        self.enter()?;
        let mut lhs = self.parse_unary()?;
        let mut wrapped = 0;

        while let Some(Token::Op(op)) = self.peek() {
            // Only ever prefix or postfix
            if matches!(*op, "!" | "++" | "--") {
                break;
            }
            let func = self.operator(op)?;
            let precedence = func.precedence();
            if precedence < min {
                break;
            }
            self.pos += 1;
            self.enter()?;
            wrapped += 1;

            let next_min = if precedence.is_right_associative() {
                precedence
            } else {
                precedence.tighter()
            };
            let rhs = self.parse_expr(next_min)?;
            lhs = Expression::call(func, vec![lhs, rhs]);
        }

        self.depth -= wrapped;
        self.leave();
        Ok(lhs)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Prefix operators
    // ═══════════════════════════════════════════════════════════════════

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        let op = match self.peek() {
            Some(Token::Op(op)) => *op,
            _ => return self.parse_postfix(),
        };
        self.pos += 1;
        let operand = self.parse_expr(Precedence::IncDec)?;

        match op {
            "-" => match operand {
                Expression::Value(Value::Int(i)) => Ok(Expression::Value(Value::Int(-i))),
                Expression::Value(Value::Float(x)) => Ok(Expression::Value(Value::Float(-x))),
                operand => Ok(Expression::call(self.operator("-")?, vec![operand])),
            },
            "!" => Ok(Expression::call(self.operator("!")?, vec![operand])),
            // Prefix form: a leading null marks it apart from postfix
            "++" | "--" => Ok(Expression::call(
                self.operator(op)?,
                vec![Expression::Value(Value::Null), operand],
            )),
            other => Err(ParseError::UnexpectedToken {
                token: other.to_string(),
            }),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Postfix forms
    // ═══════════════════════════════════════════════════════════════════

    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_primary()?;
        let mut wrapped = 0;

        loop {
            let postfix = matches!(
                self.peek(),
                Some(Token::Punct('(' | '[' | '.') | Token::Op("++" | "--"))
            );
            if postfix {
                self.enter()?;
                wrapped += 1;
            }
            match self.peek() {
                Some(Token::Punct('(')) => {
                    self.pos += 1;
                    let args = self.parse_args(')')?;
                    expr = Expression::FunctionCall {
                        callee: Callee::Expression(Box::new(expr)),
                        args,
                    };
                }
                Some(Token::Punct('[')) => {
                    self.pos += 1;
                    let index = self.parse_expr(Precedence::Assign)?;
                    self.expect_punct(']')?;
                    expr = Expression::call(self.operator("listindex")?, vec![expr, index]);
                }
                Some(Token::Punct('.')) => {
                    self.pos += 1;
                    let name = match self.next() {
                        Some(Token::Ident(name)) => name.clone(),
                        Some(token) => {
                            return Err(ParseError::UnexpectedToken {
                                token: token.to_string(),
                            })
                        }
                        None => return Err(ParseError::UnexpectedEnd),
                    };
                    if self.peek().is_some_and(|t| t.is_punct('(')) {
                        self.pos += 1;
                        let args = self.parse_args(')')?;
                        expr = Expression::MemberFunctionCall {
                            object: Box::new(expr),
                            name,
                            args,
                        };
                    } else {
                        expr = Expression::MemberVariable {
                            object: Box::new(expr),
                            name,
                        };
                    }
                }
                Some(Token::Op(op @ ("++" | "--"))) => {
                    self.pos += 1;
                    expr = Expression::call(self.operator(op)?, vec![expr]);
                }
                _ => break,
            }
        }

        self.depth -= wrapped;
        Ok(expr)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Primary expressions
    // ═══════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let token = self.next().ok_or(ParseError::UnexpectedEnd)?;
        match token {
            Token::Int(i) => Ok(Expression::Value(Value::Int(*i))),
            Token::Float(x) => Ok(Expression::Value(Value::Float(*x))),
            Token::Str(s) => Ok(Expression::Value(Value::String(s.clone()))),
            Token::Ident(name) => match name.as_str() {
                "true" => Ok(Expression::Value(Value::Int(1))),
                "false" => Ok(Expression::Value(Value::Int(0))),
                "null" => Ok(Expression::Value(Value::Null)),
                _ if self.peek().is_some_and(|t| t.is_punct('(')) => {
                    self.pos += 1;
                    let args = self.parse_args(')')?;
                    Ok(Expression::call_named(name.clone(), args))
                }
                _ => Ok(Expression::ResolveVar(name.clone())),
            },
            Token::Punct('(') => {
                let inner = self.parse_expr(Precedence::Assign)?;
                self.expect_punct(')')?;
                Ok(inner)
            }
            Token::Punct('[') => {
                let elements = self.parse_args(']')?;
                Ok(Expression::call(self.operator("[]")?, elements))
            }
            other => Err(ParseError::UnexpectedToken {
                token: other.to_string(),
            }),
        }
    }

    /// Comma-separated expressions up to `close`; the opener is consumed.
    fn parse_args(&mut self, close: char) -> Result<Vec<Expression>, ParseError> {
        let mut args = Vec::new();
        if self.peek().is_some_and(|t| t.is_punct(close)) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr(Precedence::Assign)?);
            match self.next() {
                Some(token) if token.is_punct(',') => continue,
                Some(token) if token.is_punct(close) => return Ok(args),
                Some(token) => {
                    return Err(ParseError::UnexpectedToken {
                        token: token.to_string(),
                    })
                }
                None => return Err(ParseError::UnexpectedEnd),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::prelude::standard_library;
    use crate::parser::lexer::tokenize;

    fn parse(text: &str) -> Result<Expression, ParseError> {
        let stdlib = standard_library();
        parse_expression(&tokenize(text).unwrap(), stdlib.scope(), 64)
    }

    fn callee_name(expr: &Expression) -> Option<&str> {
        match expr {
            Expression::FunctionCall {
                callee: Callee::Function(func),
                ..
            } => Some(func.name()),
            Expression::FunctionCall {
                callee: Callee::Named(name),
                ..
            } => Some(name.as_str()),
            _ => None,
        }
    }

    #[test]
    fn test_mul_binds_tighter_than_add() {
        let expr = parse("1 + 2 * 3").unwrap();
        assert_eq!(callee_name(&expr), Some("+"));
        assert_eq!(callee_name(expr.back().unwrap()), Some("*"));
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        let expr = parse("8 - 4 - 2").unwrap();
        assert_eq!(callee_name(&expr), Some("-"));
        assert_eq!(callee_name(expr.first().unwrap()), Some("-"));
        assert!(matches!(expr.back(), Some(Expression::Value(Value::Int(2)))));
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let expr = parse("a = b = 1").unwrap();
        assert_eq!(callee_name(&expr), Some("="));
        assert!(matches!(expr.first(), Some(Expression::ResolveVar(_))));
        assert_eq!(callee_name(expr.back().unwrap()), Some("="));
    }

    #[test]
    fn test_negative_literal_is_folded() {
        let expr = parse("-5").unwrap();
        assert!(matches!(expr, Expression::Value(Value::Int(-5))));
    }

    #[test]
    fn test_prefix_and_postfix_increment() {
        let prefix = parse("++i").unwrap();
        assert_eq!(prefix.children().len(), 2);
        let postfix = parse("i++").unwrap();
        assert_eq!(postfix.children().len(), 1);
    }

    #[test]
    fn test_member_access_and_calls() {
        let expr = parse("p.move(1, 2)").unwrap();
        assert!(matches!(
            &expr,
            Expression::MemberFunctionCall { name, args, .. } if name == "move" && args.len() == 2
        ));
        let expr = parse("p.x").unwrap();
        assert!(matches!(expr, Expression::MemberVariable { .. }));
    }

    #[test]
    fn test_index_becomes_listindex() {
        let expr = parse("xs[1 + 1]").unwrap();
        assert_eq!(callee_name(&expr), Some("listindex"));
    }

    #[test]
    fn test_list_literal() {
        let expr = parse("[1, 2, 3]").unwrap();
        assert_eq!(callee_name(&expr), Some("[]"));
        assert_eq!(expr.children().len(), 3);
    }

    #[test]
    fn test_named_call() {
        let expr = parse("max(1, 2)").unwrap();
        assert_eq!(callee_name(&expr), Some("max"));
    }

    #[test]
    fn test_leftover_tokens() {
        assert!(matches!(
            parse("1 2"),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_unbalanced_paren() {
        assert!(matches!(parse("(1 + 2"), Err(ParseError::UnexpectedEnd)));
    }

    #[test]
    fn test_nesting_guard() {
        let stdlib = standard_library();
        let nested = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        let flat = format!("{}1", "1 + ".repeat(20));
        let right = format!("{}1", "x = ".repeat(20));
        let indexed = format!("x{}", "[0]".repeat(20));
        let called = format!("f{}", "()".repeat(20));
        let members = format!("x{}", ".y".repeat(20));
        let bumped = format!("x{}", "++".repeat(20));
        for text in [nested, flat, right, indexed, called, members, bumped] {
            let tokens = tokenize(&text).unwrap();
            assert!(
                matches!(
                    parse_expression(&tokens, stdlib.scope(), 8),
                    Err(ParseError::TooDeep { max: 8 })
                ),
                "{text}"
            );
        }
    }

    #[test]
    fn test_chains_within_limit_parse() {
        let stdlib = standard_library();
        for text in ["1 + 2 + 3 + 4", "x[0][1].y(2)", "a = b = c"] {
            let tokens = tokenize(text).unwrap();
            assert!(parse_expression(&tokens, stdlib.scope(), 8).is_ok(), "{text}");
        }
    }
}
