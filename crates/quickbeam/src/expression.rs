//! Expression tree produced by the parser and walked by the evaluator

use std::sync::Arc;

use crate::error::ParseError;
use crate::value::{FunctionRef, FunctionType, Value};

/// One unit of parsed, executable script structure.
///
/// The variant fixes the node kind for its whole life. Nodes that own a body
/// (calls, definitions, loops, if-chains) expose it through the uniform
/// [`children`](Expression::children) view so the parser can append
/// statements without knowing which kind of block is open.
#[derive(Debug, Clone)]
pub enum Expression {
    /// Literal value
    Value(Value),

    /// Variable reference
    ResolveVar(String),

    /// `var name [= init]`
    DefineVar {
        /// Variable name
        name: String,
        /// Initializer
        init: Option<Box<Expression>>,
    },

    /// `fn name(args) { body }`
    FunctionDef {
        /// Function name
        name: String,
        /// Argument names
        arg_names: Vec<String>,
        /// Free, constructor or member
        kind: FunctionType,
        /// Statements, shared with the function once defined
        body: Arc<Vec<Expression>>,
    },

    /// Call with positional arguments
    FunctionCall {
        /// What to call
        callee: Callee,
        /// Argument expressions
        args: Vec<Expression>,
    },

    /// `object.name(args)`
    MemberFunctionCall {
        /// Receiver
        object: Box<Expression>,
        /// Method name
        name: String,
        /// Argument expressions
        args: Vec<Expression>,
    },

    /// `object.name`
    MemberVariable {
        /// Receiver
        object: Box<Expression>,
        /// Member name
        name: String,
    },

    /// `return [value]`
    Return(Option<Box<Expression>>),

    /// `for`/`while` loop
    Loop {
        /// Runs once before the first test
        init: Option<Box<Expression>>,
        /// Loop continues while truthy; absent means forever
        test: Option<Box<Expression>>,
        /// Runs after each pass of the body
        iterate: Option<Box<Expression>>,
        /// Loop body
        body: Vec<Expression>,
    },

    /// `foreach (name; iterable)`
    ForEach {
        /// Name bound to each element
        name: String,
        /// Collection to walk
        iterable: Box<Expression>,
        /// Loop body
        body: Vec<Expression>,
    },

    /// `if`/`else if`/`else` chain
    IfElse {
        /// Branches in source order
        branches: Vec<IfBranch>,
    },
}

/// One arm of an if-chain.
#[derive(Debug, Clone)]
pub struct IfBranch {
    /// Condition; `None` for the final `else` or an anonymous block
    pub test: Option<Expression>,
    /// Statements
    pub body: Vec<Expression>,
}

/// Target of a [`Expression::FunctionCall`].
#[derive(Debug, Clone)]
pub enum Callee {
    /// Resolved at parse time (operators and literals)
    Function(FunctionRef),
    /// Looked up by name when called
    Named(String),
    /// Computed by evaluating an expression
    Expression(Box<Expression>),
}

/// Kind tag of an [`Expression`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionType {
    /// Literal
    Value,
    /// Variable reference
    ResolveVar,
    /// Variable definition
    DefineVar,
    /// Function definition
    FunctionDef,
    /// Call
    FunctionCall,
    /// Method call
    MemberFunctionCall,
    /// Member access
    MemberVariable,
    /// Return
    Return,
    /// Loop
    Loop,
    /// Foreach
    ForEach,
    /// If-chain
    IfElse,
}

impl ExpressionType {
    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            ExpressionType::Value => "value",
            ExpressionType::ResolveVar => "variable",
            ExpressionType::DefineVar => "var",
            ExpressionType::FunctionDef => "function definition",
            ExpressionType::FunctionCall => "call",
            ExpressionType::MemberFunctionCall => "member call",
            ExpressionType::MemberVariable => "member",
            ExpressionType::Return => "return",
            ExpressionType::Loop => "loop",
            ExpressionType::ForEach => "foreach",
            ExpressionType::IfElse => "if",
        }
    }
}

impl Expression {
    /// Literal node.
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Value(value.into())
    }

    /// Call a function resolved ahead of time.
    pub fn call(func: FunctionRef, args: Vec<Expression>) -> Self {
        Expression::FunctionCall {
            callee: Callee::Function(func),
            args,
        }
    }

    /// Call a function by name.
    pub fn call_named(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::FunctionCall {
            callee: Callee::Named(name.into()),
            args,
        }
    }

    /// Anonymous block: a single unconditional branch.
    pub fn block(body: Vec<Expression>) -> Self {
        Expression::IfElse {
            branches: vec![IfBranch { test: None, body }],
        }
    }

    /// Kind tag.
    pub fn kind(&self) -> ExpressionType {
        match self {
            Expression::Value(_) => ExpressionType::Value,
            Expression::ResolveVar(_) => ExpressionType::ResolveVar,
            Expression::DefineVar { .. } => ExpressionType::DefineVar,
            Expression::FunctionDef { .. } => ExpressionType::FunctionDef,
            Expression::FunctionCall { .. } => ExpressionType::FunctionCall,
            Expression::MemberFunctionCall { .. } => ExpressionType::MemberFunctionCall,
            Expression::MemberVariable { .. } => ExpressionType::MemberVariable,
            Expression::Return(_) => ExpressionType::Return,
            Expression::Loop { .. } => ExpressionType::Loop,
            Expression::ForEach { .. } => ExpressionType::ForEach,
            Expression::IfElse { .. } => ExpressionType::IfElse,
        }
    }

    /// Whether this kind owns a child list.
    pub fn has_children(&self) -> bool {
        matches!(
            self,
            Expression::FunctionDef { .. }
                | Expression::FunctionCall { .. }
                | Expression::MemberFunctionCall { .. }
                | Expression::Loop { .. }
                | Expression::ForEach { .. }
                | Expression::IfElse { .. }
        )
    }

    /// Child list: call arguments, definition or loop body, or the body of
    /// the last if-branch. Empty for leaf kinds.
    pub fn children(&self) -> &[Expression] {
        match self {
            Expression::FunctionDef { body, .. } => body.as_slice(),
            Expression::FunctionCall { args, .. } => args.as_slice(),
            Expression::MemberFunctionCall { args, .. } => args.as_slice(),
            Expression::Loop { body, .. } => body.as_slice(),
            Expression::ForEach { body, .. } => body.as_slice(),
            Expression::IfElse { branches } => branches
                .last()
                .map(|branch| branch.body.as_slice())
                .unwrap_or(&[]),
            leaf => {
                debug_assert!(false, "`{}` has no children", leaf.kind().name());
                &[]
            }
        }
    }

    /// Mutable child list, if this kind has one.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Expression>> {
        match self {
            Expression::FunctionDef { body, .. } => Some(Arc::make_mut(body)),
            Expression::FunctionCall { args, .. } => Some(args),
            Expression::MemberFunctionCall { args, .. } => Some(args),
            Expression::Loop { body, .. } => Some(body),
            Expression::ForEach { body, .. } => Some(body),
            Expression::IfElse { branches } => branches.last_mut().map(|branch| &mut branch.body),
            _ => None,
        }
    }

    /// First child.
    pub fn first(&self) -> Option<&Expression> {
        self.children().first()
    }

    /// Last child.
    pub fn back(&self) -> Option<&Expression> {
        self.children().last()
    }

    /// Append a child, failing on kinds without a child list.
    pub fn push_back(&mut self, child: Expression) -> Result<(), ParseError> {
        let kind = self.kind();
        match self.children_mut() {
            Some(children) => {
                children.push(child);
                Ok(())
            }
            None => Err(ParseError::NoChildren(kind.name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_back_appends_to_body() {
        let mut def = Expression::FunctionDef {
            name: "f".into(),
            arg_names: vec![],
            kind: FunctionType::Free,
            body: Arc::new(vec![]),
        };
        def.push_back(Expression::literal(1i64)).unwrap();
        def.push_back(Expression::literal(2i64)).unwrap();
        assert_eq!(def.children().len(), 2);
        assert!(matches!(def.first(), Some(Expression::Value(Value::Int(1)))));
        assert!(matches!(def.back(), Some(Expression::Value(Value::Int(2)))));
    }

    #[test]
    fn test_push_back_on_leaf_fails() {
        let mut leaf = Expression::ResolveVar("x".into());
        assert_eq!(
            leaf.push_back(Expression::literal(1i64)),
            Err(ParseError::NoChildren("variable"))
        );
        assert!(!leaf.has_children());
    }

    #[test]
    fn test_if_chain_children_are_last_branch() {
        let mut chain = Expression::IfElse {
            branches: vec![IfBranch {
                test: Some(Expression::literal(1i64)),
                body: vec![Expression::literal(10i64)],
            }],
        };
        if let Expression::IfElse { branches } = &mut chain {
            branches.push(IfBranch { test: None, body: vec![] });
        }
        chain.push_back(Expression::literal(20i64)).unwrap();
        assert_eq!(chain.children().len(), 1);
        assert!(matches!(chain.first(), Some(Expression::Value(Value::Int(20)))));
    }

    #[test]
    fn test_clone_detaches_definition_body() {
        let original = Expression::FunctionDef {
            name: "f".into(),
            arg_names: vec![],
            kind: FunctionType::Free,
            body: Arc::new(vec![Expression::literal(1i64)]),
        };
        let mut copy = original.clone();
        copy.push_back(Expression::literal(2i64)).unwrap();
        assert_eq!(original.children().len(), 1);
        assert_eq!(copy.children().len(), 2);
    }
}
