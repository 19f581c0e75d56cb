//! Incremental statement parser
//!
//! Script text is fed one token at a time, across as many input lines as a
//! statement or block needs. The parser is a state machine over statement
//! keywords; expressions inside a statement are handed to the
//! precedence-climbing parser in [`expr`] once the statement is complete.
//!
//! The parser does not execute anything itself. Completed top-level
//! statements, class openings and imports are returned as [`Action`]s for the
//! interpreter to run, in order.

pub mod expr;
pub mod lexer;

pub use expr::parse_expression;
pub use lexer::{tokenize, Token};

use std::mem;
use std::sync::Arc;

use crate::error::ParseError;
use crate::expression::{Expression, ExpressionType, IfBranch};
use crate::scope::{Scope, ScopeRef};
use crate::value::FunctionType;

/// Work produced by the parser for the interpreter.
#[derive(Debug)]
pub enum Action {
    /// Run a completed top-level statement in `scope`
    Execute {
        /// The statement
        expr: Expression,
        /// Scope current when it was parsed
        scope: ScopeRef,
    },
    /// A class body was opened: inherit from `bases` and register the
    /// default constructor
    DefineClass {
        /// The new class scope
        scope: ScopeRef,
        /// Base class scopes, in declaration order
        bases: Vec<ScopeRef>,
    },
    /// `import name`
    Import(String),
    /// `import "path"`
    ImportFile(String),
}

/// Statement-level parser state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Between statements
    BeginExpression,
    /// Collecting an expression statement
    ReadLine,
    /// After `var`
    DefineVar,
    /// After `fn`
    DefineFunc,
    /// After `class`
    DefineClass,
    /// Collecting a class header
    ClassArgs,
    /// Collecting a parameter list
    FuncArgs,
    /// Collecting a `return` value
    ReturnLine,
    /// Collecting an `if` condition
    IfCall,
    /// After `else`
    ExpectIfEnd,
    /// Collecting a `for`/`while` header
    LoopCall,
    /// Collecting a `foreach` header
    ForEach,
    /// After `import`
    ImportModule,
}

/// Progress through a parenthesized header such as `if (...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Header {
    Expect,
    Collecting,
    Done,
}

/// Token-driven statement parser.
///
/// # Example
///
/// ```
/// use quickbeam::parser::{tokenize, Action, Parser};
/// use quickbeam::{Interpreter, Privilege};
///
/// let interp = Interpreter::new(Privilege::UNRESTRICTED);
/// let mut parser = Parser::new(interp.global().clone(), interp.operators().clone(), 64);
/// let mut actions = Vec::new();
///
/// for token in tokenize("fn add(a, b) {").unwrap() {
///     parser.feed(token, &mut actions).unwrap();
/// }
/// assert!(actions.is_empty());
/// assert!(!parser.is_idle());
///
/// for token in tokenize("return a + b; }").unwrap() {
///     parser.feed(token, &mut actions).unwrap();
/// }
/// assert!(matches!(actions.as_slice(), [Action::Execute { .. }]));
/// assert!(parser.is_idle());
/// ```
#[derive(Debug)]
pub struct Parser {
    state: ParseState,
    buffer: Vec<Token>,
    depth: usize,
    header: Header,
    stack: Vec<Expression>,
    closed_if: bool,
    else_if: bool,
    loop_keyword: &'static str,
    pending_name: Option<String>,
    root: ScopeRef,
    scope: ScopeRef,
    class_stack: Vec<ScopeRef>,
    operators: ScopeRef,
    max_depth: usize,
}

impl Parser {
    /// Create a parser that emits statements for `root` and resolves
    /// operators in `operators`.
    pub fn new(root: ScopeRef, operators: ScopeRef, max_depth: usize) -> Self {
        Parser {
            state: ParseState::BeginExpression,
            buffer: Vec::new(),
            depth: 0,
            header: Header::Expect,
            stack: Vec::new(),
            closed_if: false,
            else_if: false,
            loop_keyword: "for",
            pending_name: None,
            scope: root.clone(),
            root,
            class_stack: Vec::new(),
            operators,
            max_depth,
        }
    }

    /// Current state.
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Scope statements are currently emitted for.
    pub fn scope(&self) -> &ScopeRef {
        &self.scope
    }

    /// Whether no statement, block or class body is open.
    pub fn is_idle(&self) -> bool {
        self.state == ParseState::BeginExpression
            && self.buffer.is_empty()
            && self.stack.is_empty()
            && !self.closed_if
            && self.class_stack.is_empty()
    }

    /// Retarget an idle parser at another root scope.
    pub fn set_root(&mut self, root: ScopeRef) {
        if self.is_idle() {
            self.scope = root.clone();
            self.root = root;
        }
    }

    /// Drop all pending input and return to the root scope.
    pub fn reset(&mut self) {
        self.state = ParseState::BeginExpression;
        self.buffer.clear();
        self.depth = 0;
        self.header = Header::Expect;
        self.stack.clear();
        self.closed_if = false;
        self.else_if = false;
        self.pending_name = None;
        self.class_stack.clear();
        self.scope = self.root.clone();
    }

    /// Describe what is still open, for end-of-input errors.
    pub fn open_description(&self) -> String {
        if self.state != ParseState::BeginExpression {
            return "statement".to_string();
        }
        match self.stack.last() {
            Some(Expression::FunctionDef { name, .. }) => format!("function `{name}`"),
            Some(open) => format!("`{}` block", open.kind().name()),
            None if !self.class_stack.is_empty() => format!("class `{}`", self.scope.name()),
            None => "nothing".to_string(),
        }
    }

    /// Complete an if-chain still waiting for a possible `else`.
    pub fn flush(&mut self, actions: &mut Vec<Action>) -> Result<(), ParseError> {
        if mem::take(&mut self.closed_if) {
            self.finish_if_chain(actions)?;
        }
        Ok(())
    }

    /// Consume one token, appending any resulting work to `actions`.
    ///
    /// # Errors
    ///
    /// Returns the parse error for malformed input. The parser is left
    /// mid-statement; callers reset it before feeding more input.
    pub fn feed(&mut self, token: Token, actions: &mut Vec<Action>) -> Result<(), ParseError> {
        if mem::take(&mut self.closed_if) {
            if token.is_ident("else") {
                self.state = ParseState::ExpectIfEnd;
                return Ok(());
            }
            self.finish_if_chain(actions)?;
        }

        match self.state {
            ParseState::BeginExpression => self.begin_statement(token, actions),
            ParseState::DefineVar if self.pending_name.is_none() => self.var_name(token),
            ParseState::ReadLine | ParseState::ReturnLine | ParseState::DefineVar => {
                self.collect(token, actions)
            }
            ParseState::DefineFunc => self.function_name(token),
            ParseState::DefineClass => self.class_name(token),
            ParseState::ClassArgs => self.class_header(token, actions),
            ParseState::FuncArgs
            | ParseState::IfCall
            | ParseState::LoopCall
            | ParseState::ForEach => self.header(token),
            ParseState::ExpectIfEnd => self.after_else(token),
            ParseState::ImportModule => self.import(token, actions),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Statement starts
    // ═══════════════════════════════════════════════════════════════════

    fn begin_statement(&mut self, token: Token, actions: &mut Vec<Action>) -> Result<(), ParseError> {
        match &token {
            Token::Ident(word) => match word.as_str() {
                "fn" | "func" | "function" => self.state = ParseState::DefineFunc,
                "var" => {
                    self.pending_name = None;
                    self.state = ParseState::DefineVar;
                }
                "for" => {
                    self.loop_keyword = "for";
                    self.open_header(ParseState::LoopCall);
                }
                "while" => {
                    self.loop_keyword = "while";
                    self.open_header(ParseState::LoopCall);
                }
                "foreach" => self.open_header(ParseState::ForEach),
                "if" => {
                    self.else_if = false;
                    self.open_header(ParseState::IfCall);
                }
                "else" => return Err(ParseError::DanglingElse),
                "class" => {
                    if !self.stack.is_empty() || !self.class_stack.is_empty() {
                        return Err(ParseError::NestedClass);
                    }
                    self.state = ParseState::DefineClass;
                }
                "return" => {
                    if !self.in_function() {
                        return Err(ParseError::ReturnOutsideFunction);
                    }
                    self.state = ParseState::ReturnLine;
                }
                "import" => self.state = ParseState::ImportModule,
                _ => {
                    self.state = ParseState::ReadLine;
                    return self.collect(token, actions);
                }
            },
            Token::Punct('{') => return self.push_block(Expression::block(Vec::new())),
            Token::Punct('}') => return self.close_block(actions),
            Token::Punct(';') => {}
            _ => {
                self.state = ParseState::ReadLine;
                return self.collect(token, actions);
            }
        }
        Ok(())
    }

    fn in_function(&self) -> bool {
        self.stack
            .iter()
            .any(|open| open.kind() == ExpressionType::FunctionDef)
    }

    fn open_header(&mut self, state: ParseState) {
        self.state = state;
        self.header = Header::Expect;
        self.buffer.clear();
        self.depth = 0;
    }

    fn var_name(&mut self, token: Token) -> Result<(), ParseError> {
        match token {
            Token::Ident(name) => {
                self.pending_name = Some(name);
                Ok(())
            }
            other => Err(ParseError::MissingName {
                keyword: "var",
                found: other.to_string(),
            }),
        }
    }

    fn function_name(&mut self, token: Token) -> Result<(), ParseError> {
        match token {
            Token::Ident(name) => {
                self.pending_name = Some(name);
                self.open_header(ParseState::FuncArgs);
                Ok(())
            }
            other => Err(ParseError::MissingName {
                keyword: "fn",
                found: other.to_string(),
            }),
        }
    }

    fn import(&mut self, token: Token, actions: &mut Vec<Action>) -> Result<(), ParseError> {
        match token {
            Token::Ident(name) => actions.push(Action::Import(name)),
            Token::Str(path) => actions.push(Action::ImportFile(path)),
            other => {
                return Err(ParseError::MissingName {
                    keyword: "import",
                    found: other.to_string(),
                })
            }
        }
        self.state = ParseState::BeginExpression;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Simple statements
    // ═══════════════════════════════════════════════════════════════════

    fn collect(&mut self, token: Token, actions: &mut Vec<Action>) -> Result<(), ParseError> {
        match &token {
            Token::Punct('(' | '[') => self.depth += 1,
            Token::Punct(')' | ']') => self.depth = self.depth.saturating_sub(1),
            Token::Punct(';') if self.depth == 0 => return self.end_statement(actions),
            Token::Punct('}') if self.depth == 0 => {
                self.end_statement(actions)?;
                return self.close_block(actions);
            }
            Token::Punct('{') => {
                return Err(ParseError::UnexpectedToken {
                    token: token.to_string(),
                })
            }
            _ => {}
        }
        self.buffer.push(token);
        Ok(())
    }

    fn end_statement(&mut self, actions: &mut Vec<Action>) -> Result<(), ParseError> {
        let tokens = mem::take(&mut self.buffer);
        let state = mem::replace(&mut self.state, ParseState::BeginExpression);
        self.depth = 0;

        let expr = match state {
            ParseState::ReadLine if tokens.is_empty() => return Ok(()),
            ParseState::ReadLine => self.parse(&tokens)?,
            ParseState::ReturnLine => Expression::Return(self.parse_optional(&tokens)?.map(Box::new)),
            ParseState::DefineVar => {
                let name = self.pending_name.take().ok_or(ParseError::UnexpectedEnd)?;
                let init = match tokens.split_first() {
                    None => None,
                    Some((eq, rest)) if eq.is_op("=") => Some(Box::new(self.parse(rest)?)),
                    Some((other, _)) => {
                        return Err(ParseError::UnexpectedToken {
                            token: other.to_string(),
                        })
                    }
                };
                Expression::DefineVar { name, init }
            }
            other => {
                return Err(ParseError::Syntax(format!(
                    "statement ended while in state {other:?}"
                )))
            }
        };
        self.complete(expr, actions)
    }

    fn parse(&self, tokens: &[Token]) -> Result<Expression, ParseError> {
        parse_expression(tokens, &self.operators, self.max_depth)
    }

    fn parse_optional(&self, tokens: &[Token]) -> Result<Option<Expression>, ParseError> {
        if tokens.is_empty() {
            Ok(None)
        } else {
            self.parse(tokens).map(Some)
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Blocks
    // ═══════════════════════════════════════════════════════════════════

    fn header(&mut self, token: Token) -> Result<(), ParseError> {
        match self.header {
            Header::Expect => {
                if !token.is_punct('(') {
                    return Err(ParseError::UnexpectedToken {
                        token: token.to_string(),
                    });
                }
                self.header = Header::Collecting;
                self.depth = 1;
                Ok(())
            }
            Header::Collecting => {
                match &token {
                    Token::Punct('(' | '[') => self.depth += 1,
                    Token::Punct(')' | ']') => {
                        self.depth -= 1;
                        if self.depth == 0 {
                            self.header = Header::Done;
                            return Ok(());
                        }
                    }
                    _ => {}
                }
                self.buffer.push(token);
                Ok(())
            }
            Header::Done => {
                if !token.is_punct('{') {
                    return Err(ParseError::ExpectedBlock {
                        found: token.to_string(),
                    });
                }
                self.open_block()
            }
        }
    }

    fn open_block(&mut self) -> Result<(), ParseError> {
        let tokens = mem::take(&mut self.buffer);
        let state = mem::replace(&mut self.state, ParseState::BeginExpression);
        self.header = Header::Expect;
        self.depth = 0;

        let block = match state {
            ParseState::FuncArgs => {
                let name = self.pending_name.take().ok_or(ParseError::UnexpectedEnd)?;
                let arg_names = parse_params(&tokens)?;
                let kind = self.function_kind(&name);
                Expression::FunctionDef {
                    name,
                    arg_names,
                    kind,
                    body: Arc::new(Vec::new()),
                }
            }
            ParseState::IfCall => {
                let test = self.parse_optional(&tokens)?.ok_or_else(|| {
                    ParseError::Syntax("Syntax error, `if` requires a condition".to_string())
                })?;
                let branch = IfBranch {
                    test: Some(test),
                    body: Vec::new(),
                };
                if mem::take(&mut self.else_if) {
                    return match self.stack.last_mut() {
                        Some(Expression::IfElse { branches }) => {
                            branches.push(branch);
                            Ok(())
                        }
                        _ => Err(ParseError::DanglingElse),
                    };
                }
                Expression::IfElse {
                    branches: vec![branch],
                }
            }
            ParseState::LoopCall => self.loop_header(&tokens)?,
            ParseState::ForEach => self.foreach_header(&tokens)?,
            other => {
                return Err(ParseError::Syntax(format!(
                    "block opened while in state {other:?}"
                )))
            }
        };

        self.push_block(block)
    }

    /// Open blocks nest as deeply as the expressions inside them.
    fn push_block(&mut self, block: Expression) -> Result<(), ParseError> {
        if self.stack.len() >= self.max_depth {
            return Err(ParseError::TooDeep {
                max: self.max_depth,
            });
        }
        self.stack.push(block);
        Ok(())
    }

    fn function_kind(&self, name: &str) -> FunctionType {
        if !self.stack.is_empty() || !self.scope.is_class_scope() {
            FunctionType::Free
        } else if name == self.scope.name() {
            FunctionType::Constructor
        } else {
            FunctionType::Member
        }
    }

    fn after_else(&mut self, token: Token) -> Result<(), ParseError> {
        if token.is_ident("if") {
            self.open_header(ParseState::IfCall);
            self.else_if = true;
            return Ok(());
        }
        if !token.is_punct('{') {
            return Err(ParseError::MalformedElse {
                token: token.to_string(),
            });
        }
        match self.stack.last_mut() {
            Some(Expression::IfElse { branches }) => {
                branches.push(IfBranch {
                    test: None,
                    body: Vec::new(),
                });
                self.state = ParseState::BeginExpression;
                Ok(())
            }
            _ => Err(ParseError::DanglingElse),
        }
    }

    fn close_block(&mut self, actions: &mut Vec<Action>) -> Result<(), ParseError> {
        match self.stack.pop() {
            Some(expr) => {
                // An if-chain stays open until we know no `else` follows
                if let Expression::IfElse { branches } = &expr {
                    if branches.last().is_some_and(|b| b.test.is_some()) {
                        self.stack.push(expr);
                        self.closed_if = true;
                        return Ok(());
                    }
                }
                self.complete(expr, actions)
            }
            None => match self.class_stack.pop() {
                Some(outer) => {
                    self.scope = outer;
                    Ok(())
                }
                None => Err(ParseError::UnbalancedBrace),
            },
        }
    }

    fn finish_if_chain(&mut self, actions: &mut Vec<Action>) -> Result<(), ParseError> {
        match self.stack.pop() {
            Some(chain) => self.complete(chain, actions),
            None => Ok(()),
        }
    }

    /// Append a finished statement to the innermost open block, or emit it.
    fn complete(&mut self, expr: Expression, actions: &mut Vec<Action>) -> Result<(), ParseError> {
        match self.stack.last_mut() {
            Some(open) => open.push_back(expr),
            None => {
                actions.push(Action::Execute {
                    expr,
                    scope: self.scope.clone(),
                });
                Ok(())
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Loop headers
    // ═══════════════════════════════════════════════════════════════════

    fn loop_header(&self, tokens: &[Token]) -> Result<Expression, ParseError> {
        let parts: Vec<&[Token]> = tokens.split(|t| t.is_punct(';')).collect();
        let (init, test, iterate): (&[Token], &[Token], &[Token]) =
            match (self.loop_keyword, parts.as_slice()) {
                (_, [test]) => (&[], test, &[]),
                ("for", [test, iterate]) => (&[], test, iterate),
                ("for", [init, test, iterate]) => (init, test, iterate),
                (keyword, _) => {
                    return Err(ParseError::Syntax(format!(
                        "Syntax error, too many statements in `{keyword}`"
                    )))
                }
            };

        Ok(Expression::Loop {
            init: self.loop_init(init)?.map(Box::new),
            test: self.parse_optional(test)?.map(Box::new),
            iterate: self.parse_optional(iterate)?.map(Box::new),
            body: Vec::new(),
        })
    }

    /// `var i = e` and `i = e` both define a loop-local variable.
    fn loop_init(&self, tokens: &[Token]) -> Result<Option<Expression>, ParseError> {
        let definition = match tokens {
            [Token::Ident(var), Token::Ident(name), eq, rest @ ..] if var == "var" && eq.is_op("=") => {
                Some((name, rest))
            }
            [Token::Ident(name), eq, rest @ ..] if eq.is_op("=") => Some((name, rest)),
            _ => None,
        };
        match definition {
            Some((name, rest)) => Ok(Some(Expression::DefineVar {
                name: name.clone(),
                init: Some(Box::new(self.parse(rest)?)),
            })),
            None => self.parse_optional(tokens),
        }
    }

    fn foreach_header(&self, tokens: &[Token]) -> Result<Expression, ParseError> {
        let malformed =
            || ParseError::Syntax("Syntax error, `foreach` requires 2 statements".to_string());

        let parts: Vec<&[Token]> = tokens.split(|t| t.is_punct(';')).collect();
        let (binding, iterable): (&[Token], &[Token]) = match parts.as_slice() {
            [binding, iterable] => (*binding, *iterable),
            [single] => match single.iter().position(|t| t.is_ident("in")) {
                Some(at) => (&single[..at], &single[at + 1..]),
                None => return Err(malformed()),
            },
            _ => return Err(malformed()),
        };
        let name = match binding {
            [Token::Ident(name)] => name.clone(),
            [Token::Ident(var), Token::Ident(name)] if var == "var" => name.clone(),
            _ => return Err(malformed()),
        };
        if iterable.is_empty() {
            return Err(malformed());
        }

        Ok(Expression::ForEach {
            name,
            iterable: Box::new(self.parse(iterable)?),
            body: Vec::new(),
        })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Classes
    // ═══════════════════════════════════════════════════════════════════

    fn class_name(&mut self, token: Token) -> Result<(), ParseError> {
        match token {
            Token::Ident(name) => {
                self.pending_name = Some(name);
                self.buffer.clear();
                self.state = ParseState::ClassArgs;
                Ok(())
            }
            other => Err(ParseError::MissingName {
                keyword: "class",
                found: other.to_string(),
            }),
        }
    }

    fn class_header(&mut self, token: Token, actions: &mut Vec<Action>) -> Result<(), ParseError> {
        if !token.is_punct('{') {
            self.buffer.push(token);
            return Ok(());
        }

        let name = self.pending_name.take().ok_or(ParseError::UnexpectedEnd)?;
        let tokens = mem::take(&mut self.buffer);
        self.state = ParseState::BeginExpression;

        let bases = match tokens.split_first() {
            None => Vec::new(),
            Some((colon, rest)) if colon.is_punct(':') => self.resolve_bases(rest)?,
            Some((other, _)) => {
                return Err(ParseError::UnexpectedToken {
                    token: other.to_string(),
                })
            }
        };

        let class_scope = Scope::new_class_scope(&self.scope, &name);
        actions.push(Action::DefineClass {
            scope: class_scope.clone(),
            bases,
        });
        let outer = mem::replace(&mut self.scope, class_scope);
        self.class_stack.push(outer);
        Ok(())
    }

    fn resolve_bases(&self, tokens: &[Token]) -> Result<Vec<ScopeRef>, ParseError> {
        tokens
            .split(|t| t.is_punct(','))
            .map(|part| match part {
                [Token::Ident(base)] => self
                    .scope
                    .resolve_scope(base)
                    .filter(|scope| scope.is_class_scope())
                    .ok_or_else(|| ParseError::UnknownBaseClass(base.clone())),
                [other, ..] => Err(ParseError::UnexpectedToken {
                    token: other.to_string(),
                }),
                [] => Err(ParseError::UnexpectedEnd),
            })
            .collect()
    }
}

/// `a, b, c` to argument names.
fn parse_params(tokens: &[Token]) -> Result<Vec<String>, ParseError> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }
    tokens
        .split(|t| t.is_punct(','))
        .map(|part| match part {
            [Token::Ident(name)] => Ok(name.clone()),
            [other, ..] => Err(ParseError::UnexpectedToken {
                token: other.to_string(),
            }),
            [] => Err(ParseError::UnexpectedEnd),
        })
        .collect()
}
