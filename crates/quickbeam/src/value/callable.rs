//! Function values
//!
//! A [`Function`] is created once when it is defined, then shared through
//! [`FunctionRef`] handles by scopes, values and expression nodes. Its body is
//! either host code in one of three callback shapes, or a list of script
//! statements.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::EvalError;
use crate::expression::Expression;
use crate::interpreter::Interpreter;
use crate::scope::{Scope, ScopeRef};

use super::{ClassRef, ValueRef};

/// Shared function handle.
pub type FunctionRef = Arc<Function>;

/// Result of a native callback.
pub type NativeResult = Result<ValueRef, EvalError>;

/// Native callback that only sees its arguments.
pub type NativeFn = Arc<dyn Fn(&[ValueRef]) -> NativeResult + Send + Sync>;

/// Native callback that also sees the interpreter and the calling scope.
pub type ScopedFn = Arc<dyn Fn(&Interpreter, &ScopeRef, &[ValueRef]) -> NativeResult + Send + Sync>;

/// Native callback that also sees the receiving class instance.
pub type ClassFn = Arc<
    dyn Fn(&Interpreter, Option<&ClassRef>, &ScopeRef, &[ValueRef]) -> NativeResult + Send + Sync,
>;

/// Binding strength of an operator, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    /// `=` and compound assignment
    Assign,
    /// `&&` and `||`
    Boolean,
    /// Comparisons
    Compare,
    /// `+` and `-`
    AddSub,
    /// `*`, `/` and `%`
    MulDiv,
    /// `++` and `--`
    IncDec,
    /// Named functions
    Call,
}

impl Precedence {
    /// Derive the precedence from the shape of a function name.
    pub fn of(name: &str) -> Self {
        if name.len() > 2 {
            return Precedence::Call;
        }
        match name {
            "||" | "&&" => return Precedence::Boolean,
            "++" | "--" => return Precedence::IncDec,
            "==" => return Precedence::Compare,
            _ => {}
        }
        match name.chars().next() {
            Some('!' | '<' | '>' | '|' | '&') => Precedence::Compare,
            _ if name.contains('=') => Precedence::Assign,
            Some('/' | '*' | '%') => Precedence::MulDiv,
            Some('+' | '-') => Precedence::AddSub,
            _ => Precedence::Call,
        }
    }

    /// The next tighter level; [`Precedence::Call`] is the tightest.
    pub fn tighter(self) -> Self {
        match self {
            Precedence::Assign => Precedence::Boolean,
            Precedence::Boolean => Precedence::Compare,
            Precedence::Compare => Precedence::AddSub,
            Precedence::AddSub => Precedence::MulDiv,
            Precedence::MulDiv => Precedence::IncDec,
            Precedence::IncDec | Precedence::Call => Precedence::Call,
        }
    }

    /// Whether operators at this level group right to left.
    pub fn is_right_associative(self) -> bool {
        self == Precedence::Assign
    }
}

/// How a function is bound when called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionType {
    /// Plain function
    Free,
    /// Class definition; calling it creates an instance
    Constructor,
    /// Method run against a receiving instance
    Member,
}

/// Executable body of a [`Function`].
#[derive(Clone)]
pub enum FunctionBody {
    /// Host callback over arguments
    Native(NativeFn),
    /// Host callback with interpreter and scope access
    Scoped(ScopedFn),
    /// Host callback with class instance access
    Class(ClassFn),
    /// Script statements
    Script(Arc<Vec<Expression>>),
}

impl fmt::Debug for FunctionBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionBody::Native(_) => f.write_str("<native>"),
            FunctionBody::Scoped(_) => f.write_str("<scoped native>"),
            FunctionBody::Class(_) => f.write_str("<class native>"),
            FunctionBody::Script(body) => write!(f, "<{} statement(s)>", body.len()),
        }
    }
}

/// A named callable.
pub struct Function {
    name: String,
    precedence: Precedence,
    kind: FunctionType,
    arg_names: Vec<String>,
    body: FunctionBody,
    scope: Option<Weak<Scope>>,
}

impl Function {
    fn build(
        name: impl Into<String>,
        kind: FunctionType,
        arg_names: Vec<String>,
        body: FunctionBody,
        scope: Option<&ScopeRef>,
    ) -> FunctionRef {
        let name = name.into();
        Arc::new(Function {
            precedence: Precedence::of(&name),
            name,
            kind,
            arg_names,
            body,
            scope: scope.map(Arc::downgrade),
        })
    }

    /// Wrap an arguments-only host callback.
    pub fn native<F>(name: impl Into<String>, callback: F) -> FunctionRef
    where
        F: Fn(&[ValueRef]) -> NativeResult + Send + Sync + 'static,
    {
        Self::build(
            name,
            FunctionType::Free,
            Vec::new(),
            FunctionBody::Native(Arc::new(callback)),
            None,
        )
    }

    /// Wrap a host callback that needs the interpreter and calling scope.
    pub fn scoped<F>(name: impl Into<String>, callback: F) -> FunctionRef
    where
        F: Fn(&Interpreter, &ScopeRef, &[ValueRef]) -> NativeResult + Send + Sync + 'static,
    {
        Self::build(
            name,
            FunctionType::Free,
            Vec::new(),
            FunctionBody::Scoped(Arc::new(callback)),
            None,
        )
    }

    /// Wrap a host callback bound to a class.
    ///
    /// For constructors `scope` is the class scope the instance is built from.
    pub fn class<F>(
        name: impl Into<String>,
        kind: FunctionType,
        scope: Option<&ScopeRef>,
        callback: F,
    ) -> FunctionRef
    where
        F: Fn(&Interpreter, Option<&ClassRef>, &ScopeRef, &[ValueRef]) -> NativeResult
            + Send
            + Sync
            + 'static,
    {
        Self::build(
            name,
            kind,
            Vec::new(),
            FunctionBody::Class(Arc::new(callback)),
            scope,
        )
    }

    /// Create a script-defined function closing over its defining scope.
    pub fn script(
        name: impl Into<String>,
        kind: FunctionType,
        arg_names: Vec<String>,
        body: Arc<Vec<Expression>>,
        scope: &ScopeRef,
    ) -> FunctionRef {
        Self::build(name, kind, arg_names, FunctionBody::Script(body), Some(scope))
    }

    /// Function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operator precedence derived from the name.
    pub fn precedence(&self) -> Precedence {
        self.precedence
    }

    /// Binding kind.
    pub fn kind(&self) -> FunctionType {
        self.kind
    }

    /// Declared argument names (empty for host callbacks).
    pub fn arg_names(&self) -> &[String] {
        &self.arg_names
    }

    /// Executable body.
    pub fn body(&self) -> &FunctionBody {
        &self.body
    }

    /// Whether the body is host code.
    pub fn is_native(&self) -> bool {
        !matches!(self.body, FunctionBody::Script(_))
    }

    /// Defining scope, if it is still alive.
    pub fn scope(&self) -> Option<ScopeRef> {
        self.scope.as_ref().and_then(Weak::upgrade)
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("arg_names", &self.arg_names)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}
