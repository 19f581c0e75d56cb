//! Error types for quickbeam parsing and evaluation

use std::path::PathBuf;

use thiserror::Error;

use crate::eval::ControlFlow;
use crate::module::Privilege;
use crate::value::Type;

/// Errors raised by operators, conversions and container operations on values.
#[derive(Error, Debug)]
pub enum ValueError {
    /// Operator applied to a kind that does not support it
    #[error("Operator {op} not defined for type `{ty}`")]
    UndefinedOperator {
        /// Operator symbol
        op: &'static str,
        /// Kind of the offending operand
        ty: Type,
    },

    /// Strict promotion refused to coerce across the numeric boundary
    #[error("Types `{left}` and `{right}` are incompatible for this operation")]
    Incompatible {
        /// Debug form of the left operand
        left: String,
        /// Debug form of the right operand
        right: String,
    },

    /// Array element kind mismatch
    #[error("array of `{expected}` cannot hold a `{got}`")]
    ArrayTypeMismatch {
        /// Current element kind of the array
        expected: Type,
        /// Kind that was offered
        got: Type,
    },

    /// Arrays only hold scalar kinds and strings
    #[error("array cannot contain collections")]
    NestedCollection,

    /// No conversion exists between the two kinds
    #[error("cannot convert `{from}` to `{to}`")]
    Conversion {
        /// Source kind
        from: Type,
        /// Target kind
        to: Type,
    },

    /// Text could not be parsed as the requested kind
    #[error("`{text}` is not a valid {to}")]
    Parse {
        /// Offending text
        text: String,
        /// Target kind
        to: Type,
    },

    /// Composite values cannot key a dictionary
    #[error("`{0}` cannot be used as a dictionary key")]
    Unhashable(Type),

    /// Integer division or remainder by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Counting range would produce too many elements
    #[error("range from {start} to {end} exceeds {max} elements")]
    RangeTooLarge {
        /// Printed start bound
        start: String,
        /// Printed end bound
        end: String,
        /// Element limit
        max: u64,
    },

    /// Bounds-checked access failed
    #[error("Out of bounds array access index {index}, array length {len}")]
    IndexOutOfBounds {
        /// Requested index
        index: i64,
        /// Container length
        len: usize,
    },
}

/// Errors raised while turning source text into expressions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A character outside the language's alphabet
    #[error("unexpected character `{0}`")]
    UnexpectedCharacter(char),

    /// A string literal ran to the end of the line
    #[error("Quote mismatch: unterminated string literal")]
    UnterminatedString,

    /// Numeric literal out of range or malformed
    #[error("invalid number `{0}`")]
    InvalidNumber(String),

    /// A token that does not fit the grammar at this position
    #[error("unexpected token `{token}`")]
    UnexpectedToken {
        /// Printed form of the token
        token: String,
    },

    /// Input ended in the middle of an expression
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// Batch input ended with blocks or statements still open
    #[error("unexpected end of input: {0} still open")]
    Unterminated(String),

    /// A `}` with nothing to close
    #[error("unbalanced `}}`")]
    UnbalancedBrace,

    /// An `else` with no preceding `if` block
    #[error("`else` without a preceding `if`")]
    DanglingElse,

    /// `else` followed by something other than `if` or `{`
    #[error("Malformed Syntax: Incorrect token `{token}` following `else` keyword")]
    MalformedElse {
        /// Printed form of the token
        token: String,
    },

    /// A control-flow header must be followed by a block
    #[error("expected `{{` to open the block, found `{found}`")]
    ExpectedBlock {
        /// Printed form of the token
        found: String,
    },

    /// A keyword needs a name after it
    #[error("`{keyword}` requires a name, found `{found}`")]
    MissingName {
        /// Keyword that needed the name
        keyword: &'static str,
        /// Printed form of the token
        found: String,
    },

    /// Structural syntax error with a descriptive message
    #[error("{0}")]
    Syntax(String),

    /// Operator missing from the standard library
    #[error("unknown operator `{0}`")]
    UnknownOperator(String),

    /// `return` at top level
    #[error("`return` outside of a function")]
    ReturnOutsideFunction,

    /// `class` inside a block
    #[error("classes can only be defined at the top level")]
    NestedClass,

    /// A base class named in a class header does not exist
    #[error("unknown base class `{0}`")]
    UnknownBaseClass(String),

    /// Expression nesting guard tripped
    #[error("expression nested deeper than {max} levels")]
    TooDeep {
        /// Configured maximum
        max: usize,
    },

    /// Child access on an expression kind that has no body
    #[error("`{0}` expressions have no children")]
    NoChildren(&'static str),
}

/// Errors raised during evaluation.
#[derive(Error, Debug)]
pub enum EvalError {
    /// Name lookup walked the whole scope chain and every module without a match
    #[error("unknown identifier `{name}`")]
    UnknownIdentifier {
        /// Name that failed to resolve
        name: String,
    },

    /// Member lookup on a class instance failed
    #[error("`{class}` has no member `{name}`")]
    UnknownMember {
        /// Class name
        class: String,
        /// Member name
        name: String,
    },

    /// Import of a module nobody registered
    #[error("unknown module `{0}`")]
    UnknownModule(String),

    /// Operator, conversion or container failure
    #[error(transparent)]
    Value(#[from] ValueError),

    /// Operation applied to a value of the wrong kind
    #[error("Type error: {message}")]
    TypeError {
        /// Description of the mismatch
        message: String,
    },

    /// Script function called with the wrong number of arguments
    #[error("`{name}` expects {expected} argument(s), got {got}")]
    ArityMismatch {
        /// Function name
        name: String,
        /// Declared argument count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// Call of something that is not a function
    #[error("value of type `{0}` is not callable")]
    NotCallable(Type),

    /// Module use without the required privileges
    #[error("Cannot import restricted module: {module} (requires {required:?}, allowed {allowed:?})")]
    Privilege {
        /// Module name
        module: String,
        /// Privileges the module requires
        required: Privilege,
        /// Privileges the interpreter was created with
        allowed: Privilege,
    },

    /// Name exists in an optional module that has not been imported
    #[error("`{name}` belongs to module `{module}`, which has not been imported")]
    NotImported {
        /// Name that was looked up
        name: String,
        /// Module defining it
        module: String,
    },

    /// Call depth guard tripped
    #[error("Stack overflow: call depth {depth} exceeds maximum {max}")]
    StackOverflow {
        /// Depth reached
        depth: usize,
        /// Configured maximum
        max: usize,
    },

    /// Host requested interruption
    #[error("Evaluation interrupted")]
    Interrupted,

    /// Statement budget exhausted
    #[error("statement limit of {limit} exceeded")]
    StatementLimit {
        /// Configured budget
        limit: u64,
    },

    /// Failure reported by a native callback
    #[error("{name}: {message}")]
    Native {
        /// Function name
        name: String,
        /// Failure description
        message: String,
    },

    /// File system failure inside a native callback
    #[error("cannot access `{}`: {source}", .path.display())]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Non-local control flow (`return`) unwinding to the function boundary
    #[error("Control flow: {0:?}")]
    ControlFlow(ControlFlow),
}

impl EvalError {
    /// Build a type error from a message.
    pub fn type_error(message: impl Into<String>) -> Self {
        EvalError::TypeError {
            message: message.into(),
        }
    }

    /// Build a native callback failure.
    pub fn native(name: impl Into<String>, message: impl Into<String>) -> Self {
        EvalError::Native {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by script ingestion.
#[derive(Error, Debug)]
pub enum ScriptError {
    /// The line could not be parsed
    #[error("Error at line {line}: {source}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// Parse failure
        source: ParseError,
    },

    /// A statement failed while executing
    #[error("Error at line {line}: {source}")]
    Eval {
        /// 1-based line number
        line: usize,
        /// Evaluation failure
        source: EvalError,
    },

    /// A script file could not be read
    #[error("file not found: `{}` ({source})", .path.display())]
    Io {
        /// Path of the script
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

impl ScriptError {
    /// Line the error was reported at, if it came from a script line.
    pub fn line(&self) -> Option<usize> {
        match self {
            ScriptError::Parse { line, .. } | ScriptError::Eval { line, .. } => Some(*line),
            ScriptError::Io { .. } => None,
        }
    }
}

/// Result type alias for script ingestion
pub type Result<T> = std::result::Result<T, ScriptError>;
