//! # Quickbeam
//!
//! An embeddable scripting language with a tree-walking evaluator.
//!
//! Hosts create an [`Interpreter`] with a set of [`Privilege`]s, register
//! native functions, variables, classes and modules, and feed it script text
//! either as whole batches or line by line from a REPL. Scripts are
//! dynamically typed and support functions, classes with inheritance, loops,
//! if-chains and `import`.
//!
//! ## Architecture
//!
//! - **Values**: [`Value`] variants held in shared [`ValueRef`] slots
//! - **Scopes**: [`Scope`] chains with concurrently insertable tables
//! - **Parser**: an incremental statement state machine over [`parser::Token`]s,
//!   with a precedence-climbing expression parser
//! - **Evaluator**: the [`Evaluate`] trait over [`Expression`] trees
//! - **Modules**: the standard library plus privilege-gated optional modules
//!
//! ## Example
//!
//! ```
//! use quickbeam::{Interpreter, Privilege, Value};
//!
//! let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
//! interp.evaluate(r#"
//! class Greeter {
//!     var greeting = "hello";
//!     fn greet(name) { return greeting + ", " + name; }
//! }
//! var g = Greeter();
//! var message = g.greet("world");
//! "#).unwrap();
//!
//! let message = interp.resolve_variable("message").unwrap();
//! assert_eq!(message.get(), Value::from("hello, world"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod eval;
pub mod expression;
pub mod interpreter;
pub mod module;
pub mod parser;
pub mod scope;
pub mod value;

// Re-export main types
pub use context::EvalContext;
pub use error::{EvalError, ParseError, Result, ScriptError, ValueError};
pub use eval::{call_function, ControlFlow, Evaluate, Frame};
pub use expression::{Callee, Expression, ExpressionType, IfBranch};
pub use interpreter::Interpreter;
pub use module::{Module, ModuleRef, Privilege};
pub use scope::{Scope, ScopeRef};
pub use value::{
    Array, Class, ClassRef, Dictionary, DictionaryRef, Function, FunctionRef, FunctionType,
    NativeResult, Precedence, Type, UserPointer, Value, ValueRef, Vec3,
};

/// Quickbeam version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
