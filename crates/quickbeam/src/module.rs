//! Privilege-gated modules of host functions

use std::sync::Arc;

use bitflags::bitflags;

use crate::error::EvalError;
use crate::interpreter::Interpreter;
use crate::scope::{Scope, ScopeRef};
use crate::value::{Function, NativeResult, Value, ValueRef};

bitflags! {
    /// Host capabilities an interpreter is allowed to expose to scripts.
    ///
    /// A module declares the set it requires; an interpreter may use the
    /// module only when its own set contains every required bit.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct Privilege: u8 {
        /// Read files next to the script
        const LOCAL_FOLDER_READ = 1 << 0;
        /// Write files next to the script
        const LOCAL_FOLDER_WRITE = 1 << 1;
        /// Read anywhere on the file system
        const FILE_SYSTEM_READ = 1 << 2;
        /// Write anywhere on the file system
        const FILE_SYSTEM_WRITE = 1 << 3;
        /// Talk to hosts on the local network
        const LOCAL_NETWORK = 1 << 4;
        /// Talk to hosts on the internet
        const INTERNET = 1 << 5;
        /// Unstable features
        const EXPERIMENTAL = 1 << 6;
    }
}

impl Privilege {
    /// No privileges: only unrestricted modules are available.
    pub const UNRESTRICTED: Privilege = Privilege::empty();

    /// Whether this set grants everything in `required`.
    pub fn allows(self, required: Privilege) -> bool {
        self.contains(required)
    }
}

/// Shared module handle.
pub type ModuleRef = Arc<Module>;

/// A named bundle of host functions and variables.
///
/// Installed modules are consulted as a name-resolution fallback after the
/// scope chain; their bindings are never copied into the global scope.
#[derive(Debug)]
pub struct Module {
    name: String,
    required: Privilege,
    scope: ScopeRef,
}

impl Module {
    /// Create an empty module.
    pub fn new(name: impl Into<String>, required: Privilege) -> Self {
        let name = name.into();
        Module {
            scope: Scope::global(name.clone()),
            name,
            required,
        }
    }

    /// Add an arguments-only host function.
    pub fn function<F>(self, name: &str, callback: F) -> Self
    where
        F: Fn(&[ValueRef]) -> NativeResult + Send + Sync + 'static,
    {
        self.scope.insert_function(Function::native(name, callback));
        self
    }

    /// Add a host function that sees the interpreter and calling scope.
    pub fn scoped_function<F>(self, name: &str, callback: F) -> Self
    where
        F: Fn(&Interpreter, &ScopeRef, &[ValueRef]) -> NativeResult + Send + Sync + 'static,
    {
        self.scope.insert_function(Function::scoped(name, callback));
        self
    }

    /// Add a variable.
    pub fn variable(self, name: &str, value: Value) -> Self {
        self.scope.insert_variable(name, ValueRef::new(value));
        self
    }

    /// Module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Privileges needed to use the module.
    pub fn required(&self) -> Privilege {
        self.required
    }

    /// Scope holding the module's bindings.
    pub fn scope(&self) -> &ScopeRef {
        &self.scope
    }

    /// Fail with a privilege error unless `allowed` covers this module.
    pub fn check(&self, allowed: Privilege) -> Result<(), EvalError> {
        if allowed.allows(self.required) {
            Ok(())
        } else {
            Err(EvalError::Privilege {
                module: self.name.clone(),
                required: self.required,
                allowed,
            })
        }
    }

    /// Whether the module binds `name` as a function or variable.
    pub fn defines(&self, name: &str) -> bool {
        self.scope.function(name).is_some() || self.scope.variable(name).is_some()
    }
}
