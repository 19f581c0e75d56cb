//! Interpreter: per-embedding state and the host API
//!
//! An [`Interpreter`] owns a global scope, the installed and importable
//! modules, the statement parser and the evaluation context. Hosts feed it
//! script text (a whole batch, a file, or one line at a time), register
//! native functions, variables, classes and modules, and call script
//! functions back by name.

pub mod optional;
pub(crate) mod prelude;

use std::cell::Cell;
use std::fs;
use std::mem;
use std::path::Path;

use tracing::{debug, warn};

use crate::context::EvalContext;
use crate::error::{EvalError, ParseError, Result, ScriptError};
use crate::eval::{call_function, Evaluate, Frame};
use crate::module::{Module, ModuleRef, Privilege};
use crate::parser::{parse_expression, tokenize, Action, Parser};
use crate::scope::{Scope, ScopeRef};
use crate::value::{
    Class, ClassRef, Function, FunctionRef, FunctionType, NativeResult, Value, ValueRef,
};

pub use prelude::STANDARD_LIB;

/// Script interpreter.
///
/// # Example
///
/// ```
/// use quickbeam::{Interpreter, Privilege, Value};
///
/// let mut interp = Interpreter::new(Privilege::UNRESTRICTED);
/// interp
///     .evaluate("fn square(x) { return x * x; }\nvar y = square(7);")
///     .unwrap();
///
/// let y = interp.resolve_variable("y").unwrap();
/// assert_eq!(y.get(), Value::Int(49));
/// assert_eq!(interp.call("square", vec![Value::Float(1.5)]).unwrap(), Value::Float(2.25));
/// ```
#[derive(Debug)]
pub struct Interpreter {
    global: ScopeRef,
    privileges: Privilege,
    context: EvalContext,
    stdlib: ModuleRef,
    /// Installed modules, the standard library first
    modules: Vec<ModuleRef>,
    /// Registered modules waiting for `import`
    optional: Vec<ModuleRef>,
    parser: Parser,
    line: usize,
    call_depth: Cell<usize>,
    statements: Cell<u64>,
}

impl Interpreter {
    /// Create an interpreter with the given privileges and default limits.
    pub fn new(privileges: Privilege) -> Self {
        Self::with_context(privileges, EvalContext::default())
    }

    /// Create an interpreter with the given privileges and evaluation context.
    pub fn with_context(privileges: Privilege, context: EvalContext) -> Self {
        let global = Scope::global("global");
        let stdlib: ModuleRef = prelude::standard_library().into();
        let parser = Parser::new(
            global.clone(),
            stdlib.scope().clone(),
            context.max_expression_depth,
        );

        let mut interp = Interpreter {
            global,
            privileges,
            context,
            modules: vec![stdlib.clone()],
            stdlib,
            optional: Vec::new(),
            parser,
            line: 0,
            call_depth: Cell::new(0),
            statements: Cell::new(0),
        };
        interp.register_optional_modules();

        debug!(
            privileges = ?interp.privileges,
            max_call_depth = interp.context.max_call_depth,
            "created interpreter"
        );
        interp
    }

    fn register_optional_modules(&mut self) {
        if !self.privileges.is_empty() {
            self.optional.push(optional::file_module().into());
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════

    /// The global scope.
    pub fn global(&self) -> &ScopeRef {
        &self.global
    }

    /// Scope of the standard library, where operator functions live.
    pub fn operators(&self) -> &ScopeRef {
        self.stdlib.scope()
    }

    /// Evaluation context.
    pub fn context(&self) -> &EvalContext {
        &self.context
    }

    /// Privileges granted to scripts.
    pub fn privileges(&self) -> Privilege {
        self.privileges
    }

    /// Current script call depth.
    pub fn call_depth(&self) -> usize {
        self.call_depth.get()
    }

    /// Installed modules, the standard library first.
    pub fn modules(&self) -> &[ModuleRef] {
        &self.modules
    }

    /// Whether the parser holds no partial statement.
    pub fn is_idle(&self) -> bool {
        self.parser.is_idle()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Evaluation guards
    // ═══════════════════════════════════════════════════════════════════

    /// Account for one statement, checking interruption and the budget.
    pub(crate) fn tick(&self) -> std::result::Result<(), EvalError> {
        if self.context.is_interrupted() {
            return Err(EvalError::Interrupted);
        }
        let count = self.statements.get() + 1;
        self.statements.set(count);
        match self.context.max_statements {
            Some(limit) if count > limit => Err(EvalError::StatementLimit { limit }),
            _ => Ok(()),
        }
    }

    /// Enter a script call, failing past the configured depth.
    pub(crate) fn enter_call(&self) -> std::result::Result<(), EvalError> {
        let depth = self.call_depth.get() + 1;
        let max = self.context.max_call_depth;
        if depth > max {
            return Err(EvalError::StackOverflow { depth, max });
        }
        self.call_depth.set(depth);
        Ok(())
    }

    /// Leave a script call.
    pub(crate) fn exit_call(&self) {
        self.call_depth.set(self.call_depth.get().saturating_sub(1));
    }

    // ═══════════════════════════════════════════════════════════════════
    // Name resolution
    // ═══════════════════════════════════════════════════════════════════

    /// Resolve a name to a slot from `frame`.
    ///
    /// Order: members of the receiving instance, the scope chain (variables
    /// before functions), then installed modules. A name provided only by a
    /// module that has not been imported reports why it is unavailable.
    pub fn resolve_in(&self, name: &str, frame: &Frame) -> std::result::Result<ValueRef, EvalError> {
        if let Some(class) = &frame.class {
            if let Some(slot) = class.variable(name) {
                return Ok(slot);
            }
            if let Some(func) = class.function_scope().function(name) {
                return Ok(ValueRef::new(Value::Function(func)));
            }
        }

        if let Some(slot) = frame.scope.resolve_variable(name) {
            return Ok(slot);
        }
        if let Some(func) = frame.scope.resolve_function(name) {
            return Ok(ValueRef::new(Value::Function(func)));
        }

        for module in &self.modules {
            if let Some(slot) = module.scope().variable(name) {
                return Ok(slot);
            }
            if let Some(func) = module.scope().function(name) {
                return Ok(ValueRef::new(Value::Function(func)));
            }
        }

        Err(self.unresolved(name))
    }

    /// Resolve a name to a function from `frame`.
    ///
    /// Function tables win over variables at each level; a variable is
    /// accepted only when it holds a function.
    pub fn resolve_callable_in(
        &self,
        name: &str,
        frame: &Frame,
    ) -> std::result::Result<FunctionRef, EvalError> {
        if let Some(class) = &frame.class {
            if let Some(func) = class.function_scope().function(name) {
                return Ok(func);
            }
            let member = class
                .variable(name)
                .and_then(|slot| slot.read().as_function().cloned());
            if let Some(func) = member {
                return Ok(func);
            }
        }

        if let Some(func) = frame.scope.resolve_callable(name) {
            return Ok(func);
        }
        if let Some(func) = self.modules.iter().find_map(|m| m.scope().function(name)) {
            return Ok(func);
        }

        match self.resolve_in(name, frame)?.get() {
            Value::Function(func) => Ok(func),
            other => Err(EvalError::NotCallable(other.type_of())),
        }
    }

    fn unresolved(&self, name: &str) -> EvalError {
        match self.optional.iter().find(|module| module.defines(name)) {
            Some(module) => match module.check(self.privileges) {
                Err(denied) => denied,
                Ok(()) => EvalError::NotImported {
                    name: name.to_string(),
                    module: module.name().to_string(),
                },
            },
            None => EvalError::UnknownIdentifier {
                name: name.to_string(),
            },
        }
    }

    /// Look up a variable from the global scope.
    pub fn resolve_variable(&self, name: &str) -> std::result::Result<ValueRef, EvalError> {
        self.resolve_in(name, &Frame::new(self.global.clone()))
    }

    /// Look up a function from the global scope.
    pub fn resolve_function(&self, name: &str) -> std::result::Result<FunctionRef, EvalError> {
        self.resolve_callable_in(name, &Frame::new(self.global.clone()))
    }

    /// Look up a named scope (a class scope, for example) from the global scope.
    pub fn resolve_scope(&self, name: &str) -> Option<ScopeRef> {
        self.global.resolve_scope(name)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Script ingestion
    // ═══════════════════════════════════════════════════════════════════

    /// Evaluate a batch of script text in the global scope.
    ///
    /// Stops at the first failing line. A batch must close every block it
    /// opens; a trailing if-chain is completed.
    pub fn evaluate(&mut self, text: &str) -> Result<()> {
        let global = self.global.clone();
        self.evaluate_in(text, &global)
    }

    /// Evaluate a batch of script text with `scope` as the top-level scope.
    pub fn evaluate_in(&mut self, text: &str, scope: &ScopeRef) -> Result<()> {
        self.statements.set(0);
        self.parser.set_root(scope.clone());
        let result = self.batch(text);
        self.parser.set_root(self.global.clone());
        result
    }

    /// Evaluate a script file in the global scope.
    pub fn evaluate_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.statements.set(0);
        self.parser.set_root(self.global.clone());
        self.load_file(path.as_ref())
    }

    /// Feed one line of input, REPL style.
    ///
    /// Statements run as soon as they are complete; an unfinished block
    /// waits for further lines. A finished if-chain waits for a possible
    /// `else` until the next statement or [`flush`](Self::flush).
    pub fn read_line(&mut self, text: &str) -> Result<()> {
        let global = self.global.clone();
        self.read_line_in(text, &global)
    }

    /// Feed one line of input with `scope` as the top-level scope.
    ///
    /// The scope takes effect only when no statement is pending.
    pub fn read_line_in(&mut self, text: &str, scope: &ScopeRef) -> Result<()> {
        self.statements.set(0);
        self.parser.set_root(scope.clone());
        for line in text.lines() {
            self.ingest(line)?;
        }
        Ok(())
    }

    /// Complete a pending if-chain that is waiting for an `else`.
    pub fn flush(&mut self) -> Result<()> {
        let mut actions = Vec::new();
        if let Err(source) = self.parser.flush(&mut actions) {
            self.parser.reset();
            return Err(ScriptError::Parse {
                line: self.line,
                source,
            });
        }
        self.run(actions)
    }

    /// Evaluate a single expression in the global scope and return its value.
    ///
    /// A trailing `;` is accepted. Errors are reported at line 1.
    pub fn eval_expression(&self, text: &str) -> Result<Value> {
        let parse = |source| ScriptError::Parse { line: 1, source };

        let mut tokens = tokenize(text).map_err(parse)?;
        if tokens.last().is_some_and(|token| token.is_punct(';')) {
            tokens.pop();
        }
        let expr = parse_expression(&tokens, self.operators(), self.context.max_expression_depth)
            .map_err(parse)?;

        self.statements.set(0);
        let slot = expr
            .eval(self, &Frame::new(self.global.clone()))
            .map_err(|source| ScriptError::Eval { line: 1, source })?;
        Ok(slot.get())
    }

    /// Call a script or native function by name with copies of `args`.
    pub fn call(&self, name: &str, args: Vec<Value>) -> std::result::Result<Value, EvalError> {
        let func = self.resolve_function(name)?;
        let args: Vec<ValueRef> = args.into_iter().map(ValueRef::new).collect();
        let result = call_function(self, &func, &self.global, &args, None)?;
        Ok(result.get())
    }

    fn batch(&mut self, text: &str) -> Result<()> {
        self.line = 0;
        for (index, line) in text.lines().enumerate() {
            if index == 0 && line.starts_with("#!") {
                self.line += 1;
                continue;
            }
            self.ingest(line)?;
        }
        self.finish_batch()
    }

    fn finish_batch(&mut self) -> Result<()> {
        self.flush()?;
        if !self.parser.is_idle() {
            let source = ParseError::Unterminated(self.parser.open_description());
            self.parser.reset();
            return Err(ScriptError::Parse {
                line: self.line,
                source,
            });
        }
        Ok(())
    }

    fn ingest(&mut self, line: &str) -> Result<()> {
        self.line += 1;
        let actions = self.feed_line(line)?;
        self.run(actions)
    }

    fn feed_line(&mut self, line: &str) -> Result<Vec<Action>> {
        let mut actions = Vec::new();
        let parser = &mut self.parser;
        let fed = tokenize(line).and_then(|tokens| {
            tokens
                .into_iter()
                .try_for_each(|token| parser.feed(token, &mut actions))
        });

        match fed {
            Ok(()) => Ok(actions),
            Err(source) => {
                if !actions.is_empty() {
                    debug!(
                        line = self.line,
                        discarded = actions.len(),
                        "discarding statements parsed before the error"
                    );
                }
                self.parser.reset();
                Err(ScriptError::Parse {
                    line: self.line,
                    source,
                })
            }
        }
    }

    fn run(&mut self, actions: Vec<Action>) -> Result<()> {
        for action in actions {
            if let Err(err) = self.apply(action) {
                self.parser.reset();
                return Err(err);
            }
        }
        Ok(())
    }

    fn apply(&mut self, action: Action) -> Result<()> {
        let line = self.line;
        let failed = |source| ScriptError::Eval { line, source };

        match action {
            Action::Execute { expr, scope } => {
                self.tick().map_err(failed)?;
                expr.eval(self, &Frame::new(scope)).map_err(failed)?;
            }
            Action::DefineClass { scope, bases } => self.define_class(&scope, &bases),
            Action::Import(name) => self.import_module(&name).map_err(failed)?,
            Action::ImportFile(path) => self.import_file(&path)?,
        }
        Ok(())
    }

    /// Inherit base members into a fresh class scope and register its
    /// default constructor next to it.
    fn define_class(&self, class_scope: &ScopeRef, bases: &[ScopeRef]) {
        for base in bases {
            for (name, slot) in base.variables() {
                class_scope.insert_variable(name, ValueRef::new(slot.get().deep_copy()));
            }
            for func in base.functions() {
                class_scope.insert_function(func);
            }
        }

        let constructor = Function::script(
            class_scope.name(),
            FunctionType::Constructor,
            Vec::new(),
            Default::default(),
            class_scope,
        );
        let outer = class_scope.parent().unwrap_or_else(|| self.global.clone());
        outer.insert_function(constructor);
    }

    /// `import "path"`: run another script with its own parser state.
    fn import_file(&mut self, path: &str) -> Result<()> {
        let nested = Parser::new(
            self.global.clone(),
            self.operators().clone(),
            self.context.max_expression_depth,
        );
        let outer = mem::replace(&mut self.parser, nested);
        let line = self.line;

        let result = self.load_file(Path::new(path));

        self.parser = outer;
        self.line = line;
        result
    }

    fn load_file(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "evaluating script file");
        self.batch(&text)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Native registration
    // ═══════════════════════════════════════════════════════════════════

    /// Register a native function that only sees its arguments.
    pub fn new_function<F>(&self, scope: &ScopeRef, name: &str, callback: F) -> FunctionRef
    where
        F: Fn(&[ValueRef]) -> NativeResult + Send + Sync + 'static,
    {
        scope.insert_function(Function::native(name, callback))
    }

    /// Register a native function that also sees the interpreter and the
    /// calling scope.
    pub fn new_scoped_function<F>(&self, scope: &ScopeRef, name: &str, callback: F) -> FunctionRef
    where
        F: Fn(&Interpreter, &ScopeRef, &[ValueRef]) -> NativeResult + Send + Sync + 'static,
    {
        scope.insert_function(Function::scoped(name, callback))
    }

    /// Register a native method in a class scope.
    pub fn new_member_function<F>(&self, scope: &ScopeRef, name: &str, callback: F) -> FunctionRef
    where
        F: Fn(&Interpreter, Option<&ClassRef>, &ScopeRef, &[ValueRef]) -> NativeResult
            + Send
            + Sync
            + 'static,
    {
        scope.insert_function(Function::class(
            name,
            FunctionType::Member,
            Some(scope),
            callback,
        ))
    }

    /// Bind a variable in `scope`, returning its slot.
    pub fn new_variable(&self, scope: &ScopeRef, name: &str, value: Value) -> ValueRef {
        scope.insert_variable(name, ValueRef::new(value))
    }

    /// Bind several variables in `scope`.
    pub fn new_variables<I, S>(&self, scope: &ScopeRef, variables: I)
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        for (name, value) in variables {
            scope.insert_variable(name, ValueRef::new(value));
        }
    }

    /// Define a native class in `scope`.
    ///
    /// Creates the class scope holding the member defaults and `methods`,
    /// and registers `constructor` under the class name. Calling the class
    /// builds an instance from the member defaults, then runs `constructor`
    /// with the instance as class context. Returns the class scope.
    pub fn new_class<I, S, F>(
        &self,
        scope: &ScopeRef,
        name: &str,
        variables: I,
        constructor: F,
        methods: Vec<FunctionRef>,
    ) -> ScopeRef
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
        F: Fn(&Interpreter, Option<&ClassRef>, &ScopeRef, &[ValueRef]) -> NativeResult
            + Send
            + Sync
            + 'static,
    {
        let class_scope = Scope::new_class_scope(scope, name);
        self.new_variables(&class_scope, variables);
        for method in methods {
            class_scope.insert_function(method);
        }
        scope.insert_function(Function::class(
            name,
            FunctionType::Constructor,
            Some(&class_scope),
            constructor,
        ));
        class_scope
    }

    /// Build a bare instance of a class scope without running a constructor.
    pub fn instantiate(&self, class_scope: &ScopeRef) -> ClassRef {
        Class::from_scope(class_scope)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Modules
    // ═══════════════════════════════════════════════════════════════════

    /// Register a module, replacing any module of the same name.
    ///
    /// A module with no required privileges is installed at once; any other
    /// module waits for `import`.
    pub fn new_module(&mut self, module: Module) -> ModuleRef {
        let module: ModuleRef = module.into();
        let name = module.name().to_string();
        self.modules.retain(|m| m.name() != name || m.name() == STANDARD_LIB);
        self.optional.retain(|m| m.name() != name);

        if module.required().is_empty() {
            debug!(module = %name, "installed module");
            self.modules.push(module.clone());
        } else {
            debug!(module = %name, required = ?module.required(), "registered optional module");
            self.optional.push(module.clone());
        }
        module
    }

    /// Install a registered module, checking its privileges.
    pub fn import_module(&mut self, name: &str) -> std::result::Result<(), EvalError> {
        if self.modules.iter().any(|m| m.name() == name) {
            return Ok(());
        }
        let index = self
            .optional
            .iter()
            .position(|m| m.name() == name)
            .ok_or_else(|| EvalError::UnknownModule(name.to_string()))?;

        if let Err(denied) = self.optional[index].check(self.privileges) {
            warn!(module = name, privileges = ?self.privileges, "import denied");
            return Err(denied);
        }

        let module = self.optional.remove(index);
        debug!(module = name, "imported module");
        self.modules.push(module);
        Ok(())
    }

    /// Forget every script definition and imported module.
    ///
    /// Host registrations in the global scope and custom modules are
    /// dropped too; the standard library and built-in optional modules are
    /// restored.
    pub fn clear_state(&mut self) {
        self.global.clear();
        self.modules = vec![self.stdlib.clone()];
        self.optional.clear();
        self.register_optional_modules();
        self.parser.reset();
        self.parser.set_root(self.global.clone());
        self.line = 0;
        self.call_depth.set(0);
        self.statements.set(0);
        debug!("cleared interpreter state");
    }
}
