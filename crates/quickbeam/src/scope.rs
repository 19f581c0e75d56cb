//! Lexical scopes holding variable, function and sub-scope bindings

use std::fmt;
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use crate::value::{FunctionRef, ValueRef};

/// Shared scope handle.
pub type ScopeRef = Arc<Scope>;

/// A lexical environment linked to its parent.
///
/// Each table can be inserted into concurrently from host threads. Lookups
/// walk the parent chain outward and stop at the first match; insertion only
/// ever touches the target scope. Parent links are weak, so a child never
/// keeps its parent alive.
///
/// # Example
///
/// ```
/// use quickbeam::{Scope, Value};
///
/// let global = Scope::global("global");
/// global.insert_variable("x", Value::Int(1).into());
///
/// let block = Scope::child(&global, "block");
/// block.insert_variable("y", Value::Int(2).into());
///
/// assert_eq!(block.resolve_variable("x").unwrap().get(), Value::Int(1));
/// assert!(global.resolve_variable("y").is_none());
/// ```
pub struct Scope {
    name: String,
    parent: Option<Weak<Scope>>,
    class_scope: bool,
    variables: DashMap<String, ValueRef>,
    scopes: DashMap<String, ScopeRef>,
    functions: DashMap<String, FunctionRef>,
}

impl Scope {
    fn build(name: impl Into<String>, parent: Option<&ScopeRef>, class_scope: bool) -> ScopeRef {
        Arc::new(Scope {
            name: name.into(),
            parent: parent.map(Arc::downgrade),
            class_scope,
            variables: DashMap::new(),
            scopes: DashMap::new(),
            functions: DashMap::new(),
        })
    }

    /// Create a root scope.
    pub fn global(name: impl Into<String>) -> ScopeRef {
        Self::build(name, None, false)
    }

    /// Create a transient child that is not registered in the parent.
    ///
    /// Call frames and block bodies use these; they live as long as the
    /// evaluation holding them.
    pub fn child(parent: &ScopeRef, name: impl Into<String>) -> ScopeRef {
        Self::build(name, Some(parent), false)
    }

    /// Get or create the named sub-scope of `parent`.
    pub fn new_scope(parent: &ScopeRef, name: &str) -> ScopeRef {
        parent
            .scopes
            .entry(name.to_string())
            .or_insert_with(|| Self::build(name, Some(parent), false))
            .value()
            .clone()
    }

    /// Create a class scope under `parent`, replacing any previous one of that name.
    pub fn new_class_scope(parent: &ScopeRef, name: &str) -> ScopeRef {
        let scope = Self::build(name, Some(parent), true);
        parent.scopes.insert(name.to_string(), scope.clone());
        scope
    }

    /// Remove a named non-class sub-scope. Returns whether one was removed.
    pub fn close_scope(&self, name: &str) -> bool {
        self.scopes
            .remove_if(name, |_, scope| !scope.class_scope)
            .is_some()
    }

    /// Scope name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent scope, if it is still alive.
    pub fn parent(&self) -> Option<ScopeRef> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Whether this scope holds a class definition.
    pub fn is_class_scope(&self) -> bool {
        self.class_scope
    }

    // ═══════════════════════════════════════════════════════════════════
    // Insertion
    // ═══════════════════════════════════════════════════════════════════

    /// Bind a variable, replacing any slot of the same name. Returns the slot.
    pub fn insert_variable(&self, name: impl Into<String>, value: ValueRef) -> ValueRef {
        self.variables.insert(name.into(), value.clone());
        value
    }

    /// Register a function under its own name.
    pub fn insert_function(&self, func: FunctionRef) -> FunctionRef {
        self.functions.insert(func.name().to_string(), func.clone());
        func
    }

    /// Register a named sub-scope.
    pub fn insert_scope(&self, name: impl Into<String>, scope: ScopeRef) {
        self.scopes.insert(name.into(), scope);
    }

    /// Remove a variable binding from this scope only.
    pub fn remove_variable(&self, name: &str) -> Option<ValueRef> {
        self.variables.remove(name).map(|(_, slot)| slot)
    }

    /// Drop every binding in this scope.
    pub fn clear(&self) {
        self.variables.clear();
        self.scopes.clear();
        self.functions.clear();
    }

    // ═══════════════════════════════════════════════════════════════════
    // Local lookup
    // ═══════════════════════════════════════════════════════════════════

    /// Variable bound directly in this scope.
    pub fn variable(&self, name: &str) -> Option<ValueRef> {
        self.variables.get(name).map(|slot| slot.value().clone())
    }

    /// Function registered directly in this scope.
    pub fn function(&self, name: &str) -> Option<FunctionRef> {
        self.functions.get(name).map(|func| func.value().clone())
    }

    /// Sub-scope registered directly in this scope.
    pub fn scope(&self, name: &str) -> Option<ScopeRef> {
        self.scopes.get(name).map(|scope| scope.value().clone())
    }

    /// Snapshot of the variables bound in this scope.
    pub fn variables(&self) -> Vec<(String, ValueRef)> {
        self.variables
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Snapshot of the functions registered in this scope.
    pub fn functions(&self) -> Vec<FunctionRef> {
        self.functions.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Sorted names of the variables bound in this scope.
    pub fn variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.variables.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    // ═══════════════════════════════════════════════════════════════════
    // Chain lookup
    // ═══════════════════════════════════════════════════════════════════

    fn walk<T>(&self, lookup: impl Fn(&Scope) -> Option<T>) -> Option<T> {
        if let Some(found) = lookup(self) {
            return Some(found);
        }
        let mut current = self.parent();
        while let Some(scope) = current {
            if let Some(found) = lookup(&scope) {
                return Some(found);
            }
            current = scope.parent();
        }
        None
    }

    /// Find a variable here or in the nearest ancestor that binds it.
    pub fn resolve_variable(&self, name: &str) -> Option<ValueRef> {
        self.walk(|scope| scope.variable(name))
    }

    /// Find a function here or in the nearest ancestor that registers it.
    pub fn resolve_function(&self, name: &str) -> Option<FunctionRef> {
        self.walk(|scope| scope.function(name))
    }

    /// Find a named sub-scope here or in the nearest ancestor that registers it.
    pub fn resolve_scope(&self, name: &str) -> Option<ScopeRef> {
        self.walk(|scope| scope.scope(name))
    }

    /// Find a function, or a variable holding one, walking outward.
    ///
    /// At each level the function table wins over the variable table.
    pub fn resolve_callable(&self, name: &str) -> Option<FunctionRef> {
        self.walk(|scope| {
            scope.function(name).or_else(|| {
                scope
                    .variable(name)
                    .and_then(|slot| slot.read().as_function().cloned())
            })
        })
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut functions: Vec<String> = self.functions.iter().map(|e| e.key().clone()).collect();
        functions.sort();
        f.debug_struct("Scope")
            .field("name", &self.name)
            .field("class_scope", &self.class_scope)
            .field("variables", &self.variable_names())
            .field("functions", &functions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Function, Value};

    #[test]
    fn test_child_sees_parent() {
        let global = Scope::global("global");
        global.insert_variable("x", Value::Int(1).into());
        let child = Scope::child(&global, "child");
        assert_eq!(child.resolve_variable("x").unwrap().get(), Value::Int(1));
        assert!(child.variable("x").is_none());
    }

    #[test]
    fn test_siblings_are_isolated() {
        let global = Scope::global("global");
        let a = Scope::new_scope(&global, "a");
        let b = Scope::new_scope(&global, "b");
        a.insert_variable("only_a", Value::Null.into());
        assert!(b.resolve_variable("only_a").is_none());
    }

    #[test]
    fn test_new_scope_reuses_by_name() {
        let global = Scope::global("global");
        let first = Scope::new_scope(&global, "block");
        let second = Scope::new_scope(&global, "block");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_close_scope_keeps_class_scopes() {
        let global = Scope::global("global");
        Scope::new_scope(&global, "block");
        Scope::new_class_scope(&global, "Point");
        assert!(global.close_scope("block"));
        assert!(!global.close_scope("Point"));
        assert!(global.scope("Point").unwrap().is_class_scope());
    }

    #[test]
    fn test_parent_is_not_kept_alive() {
        let global = Scope::global("global");
        let child = Scope::child(&global, "child");
        drop(global);
        assert!(child.parent().is_none());
    }

    #[test]
    fn test_resolve_callable_prefers_function_table() {
        let global = Scope::global("global");
        let f = global.insert_function(Function::native("f", |_| Ok(ValueRef::null())));
        let g = Function::native("g", |_| Ok(ValueRef::null()));
        global.insert_variable("f", Value::Function(g.clone()).into());
        global.insert_variable("h", Value::Function(g.clone()).into());

        let child = Scope::child(&global, "child");
        assert!(Arc::ptr_eq(&child.resolve_callable("f").unwrap(), &f));
        assert!(Arc::ptr_eq(&child.resolve_callable("h").unwrap(), &g));
        assert!(child.resolve_callable("missing").is_none());
    }
}
