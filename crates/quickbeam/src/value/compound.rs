//! Shared composite values: dictionaries and class instances

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::ValueError;
use crate::scope::ScopeRef;

use super::cycles::{self, Copies, Pairs};
use super::{Value, ValueRef};

/// Shared dictionary handle.
pub type DictionaryRef = Arc<RwLock<Dictionary>>;

/// Shared class instance handle.
pub type ClassRef = Arc<Class>;

// ═══════════════════════════════════════════════════════════════════════════
// Dictionary
// ═══════════════════════════════════════════════════════════════════════════

/// Map from a key's content hash to a value slot.
///
/// The key value is kept next to its slot so the dictionary can print and
/// enumerate its keys. Entries iterate in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: IndexMap<u64, (Value, ValueRef)>,
}

impl Dictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap into a shared handle.
    pub fn into_ref(self) -> DictionaryRef {
        Arc::new(RwLock::new(self))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Slot stored under `key`.
    pub fn get(&self, key: &Value) -> Result<Option<ValueRef>, ValueError> {
        let hash = key.hash_key()?;
        Ok(self.entries.get(&hash).map(|(_, slot)| slot.clone()))
    }

    /// Slot stored under `key`, inserting a `null` slot when absent.
    pub fn entry(&mut self, key: Value) -> Result<ValueRef, ValueError> {
        let hash = key.hash_key()?;
        let (_, slot) = self
            .entries
            .entry(hash)
            .or_insert_with(|| (key, ValueRef::null()));
        Ok(slot.clone())
    }

    /// Store `value` under `key`, replacing any previous slot.
    pub fn insert(&mut self, key: Value, value: ValueRef) -> Result<(), ValueError> {
        let hash = key.hash_key()?;
        self.entries.insert(hash, (key, value));
        Ok(())
    }

    /// Remove the entry under `key`, keeping the order of the others.
    pub fn remove(&mut self, key: &Value) -> Result<Option<ValueRef>, ValueError> {
        let hash = key.hash_key()?;
        Ok(self.entries.shift_remove(&hash).map(|(_, slot)| slot))
    }

    /// Whether an entry exists under `key`.
    pub fn contains_key(&self, key: &Value) -> Result<bool, ValueError> {
        Ok(self.entries.contains_key(&key.hash_key()?))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.values().map(|(key, _)| key)
    }

    /// Value slots in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &ValueRef> {
        self.entries.values().map(|(_, slot)| slot)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &ValueRef)> {
        self.entries.values().map(|(key, slot)| (key, slot))
    }

    /// Add the entries of `other` whose keys are not present yet.
    pub fn merge(&mut self, other: &Dictionary) {
        for (hash, entry) in &other.entries {
            self.entries.entry(*hash).or_insert_with(|| entry.clone());
        }
    }

    /// Copy with fresh slots holding deep copies.
    pub fn deep_copy(&self) -> Dictionary {
        Copies::default().entries(self)
    }

    /// Same keys in the same order, each slot replaced by `f(slot)`.
    pub(crate) fn map_slots(&self, mut f: impl FnMut(&ValueRef) -> ValueRef) -> Dictionary {
        let entries = self
            .entries
            .iter()
            .map(|(hash, (key, slot))| (*hash, (key.clone(), f(slot))))
            .collect();
        Dictionary { entries }
    }
}

impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || cycles::dictionary_entries_equal(self, other)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Class instances
// ═══════════════════════════════════════════════════════════════════════════

/// An instance of a script or host class.
///
/// Members live in the instance's own variable table; methods live in the
/// class scope shared by every instance.
pub struct Class {
    name: String,
    variables: RwLock<IndexMap<String, ValueRef>>,
    function_scope: ScopeRef,
}

impl Class {
    /// Create an instance with an explicit member table.
    pub fn new(
        name: impl Into<String>,
        variables: IndexMap<String, ValueRef>,
        function_scope: ScopeRef,
    ) -> ClassRef {
        Arc::new(Class {
            name: name.into(),
            variables: RwLock::new(variables),
            function_scope,
        })
    }

    /// Instantiate from a class scope, deep-copying its variables in name order.
    pub fn from_scope(scope: &ScopeRef) -> ClassRef {
        let mut members = scope.variables();
        members.sort_by(|(a, _), (b, _)| a.cmp(b));
        let mut copies = Copies::default();
        let variables = members
            .into_iter()
            .map(|(name, slot)| (name, copies.slot(&slot)))
            .collect();
        Self::new(scope.name(), variables, scope.clone())
    }

    /// Class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scope holding the class methods.
    pub fn function_scope(&self) -> &ScopeRef {
        &self.function_scope
    }

    /// Member slot by name.
    pub fn variable(&self, name: &str) -> Option<ValueRef> {
        self.variables.read().get(name).cloned()
    }

    /// Bind a member, replacing any previous slot, and return the slot.
    pub fn insert_variable(&self, name: impl Into<String>, value: ValueRef) -> ValueRef {
        self.variables.write().insert(name.into(), value.clone());
        value
    }

    /// Snapshot of the members in table order.
    pub fn variables(&self) -> Vec<(String, ValueRef)> {
        self.variables
            .read()
            .iter()
            .map(|(name, slot)| (name.clone(), slot.clone()))
            .collect()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.variables.read().len()
    }

    /// Whether the instance has no members.
    pub fn is_empty(&self) -> bool {
        self.variables.read().is_empty()
    }

    /// Independent instance with deep-copied members sharing the same methods.
    pub fn deep_copy(&self) -> ClassRef {
        Copies::default().class(self)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("variables", &*self.variables.read())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        cycles::classes_equal(self, other, &mut Pairs::default())
    }
}
