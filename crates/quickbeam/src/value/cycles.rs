//! Cycle-aware walks over shared containers
//!
//! Dictionaries, class instances and value slots are shared handles, so a
//! container can end up holding itself (`d["k"] = d`). Printing, comparing and
//! deep copying keep track of the handles they are inside of and stop at the
//! back edge instead of recursing forever.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use super::{Class, ClassRef, Dictionary, DictionaryRef, Value, ValueRef};

/// Printed in place of a container that is already being printed.
pub(crate) const CYCLE_MARKER: &str = "<cycle>";

pub(crate) fn dictionary_addr(dict: &DictionaryRef) -> usize {
    Arc::as_ptr(dict) as *const () as usize
}

pub(crate) fn class_addr(class: &Class) -> usize {
    class as *const Class as usize
}

// ═══════════════════════════════════════════════════════════════════════════
// Path tracking
// ═══════════════════════════════════════════════════════════════════════════

/// Container handles on the current descent.
pub(crate) struct Path<K>(Vec<K>);

impl<K> Default for Path<K> {
    fn default() -> Self {
        Path(Vec::new())
    }
}

impl<K: PartialEq> Path<K> {
    /// Push `key`, or return false when the walk is already inside it.
    pub(crate) fn enter(&mut self, key: K) -> bool {
        if self.0.contains(&key) {
            return false;
        }
        self.0.push(key);
        true
    }

    pub(crate) fn leave(&mut self) {
        self.0.pop();
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Equality
// ═══════════════════════════════════════════════════════════════════════════

/// Pairs of containers being compared. A pair met again is assumed equal;
/// any real difference shows up elsewhere on the walk.
pub(crate) type Pairs = Path<(usize, usize)>;

fn within(pairs: &mut Pairs, key: (usize, usize), walk: impl FnOnce(&mut Pairs) -> bool) -> bool {
    if !pairs.enter(key) {
        return true;
    }
    let equal = walk(pairs);
    pairs.leave();
    equal
}

pub(crate) fn values_equal(lhs: &Value, rhs: &Value, pairs: &mut Pairs) -> bool {
    match (lhs, rhs) {
        (Value::Null, Value::Null) => true,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Vec3(a), Value::Vec3(b)) => a == b,
        (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
        (Value::UserPointer(a), Value::UserPointer(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => a == b,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| slots_equal(x, y, pairs))
        }
        (Value::Dictionary(a), Value::Dictionary(b)) => dictionaries_equal(a, b, pairs),
        (Value::Class(a), Value::Class(b)) => classes_equal(a, b, pairs),
        _ => false,
    }
}

pub(crate) fn slots_equal(lhs: &ValueRef, rhs: &ValueRef, pairs: &mut Pairs) -> bool {
    if lhs.ptr_eq(rhs) {
        return true;
    }
    within(pairs, (lhs.addr(), rhs.addr()), |pairs| {
        values_equal(&lhs.get(), &rhs.get(), pairs)
    })
}

/// Slots of `lhs` paired with the slots under the same keys in `rhs`, or
/// `None` when the key sets differ.
fn paired_slots(lhs: &Dictionary, rhs: &Dictionary) -> Option<Vec<(ValueRef, ValueRef)>> {
    if lhs.len() != rhs.len() {
        return None;
    }
    lhs.iter()
        .map(|(key, slot)| match rhs.get(key) {
            Ok(Some(other)) => Some((slot.clone(), other)),
            _ => None,
        })
        .collect()
}

fn dictionaries_equal(lhs: &DictionaryRef, rhs: &DictionaryRef, pairs: &mut Pairs) -> bool {
    if Arc::ptr_eq(lhs, rhs) {
        return true;
    }
    let Some(slots) = paired_slots(&lhs.read(), &rhs.read()) else {
        return false;
    };
    within(pairs, (dictionary_addr(lhs), dictionary_addr(rhs)), |pairs| {
        slots.iter().all(|(a, b)| slots_equal(a, b, pairs))
    })
}

/// Entry-wise comparison of two unshared dictionaries.
pub(crate) fn dictionary_entries_equal(lhs: &Dictionary, rhs: &Dictionary) -> bool {
    let Some(slots) = paired_slots(lhs, rhs) else {
        return false;
    };
    let mut pairs = Pairs::default();
    slots.iter().all(|(a, b)| slots_equal(a, b, &mut pairs))
}

pub(crate) fn classes_equal(lhs: &Class, rhs: &Class, pairs: &mut Pairs) -> bool {
    if std::ptr::eq(lhs, rhs) {
        return true;
    }
    if lhs.name() != rhs.name() || lhs.len() != rhs.len() {
        return false;
    }
    let mut slots = Vec::with_capacity(lhs.len());
    for (name, slot) in lhs.variables() {
        match rhs.variable(&name) {
            Some(other) => slots.push((slot, other)),
            None => return false,
        }
    }
    within(pairs, (class_addr(lhs), class_addr(rhs)), |pairs| {
        slots.iter().all(|(a, b)| slots_equal(a, b, pairs))
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Deep copy
// ═══════════════════════════════════════════════════════════════════════════

/// Copies made so far during one deep copy, keyed by source address.
///
/// A handle reached twice maps to the same copy, so shared and cyclic
/// structure is reproduced in the copy rather than unrolled.
#[derive(Default)]
pub(crate) struct Copies {
    slots: FxHashMap<usize, ValueRef>,
    dictionaries: FxHashMap<usize, DictionaryRef>,
    classes: FxHashMap<usize, ClassRef>,
}

impl Copies {
    pub(crate) fn value(&mut self, value: &Value) -> Value {
        match value {
            Value::List(list) => Value::List(list.iter().map(|slot| self.slot(slot)).collect()),
            Value::Dictionary(dict) => Value::Dictionary(self.dictionary(dict)),
            Value::Class(class) => Value::Class(self.class(class)),
            other => other.clone(),
        }
    }

    pub(crate) fn slot(&mut self, slot: &ValueRef) -> ValueRef {
        if let Some(copy) = self.slots.get(&slot.addr()) {
            return copy.clone();
        }
        let copy = ValueRef::null();
        self.slots.insert(slot.addr(), copy.clone());
        let value = self.value(&slot.get());
        copy.set(value);
        copy
    }

    fn dictionary(&mut self, dict: &DictionaryRef) -> DictionaryRef {
        let addr = dictionary_addr(dict);
        if let Some(copy) = self.dictionaries.get(&addr) {
            return copy.clone();
        }
        let copy = Dictionary::new().into_ref();
        self.dictionaries.insert(addr, copy.clone());
        let source = dict.read().clone();
        let filled = self.entries(&source);
        *copy.write() = filled;
        copy
    }

    /// Same keys as `dict`, each slot replaced by its copy.
    pub(crate) fn entries(&mut self, dict: &Dictionary) -> Dictionary {
        dict.map_slots(|slot| self.slot(slot))
    }

    pub(crate) fn class(&mut self, class: &Class) -> ClassRef {
        let addr = class_addr(class);
        if let Some(copy) = self.classes.get(&addr) {
            return copy.clone();
        }
        let copy = Class::new(class.name(), IndexMap::new(), class.function_scope().clone());
        self.classes.insert(addr, copy.clone());
        for (name, slot) in class.variables() {
            let member = self.slot(&slot);
            copy.insert_variable(name, member);
        }
        copy
    }
}
