//! Shared value slots

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::cycles::{slots_equal, Pairs};
use super::{Type, Value};

/// A shared, interior-mutable slot holding a [`Value`].
///
/// Variables, list elements, dictionary entries and class members are all
/// slots. Evaluation hands slots around so that assignment operators can
/// write through them; cloning a `ValueRef` aliases the slot, it does not copy
/// the value.
///
/// Never hold a write guard on one slot while reading another slot that may
/// be the same one: copy the value out with [`ValueRef::get`] first.
#[derive(Clone, Default)]
pub struct ValueRef(Arc<RwLock<Value>>);

impl ValueRef {
    /// Create a fresh slot.
    pub fn new(value: Value) -> Self {
        ValueRef(Arc::new(RwLock::new(value)))
    }

    /// Create a fresh slot holding `null`.
    pub fn null() -> Self {
        Self::new(Value::Null)
    }

    /// Copy the held value out.
    pub fn get(&self) -> Value {
        self.0.read().clone()
    }

    /// Replace the held value.
    pub fn set(&self, value: Value) {
        *self.0.write() = value;
    }

    /// Borrow the held value.
    pub fn read(&self) -> RwLockReadGuard<'_, Value> {
        self.0.read()
    }

    /// Mutably borrow the held value.
    pub fn write(&self) -> RwLockWriteGuard<'_, Value> {
        self.0.write()
    }

    /// Kind of the held value.
    pub fn type_of(&self) -> Type {
        self.0.read().type_of()
    }

    /// Truthiness of the held value.
    pub fn truthy(&self) -> bool {
        self.0.read().truthy()
    }

    /// Whether both handles point at the same slot.
    pub fn ptr_eq(&self, other: &ValueRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the slot, used for identity.
    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl From<Value> for ValueRef {
    fn from(value: Value) -> Self {
        ValueRef::new(value)
    }
}

impl PartialEq for ValueRef {
    fn eq(&self, other: &Self) -> bool {
        slots_equal(self, other, &mut Pairs::default())
    }
}

impl fmt::Debug for ValueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0.read(), f)
    }
}
