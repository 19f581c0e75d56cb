//! Homogeneous typed arrays

use crate::error::ValueError;

use super::{FunctionRef, Type, UserPointer, Value, Vec3};

/// A homogeneous buffer of one element kind.
///
/// Mutations fail unless the operand matches the current element kind. An
/// empty array is Int-typed and adopts the kind of its first element.
#[derive(Debug, Clone, PartialEq)]
pub enum Array {
    /// Integers
    Int(Vec<i64>),
    /// Floats
    Float(Vec<f64>),
    /// Vectors
    Vec3(Vec<Vec3>),
    /// Function references
    Function(Vec<FunctionRef>),
    /// Host handles
    UserPointer(Vec<UserPointer>),
    /// Strings
    String(Vec<String>),
}

/// Run `$body` against the element vector, whatever its kind.
macro_rules! each_kind {
    ($array:expr, $items:ident => $body:expr) => {
        match $array {
            Array::Int($items) => $body,
            Array::Float($items) => $body,
            Array::Vec3($items) => $body,
            Array::Function($items) => $body,
            Array::UserPointer($items) => $body,
            Array::String($items) => $body,
        }
    };
}

/// Like `each_kind!`, re-wrapping the resulting vector in the same kind.
macro_rules! map_kind {
    ($array:expr, $items:ident => $body:expr) => {
        match $array {
            Array::Int($items) => Array::Int($body),
            Array::Float($items) => Array::Float($body),
            Array::Vec3($items) => Array::Vec3($body),
            Array::Function($items) => Array::Function($body),
            Array::UserPointer($items) => Array::UserPointer($body),
            Array::String($items) => Array::String($body),
        }
    };
}

impl Default for Array {
    fn default() -> Self {
        Array::Int(Vec::new())
    }
}

impl Array {
    /// Create an empty Int-typed array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty array of the given element kind.
    pub fn with_kind(kind: Type) -> Option<Self> {
        Some(match kind {
            Type::Int => Array::Int(Vec::new()),
            Type::Float => Array::Float(Vec::new()),
            Type::Vec3 => Array::Vec3(Vec::new()),
            Type::Function => Array::Function(Vec::new()),
            Type::UserPointer => Array::UserPointer(Vec::new()),
            Type::String => Array::String(Vec::new()),
            _ => return None,
        })
    }

    /// Build an array from values that must all share one element kind.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Result<Self, ValueError> {
        let mut array = Array::new();
        for value in values {
            if !value.type_of().is_array_element() {
                return Err(ValueError::NestedCollection);
            }
            array.push(value)?;
        }
        Ok(array)
    }

    /// Build an array typed by the first element, skipping elements of other kinds.
    pub fn from_values_lossy(values: impl IntoIterator<Item = Value>) -> Result<Self, ValueError> {
        let mut array: Option<Array> = None;
        for value in values {
            let kind = value.type_of();
            if kind > Type::String {
                return Err(ValueError::NestedCollection);
            }
            if array.is_none() {
                array = Array::with_kind(kind);
            }
            let Some(target) = array.as_mut() else {
                continue;
            };
            if target.element_type() == kind {
                target.push(value)?;
            }
        }
        Ok(array.unwrap_or_default())
    }

    /// Array of the values when they are non-empty and share one element kind.
    pub fn homogeneous(values: &[Value]) -> Option<Self> {
        let kind = values.first()?.type_of();
        if !kind.is_array_element() || values.iter().any(|v| v.type_of() != kind) {
            return None;
        }
        Array::from_values(values.iter().cloned()).ok()
    }

    /// Current element kind.
    pub fn element_type(&self) -> Type {
        match self {
            Array::Int(_) => Type::Int,
            Array::Float(_) => Type::Float,
            Array::Vec3(_) => Type::Vec3,
            Array::Function(_) => Type::Function,
            Array::UserPointer(_) => Type::UserPointer,
            Array::String(_) => Type::String,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        each_kind!(self, items => items.len())
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the element at `index`.
    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            Array::Int(items) => items.get(index).copied().map(Value::Int),
            Array::Float(items) => items.get(index).copied().map(Value::Float),
            Array::Vec3(items) => items.get(index).copied().map(Value::Vec3),
            Array::Function(items) => items.get(index).cloned().map(Value::Function),
            Array::UserPointer(items) => items.get(index).cloned().map(Value::UserPointer),
            Array::String(items) => items.get(index).cloned().map(Value::String),
        }
    }

    /// Iterate over copies of the elements.
    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).filter_map(move |index| self.get(index))
    }

    /// Retype an empty array to `kind` so the first write decides the kind.
    fn adopt(&mut self, kind: Type) {
        if self.is_empty() && self.element_type() != kind {
            if let Some(fresh) = Array::with_kind(kind) {
                *self = fresh;
            }
        }
    }

    /// Append one element of the current kind.
    pub fn push(&mut self, value: Value) -> Result<(), ValueError> {
        self.adopt(value.type_of());
        match (self, value) {
            (Array::Int(items), Value::Int(v)) => items.push(v),
            (Array::Float(items), Value::Float(v)) => items.push(v),
            (Array::Vec3(items), Value::Vec3(v)) => items.push(v),
            (Array::Function(items), Value::Function(v)) => items.push(v),
            (Array::UserPointer(items), Value::UserPointer(v)) => items.push(v),
            (Array::String(items), Value::String(v)) => items.push(v),
            (array, value) => {
                return Err(ValueError::ArrayTypeMismatch {
                    expected: array.element_type(),
                    got: value.type_of(),
                })
            }
        }
        Ok(())
    }

    /// Insert one element of the current kind at `index`.
    pub fn insert(&mut self, index: usize, value: Value) -> Result<(), ValueError> {
        let len = self.len();
        if index > len {
            return Err(ValueError::IndexOutOfBounds {
                index: index as i64,
                len,
            });
        }
        self.adopt(value.type_of());
        match (self, value) {
            (Array::Int(items), Value::Int(v)) => items.insert(index, v),
            (Array::Float(items), Value::Float(v)) => items.insert(index, v),
            (Array::Vec3(items), Value::Vec3(v)) => items.insert(index, v),
            (Array::Function(items), Value::Function(v)) => items.insert(index, v),
            (Array::UserPointer(items), Value::UserPointer(v)) => items.insert(index, v),
            (Array::String(items), Value::String(v)) => items.insert(index, v),
            (array, value) => {
                return Err(ValueError::ArrayTypeMismatch {
                    expected: array.element_type(),
                    got: value.type_of(),
                })
            }
        }
        Ok(())
    }

    /// Append every element of an array of the same kind.
    pub fn extend(&mut self, other: &Array) -> Result<(), ValueError> {
        if other.is_empty() {
            return Ok(());
        }
        self.adopt(other.element_type());
        match (self, other) {
            (Array::Int(a), Array::Int(b)) => a.extend_from_slice(b),
            (Array::Float(a), Array::Float(b)) => a.extend_from_slice(b),
            (Array::Vec3(a), Array::Vec3(b)) => a.extend_from_slice(b),
            (Array::Function(a), Array::Function(b)) => a.extend(b.iter().cloned()),
            (Array::UserPointer(a), Array::UserPointer(b)) => a.extend(b.iter().cloned()),
            (Array::String(a), Array::String(b)) => a.extend(b.iter().cloned()),
            (a, b) => {
                return Err(ValueError::ArrayTypeMismatch {
                    expected: a.element_type(),
                    got: b.element_type(),
                })
            }
        }
        Ok(())
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Option<Value> {
        match self {
            Array::Int(items) => items.pop().map(Value::Int),
            Array::Float(items) => items.pop().map(Value::Float),
            Array::Vec3(items) => items.pop().map(Value::Vec3),
            Array::Function(items) => items.pop().map(Value::Function),
            Array::UserPointer(items) => items.pop().map(Value::UserPointer),
            Array::String(items) => items.pop().map(Value::String),
        }
    }

    /// Remove and return the element at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Value> {
        if index >= self.len() {
            return None;
        }
        Some(match self {
            Array::Int(items) => Value::Int(items.remove(index)),
            Array::Float(items) => Value::Float(items.remove(index)),
            Array::Vec3(items) => Value::Vec3(items.remove(index)),
            Array::Function(items) => Value::Function(items.remove(index)),
            Array::UserPointer(items) => Value::UserPointer(items.remove(index)),
            Array::String(items) => Value::String(items.remove(index)),
        })
    }

    /// Reverse in place.
    pub fn reverse(&mut self) {
        each_kind!(self, items => items.reverse())
    }

    /// Sort in place. Vectors order by `x`; handles keep their order.
    pub fn sort(&mut self) {
        match self {
            Array::Int(items) => items.sort_unstable(),
            Array::Float(items) => items.sort_by(|a, b| a.total_cmp(b)),
            Array::Vec3(items) => items.sort_by(|a, b| a.x.total_cmp(&b.x)),
            Array::String(items) => items.sort(),
            Array::Function(_) | Array::UserPointer(_) => {}
        }
    }

    /// Copy of the elements in `start..end`, clamped to the array bounds.
    pub fn slice(&self, start: usize, end: usize) -> Array {
        let end = end.min(self.len());
        let start = start.min(end);
        map_kind!(self, items => items[start..end].to_vec())
    }

    /// Index of the first element equal to `value`.
    pub fn position(&self, value: &Value) -> Option<usize> {
        self.iter().position(|item| item == *value)
    }
}
