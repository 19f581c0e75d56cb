//! Core value queries, equality and conversions from host types

use super::cycles::{values_equal, Copies, Pairs};
use super::{Array, ClassRef, DictionaryRef, FunctionRef, Type, UserPointer, Value, ValueRef, Vec3};

impl Value {
    /// Kind tag of the active variant.
    pub fn type_of(&self) -> Type {
        match self {
            Value::Null => Type::Null,
            Value::Int(_) => Type::Int,
            Value::Float(_) => Type::Float,
            Value::Vec3(_) => Type::Vec3,
            Value::Function(_) => Type::Function,
            Value::UserPointer(_) => Type::UserPointer,
            Value::String(_) => Type::String,
            Value::Array(_) => Type::Array,
            Value::List(_) => Type::List,
            Value::Dictionary(_) => Type::Dictionary,
            Value::Class(_) => Type::Class,
        }
    }

    /// Truthiness used by conditions and logical operators.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Vec3(v) => !v.is_zero(),
            Value::String(s) => !s.is_empty(),
            Value::Array(array) => !array.is_empty(),
            Value::List(list) => !list.is_empty(),
            _ => false,
        }
    }

    /// Whether this is `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Element count of strings and containers.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(array) => Some(array.len()),
            Value::List(list) => Some(list.len()),
            Value::Dictionary(dict) => Some(dict.read().len()),
            Value::Class(class) => Some(class.len()),
            _ => None,
        }
    }

    /// Copies of the elements of a string or container, in container order.
    ///
    /// Strings yield one-character strings, dictionaries their values and
    /// class instances their member values. Other kinds yield nothing.
    pub fn elements(&self) -> Vec<Value> {
        match self {
            Value::String(s) => s.chars().map(|c| Value::String(c.into())).collect(),
            Value::Array(array) => array.iter().collect(),
            Value::List(list) => list.iter().map(ValueRef::get).collect(),
            Value::Dictionary(dict) => dict.read().values().map(ValueRef::get).collect(),
            Value::Class(class) => class.variables().into_iter().map(|(_, v)| v.get()).collect(),
            _ => Vec::new(),
        }
    }

    /// Fully independent copy: containers get fresh slots all the way down.
    ///
    /// A container reachable twice is copied once, so a structure that holds
    /// itself yields a copy that holds the copy.
    pub fn deep_copy(&self) -> Value {
        Copies::default().value(self)
    }

    /// The integer, if this is an Int.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The number as a float, if this is an Int or Float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// The text, if this is a String.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The function, if this is a Function.
    pub fn as_function(&self) -> Option<&FunctionRef> {
        match self {
            Value::Function(func) => Some(func),
            _ => None,
        }
    }

    /// The instance, if this is a Class.
    pub fn as_class(&self) -> Option<&ClassRef> {
        match self {
            Value::Class(class) => Some(class),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        values_equal(self, other, &mut Pairs::default())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Host conversions
// ═══════════════════════════════════════════════════════════════════════════

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Vec3> for Value {
    fn from(value: Vec3) -> Self {
        Value::Vec3(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Array> for Value {
    fn from(value: Array) -> Self {
        Value::Array(value)
    }
}

impl From<FunctionRef> for Value {
    fn from(value: FunctionRef) -> Self {
        Value::Function(value)
    }
}

impl From<UserPointer> for Value {
    fn from(value: UserPointer) -> Self {
        Value::UserPointer(value)
    }
}

impl From<DictionaryRef> for Value {
    fn from(value: DictionaryRef) -> Self {
        Value::Dictionary(value)
    }
}

impl From<ClassRef> for Value {
    fn from(value: ClassRef) -> Self {
        Value::Class(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::List(values.into_iter().map(ValueRef::new).collect())
    }
}
