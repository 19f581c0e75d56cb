//! Value representation for runtime values

mod array;
mod callable;
mod compound;
mod convert;
mod cycles;
mod display;
mod hashable;
mod impls;
mod ops;
mod refs;
mod vec3;

pub use array::Array;
pub use callable::{
    ClassFn, Function, FunctionBody, FunctionRef, FunctionType, NativeFn, NativeResult,
    Precedence, ScopedFn,
};
pub use compound::{Class, ClassRef, Dictionary, DictionaryRef};
pub use convert::{promote, promote_strict};
pub use refs::ValueRef;
pub use vec3::Vec3;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Heterogeneous ordered sequence of shared value slots.
pub type List = Vec<ValueRef>;

/// Runtime value representation for quickbeam scripts.
///
/// Variants are declared in promotion rank order: when two operands of
/// different kinds meet, the lower-ranked one is converted to the kind of the
/// higher-ranked one.
#[derive(Clone, Default)]
pub enum Value {
    // ═══════════════════════════════════════════════════════════════════
    // Scalars
    // ═══════════════════════════════════════════════════════════════════
    /// Absence of a value
    #[default]
    Null,

    /// 64-bit signed integer (also used for booleans)
    Int(i64),

    /// 64-bit float
    Float(f64),

    /// Three-component vector
    Vec3(Vec3),

    // ═══════════════════════════════════════════════════════════════════
    // Handles
    // ═══════════════════════════════════════════════════════════════════
    /// Shared function reference
    Function(FunctionRef),

    /// Opaque host handle
    UserPointer(UserPointer),

    // ═══════════════════════════════════════════════════════════════════
    // Containers
    // ═══════════════════════════════════════════════════════════════════
    /// Owned string
    String(String),

    /// Homogeneous typed buffer
    Array(Array),

    /// Heterogeneous list of shared slots
    List(List),

    /// Shared hash-keyed map of slots
    Dictionary(DictionaryRef),

    /// Shared class instance
    Class(ClassRef),
}

/// Kind tag of a [`Value`], ordered by promotion rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Type {
    /// `null`
    Null,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `vec3`
    Vec3,
    /// `function`
    Function,
    /// `userpointer`
    UserPointer,
    /// `string`
    String,
    /// `array`
    Array,
    /// `list`
    List,
    /// `dictionary`
    Dictionary,
    /// `class`
    Class,
}

impl Type {
    /// Script-visible name of the kind.
    pub fn name(self) -> &'static str {
        match self {
            Type::Null => "null",
            Type::Int => "int",
            Type::Float => "float",
            Type::Vec3 => "vec3",
            Type::Function => "function",
            Type::UserPointer => "userpointer",
            Type::String => "string",
            Type::Array => "array",
            Type::List => "list",
            Type::Dictionary => "dictionary",
            Type::Class => "class",
        }
    }

    /// Whether the kind is Int, Float or Vec3.
    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Int | Type::Float | Type::Vec3)
    }

    /// Whether an [`Array`] can hold elements of this kind.
    pub fn is_array_element(self) -> bool {
        matches!(
            self,
            Type::Int | Type::Float | Type::Vec3 | Type::Function | Type::UserPointer | Type::String
        )
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An opaque handle to host data.
///
/// Scripts can store and pass user pointers around but never look inside;
/// equality and hashing are by identity.
#[derive(Clone)]
pub struct UserPointer(Arc<dyn Any + Send + Sync>);

impl UserPointer {
    /// Wrap host data.
    pub fn new<T: Any + Send + Sync>(data: T) -> Self {
        UserPointer(Arc::new(data))
    }

    /// Borrow the host data if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Address of the shared allocation, used for identity.
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for UserPointer {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for UserPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserPointer({:#x})", self.addr())
    }
}
