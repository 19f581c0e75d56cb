//! Content hashing for dictionary keys

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHasher;

use crate::error::ValueError;

use super::Value;

impl Value {
    /// Hash used to key a dictionary entry.
    ///
    /// Scalars and strings hash by content, functions and user pointers by
    /// identity. The kind is mixed in, so `1` and `1.0` are distinct keys.
    pub fn hash_key(&self) -> Result<u64, ValueError> {
        let mut hasher = FxHasher::default();
        self.type_of().hash(&mut hasher);
        match self {
            Value::Null => {}
            Value::Int(i) => i.hash(&mut hasher),
            Value::Float(f) => f.to_bits().hash(&mut hasher),
            Value::Vec3(v) => [v.x, v.y, v.z].map(f32::to_bits).hash(&mut hasher),
            Value::Function(func) => (Arc::as_ptr(func) as usize).hash(&mut hasher),
            Value::UserPointer(ptr) => ptr.addr().hash(&mut hasher),
            Value::String(s) => s.hash(&mut hasher),
            other => return Err(ValueError::Unhashable(other.type_of())),
        }
        Ok(hasher.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Array, Type, UserPointer};

    #[test]
    fn test_equal_content_equal_hash() {
        let a = Value::String("key".into()).hash_key().unwrap();
        let b = Value::String("key".into()).hash_key().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_kind_is_part_of_the_hash() {
        let int = Value::Int(1).hash_key().unwrap();
        let float = Value::Float(1.0).hash_key().unwrap();
        assert_ne!(int, float);
    }

    #[test]
    fn test_user_pointers_hash_by_identity() {
        let a = UserPointer::new(5u32);
        let b = UserPointer::new(5u32);
        let ha = Value::UserPointer(a.clone()).hash_key().unwrap();
        assert_eq!(ha, Value::UserPointer(a).hash_key().unwrap());
        assert_ne!(ha, Value::UserPointer(b).hash_key().unwrap());
    }

    #[test]
    fn test_composites_are_unhashable() {
        let err = Value::Array(Array::new()).hash_key().unwrap_err();
        assert!(matches!(err, ValueError::Unhashable(Type::Array)));
    }
}
