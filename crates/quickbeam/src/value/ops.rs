//! Operator semantics
//!
//! Binary operators promote their operands first: `+` widens across every
//! kind, the other arithmetic and ordering operators only within the numeric
//! kinds. Compound assignment writes through the target slot.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::ValueError;

use super::{promote, promote_strict, Type, Value, ValueRef, Vec3};

fn undefined(op: &'static str, value: &Value) -> ValueError {
    ValueError::UndefinedOperator {
        op,
        ty: value.type_of(),
    }
}

impl Value {
    // ═══════════════════════════════════════════════════════════════════
    // Arithmetic
    // ═══════════════════════════════════════════════════════════════════

    /// `self + rhs`: numeric sum, concatenation, append, splice or merge.
    pub fn try_add(&self, rhs: &Value) -> Result<Value, ValueError> {
        let (a, b) = promote(self, rhs)?;
        Ok(match (a, b) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_add(b)),
            (Value::Float(a), Value::Float(b)) => Value::Float(a + b),
            (Value::Vec3(a), Value::Vec3(b)) => Value::Vec3(a + b),
            (Value::String(mut a), Value::String(b)) => {
                a.push_str(&b);
                Value::String(a)
            }
            (Value::Array(mut a), Value::Array(b)) => {
                a.extend(&b)?;
                Value::Array(a)
            }
            (Value::List(mut a), Value::List(b)) => {
                a.extend(b);
                Value::List(a)
            }
            (Value::Dictionary(a), Value::Dictionary(b)) => {
                let mut merged = (*a.read()).clone();
                if !Arc::ptr_eq(&a, &b) {
                    merged.merge(&b.read());
                }
                Value::Dictionary(merged.into_ref())
            }
            (a, _) => return Err(undefined("+", &a)),
        })
    }

    /// `self - rhs` over the numeric kinds.
    pub fn try_sub(&self, rhs: &Value) -> Result<Value, ValueError> {
        let (a, b) = promote_strict(self, rhs)?;
        Ok(match (a, b) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_sub(b)),
            (Value::Float(a), Value::Float(b)) => Value::Float(a - b),
            (Value::Vec3(a), Value::Vec3(b)) => Value::Vec3(a - b),
            (a, _) => return Err(undefined("-", &a)),
        })
    }

    /// `self * rhs` over the numeric kinds.
    pub fn try_mul(&self, rhs: &Value) -> Result<Value, ValueError> {
        let (a, b) = promote_strict(self, rhs)?;
        Ok(match (a, b) {
            (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_mul(b)),
            (Value::Float(a), Value::Float(b)) => Value::Float(a * b),
            (Value::Vec3(a), Value::Vec3(b)) => Value::Vec3(a * b),
            (a, _) => return Err(undefined("*", &a)),
        })
    }

    /// `self / rhs` over the numeric kinds. Integer division by zero fails.
    pub fn try_div(&self, rhs: &Value) -> Result<Value, ValueError> {
        let (a, b) = promote_strict(self, rhs)?;
        Ok(match (a, b) {
            (Value::Int(_), Value::Int(0)) => return Err(ValueError::DivisionByZero),
            (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_div(b)),
            (Value::Float(a), Value::Float(b)) => Value::Float(a / b),
            (Value::Vec3(a), Value::Vec3(b)) => Value::Vec3(a / b),
            (a, _) => return Err(undefined("/", &a)),
        })
    }

    /// `self % rhs` over Int and Float.
    pub fn try_rem(&self, rhs: &Value) -> Result<Value, ValueError> {
        let (a, b) = promote_strict(self, rhs)?;
        Ok(match (a, b) {
            (Value::Int(_), Value::Int(0)) => return Err(ValueError::DivisionByZero),
            (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_rem(b)),
            (Value::Float(a), Value::Float(b)) => Value::Float(a % b),
            (a, _) => return Err(undefined("%", &a)),
        })
    }

    /// Unary minus.
    pub fn try_neg(&self) -> Result<Value, ValueError> {
        Ok(match self {
            Value::Int(i) => Value::Int(i.wrapping_neg()),
            Value::Float(f) => Value::Float(-f),
            Value::Vec3(v) => Value::Vec3(-*v),
            other => return Err(undefined("-", other)),
        })
    }

    /// Logical not as an Int.
    pub fn logical_not(&self) -> Value {
        Value::Int(i64::from(!self.truthy()))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Ordering
    // ═══════════════════════════════════════════════════════════════════

    /// Order two values for the comparison operator `op`.
    ///
    /// Numbers and strings compare by value, collections by size. `None`
    /// means the operands are unordered (a NaN was involved).
    pub fn compare(&self, rhs: &Value, op: &'static str) -> Result<Option<Ordering>, ValueError> {
        let (a, b) = promote_strict(self, rhs)?;
        Ok(match (&a, &b) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Array(_) | Value::List(_) | Value::Dictionary(_), _) => {
                Some(a.len().cmp(&b.len()))
            }
            _ => return Err(undefined(op, &a)),
        })
    }
}

impl ValueRef {
    // ═══════════════════════════════════════════════════════════════════
    // Compound assignment
    // ═══════════════════════════════════════════════════════════════════

    /// `slot += rhs`, mutating the slot in place.
    ///
    /// Strings append the printed form of `rhs`, arrays and lists push or
    /// splice, dictionaries merge, numbers add.
    pub fn add_assign(&self, rhs: &Value) -> Result<(), ValueError> {
        match self.type_of() {
            Type::String => {
                let text = rhs.to_string();
                if let Value::String(s) = &mut *self.write() {
                    s.push_str(&text);
                }
            }
            Type::Array => {
                if let Value::Array(array) = &mut *self.write() {
                    match rhs {
                        Value::Array(other) => array.extend(other)?,
                        other => array.push(other.clone())?,
                    }
                }
            }
            Type::List => {
                if let Value::List(list) = &mut *self.write() {
                    match rhs {
                        Value::List(other) => list.extend(other.iter().cloned()),
                        other => list.push(ValueRef::new(other.clone())),
                    }
                }
            }
            Type::Dictionary => {
                let Value::Dictionary(other) = rhs.upconvert(Type::Dictionary)? else {
                    return Ok(());
                };
                if let Value::Dictionary(dict) = self.get() {
                    if !Arc::ptr_eq(&dict, &other) {
                        let other = (*other.read()).clone();
                        dict.write().merge(&other);
                    }
                }
            }
            _ => {
                let sum = self.get().try_add(rhs)?;
                self.set(sum);
            }
        }
        Ok(())
    }

    fn numeric_assign(
        &self,
        rhs: &Value,
        op: &'static str,
        apply: fn(&Value, &Value) -> Result<Value, ValueError>,
    ) -> Result<(), ValueError> {
        let current = self.get();
        if !current.type_of().is_numeric() {
            return Err(undefined(op, &current));
        }
        self.set(apply(&current, rhs)?);
        Ok(())
    }

    /// `slot -= rhs` over the numeric kinds.
    pub fn sub_assign(&self, rhs: &Value) -> Result<(), ValueError> {
        self.numeric_assign(rhs, "-=", Value::try_sub)
    }

    /// `slot *= rhs` over the numeric kinds.
    pub fn mul_assign(&self, rhs: &Value) -> Result<(), ValueError> {
        self.numeric_assign(rhs, "*=", Value::try_mul)
    }

    /// `slot /= rhs` over the numeric kinds.
    pub fn div_assign(&self, rhs: &Value) -> Result<(), ValueError> {
        self.numeric_assign(rhs, "/=", Value::try_div)
    }

    /// Add one in place, returning the previous value.
    pub fn increment(&self) -> Result<Value, ValueError> {
        self.step(1, "++")
    }

    /// Subtract one in place, returning the previous value.
    pub fn decrement(&self) -> Result<Value, ValueError> {
        self.step(-1, "--")
    }

    fn step(&self, delta: i64, op: &'static str) -> Result<Value, ValueError> {
        let mut slot = self.write();
        let previous = (*slot).clone();
        *slot = match &previous {
            Value::Int(i) => Value::Int(i.wrapping_add(delta)),
            Value::Float(f) => Value::Float(f + delta as f64),
            Value::Vec3(v) => Value::Vec3(*v + Vec3::splat(delta as f32)),
            other => return Err(undefined(op, other)),
        };
        Ok(previous)
    }
}
