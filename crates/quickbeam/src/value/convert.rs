//! Kind conversions and operand promotion

use crate::error::ValueError;

use super::{Array, Dictionary, Type, Value, ValueRef, Vec3};

/// Bring two operands to the same kind by widening the lower-ranked one.
pub fn promote(a: &Value, b: &Value) -> Result<(Value, Value), ValueError> {
    let (ta, tb) = (a.type_of(), b.type_of());
    if ta == tb {
        Ok((a.clone(), b.clone()))
    } else if ta < tb {
        Ok((a.upconvert(tb)?, b.clone()))
    } else {
        Ok((a.clone(), b.upconvert(ta)?))
    }
}

/// Like [`promote`], but only within the numeric kinds.
///
/// Operands of different kinds where either ranks above `vec3` are rejected.
pub fn promote_strict(a: &Value, b: &Value) -> Result<(Value, Value), ValueError> {
    let (ta, tb) = (a.type_of(), b.type_of());
    if ta != tb && ta.max(tb) > Type::Vec3 {
        return Err(ValueError::Incompatible {
            left: format!("{a:?}"),
            right: format!("{b:?}"),
        });
    }
    promote(a, b)
}

fn conversion(from: Type, to: Type) -> ValueError {
    ValueError::Conversion { from, to }
}

fn chars(text: &str) -> impl Iterator<Item = String> + '_ {
    text.chars().map(String::from)
}

impl Value {
    /// Widen to `target` without losing information.
    pub fn upconvert(&self, target: Type) -> Result<Value, ValueError> {
        let from = self.type_of();
        if from == target {
            return Ok(self.clone());
        }
        let converted = match (target, self) {
            (Type::Int, Value::Null) => Value::Int(0),

            (Type::Float, Value::Null) => Value::Float(0.0),
            (Type::Float, Value::Int(i)) => Value::Float(*i as f64),

            (Type::Vec3, Value::Null) => Value::Vec3(Vec3::default()),
            (Type::Vec3, Value::Int(i)) => Value::Vec3(Vec3::splat(*i as f32)),
            (Type::Vec3, Value::Float(f)) => Value::Vec3(Vec3::splat(*f as f32)),

            (Type::String, value) => Value::String(value.to_string()),

            (Type::Array, Value::Null) => Value::Array(Array::new()),
            (Type::Array, Value::String(s)) => Value::Array(Array::String(chars(s).collect())),
            (Type::Array, value) if from.is_array_element() => {
                Value::Array(Array::from_values([value.clone()])?)
            }

            (Type::List, Value::Null) => Value::List(Vec::new()),
            (Type::List, Value::String(s)) => {
                Value::List(chars(s).map(|c| Value::String(c).into()).collect())
            }
            (Type::List, Value::Array(array)) => {
                Value::List(array.iter().map(ValueRef::new).collect())
            }
            (Type::List, value) if from.is_array_element() => {
                Value::List(vec![ValueRef::new(value.clone())])
            }

            (Type::Dictionary, Value::Array(array)) => {
                let mut dict = Dictionary::new();
                for (index, item) in array.iter().enumerate() {
                    dict.insert(Value::Int(index as i64), ValueRef::new(item))?;
                }
                Value::Dictionary(dict.into_ref())
            }
            (Type::Dictionary, Value::List(list)) => {
                let mut dict = Dictionary::new();
                for (index, slot) in list.iter().enumerate() {
                    dict.insert(Value::Int(index as i64), ValueRef::new(slot.get()))?;
                }
                Value::Dictionary(dict.into_ref())
            }
            (Type::Dictionary, _) if from <= Type::String => {
                Value::Dictionary(Dictionary::new().into_ref())
            }

            _ => return Err(conversion(from, target)),
        };
        Ok(converted)
    }

    /// Explicit cast to `target`, allowing narrowing and parsing.
    pub fn hardconvert(&self, target: Type) -> Result<Value, ValueError> {
        let from = self.type_of();
        if from == target {
            return Ok(self.clone());
        }
        let converted = match (target, self) {
            (Type::Int, Value::Float(f)) => Value::Int(*f as i64),
            (Type::Int, Value::Vec3(v)) => Value::Int(v.x as i64),
            (Type::Int, Value::String(s)) => {
                let text = s.trim();
                let parsed = text
                    .parse::<i64>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().map(|f| f as i64));
                match parsed {
                    Some(i) => Value::Int(i),
                    None => return Err(ValueError::Parse { text: s.clone(), to: Type::Int }),
                }
            }
            (Type::Int, Value::Array(_) | Value::List(_) | Value::Dictionary(_)) => {
                Value::Int(self.len().unwrap_or(0) as i64)
            }

            (Type::Float, Value::Vec3(v)) => Value::Float(v.x as f64),
            (Type::Float, Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(f) => Value::Float(f),
                Err(_) => return Err(ValueError::Parse { text: s.clone(), to: Type::Float }),
            },
            (Type::Float, Value::Array(_) | Value::List(_) | Value::Dictionary(_)) => {
                Value::Float(self.len().unwrap_or(0) as f64)
            }

            (Type::Vec3, Value::Array(_) | Value::List(_)) => {
                let items = self.elements();
                if items.len() != 3 {
                    return Err(conversion(from, target));
                }
                let mut parts = [0.0f32; 3];
                for (part, item) in parts.iter_mut().zip(items) {
                    match item.hardconvert(Type::Float)? {
                        Value::Float(f) => *part = f as f32,
                        _ => return Err(conversion(item.type_of(), Type::Float)),
                    }
                }
                Value::Vec3(Vec3::new(parts[0], parts[1], parts[2]))
            }
            (Type::Vec3, Value::String(s)) => {
                let parts: Vec<f32> = s
                    .split(',')
                    .map(|part| part.trim().parse::<f32>())
                    .collect::<Result<_, _>>()
                    .map_err(|_| ValueError::Parse { text: s.clone(), to: Type::Vec3 })?;
                match parts.as_slice() {
                    [x, y, z] => Value::Vec3(Vec3::new(*x, *y, *z)),
                    _ => return Err(ValueError::Parse { text: s.clone(), to: Type::Vec3 }),
                }
            }

            (Type::Array, Value::List(_) | Value::Dictionary(_)) => {
                Value::Array(Array::from_values_lossy(self.elements())?)
            }

            (Type::List, Value::Dictionary(dict)) => Value::List(
                dict.read().values().map(|slot| ValueRef::new(slot.get())).collect(),
            ),
            (Type::List, Value::Class(class)) => Value::List(
                class
                    .variables()
                    .into_iter()
                    .map(|(_, slot)| ValueRef::new(slot.get()))
                    .collect(),
            ),

            (Type::Dictionary, Value::Class(class)) => {
                let mut dict = Dictionary::new();
                for (name, slot) in class.variables() {
                    dict.insert(Value::String(name), ValueRef::new(slot.get()))?;
                }
                Value::Dictionary(dict.into_ref())
            }

            _ => return self.upconvert(target),
        };
        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promote_widens_lower_kind() {
        let (a, b) = promote(&Value::Int(2), &Value::Float(0.5)).unwrap();
        assert_eq!(a, Value::Float(2.0));
        assert_eq!(b, Value::Float(0.5));

        let (a, b) = promote(&Value::Vec3(Vec3::splat(1.0)), &Value::Int(3)).unwrap();
        assert_eq!(a.type_of(), Type::Vec3);
        assert_eq!(b, Value::Vec3(Vec3::splat(3.0)));
    }

    #[test]
    fn test_promote_strict_rejects_non_numeric_mix() {
        let err = promote_strict(&Value::Int(1), &Value::String("a".into())).unwrap_err();
        assert!(matches!(err, ValueError::Incompatible { .. }));
        assert!(promote_strict(&Value::String("a".into()), &Value::String("b".into())).is_ok());
    }

    #[test]
    fn test_upconvert_string_to_collections() {
        let array = Value::String("ab".into()).upconvert(Type::Array).unwrap();
        assert_eq!(array, Value::Array(Array::String(vec!["a".into(), "b".into()])));

        let list = Value::String("ab".into()).upconvert(Type::List).unwrap();
        assert_eq!(list.len(), Some(2));
    }

    #[test]
    fn test_upconvert_refuses_narrowing() {
        assert!(Value::Float(1.5).upconvert(Type::Int).is_err());
        assert!(Value::List(Vec::new()).upconvert(Type::Array).is_err());
    }

    #[test]
    fn test_hardconvert_numbers() {
        assert_eq!(Value::Float(3.9).hardconvert(Type::Int).unwrap(), Value::Int(3));
        assert_eq!(Value::String(" 42 ".into()).hardconvert(Type::Int).unwrap(), Value::Int(42));
        assert_eq!(
            Value::String("2.5".into()).hardconvert(Type::Float).unwrap(),
            Value::Float(2.5)
        );
        assert!(Value::String("abc".into()).hardconvert(Type::Int).is_err());
        assert_eq!(
            Value::Array(Array::Int(vec![1, 2, 3])).hardconvert(Type::Int).unwrap(),
            Value::Int(3)
        );
    }

    #[test]
    fn test_hardconvert_vec3() {
        let from_text = Value::String("1, 2, 3".into()).hardconvert(Type::Vec3).unwrap();
        assert_eq!(from_text, Value::Vec3(Vec3::new(1.0, 2.0, 3.0)));

        let from_array = Value::Array(Array::Int(vec![4, 5, 6])).hardconvert(Type::Vec3).unwrap();
        assert_eq!(from_array, Value::Vec3(Vec3::new(4.0, 5.0, 6.0)));

        assert!(Value::Array(Array::Int(vec![1, 2])).hardconvert(Type::Vec3).is_err());
    }

    #[test]
    fn test_hardconvert_list_to_array_skips_mismatches() {
        let list = Value::List(vec![
            Value::String("a".into()).into(),
            Value::Int(1).into(),
            Value::String("b".into()).into(),
        ]);
        let array = list.hardconvert(Type::Array).unwrap();
        assert_eq!(array, Value::Array(Array::String(vec!["a".into(), "b".into()])));
    }
}
