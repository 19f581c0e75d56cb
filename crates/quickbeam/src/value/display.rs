//! Printed forms of values

use std::fmt;

use super::cycles::{class_addr, dictionary_addr, Path, CYCLE_MARKER};
use super::{Array, Value, ValueRef};

fn join<I, T>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
where
    I: IntoIterator<Item = T>,
    T: fmt::Display,
{
    for (index, item) in items.into_iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_finite() && value.fract() == 0.0 {
        write!(f, "{value:.1}")
    } else {
        write!(f, "{value}")
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        join(f, self.iter())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write_float(f, *v),
            Value::Vec3(v) => write!(f, "{v}"),
            Value::Function(func) => f.write_str(func.name()),
            Value::UserPointer(ptr) => write!(f, "userpointer({:#x})", ptr.addr()),
            Value::String(s) => f.write_str(s),
            Value::Array(array) => write!(f, "{array}"),
            Value::List(_) | Value::Dictionary(_) | Value::Class(_) => {
                write_nested(f, self, &mut Path::default())
            }
        }
    }
}

/// Print a container, replacing any container already being printed with
/// [`CYCLE_MARKER`].
fn write_nested(f: &mut fmt::Formatter<'_>, value: &Value, path: &mut Path<usize>) -> fmt::Result {
    match value {
        Value::List(list) => {
            for (index, slot) in list.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write_slot(f, slot, path)?;
            }
            Ok(())
        }
        Value::Dictionary(dict) => {
            if !path.enter(dictionary_addr(dict)) {
                return f.write_str(CYCLE_MARKER);
            }
            let entries: Vec<(Value, ValueRef)> = dict
                .read()
                .iter()
                .map(|(key, slot)| (key.clone(), slot.clone()))
                .collect();
            for (index, (key, slot)) in entries.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "`{key}: ")?;
                write_slot(f, slot, path)?;
                f.write_str("`")?;
            }
            path.leave();
            Ok(())
        }
        Value::Class(class) => {
            if !path.enter(class_addr(class)) {
                return f.write_str(CYCLE_MARKER);
            }
            write!(f, "{}:", class.name())?;
            for (name, slot) in class.variables() {
                write!(f, "\n`{name}: ")?;
                write_slot(f, &slot, path)?;
                f.write_str("`")?;
            }
            path.leave();
            Ok(())
        }
        scalar => write!(f, "{scalar}"),
    }
}

fn write_slot(f: &mut fmt::Formatter<'_>, slot: &ValueRef, path: &mut Path<usize>) -> fmt::Result {
    if !path.enter(slot.addr()) {
        return f.write_str(CYCLE_MARKER);
    }
    write_nested(f, &slot.get(), path)?;
    path.leave();
    Ok(())
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::String(s) => write!(f, "string {s:?}"),
            other => write!(f, "{} {other}", other.type_of()),
        }
    }
}
